//! USDA document writer.

use std::fmt::Write;

use crate::core::{MetaValue, ScalarKind, Value, ValueType};
use crate::scene::{Attribute, Node, NodeId, Stage};
use crate::util::DVec3;

const INDENT: &str = "    ";

/// Serialize a stage to USDA text.
pub fn to_string(stage: &Stage) -> String {
    let mut out = String::from("#usda 1.0\n");
    if !stage.meta_data().is_empty() {
        out.push_str("(\n");
        for (key, value) in stage.meta_data().iter() {
            let _ = writeln!(out, "{INDENT}{key} = {}", meta_value(value));
        }
        out.push_str(")\n");
    }
    for &child in stage.children(stage.root()) {
        out.push('\n');
        write_node(&mut out, stage, child, 0);
    }
    out
}

fn write_node(out: &mut String, stage: &Stage, id: NodeId, depth: usize) {
    let Some(node) = stage.node(id) else { return };
    let pad = INDENT.repeat(depth);

    let _ = write!(out, "{pad}{} ", node.specifier().keyword());
    if let Some(ty) = node.kind().type_name() {
        let _ = write!(out, "{ty} ");
    }
    let _ = write!(out, "{}", quote(node.name()));

    let meta = node_meta(node);
    if meta.is_empty() {
        out.push('\n');
    } else {
        out.push_str(" (\n");
        for line in meta {
            let _ = writeln!(out, "{pad}{INDENT}{line}");
        }
        let _ = writeln!(out, "{pad})");
    }

    let _ = writeln!(out, "{pad}{{");
    for attr in node.attributes() {
        write_attribute(out, attr, &format!("{pad}{INDENT}"));
    }
    for (i, &child) in node.children().iter().enumerate() {
        if i > 0 || !node.attributes().is_empty() {
            out.push('\n');
        }
        write_node(out, stage, child, depth + 1);
    }
    let _ = writeln!(out, "{pad}}}");
}

fn node_meta(node: &Node) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in node.meta_data().iter() {
        let key = if key == "documentation" { "doc" } else { key };
        lines.push(format!("{key} = {}", meta_value(value)));
    }
    if let Some(target) = node.reference() {
        lines.push(format!("prepend references = <{target}>"));
    }
    lines
}

fn meta_value(value: &MetaValue) -> String {
    match value {
        MetaValue::Bool(b) => b.to_string(),
        MetaValue::Number(x) => real(*x),
        MetaValue::String(s) | MetaValue::Token(s) => quote(s),
        MetaValue::Path(p) => format!("<{p}>"),
    }
}

fn write_attribute(out: &mut String, attr: &Attribute, pad: &str) {
    let ty = attr.value_type();
    let mut decl = String::new();
    if attr.custom {
        decl.push_str("custom ");
    }
    if attr.uniform {
        decl.push_str("uniform ");
    }
    let _ = write!(decl, "{} {}", ty.name(), attr.name());

    match attr.default_value() {
        Some(v) => {
            let _ = writeln!(out, "{pad}{decl} = {}", value(ty, v));
        }
        None if attr.samples().is_empty() => {
            let _ = writeln!(out, "{pad}{decl}");
        }
        None => {}
    }
    if !attr.samples().is_empty() {
        let _ = writeln!(out, "{pad}{decl}.timeSamples = {{");
        for (t, v) in attr.samples() {
            let _ = writeln!(out, "{pad}{INDENT}{}: {},", real(*t), value(ty, v));
        }
        let _ = writeln!(out, "{pad}}}");
    }
}

/// Format a value of type `ty`.
fn value(ty: ValueType, v: &Value) -> String {
    let num = |x: f64| match ty.kind {
        k if k.is_integer() => (x as i64).to_string(),
        ScalarKind::Float | ScalarKind::Half if x.is_finite() => format!("{:?}", x as f32),
        _ => real(x),
    };
    let tuple = |t: &[f64]| format!("({})", t.iter().map(|&x| num(x)).collect::<Vec<_>>().join(", "));
    let vec3 = |p: &DVec3| tuple(&p.to_array());
    let list = |items: Vec<String>| format!("[{}]", items.join(", "));

    match v {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Real(x) => num(*x),
        Value::Token(s) | Value::String(s) if ty.kind == ScalarKind::Asset => format!("@{s}@"),
        Value::Token(s) | Value::String(s) => quote(s),
        Value::Tuple(t) => tuple(t),
        Value::Matrix4(m) => {
            let rows: Vec<String> = m.to_cols_array_2d().iter().map(|r| tuple(r)).collect();
            format!("( {} )", rows.join(", "))
        }
        Value::BoolArray(a) => list(a.iter().map(bool::to_string).collect()),
        Value::IntArray(a) => list(a.iter().map(i64::to_string).collect()),
        Value::RealArray(a) => list(a.iter().map(|&x| num(x)).collect()),
        Value::TokenArray(a) => list(a.iter().map(|s| quote(s)).collect()),
        Value::StringArray(a) if ty.kind == ScalarKind::Asset => list(a.iter().map(|s| format!("@{s}@")).collect()),
        Value::StringArray(a) => list(a.iter().map(|s| quote(s)).collect()),
        Value::Vec3Array(a) => list(a.iter().map(vec3).collect()),
        Value::TupleArray(a) => list(a.iter().map(|t| tuple(t)).collect()),
    }
}

fn real(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else {
        // shortest round-tripping digits, exponent form for extreme magnitudes
        format!("{x:?}")
    }
}

fn quote(s: &str) -> String {
    let mut q = String::with_capacity(s.len() + 2);
    q.push('"');
    for c in s.chars() {
        match c {
            '"' => q.push_str("\\\""),
            '\\' => q.push_str("\\\\"),
            '\n' => q.push_str("\\n"),
            '\t' => q.push_str("\\t"),
            '\r' => q.push_str("\\r"),
            c => q.push(c),
        }
    }
    q.push('"');
    q
}
