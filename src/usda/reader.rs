//! USDA document reader.
//!
//! Parses the subset of the text format described in the crate docs into
//! a [`Stage`]. Constructs outside the subset that carry no geometry
//! (dictionaries, variant sets, relationships, attribute metadata) are
//! skipped; external references are skipped with a warning.

use super::lexer::{tokenize, Tok, Token};
use crate::core::{MetaValue, NodePath, ScalarKind, Value, ValueType};
use crate::geom::NodeKind;
use crate::scene::{NodeId, Specifier, Stage};
use crate::util::{DMat4, DVec3, Error, Result};

/// Document header magic.
pub const USDA_HEADER: &str = "#usda";

/// Metadata keys whose string values are tokens.
const TOKEN_KEYS: &[&str] = &["defaultPrim", "upAxis", "kind"];

/// Parse a document into a stage bound to `identifier`.
pub fn parse(text: &str, identifier: &str) -> Result<Stage> {
    let body = match text.strip_prefix(USDA_HEADER) {
        Some(rest) => rest.split_once('\n').map_or("", |(_, body)| body),
        None => {
            return Err(Error::Parse {
                line: 1,
                column: 1,
                message: format!("expected '{USDA_HEADER}' header"),
            })
        }
    };
    let tokens = tokenize(body, 2)?;
    let mut parser = Parser { tokens, pos: 0, stage: Stage::new(identifier) };
    parser.document()?;
    Ok(parser.stage)
}

/// Untyped value tree as written in the document.
#[derive(Clone, Debug)]
enum Parsed {
    Number(f64, bool),
    Str(String),
    Ident(String),
    Path(String),
    Asset(String),
    Seq(Vec<Parsed>),
    List(Vec<Parsed>),
    Dict,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    stage: Stage,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            Some(Tok::Ident(s)) => Some(s),
            _ => None,
        }
    }

    fn next(&mut self) -> Result<Tok> {
        let t = self.tokens.get(self.pos).ok_or_else(|| self.error("unexpected end of document"))?;
        self.pos += 1;
        Ok(t.tok.clone())
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let (line, column) = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or((1, 1), |t| (t.line, t.column));
        Error::Parse { line, column, message: message.into() }
    }

    fn expect(&mut self, want: Tok) -> Result<()> {
        match self.peek() {
            Some(t) if *t == want => {
                self.pos += 1;
                Ok(())
            }
            other => Err(self.error(format!("expected {want:?}, found {other:?}"))),
        }
    }

    fn eat(&mut self, want: &Tok) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.next()? {
            Tok::Ident(s) => Ok(s),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected identifier, found {other:?}")))
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        match self.next()? {
            Tok::Str(s) => Ok(s),
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected string, found {other:?}")))
            }
        }
    }

    fn document(&mut self) -> Result<()> {
        if self.peek() == Some(&Tok::LParen) {
            self.metadata_block(|p, key, value| {
                if let Some(meta) = to_meta_value(key, &value) {
                    p.stage.set_meta_data(key, meta)?;
                }
                Ok(())
            })?;
        }
        let root = self.stage.root();
        while self.peek().is_some() {
            self.prim(root)?;
        }
        Ok(())
    }

    /// `( entry* )` where an entry is `[listop] key = value` or a bare doc string.
    fn metadata_block(&mut self, mut on_entry: impl FnMut(&mut Self, &str, Parsed) -> Result<()>) -> Result<()> {
        self.expect(Tok::LParen)?;
        loop {
            match self.peek() {
                Some(Tok::RParen) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Tok::Str(_)) => {
                    let doc = self.string()?;
                    on_entry(self, "doc", Parsed::Str(doc))?;
                }
                Some(Tok::Semicolon) => self.pos += 1,
                Some(Tok::Ident(_)) => {
                    let mut key = self.ident()?;
                    if matches!(key.as_str(), "prepend" | "append" | "add" | "delete" | "reorder") {
                        key = self.ident()?;
                    }
                    self.expect(Tok::Equals)?;
                    let value = self.value()?;
                    on_entry(self, &key, value)?;
                }
                other => return Err(self.error(format!("unexpected {other:?} in metadata"))),
            }
        }
    }

    fn prim(&mut self, parent: NodeId) -> Result<()> {
        let specifier = match self.ident()?.as_str() {
            "def" => Specifier::Def,
            "over" => Specifier::Over,
            "class" => Specifier::Class,
            other => {
                self.pos -= 1;
                return Err(self.error(format!("expected def, over or class, found {other:?}")));
            }
        };
        let type_name = match self.peek() {
            Some(Tok::Ident(_)) => self.ident()?,
            _ => String::new(),
        };
        let name = self.string()?;
        let parent_path = self
            .stage
            .path_of(parent)
            .cloned()
            .ok_or_else(|| self.error("dangling parent"))?;
        let path = parent_path.child(&name).map_err(|e| self.error(e.to_string()))?;

        let id = self.stage.upsert(&path, specifier)?;
        if !type_name.is_empty() || specifier != Specifier::Over {
            self.stage.set_kind(id, NodeKind::from_type_name(&type_name))?;
        }

        if self.peek() == Some(&Tok::LParen) {
            self.metadata_block(|p, key, value| p.prim_metadata(id, key, value))?;
        }

        self.expect(Tok::LBrace)?;
        loop {
            match self.peek() {
                Some(Tok::RBrace) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Tok::Ident(kw)) if matches!(kw.as_str(), "def" | "over" | "class") => self.prim(id)?,
                Some(Tok::Ident(kw)) if kw == "variantSet" => self.skip_variant_set()?,
                Some(Tok::Semicolon) => self.pos += 1,
                Some(_) => self.property(id)?,
                None => return Err(self.error(format!("unterminated prim {path}"))),
            }
        }
    }

    fn prim_metadata(&mut self, id: NodeId, key: &str, value: Parsed) -> Result<()> {
        match key {
            "references" | "inherits" | "specializes" | "payload" => {
                let target = match &value {
                    Parsed::Path(p) => Some(p.clone()),
                    Parsed::List(items) if items.len() == 1 => match &items[0] {
                        Parsed::Path(p) => Some(p.clone()),
                        _ => None,
                    },
                    Parsed::List(items) if items.is_empty() => return Ok(()),
                    _ => None,
                };
                match (key, target) {
                    ("references", Some(p)) => {
                        let target = NodePath::parse(&p).map_err(|e| self.error(e.to_string()))?;
                        self.stage.set_reference(id, target)?;
                    }
                    _ => tracing::warn!(
                        "{}: unsupported {} ignored",
                        self.stage.path_of(id).map(NodePath::as_str).unwrap_or("?"),
                        key
                    ),
                }
            }
            "doc" => {
                if let Parsed::Str(s) = value {
                    self.stage.set_node_meta_data(id, "documentation", MetaValue::String(s))?;
                }
            }
            _ => {
                if let Some(meta) = to_meta_value(key, &value) {
                    self.stage.set_node_meta_data(id, key, meta)?;
                }
            }
        }
        Ok(())
    }

    fn property(&mut self, id: NodeId) -> Result<()> {
        let mut custom = false;
        let mut uniform = false;
        loop {
            match self.peek_ident() {
                Some("custom") => custom = true,
                Some("uniform") => uniform = true,
                Some("varying") => {}
                _ => break,
            }
            self.pos += 1;
        }

        if self.peek_ident() == Some("rel") {
            self.pos += 1;
            self.ident()?;
            if self.eat(&Tok::Equals) {
                self.value()?;
            }
            if self.peek() == Some(&Tok::LParen) {
                self.metadata_block(|_, _, _| Ok(()))?;
            }
            return Ok(());
        }

        let type_token = self.ident()?;
        let mut type_name = type_token.clone();
        if self.eat(&Tok::LBracket) {
            self.expect(Tok::RBracket)?;
            type_name.push_str("[]");
        }
        let value_type = ValueType::from_name(&type_name)
            .ok_or_else(|| self.error(format!("unsupported attribute type {type_name:?}")))?;
        let full_name = self.ident()?;
        let (name, suffix) = match full_name.rsplit_once('.') {
            Some((n, s)) if matches!(s, "timeSamples" | "connect" | "spline") => (n.to_string(), Some(s.to_string())),
            _ => (full_name.clone(), None),
        };

        let attr = self.stage.create_attribute(id, &name, value_type)?;
        attr.custom |= custom;
        attr.uniform |= uniform;

        if self.eat(&Tok::Equals) {
            match suffix.as_deref() {
                Some("timeSamples") => {
                    let samples = self.time_samples(value_type)?;
                    let attr = self.stage.create_attribute(id, &name, value_type)?;
                    for (t, v) in samples {
                        attr.set_sample(t, v)?;
                    }
                }
                Some(_) => {
                    self.value()?;
                }
                None => {
                    let at = self.pos;
                    let parsed = self.value()?;
                    if let Some(value) = convert(value_type, &parsed).map_err(|m| self.error_at(at, m))? {
                        self.stage.create_attribute(id, &name, value_type)?.set(value)?;
                    }
                }
            }
        }
        if self.peek() == Some(&Tok::LParen) {
            self.metadata_block(|_, _, _| Ok(()))?;
        }
        Ok(())
    }

    fn error_at(&self, pos: usize, message: String) -> Error {
        let (line, column) = self.tokens.get(pos).map_or((1, 1), |t| (t.line, t.column));
        Error::Parse { line, column, message }
    }

    fn time_samples(&mut self, value_type: ValueType) -> Result<Vec<(f64, Value)>> {
        self.expect(Tok::LBrace)?;
        let mut out = Vec::new();
        loop {
            match self.next()? {
                Tok::RBrace => return Ok(out),
                Tok::Comma => {}
                Tok::Number(t, _) => {
                    self.expect(Tok::Colon)?;
                    let at = self.pos;
                    let parsed = self.value()?;
                    if let Some(v) = convert(value_type, &parsed).map_err(|m| self.error_at(at, m))? {
                        out.push((t, v));
                    }
                }
                other => {
                    self.pos -= 1;
                    return Err(self.error(format!("expected sample time, found {other:?}")));
                }
            }
        }
    }

    fn value(&mut self) -> Result<Parsed> {
        match self.next()? {
            Tok::Number(x, int) => Ok(Parsed::Number(x, int)),
            Tok::Str(s) => Ok(Parsed::Str(s)),
            Tok::Ident(s) => Ok(Parsed::Ident(s)),
            Tok::PathRef(p) => Ok(Parsed::Path(p)),
            Tok::Asset(a) => {
                // external reference target: @file@</prim>
                if let Some(Tok::PathRef(_)) = self.peek() {
                    self.pos += 1;
                }
                Ok(Parsed::Asset(a))
            }
            Tok::LParen => Ok(Parsed::Seq(self.sequence(Tok::RParen)?)),
            Tok::LBracket => Ok(Parsed::List(self.sequence(Tok::RBracket)?)),
            Tok::LBrace => {
                self.skip_balanced()?;
                Ok(Parsed::Dict)
            }
            other => {
                self.pos -= 1;
                Err(self.error(format!("expected value, found {other:?}")))
            }
        }
    }

    fn sequence(&mut self, close: Tok) -> Result<Vec<Parsed>> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(&Tok::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    /// Skip to the brace matching an already consumed `{`.
    fn skip_balanced(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Tok::LBrace => depth += 1,
                Tok::RBrace => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn skip_variant_set(&mut self) -> Result<()> {
        self.pos += 1;
        let name = self.string()?;
        tracing::debug!("skipping variantSet {:?}", name);
        self.expect(Tok::Equals)?;
        self.expect(Tok::LBrace)?;
        self.skip_balanced()
    }
}

fn to_meta_value(key: &str, value: &Parsed) -> Option<MetaValue> {
    match value {
        Parsed::Str(s) if TOKEN_KEYS.contains(&key) => Some(MetaValue::Token(s.clone())),
        Parsed::Str(s) => Some(MetaValue::String(s.clone())),
        Parsed::Number(x, _) => Some(MetaValue::Number(*x)),
        Parsed::Ident(s) if s == "true" => Some(MetaValue::Bool(true)),
        Parsed::Ident(s) if s == "false" => Some(MetaValue::Bool(false)),
        Parsed::Ident(s) => Some(MetaValue::Token(s.clone())),
        Parsed::Path(p) => NodePath::parse(p).ok().map(MetaValue::Path),
        _ => None,
    }
}

/// Convert a parsed value to the declared type. `None` is a blocked value.
fn convert(ty: ValueType, parsed: &Parsed) -> std::result::Result<Option<Value>, String> {
    if matches!(parsed, Parsed::Ident(s) if s == "None") {
        return Ok(None);
    }
    let value = if ty.array {
        let Parsed::List(items) = parsed else {
            return Err(format!("expected array for {ty}"));
        };
        convert_array(ty, items)?
    } else {
        convert_element(ty, parsed)?
    };
    Ok(Some(value))
}

fn convert_array(ty: ValueType, items: &[Parsed]) -> std::result::Result<Value, String> {
    let elem = ty.element();
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(convert_element(elem, item)?);
    }
    macro_rules! collect {
        ($variant:ident, $pat:pat => $out:expr) => {
            Value::$variant(values.into_iter().filter_map(|v| match v { $pat => Some($out), _ => None }).collect())
        };
    }
    Ok(match (ty.kind, ty.components) {
        (ScalarKind::Bool, 1) => collect!(BoolArray, Value::Bool(b) => b),
        (k, 1) if k.is_integer() => collect!(IntArray, Value::Int(i) => i),
        (k, 1) if k.is_real() => collect!(RealArray, Value::Real(x) => x),
        (ScalarKind::Token, 1) => collect!(TokenArray, Value::Token(s) => s),
        (ScalarKind::String | ScalarKind::Asset, 1) => collect!(StringArray, Value::String(s) => s),
        (_, 3) => collect!(Vec3Array, Value::Tuple(t) => DVec3::new(t[0], t[1], t[2])),
        (_, n) if n > 1 => collect!(TupleArray, Value::Tuple(t) => t),
        _ => return Err(format!("unsupported array type {ty}")),
    })
}

fn convert_element(ty: ValueType, parsed: &Parsed) -> std::result::Result<Value, String> {
    let number = |p: &Parsed| match p {
        Parsed::Number(x, int) => Ok((*x, *int)),
        other => Err(format!("expected number for {ty}, found {other:?}")),
    };
    match ty.kind {
        ScalarKind::Matrix4d => {
            let Parsed::Seq(rows) = parsed else {
                return Err("expected matrix rows".into());
            };
            if rows.len() != 4 {
                return Err(format!("matrix4d needs 4 rows, found {}", rows.len()));
            }
            let mut m = [[0.0; 4]; 4];
            for (r, row) in rows.iter().enumerate() {
                let Parsed::Seq(cells) = row else {
                    return Err("expected matrix row tuple".into());
                };
                if cells.len() != 4 {
                    return Err(format!("matrix4d row needs 4 values, found {}", cells.len()));
                }
                for (c, cell) in cells.iter().enumerate() {
                    m[r][c] = number(cell)?.0;
                }
            }
            // rows of the row-vector matrix are the columns of its transpose
            Ok(Value::Matrix4(DMat4::from_cols_array_2d(&m)))
        }
        ScalarKind::Bool => match parsed {
            Parsed::Ident(s) if s == "true" => Ok(Value::Bool(true)),
            Parsed::Ident(s) if s == "false" => Ok(Value::Bool(false)),
            Parsed::Number(x, true) => Ok(Value::Bool(*x != 0.0)),
            other => Err(format!("expected bool, found {other:?}")),
        },
        ScalarKind::Token | ScalarKind::String | ScalarKind::Asset => match parsed {
            Parsed::Str(s) if ty.kind == ScalarKind::Token => Ok(Value::Token(s.clone())),
            Parsed::Str(s) | Parsed::Asset(s) => Ok(Value::String(s.clone())),
            other => Err(format!("expected string for {ty}, found {other:?}")),
        },
        k if ty.components > 1 => {
            let Parsed::Seq(items) = parsed else {
                return Err(format!("expected tuple for {ty}, found {parsed:?}"));
            };
            if items.len() != ty.components as usize {
                return Err(format!("{ty} needs {} components, found {}", ty.components, items.len()));
            }
            let mut t = Vec::with_capacity(items.len());
            for item in items {
                let (x, int) = number(item)?;
                if k.is_integer() && !int {
                    return Err(format!("expected integer component for {ty}"));
                }
                t.push(x);
            }
            Ok(Value::Tuple(t))
        }
        k if k.is_integer() => match number(parsed)? {
            (x, true) => Ok(Value::Int(x as i64)),
            (x, false) => Err(format!("expected integer for {ty}, found {x}")),
        },
        _ => Ok(Value::Real(number(parsed)?.0)),
    }
}
