//! USDA text documents.
//!
//! The persisted form of a [`Stage`]: a subset of the USD ASCII format
//! covering prims, typed attributes with defaults and time samples,
//! stage and prim metadata, and internal references.
//!
//! ```text
//! #usda 1.0
//! (
//!     defaultPrim = "asset"
//! )
//!
//! def Xform "asset"
//! {
//!     double3 xformOp:translate = (1, 2, 3)
//!     uniform token[] xformOpOrder = ["xformOp:translate"]
//! }
//! ```

mod lexer;
mod reader;
mod writer;

pub use reader::USDA_HEADER;

use crate::scene::Stage;
use crate::util::Result;

/// Parse a document. `identifier` becomes the stage identifier.
pub fn read(text: &str, identifier: &str) -> Result<Stage> {
    reader::parse(text, identifier)
}

/// Serialize a stage.
pub fn write(stage: &Stage) -> String {
    writer::to_string(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MetaValue, NodePath, TimeCode, Value, ValueType};
    use crate::geom::NodeKind;
    use crate::util::{DMat4, DVec3};

    fn path(s: &str) -> NodePath {
        NodePath::parse(s).unwrap()
    }

    fn sample_stage() -> Stage {
        let mut stage = Stage::new("sample.usda");
        let asset = stage.define_node(&path("/asset"), NodeKind::Xform).unwrap();
        stage.set_default_node(asset).unwrap();
        stage
            .set_node_meta_data(asset, "documentation", MetaValue::String("say \"hi\"\nbye".into()))
            .unwrap();
        stage
            .set_attribute(asset, "xformOp:translate", ValueType::DOUBLE3, Value::Tuple(vec![0.1, -2.0, 1e-9]))
            .unwrap();
        let order = stage.create_attribute(asset, "xformOpOrder", ValueType::TOKEN_ARRAY).unwrap();
        order.uniform = true;
        order.set(Value::TokenArray(vec!["xformOp:translate".into()])).unwrap();

        let mesh = stage.define_node(&path("/asset/geo/box"), NodeKind::Mesh).unwrap();
        stage
            .set_attribute(mesh, "points", ValueType::POINT3F_ARRAY, vec![DVec3::new(0.1, 2.5, -3.0); 2].into())
            .unwrap();
        stage
            .set_attribute(mesh, "faceVertexCounts", ValueType::INT_ARRAY, Value::from(&[4, 4][..]))
            .unwrap();
        let radius = stage.create_attribute(mesh, "primvars:width", ValueType::FLOAT).unwrap();
        radius.set_sample(1.0, Value::Real(0.5)).unwrap();
        radius.set_sample(24.0, Value::Real(1e20)).unwrap();
        stage.create_attribute(mesh, "extent", ValueType::VECTOR3F_ARRAY).unwrap();

        let m = DMat4::from_translation(DVec3::new(5.0, 6.0, 7.0));
        let inst = stage.define_node(&path("/inst"), NodeKind::Xform).unwrap();
        stage.set_reference(inst, path("/asset")).unwrap();
        stage.set_attribute(inst, "xformOp:transform", ValueType::MATRIX4D, m.into()).unwrap();
        stage.define_node(&path("/over_me"), NodeKind::Untyped).unwrap();
        stage
    }

    #[test]
    fn test_write_read_roundtrip() {
        let stage = sample_stage();
        let text = write(&stage);
        assert!(text.starts_with("#usda 1.0\n"));
        let back = read(&text, "sample.usda").unwrap();
        assert_eq!(back, stage, "document:\n{text}");
        assert_eq!(write(&back), text);
    }

    #[test]
    fn test_written_layout() {
        let text = write(&sample_stage());
        assert!(text.contains("    defaultPrim = \"asset\"\n"));
        assert!(text.contains("def Xform \"asset\" (\n"));
        assert!(text.contains("        def Mesh \"box\"\n"));
        assert!(text.contains("int[] faceVertexCounts = [4, 4]"));
        assert!(text.contains("point3f[] points = [(0.1, 2.5, -3.0), (0.1, 2.5, -3.0)]"));
        assert!(text.contains("uniform token[] xformOpOrder = [\"xformOp:translate\"]"));
        assert!(text.contains("prepend references = </asset>"));
        assert!(text.contains("primvars:width.timeSamples = {"));
        assert!(text.contains("vector3f[] extent\n"));
        assert!(text.contains("def \"over_me\""));
    }

    #[test]
    fn test_matrix_rows() {
        let text = write(&sample_stage());
        assert!(text.contains("(5.0, 6.0, 7.0, 1.0)"), "{text}");
        let back = read(&text, "x").unwrap();
        let inst = back.resolve("/inst").unwrap();
        let m = back
            .attribute(inst, "xformOp:transform")
            .and_then(|a| a.get(TimeCode::Default))
            .and_then(Value::as_matrix4)
            .unwrap();
        assert_eq!(m.transform_point3(DVec3::ONE), DVec3::new(6.0, 7.0, 8.0));
    }
}
