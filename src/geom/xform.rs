//! Transform ops authored on xformable nodes.
//!
//! A node's local transform is the ordered list of ops named by its
//! `xformOpOrder` attribute. Each entry names an attribute such as
//! `xformOp:translate` or `xformOp:rotateZ:tilt`; the `!invert!` prefix
//! applies the op's inverse and `!resetXformStack!` stops the node from
//! inheriting its parent's transform. The order and the op attributes
//! resolve through internal references, local opinions first.

use crate::core::{TimeCode, Value};
use crate::scene::{NodeId, Stage};
use crate::util::{DMat4, DQuat, DVec3, Error, Result};

/// Attribute listing the ops in application order.
pub const XFORM_OP_ORDER: &str = "xformOpOrder";

/// Marker entry that discards inherited transforms.
pub const RESET_XFORM_STACK: &str = "!resetXformStack!";

const OP_PREFIX: &str = "xformOp:";
const INVERT_PREFIX: &str = "!invert!";

/// Transform operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XformOpType {
    Translate,
    Scale,
    RotateX,
    RotateY,
    RotateZ,
    /// Euler angles in degrees, applied X then Y then Z.
    RotateXYZ,
    RotateXZY,
    RotateYXZ,
    RotateYZX,
    RotateZXY,
    RotateZYX,
    /// Quaternion, authored real part first.
    Orient,
    /// Full 4x4 matrix.
    Transform,
}

impl XformOpType {
    /// Parse the op type segment of an op name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "translate" => Self::Translate,
            "scale" => Self::Scale,
            "rotateX" => Self::RotateX,
            "rotateY" => Self::RotateY,
            "rotateZ" => Self::RotateZ,
            "rotateXYZ" => Self::RotateXYZ,
            "rotateXZY" => Self::RotateXZY,
            "rotateYXZ" => Self::RotateYXZ,
            "rotateYZX" => Self::RotateYZX,
            "rotateZXY" => Self::RotateZXY,
            "rotateZYX" => Self::RotateZYX,
            "orient" => Self::Orient,
            "transform" => Self::Transform,
            _ => return None,
        })
    }

    /// Axes of a three-angle rotation in the order they are applied.
    pub fn euler_order(self) -> Option<[usize; 3]> {
        Some(match self {
            Self::RotateXYZ => [0, 1, 2],
            Self::RotateXZY => [0, 2, 1],
            Self::RotateYXZ => [1, 0, 2],
            Self::RotateYZX => [1, 2, 0],
            Self::RotateZXY => [2, 0, 1],
            Self::RotateZYX => [2, 1, 0],
            _ => return None,
        })
    }

    /// Number of values an op of this type carries.
    pub fn arity(self) -> usize {
        match self {
            Self::RotateX | Self::RotateY | Self::RotateZ => 1,
            Self::Orient => 4,
            Self::Transform => 16,
            _ => 3,
        }
    }
}

/// A single transform operation.
///
/// Values always match the op type's arity: 3 for vectors and Euler
/// angles, 1 for single-axis angles, 4 for quaternions (real part first),
/// 16 for matrices (column-major).
#[derive(Clone, Debug, PartialEq)]
pub struct XformOp {
    op_type: XformOpType,
    values: Vec<f64>,
    inverse: bool,
}

impl XformOp {
    fn new(op_type: XformOpType, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), op_type.arity());
        Self { op_type, values, inverse: false }
    }

    /// Create a translate operation.
    pub fn translate(v: DVec3) -> Self {
        Self::new(XformOpType::Translate, v.to_array().to_vec())
    }

    /// Create a scale operation.
    pub fn scale(v: DVec3) -> Self {
        Self::new(XformOpType::Scale, v.to_array().to_vec())
    }

    /// Create a rotation around Z (degrees).
    pub fn rotate_z(angle: f64) -> Self {
        Self::new(XformOpType::RotateZ, vec![angle])
    }

    /// Create a three-angle rotation (degrees per axis). `None` unless
    /// `op_type` is one of the `rotateABC` types.
    pub fn rotate_euler(op_type: XformOpType, angles: DVec3) -> Option<Self> {
        op_type.euler_order()?;
        Some(Self::new(op_type, angles.to_array().to_vec()))
    }

    /// Create an orientation operation.
    pub fn orient(q: DQuat) -> Self {
        Self::new(XformOpType::Orient, vec![q.w, q.x, q.y, q.z])
    }

    /// Create a matrix operation.
    pub fn transform(m: DMat4) -> Self {
        Self::new(XformOpType::Transform, m.to_cols_array().to_vec())
    }

    /// Build an op from an authored value, `None` if the value's shape does
    /// not fit the op type.
    pub fn from_value(op_type: XformOpType, value: &Value) -> Option<Self> {
        let values = match (op_type.arity(), value) {
            (1, v) => vec![v.as_real()?],
            (16, v) => v.as_matrix4()?.to_cols_array().to_vec(),
            (n, Value::Tuple(t)) if t.len() == n => t.clone(),
            _ => return None,
        };
        Some(Self::new(op_type, values))
    }

    /// The same op applied inversely.
    pub fn inverted(mut self) -> Self {
        self.inverse = !self.inverse;
        self
    }

    pub fn op_type(&self) -> XformOpType {
        self.op_type
    }

    /// Authored values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    fn vec3(&self) -> DVec3 {
        DVec3::new(self.values[0], self.values[1], self.values[2])
    }

    /// Matrix of this op alone.
    pub fn matrix(&self) -> DMat4 {
        let m = match self.op_type {
            XformOpType::Translate => DMat4::from_translation(self.vec3()),
            XformOpType::Scale => DMat4::from_scale(self.vec3()),
            XformOpType::RotateX => axis_rotation(0, self.values[0]),
            XformOpType::RotateY => axis_rotation(1, self.values[0]),
            XformOpType::RotateZ => axis_rotation(2, self.values[0]),
            XformOpType::Orient => {
                let [w, x, y, z] = [self.values[0], self.values[1], self.values[2], self.values[3]];
                DMat4::from_quat(DQuat::from_xyzw(x, y, z, w).normalize())
            }
            XformOpType::Transform => {
                let mut cols = [0.0; 16];
                cols.copy_from_slice(&self.values);
                DMat4::from_cols_array(&cols)
            }
            euler => {
                let angles = self.vec3();
                euler
                    .euler_order()
                    .unwrap_or([0, 1, 2])
                    .iter()
                    .fold(DMat4::IDENTITY, |m, &axis| axis_rotation(axis, angles[axis]) * m)
            }
        };
        if self.inverse {
            m.inverse()
        } else {
            m
        }
    }
}

fn axis_rotation(axis: usize, degrees: f64) -> DMat4 {
    let radians = degrees.to_radians();
    match axis {
        0 => DMat4::from_rotation_x(radians),
        1 => DMat4::from_rotation_y(radians),
        _ => DMat4::from_rotation_z(radians),
    }
}

/// Transform sample with decomposed operations.
#[derive(Clone, Debug, PartialEq)]
pub struct XformSample {
    /// Transform operations in order.
    pub ops: Vec<XformOp>,
    /// Whether this xform inherits from parent.
    pub inherits: bool,
}

impl Default for XformSample {
    fn default() -> Self {
        Self { ops: Vec::new(), inherits: true }
    }
}

impl XformSample {
    /// Create identity xform.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Read the ops of a node at `time`, composed through its references.
    ///
    /// Nodes without `xformOpOrder` are the identity. Every entry must name
    /// an attribute with a value of the op's shape.
    pub fn read(stage: &Stage, id: NodeId, time: TimeCode) -> Result<Self> {
        let node = stage.node(id).ok_or_else(|| Error::NodeNotFound(format!("#{id:?}")))?;
        let path = node.path().as_str();
        let mut sample = Self::default();
        let Some(order) = stage.composed_attribute(id, XFORM_OP_ORDER).and_then(|a| a.get(time)) else {
            return Ok(sample);
        };
        let order = order
            .as_token_array()
            .ok_or_else(|| Error::geometry(path, format!("{XFORM_OP_ORDER} is not a token array")))?;

        for entry in order {
            if entry == RESET_XFORM_STACK {
                sample.ops.clear();
                sample.inherits = false;
                continue;
            }
            let (name, inverse) = match entry.strip_prefix(INVERT_PREFIX) {
                Some(name) => (name, true),
                None => (entry.as_str(), false),
            };
            let op_type = name
                .strip_prefix(OP_PREFIX)
                .and_then(|rest| XformOpType::from_name(rest.split(':').next().unwrap_or(rest)))
                .ok_or_else(|| Error::geometry(path, format!("unsupported transform op {entry:?}")))?;
            let value = stage
                .composed_attribute(id, name)
                .and_then(|a| a.get(time))
                .ok_or_else(|| Error::geometry(path, format!("transform op {name:?} has no value")))?;
            let op = XformOp::from_value(op_type, value)
                .ok_or_else(|| Error::geometry(path, format!("transform op {name:?} has a {} value", value.describe())))?;
            sample.ops.push(if inverse { op.inverted() } else { op });
        }
        Ok(sample)
    }

    /// Compute the local 4x4 transformation matrix.
    pub fn matrix(&self) -> DMat4 {
        // Ops are listed outermost first; for column vectors that is a
        // right-multiply in order.
        self.ops.iter().fold(DMat4::IDENTITY, |acc, op| acc * op.matrix())
    }

    /// Get translation component.
    pub fn translation(&self) -> DVec3 {
        self.matrix().w_axis.truncate()
    }
}

/// Local-to-world matrix of a node: its ancestors' transforms composed down
/// to its own, stopping at the nearest `!resetXformStack!`.
pub fn local_to_world(stage: &Stage, id: NodeId, time: TimeCode) -> Result<DMat4> {
    let mut chain = Vec::new();
    let mut current = Some(id);
    while let Some(n) = current {
        let Some(node) = stage.node(n) else { break };
        if stage.composed_kind(n).is_xformable() {
            let sample = XformSample::read(stage, n, time)?;
            let inherits = sample.inherits;
            chain.push(sample.matrix());
            if !inherits {
                break;
            }
        }
        current = node.parent();
    }
    Ok(chain.iter().rev().fold(DMat4::IDENTITY, |acc, m| acc * *m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NodePath, ValueType};
    use crate::geom::NodeKind;

    fn assert_close(a: DVec3, b: DVec3) {
        assert!((a - b).length() < 1e-9, "{a} != {b}");
    }

    fn xform(stage: &mut Stage, path: &str, ops: &[(&str, ValueType, Value)]) -> NodeId {
        let id = stage.define_node(&NodePath::parse(path).unwrap(), NodeKind::Xform).unwrap();
        let mut order = Vec::new();
        for (name, ty, value) in ops {
            let attr_name = name.trim_start_matches(INVERT_PREFIX);
            if *name != RESET_XFORM_STACK && stage.attribute(id, attr_name).is_none() {
                stage.set_attribute(id, attr_name, *ty, value.clone()).unwrap();
            }
            order.push(name.to_string());
        }
        stage
            .set_attribute(id, XFORM_OP_ORDER, ValueType::TOKEN_ARRAY, Value::TokenArray(order))
            .unwrap();
        id
    }

    fn v3(x: f64, y: f64, z: f64) -> Value {
        Value::Tuple(vec![x, y, z])
    }

    #[test]
    fn test_op_order() {
        let mut stage = Stage::new("t");
        let id = xform(
            &mut stage,
            "/a",
            &[
                ("xformOp:translate", ValueType::DOUBLE3, v3(10.0, 0.0, 0.0)),
                ("xformOp:rotateZ", ValueType::DOUBLE, Value::Real(90.0)),
                ("xformOp:scale", ValueType::FLOAT3, v3(2.0, 2.0, 2.0)),
            ],
        );
        let m = XformSample::read(&stage, id, TimeCode::Default).unwrap().matrix();
        // scale, then rotate, then translate
        assert_close(m.transform_point3(DVec3::X), DVec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn test_matrix_and_rotate_xyz() {
        let m = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let op = XformOp::transform(m);
        assert_eq!(op.matrix(), m);

        let r = XformOp::rotate_euler(XformOpType::RotateXYZ, DVec3::new(90.0, 0.0, 90.0)).unwrap();
        // X first: Y axis goes to Z; then Z rotation leaves Z alone
        assert_close(r.matrix().transform_point3(DVec3::Y), DVec3::Z);
        // Z last: X axis goes to Y
        assert_close(r.matrix().transform_point3(DVec3::X), DVec3::Y);
    }

    #[test]
    fn test_euler_orders() {
        let angles = DVec3::new(90.0, 0.0, 90.0);
        let xyz = XformOp::rotate_euler(XformOpType::RotateXYZ, angles).unwrap().matrix();
        let zyx = XformOp::rotate_euler(XformOpType::RotateZYX, angles).unwrap().matrix();
        // Z first: X axis goes to Y, then X rotation sends Y to Z
        assert_close(zyx.transform_point3(DVec3::X), DVec3::Z);
        assert_close(xyz.transform_point3(DVec3::X), DVec3::Y);

        for (name, order) in [
            ("rotateXZY", [0, 2, 1]),
            ("rotateYXZ", [1, 0, 2]),
            ("rotateYZX", [1, 2, 0]),
            ("rotateZXY", [2, 0, 1]),
        ] {
            let op_type = XformOpType::from_name(name).unwrap();
            assert_eq!(op_type.euler_order(), Some(order));
            let angles = DVec3::new(30.0, 45.0, 60.0);
            let expected = order
                .iter()
                .fold(DMat4::IDENTITY, |m, &axis| axis_rotation(axis, angles[axis]) * m);
            let m = XformOp::rotate_euler(op_type, angles).unwrap().matrix();
            assert!(m.abs_diff_eq(expected, 1e-12), "{name}");
        }
        assert!(XformOp::rotate_euler(XformOpType::RotateZ, angles).is_none());
    }

    #[test]
    fn test_orient() {
        let identity = XformOp::from_value(XformOpType::Orient, &Value::Tuple(vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        assert!(identity.matrix().abs_diff_eq(DMat4::IDENTITY, 1e-12));

        let q = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let op = XformOp::orient(q);
        assert_eq!(op.values()[0], q.w);
        assert_close(op.matrix().transform_point3(DVec3::X), DVec3::Y);

        let mut stage = Stage::new("t");
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let quatf = ValueType::from_name("quatf").unwrap();
        let id = xform(&mut stage, "/a", &[("xformOp:orient", quatf, Value::Tuple(vec![s, 0.0, 0.0, s]))]);
        let m = XformSample::read(&stage, id, TimeCode::Default).unwrap().matrix();
        assert_close(m.transform_point3(DVec3::X), DVec3::Y);
    }

    #[test]
    fn test_values_match_op_shape() {
        assert!(XformOp::from_value(XformOpType::Orient, &Value::Tuple(vec![1.0, 0.0, 0.0])).is_none());
        assert!(XformOp::from_value(XformOpType::Translate, &Value::Real(1.0)).is_none());
        assert!(XformOp::from_value(XformOpType::RotateX, &Value::Tuple(vec![1.0, 0.0, 0.0])).is_none());
        assert!(XformOp::from_value(XformOpType::Transform, &Value::Tuple(vec![0.0; 16])).is_none());

        let op = XformOp::from_value(XformOpType::RotateY, &Value::Int(90)).unwrap();
        assert_eq!(op.values(), &[90.0]);
        let inverted = op.clone().inverted();
        assert!(inverted.is_inverse());
        assert!((op.matrix() * inverted.matrix()).abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn test_ops_compose_through_references() {
        let mut stage = Stage::new("t");
        xform(&mut stage, "/protos/wheel", &[("xformOp:translate", ValueType::DOUBLE3, v3(100.0, 0.0, 0.0))]);
        let inst = stage.define_node(&NodePath::parse("/inst").unwrap(), NodeKind::Untyped).unwrap();
        stage.set_reference(inst, NodePath::parse("/protos/wheel").unwrap()).unwrap();
        let m = local_to_world(&stage, inst, TimeCode::Default).unwrap();
        assert_close(m.transform_point3(DVec3::ZERO), DVec3::new(100.0, 0.0, 0.0));

        // local value wins, the op order still comes from the prototype
        stage.set_attribute(inst, "xformOp:translate", ValueType::DOUBLE3, v3(0.0, 2.0, 0.0)).unwrap();
        let sample = XformSample::read(&stage, inst, TimeCode::Default).unwrap();
        assert_close(sample.translation(), DVec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_pivot_inverse() {
        let mut stage = Stage::new("t");
        let id = xform(
            &mut stage,
            "/a",
            &[
                ("xformOp:translate:pivot", ValueType::DOUBLE3, v3(1.0, 0.0, 0.0)),
                ("xformOp:rotateZ", ValueType::FLOAT, Value::Real(180.0)),
                ("!invert!xformOp:translate:pivot", ValueType::DOUBLE3, v3(0.0, 0.0, 0.0)),
            ],
        );
        let m = XformSample::read(&stage, id, TimeCode::Default).unwrap().matrix();
        // rotating about x=1 keeps the pivot fixed
        assert_close(m.transform_point3(DVec3::X), DVec3::X);
        assert_close(m.transform_point3(DVec3::ZERO), DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_world_chain_and_reset() {
        let mut stage = Stage::new("t");
        xform(&mut stage, "/a", &[("xformOp:translate", ValueType::DOUBLE3, v3(1.0, 0.0, 0.0))]);
        let b = xform(&mut stage, "/a/b", &[("xformOp:scale", ValueType::DOUBLE3, v3(3.0, 3.0, 3.0))]);
        let m = local_to_world(&stage, b, TimeCode::Default).unwrap();
        assert_close(m.transform_point3(DVec3::ONE), DVec3::new(4.0, 3.0, 3.0));

        let c = xform(
            &mut stage,
            "/a/b/c",
            &[
                (RESET_XFORM_STACK, ValueType::TOKEN, Value::Token(String::new())),
                ("xformOp:translate", ValueType::DOUBLE3, v3(0.0, 5.0, 0.0)),
            ],
        );
        let m = local_to_world(&stage, c, TimeCode::Default).unwrap();
        assert_close(m.transform_point3(DVec3::ZERO), DVec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_time_sampled_op() {
        let mut stage = Stage::new("t");
        let id = xform(&mut stage, "/a", &[("xformOp:translate", ValueType::DOUBLE3, v3(0.0, 0.0, 0.0))]);
        stage
            .create_attribute(id, "xformOp:translate", ValueType::DOUBLE3)
            .unwrap()
            .set_sample(10.0, v3(5.0, 0.0, 0.0))
            .unwrap();
        let at = |t| XformSample::read(&stage, id, t).unwrap().translation();
        assert_close(at(TimeCode::Default), DVec3::ZERO);
        assert_close(at(TimeCode::At(12.0)), DVec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_malformed_ops() {
        let mut stage = Stage::new("t");
        let id = stage.define_node(&NodePath::parse("/a").unwrap(), NodeKind::Xform).unwrap();
        let order = |ops: &[&str]| Value::TokenArray(ops.iter().map(|s| s.to_string()).collect());

        stage
            .set_attribute(id, XFORM_OP_ORDER, ValueType::TOKEN_ARRAY, order(&["xformOp:translate"]))
            .unwrap();
        assert!(matches!(XformSample::read(&stage, id, TimeCode::Default), Err(Error::InvalidGeometry { .. })));

        stage.set_attribute(id, "xformOp:translate", ValueType::DOUBLE, Value::Real(1.0)).unwrap();
        assert!(XformSample::read(&stage, id, TimeCode::Default).is_err());

        stage
            .set_attribute(id, XFORM_OP_ORDER, ValueType::TOKEN_ARRAY, order(&["xformOp:shear"]))
            .unwrap();
        assert!(XformSample::read(&stage, id, TimeCode::Default).is_err());

        stage
            .set_attribute(id, XFORM_OP_ORDER, ValueType::TOKEN_ARRAY, order(&["xformOp:orient"]))
            .unwrap();
        stage.set_attribute(id, "xformOp:orient", ValueType::DOUBLE3, v3(1.0, 0.0, 0.0)).unwrap();
        assert!(matches!(XformSample::read(&stage, id, TimeCode::Default), Err(Error::InvalidGeometry { .. })));
    }
}
