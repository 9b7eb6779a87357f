//! Typed attribute values.
//!
//! A [`ValueType`] combines a scalar kind with a component count, a
//! semantic role and an array flag, mirroring scene description type
//! names such as `point3f[]` or `matrix4d`. A [`Value`] is the data.

use crate::util::{DMat4, DVec3, Error, Result};
use std::fmt;

/// Base storage kind of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    UChar,
    Int,
    UInt,
    Int64,
    UInt64,
    Half,
    Float,
    Double,
    Token,
    String,
    Asset,
    Matrix4d,
}

impl ScalarKind {
    /// Type name as written in scene documents.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UChar => "uchar",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Half => "half",
            Self::Float => "float",
            Self::Double => "double",
            Self::Token => "token",
            Self::String => "string",
            Self::Asset => "asset",
            Self::Matrix4d => "matrix4d",
        }
    }

    /// Single-letter precision suffix used by role types (`point3f`).
    const fn suffix(self) -> Option<char> {
        match self {
            Self::Half => Some('h'),
            Self::Float => Some('f'),
            Self::Double => Some('d'),
            _ => None,
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            'h' => Some(Self::Half),
            'f' => Some(Self::Float),
            'd' => Some(Self::Double),
            _ => None,
        }
    }

    /// Integer kinds.
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::UChar | Self::Int | Self::UInt | Self::Int64 | Self::UInt64)
    }

    /// Floating point kinds.
    pub const fn is_real(self) -> bool {
        matches!(self, Self::Half | Self::Float | Self::Double)
    }

    /// Numeric kinds that may form tuples.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_real()
    }

    /// Text kinds.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Token | Self::String | Self::Asset)
    }

    const ALL_NAMED: [Self; 13] = [
        Self::Bool,
        Self::UChar,
        Self::UInt64,
        Self::UInt,
        Self::Int64,
        Self::Int,
        Self::Half,
        Self::Float,
        Self::Double,
        Self::Token,
        Self::String,
        Self::Asset,
        Self::Matrix4d,
    ];
}

/// Semantic role of a tuple type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    None,
    Point,
    Vector,
    Normal,
    Color,
    TexCoord,
    Quat,
}

impl Role {
    const fn prefix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Point => "point",
            Self::Vector => "vector",
            Self::Normal => "normal",
            Self::Color => "color",
            Self::TexCoord => "texCoord",
            Self::Quat => "quat",
        }
    }

    const ALL: [Self; 6] = [
        Self::Point,
        Self::Vector,
        Self::Normal,
        Self::Color,
        Self::TexCoord,
        Self::Quat,
    ];
}

/// Full type of an attribute value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    /// Base storage kind.
    pub kind: ScalarKind,
    /// Tuple width (1 for scalars, 2..=4 for vectors).
    pub components: u8,
    /// Semantic role.
    pub role: Role,
    /// Whether this is an array of elements.
    pub array: bool,
}

impl ValueType {
    /// Create a scalar (non-array, single component) type.
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self { kind, components: 1, role: Role::None, array: false }
    }

    /// Create a tuple type.
    pub const fn tuple(kind: ScalarKind, components: u8, role: Role) -> Self {
        Self { kind, components, role, array: false }
    }

    /// Array of this type.
    pub const fn array_of(self) -> Self {
        Self { array: true, ..self }
    }

    /// Element type of an array type.
    pub const fn element(self) -> Self {
        Self { array: false, ..self }
    }

    // === Common predefined types ===

    pub const BOOL: Self = Self::scalar(ScalarKind::Bool);
    pub const INT: Self = Self::scalar(ScalarKind::Int);
    pub const FLOAT: Self = Self::scalar(ScalarKind::Float);
    pub const DOUBLE: Self = Self::scalar(ScalarKind::Double);
    pub const TOKEN: Self = Self::scalar(ScalarKind::Token);
    pub const STRING: Self = Self::scalar(ScalarKind::String);
    pub const MATRIX4D: Self = Self::scalar(ScalarKind::Matrix4d);
    pub const FLOAT3: Self = Self::tuple(ScalarKind::Float, 3, Role::None);
    pub const DOUBLE3: Self = Self::tuple(ScalarKind::Double, 3, Role::None);

    pub const INT_ARRAY: Self = Self::INT.array_of();
    pub const FLOAT_ARRAY: Self = Self::FLOAT.array_of();
    pub const TOKEN_ARRAY: Self = Self::TOKEN.array_of();
    pub const FLOAT3_ARRAY: Self = Self::FLOAT3.array_of();
    pub const POINT3F_ARRAY: Self = Self::tuple(ScalarKind::Float, 3, Role::Point).array_of();
    pub const VECTOR3F_ARRAY: Self = Self::tuple(ScalarKind::Float, 3, Role::Vector).array_of();

    /// Type name as written in scene documents, e.g. `point3f[]`.
    pub fn name(&self) -> String {
        let mut s = String::new();
        match (self.role, self.kind.suffix()) {
            (Role::Quat, Some(suffix)) => {
                s.push_str("quat");
                s.push(suffix);
            }
            (Role::None, _) => {
                s.push_str(self.kind.name());
                if self.components > 1 {
                    s.push_str(&self.components.to_string());
                }
            }
            (role, Some(suffix)) => {
                s.push_str(role.prefix());
                s.push_str(&self.components.to_string());
                s.push(suffix);
            }
            (_, None) => s.push_str(self.kind.name()),
        }
        if self.array {
            s.push_str("[]");
        }
        s
    }

    /// Parse a type name. Returns `None` for unsupported names.
    pub fn from_name(name: &str) -> Option<Self> {
        let (base, array) = match name.strip_suffix("[]") {
            Some(b) => (b, true),
            None => (name, false),
        };

        for role in Role::ALL {
            let Some(rest) = base.strip_prefix(role.prefix()) else { continue };
            let mut chars = rest.chars();
            let (components, suffix) = if role == Role::Quat {
                (4, chars.next()?)
            } else {
                let digit = chars.next()?.to_digit(10)?;
                (digit as u8, chars.next()?)
            };
            if chars.next().is_some() || !(2..=4).contains(&components) {
                return None;
            }
            let kind = ScalarKind::from_suffix(suffix)?;
            return Some(Self { kind, components, role, array });
        }

        // `int64` must be tried before `int`, `uint64` before `uint`
        for kind in ScalarKind::ALL_NAMED {
            let Some(rest) = base.strip_prefix(kind.name()) else { continue };
            let components = match rest {
                "" => 1,
                "2" | "3" | "4" if kind.is_numeric() => rest.parse().ok()?,
                _ => continue,
            };
            return Some(Self { kind, components, role: Role::None, array });
        }
        None
    }

    /// Check whether `value` has the shape this type describes.
    pub fn accepts(&self, value: &Value) -> bool {
        use Value as V;
        let k = self.kind;
        match (self.array, self.components, value) {
            (false, 1, V::Bool(_)) => k == ScalarKind::Bool,
            (false, 1, V::Int(_)) => k.is_integer(),
            (false, 1, V::Real(_)) => k.is_real(),
            (false, 1, V::Token(_)) => k == ScalarKind::Token,
            (false, 1, V::String(_)) => matches!(k, ScalarKind::String | ScalarKind::Asset),
            (false, 1, V::Matrix4(_)) => k == ScalarKind::Matrix4d,
            (false, n, V::Tuple(t)) => k.is_numeric() && n > 1 && t.len() == n as usize,
            (true, 1, V::BoolArray(_)) => k == ScalarKind::Bool,
            (true, 1, V::IntArray(_)) => k.is_integer(),
            (true, 1, V::RealArray(_)) => k.is_real(),
            (true, 1, V::TokenArray(_)) => k == ScalarKind::Token,
            (true, 1, V::StringArray(_)) => matches!(k, ScalarKind::String | ScalarKind::Asset),
            (true, 3, V::Vec3Array(_)) => k.is_numeric(),
            (true, n, V::TupleArray(a)) => {
                k.is_numeric() && n > 1 && a.iter().all(|t| t.len() == n as usize)
            }
            _ => false,
        }
    }

    /// Validate `value` against this type and round real components to
    /// the type's precision, so stored data equals what a reload yields.
    pub fn conform(&self, value: Value) -> Result<Value> {
        if !self.accepts(&value) {
            return Err(Error::mismatch(self, value.describe()));
        }
        if !matches!(self.kind, ScalarKind::Float | ScalarKind::Half) {
            return Ok(value);
        }
        let q = |x: f64| x as f32 as f64;
        Ok(match value {
            Value::Real(x) => Value::Real(q(x)),
            Value::Tuple(t) => Value::Tuple(t.into_iter().map(q).collect()),
            Value::RealArray(a) => Value::RealArray(a.into_iter().map(q).collect()),
            Value::Vec3Array(a) => Value::Vec3Array(
                a.into_iter().map(|v| v.as_vec3().as_dvec3()).collect(),
            ),
            Value::TupleArray(a) => Value::TupleArray(
                a.into_iter().map(|t| t.into_iter().map(q).collect()).collect(),
            ),
            other => other,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.name())
    }
}

/// Attribute data.
///
/// Three-component arrays (points, normals, extents) are stored as
/// [`DVec3`]; other tuple widths use plain vectors.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Token(String),
    String(String),
    Tuple(Vec<f64>),
    Matrix4(DMat4),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    RealArray(Vec<f64>),
    TokenArray(Vec<String>),
    StringArray(Vec<String>),
    Vec3Array(Vec<DVec3>),
    TupleArray(Vec<Vec<f64>>),
}

impl Value {
    /// Short description of the value's shape, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Real(_) => "real",
            Self::Token(_) => "token",
            Self::String(_) => "string",
            Self::Tuple(_) => "tuple",
            Self::Matrix4(_) => "matrix",
            Self::BoolArray(_) => "bool array",
            Self::IntArray(_) => "integer array",
            Self::RealArray(_) => "real array",
            Self::TokenArray(_) => "token array",
            Self::StringArray(_) => "string array",
            Self::Vec3Array(_) => "vec3 array",
            Self::TupleArray(_) => "tuple array",
        }
    }

    /// Numeric scalar as f64 (integers widen).
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(x) => Some(*x),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Token or string payload.
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(s) | Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Three-component tuple as a vector.
    pub fn as_vec3(&self) -> Option<DVec3> {
        match self {
            Self::Tuple(t) if t.len() == 3 => Some(DVec3::new(t[0], t[1], t[2])),
            _ => None,
        }
    }

    /// Matrix payload.
    pub fn as_matrix4(&self) -> Option<DMat4> {
        match self {
            Self::Matrix4(m) => Some(*m),
            _ => None,
        }
    }

    /// Integer array payload.
    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            Self::IntArray(a) => Some(a),
            _ => None,
        }
    }

    /// Real array payload.
    pub fn as_real_array(&self) -> Option<&[f64]> {
        match self {
            Self::RealArray(a) => Some(a),
            _ => None,
        }
    }

    /// Token array payload.
    pub fn as_token_array(&self) -> Option<&[String]> {
        match self {
            Self::TokenArray(a) => Some(a),
            _ => None,
        }
    }

    /// Three-component array payload.
    pub fn as_vec3_array(&self) -> Option<&[DVec3]> {
        match self {
            Self::Vec3Array(a) => Some(a),
            _ => None,
        }
    }
}

impl From<Vec<DVec3>> for Value {
    fn from(v: Vec<DVec3>) -> Self {
        Self::Vec3Array(v)
    }
}

impl From<&[i32]> for Value {
    fn from(v: &[i32]) -> Self {
        Self::IntArray(v.iter().map(|&i| i as i64).collect())
    }
}

impl From<DMat4> for Value {
    fn from(m: DMat4) -> Self {
        Self::Matrix4(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_roundtrip() {
        for name in [
            "int", "int[]", "float", "double3", "float3[]", "point3f[]", "vector3f[]",
            "normal3f[]", "color3f[]", "texCoord2f[]", "quatf", "matrix4d", "token",
            "token[]", "string", "asset", "int64", "uint", "half3", "bool",
        ] {
            let ty = ValueType::from_name(name).unwrap_or_else(|| panic!("unparsed {name}"));
            assert_eq!(ty.name(), name);
        }
        assert_eq!(ValueType::from_name("point3f[]"), Some(ValueType::POINT3F_ARRAY));
        assert_eq!(ValueType::from_name("int64").map(|t| t.kind), Some(ScalarKind::Int64));
        assert_eq!(ValueType::from_name("dictionary"), None);
        assert_eq!(ValueType::from_name("point5f"), None);
        assert_eq!(ValueType::from_name("token3"), None);
    }

    #[test]
    fn test_accepts() {
        assert!(ValueType::INT_ARRAY.accepts(&Value::IntArray(vec![4, 4])));
        assert!(!ValueType::INT_ARRAY.accepts(&Value::RealArray(vec![4.0])));
        assert!(ValueType::POINT3F_ARRAY.accepts(&Value::Vec3Array(vec![DVec3::ONE])));
        assert!(ValueType::DOUBLE3.accepts(&Value::Tuple(vec![1.0, 2.0, 3.0])));
        assert!(!ValueType::DOUBLE3.accepts(&Value::Tuple(vec![1.0, 2.0])));
        assert!(ValueType::TOKEN.accepts(&Value::Token("render".into())));
    }

    #[test]
    fn test_conform_rounds_float_precision() {
        let v = ValueType::POINT3F_ARRAY
            .conform(Value::Vec3Array(vec![DVec3::new(0.1, 1.0, -2.5)]))
            .unwrap();
        let p = v.as_vec3_array().unwrap()[0];
        assert_eq!(p.x, 0.1f32 as f64);
        assert_eq!(p.y, 1.0);

        let d = ValueType::DOUBLE3.conform(Value::Tuple(vec![0.1, 0.2, 0.3])).unwrap();
        assert_eq!(d.as_vec3(), Some(DVec3::new(0.1, 0.2, 0.3)));

        let err = ValueType::INT_ARRAY.conform(Value::Token("x".into())).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
