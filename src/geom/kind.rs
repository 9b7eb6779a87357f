//! Node kinds (schema type names).

use std::fmt;

/// Mesh schema type name.
pub const MESH_TYPE: &str = "Mesh";

/// Xform schema type name.
pub const XFORM_TYPE: &str = "Xform";

/// Schema type of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// No type name authored.
    #[default]
    Untyped,
    Xform,
    Scope,
    Mesh,
    Points,
    BasisCurves,
    NurbsCurves,
    NurbsPatch,
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Capsule,
    /// Any other type name (cameras, lights, materials, ...).
    Other(String),
}

impl NodeKind {
    /// Parse a type name; an empty name means untyped.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "" => Self::Untyped,
            XFORM_TYPE => Self::Xform,
            "Scope" => Self::Scope,
            MESH_TYPE => Self::Mesh,
            "Points" => Self::Points,
            "BasisCurves" => Self::BasisCurves,
            "NurbsCurves" => Self::NurbsCurves,
            "NurbsPatch" => Self::NurbsPatch,
            "Cube" => Self::Cube,
            "Sphere" => Self::Sphere,
            "Cylinder" => Self::Cylinder,
            "Cone" => Self::Cone,
            "Capsule" => Self::Capsule,
            other => Self::Other(other.to_string()),
        }
    }

    /// Type name, `None` when untyped.
    pub fn type_name(&self) -> Option<&str> {
        Some(match self {
            Self::Untyped => return None,
            Self::Xform => XFORM_TYPE,
            Self::Scope => "Scope",
            Self::Mesh => MESH_TYPE,
            Self::Points => "Points",
            Self::BasisCurves => "BasisCurves",
            Self::NurbsCurves => "NurbsCurves",
            Self::NurbsPatch => "NurbsPatch",
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Cone => "Cone",
            Self::Capsule => "Capsule",
            Self::Other(name) => name,
        })
    }

    /// Whether authored transform ops apply to this node.
    pub fn is_xformable(&self) -> bool {
        !matches!(self, Self::Untyped | Self::Scope)
    }

    /// Gprims whose geometry is an explicit `points` array.
    pub fn is_point_based(&self) -> bool {
        matches!(
            self,
            Self::Mesh | Self::Points | Self::BasisCurves | Self::NurbsCurves | Self::NurbsPatch
        )
    }

    /// Gprims described by a few parameters.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::Cube | Self::Sphere | Self::Cylinder | Self::Cone | Self::Capsule)
    }

    /// Nodes that contribute geometry to bounds.
    pub fn is_gprim(&self) -> bool {
        self.is_point_based() || self.is_implicit()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name().unwrap_or("<untyped>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_roundtrip() {
        for name in ["Xform", "Scope", "Mesh", "Points", "Cube", "Capsule", "Camera"] {
            assert_eq!(NodeKind::from_type_name(name).type_name(), Some(name));
        }
        assert_eq!(NodeKind::from_type_name(""), NodeKind::Untyped);
        assert_eq!(NodeKind::Untyped.type_name(), None);
    }

    #[test]
    fn test_classification() {
        assert!(NodeKind::Mesh.is_gprim());
        assert!(NodeKind::Mesh.is_point_based());
        assert!(NodeKind::Sphere.is_implicit());
        assert!(!NodeKind::Xform.is_gprim());
        assert!(NodeKind::Xform.is_xformable());
        assert!(!NodeKind::Scope.is_xformable());
        assert!(NodeKind::Other("Camera".into()).is_xformable());
    }
}
