//! Guide mesh assembly.

use super::topology::{CornerSet, FACE_VERTEX_COUNTS, FACE_VERTEX_INDICES};
use crate::core::{NodePath, Value, ValueType};
use crate::geom::{NodeKind, EXTENT_ATTR, POINTS_ATTR};
use crate::scene::{NodeId, Stage};
use crate::util::{BoundingRange, Error, Result};

/// Quad count per face.
pub const FACE_VERTEX_COUNTS_ATTR: &str = "faceVertexCounts";
/// Flattened corner indices of every face.
pub const FACE_VERTEX_INDICES_ATTR: &str = "faceVertexIndices";

/// Segments below the asset node leading to the box mesh.
pub const GUIDE_HIERARCHY: [&str; 3] = ["model", "guide", "box"];

/// Writes the box mesh into a target stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct GuideMeshBuilder;

impl GuideMeshBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Path of the mesh node for a given asset path.
    pub fn mesh_path(parent: &NodePath) -> Result<NodePath> {
        GUIDE_HIERARCHY.iter().try_fold(parent.clone(), |p, name| p.child(name))
    }

    /// Define `<parent>/model/guide/box` and author the box on it.
    ///
    /// Re-running with the same inputs leaves the stage unchanged. If the
    /// stage has no default node, the top-level ancestor of `parent` becomes
    /// it.
    #[tracing::instrument(level = "debug", skip_all, fields(parent = %parent))]
    pub fn build_guide_mesh(
        &self,
        stage: &mut Stage,
        range: &BoundingRange,
        corners: &CornerSet,
        parent: &NodePath,
    ) -> Result<NodeId> {
        self.author(stage, range, corners, parent)
            .map_err(|e| Error::MeshBuild { path: parent.to_string(), source: Box::new(e) })
    }

    fn author(&self, stage: &mut Stage, range: &BoundingRange, corners: &CornerSet, parent: &NodePath) -> Result<NodeId> {
        if parent.is_root() {
            return Err(Error::InvalidPath("guide parent must not be the pseudo-root".into()));
        }

        let mut path = parent.clone();
        stage.define_node(&path, NodeKind::Xform)?;
        for name in &GUIDE_HIERARCHY[..2] {
            path = path.child(name)?;
            stage.define_node(&path, NodeKind::Xform)?;
        }
        path = path.child(GUIDE_HIERARCHY[2])?;
        let mesh = stage.define_node(&path, NodeKind::Mesh)?;

        stage.set_attribute(mesh, FACE_VERTEX_COUNTS_ATTR, ValueType::INT_ARRAY, Value::from(&FACE_VERTEX_COUNTS[..]))?;
        stage.set_attribute(mesh, POINTS_ATTR, ValueType::POINT3F_ARRAY, corners.to_vec().into())?;
        stage.set_attribute(mesh, EXTENT_ATTR, ValueType::VECTOR3F_ARRAY, vec![range.min, range.max].into())?;
        stage.set_attribute(mesh, FACE_VERTEX_INDICES_ATTR, ValueType::INT_ARRAY, Value::from(&FACE_VERTEX_INDICES[..]))?;

        if stage.default_node().is_none() {
            if let Some(top) = parent.top_level().and_then(|p| stage.node_at(&p)) {
                stage.set_default_node(top)?;
            }
        }
        tracing::debug!("authored guide mesh {}", path);
        Ok(mesh)
    }
}
