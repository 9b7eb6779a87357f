//! Geometry layer.
//!
//! This module provides the scene-graph rules bounds computation needs:
//! - [`NodeKind`] - Schema types (Xform, Mesh, implicit gprims, ...)
//! - [`XformSample`] / [`XformOp`] - Authored transform ops
//! - [`Purpose`] / [`Visibility`] - Node filtering
//! - [`local_extent`] - Object-space extents per gprim
//! - [`BBoxCache`] - World-space bounds of subtrees

pub mod kind;
pub mod xform;
pub mod visibility;
pub mod extent;
pub mod bbox_cache;

pub use kind::{NodeKind, MESH_TYPE, XFORM_TYPE};
pub use xform::{local_to_world, XformOp, XformOpType, XformSample, RESET_XFORM_STACK, XFORM_OP_ORDER};
pub use visibility::{
    compute_purpose, get_visibility, is_invisible, Purpose, Visibility, VisibilityPolicy,
    PURPOSE_ATTR, VISIBILITY_ATTR,
};
pub use extent::{local_extent, EXTENT_ATTR, POINTS_ATTR, WIDTHS_ATTR};
pub use bbox_cache::{BBoxCache, EXTENTS_HINT_ATTR};
