//! Scene layer - the in-memory graph and the stores that persist it.
//!
//! - [`Stage`] - Node arena with path index, attributes and metadata
//! - [`SceneStore`] - Open / create / save documents by identifier
//! - [`FileStore`] / [`MemoryStore`] - Disk-backed and in-memory stores

mod stage;
mod store;

pub use stage::{Attribute, Node, NodeId, NodeRef, Specifier, Stage};
pub use store::{FileStore, MemoryStore, SceneStore};
