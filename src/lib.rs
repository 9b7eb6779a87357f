//! # autoguide
//!
//! Bounding-box guide meshes for USD-style scene graphs.
//!
//! Given a scene document, autoguide computes the world-space bound of its
//! default node (honouring transforms, purpose, visibility and instancing),
//! turns it into the 8 corners of a box and writes a 6-quad mesh at
//! `<asset>/model/guide/box` into a new document. The guide stands in for
//! the asset in crowd scenes, layout and distant levels of detail.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math re-exports and [`BoundingRange`](util::BoundingRange)
//! - [`core`] - Node paths, metadata, typed values and time codes
//! - [`scene`] - The in-memory [`Stage`](scene::Stage) and scene stores
//! - [`usda`] - Reading and writing the USDA text subset
//! - [`geom`] - Node kinds, transforms, purpose/visibility and bounds
//! - [`guide`] - Bounds resolution, guide mesh assembly and the pipeline
//!
//! ## Example
//!
//! ```ignore
//! use autoguide::prelude::*;
//!
//! let store = FileStore::new();
//! let report = generate_guide(&store, "geo.usda", "guide.usda", &GuideConfig::default())?;
//! println!("{} -> {}", report.asset, report.mesh);
//! ```

pub mod util;
pub mod core;
pub mod scene;
pub mod usda;
pub mod geom;
pub mod guide;

// Re-export commonly used types
pub use util::{Error, Result};
pub use guide::{generate_guide, GuideConfig, GuideReport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{BoundingRange, Error, Result};
    pub use crate::core::{NodePath, TimeCode, Value, ValueType};
    pub use crate::scene::{FileStore, MemoryStore, NodeId, SceneStore, Stage};
    pub use crate::geom::{BBoxCache, NodeKind, Purpose, VisibilityPolicy};
    pub use crate::guide::*;
}
