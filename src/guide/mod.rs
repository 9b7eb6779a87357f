//! Guide generation.
//!
//! A guide is an 8-vertex, 6-quad box mesh that stands in for an asset:
//! - [`BoundsResolver`] - World bound and normalized corners of an asset
//! - [`GuideMeshBuilder`] - Authors the box under `<asset>/model/guide/box`
//! - [`generate_guide`] - Open source, compute, build, save
//! - [`GuideConfig`] - Purposes, visibility, normalization and time

pub mod topology;
pub mod resolver;
pub mod builder;
pub mod config;
pub mod pipeline;

pub use topology::{box_corners, CornerSet, FACE_VERTEX_COUNTS, FACE_VERTEX_INDICES};
pub use resolver::{BoundsResolver, ExtentNormalization};
pub use builder::{GuideMeshBuilder, FACE_VERTEX_COUNTS_ATTR, FACE_VERTEX_INDICES_ATTR, GUIDE_HIERARCHY};
pub use config::{GuideConfig, CONFIG_ENV};
pub use pipeline::{generate_guide, GuideReport};
