//! End-to-end guide generation: source document in, guide document out.

use serde::Serialize;

use super::builder::GuideMeshBuilder;
use super::config::GuideConfig;
use super::resolver::BoundsResolver;
use crate::scene::{SceneStore, Stage};
use crate::util::{BoundingRange, DVec3, Error, Result};

/// Summary of a generated guide.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GuideReport {
    pub source: String,
    pub target: String,
    /// Default node of the source the bound was computed for.
    pub asset: String,
    /// Path of the box mesh in the target.
    pub mesh: String,
    pub extent: BoundingRange,
    pub points: Vec<DVec3>,
}

/// Compute the guide for `source`'s default node and save it to `target`.
///
/// Fails with [`Error::SourceNotFound`] before touching the store when the
/// source does not exist; every later failure is wrapped in
/// [`Error::GuideGeneration`].
#[tracing::instrument(level = "debug", skip(store, config))]
pub fn generate_guide(store: &dyn SceneStore, source: &str, target: &str, config: &GuideConfig) -> Result<GuideReport> {
    if !store.exists(source) {
        return Err(Error::SourceNotFound(source.to_string()));
    }
    run(store, source, target, config).map_err(|e| Error::GuideGeneration { source: Box::new(e) })
}

fn run(store: &dyn SceneStore, source: &str, target: &str, config: &GuideConfig) -> Result<GuideReport> {
    config.validate()?;
    let mut stage = store.open(source)?;
    stage.freeze();

    let asset = stage
        .default_node()
        .ok_or_else(|| Error::NodeNotFound(format!("default node of {source}")))?;
    let asset_path = stage
        .path_of(asset)
        .cloned()
        .ok_or_else(|| Error::NodeNotFound(format!("default node of {source}")))?;
    tracing::info!("Auto guide will be calculated for: {}", asset_path);

    let mut resolver = BoundsResolver::from_config(config);
    let (extent, corners) = resolver.compute_vertex_box(&stage, asset)?;

    let mut guide: Stage = store.create_new(target)?;
    let mesh = GuideMeshBuilder::new().build_guide_mesh(&mut guide, &extent, &corners, &asset_path)?;
    let mesh_path = guide.path_of(mesh).map(|p| p.to_string()).unwrap_or_default();
    store.save(&guide)?;
    tracing::info!("Guide written to {} ({})", target, mesh_path);

    Ok(GuideReport {
        source: source.to_string(),
        target: target.to_string(),
        asset: asset_path.to_string(),
        mesh: mesh_path,
        extent,
        points: corners.to_vec(),
    })
}
