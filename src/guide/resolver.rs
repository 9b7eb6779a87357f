//! World extent and vertex-box computation for an asset node.

use serde::{Deserialize, Serialize};

use super::config::GuideConfig;
use super::topology::{box_corners, CornerSet};
use crate::geom::BBoxCache;
use crate::scene::{NodeRef, Stage};
use crate::util::{BoundingRange, DVec3, Error, Result, VertexBoxStage};

/// How extent coordinates are normalized before corners are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentNormalization {
    /// Coordinates pass through unchanged.
    #[default]
    Exact,
    /// Coordinates whose shortest decimal form is scientific
    /// (`|x| < 1e-4` or `|x| >= 1e16`) are replaced by their mantissa,
    /// matching guide files written by older tools.
    LegacyMantissa,
}

impl ExtentNormalization {
    /// Normalize one coordinate.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Exact => x,
            Self::LegacyMantissa => {
                let a = x.abs();
                if x == 0.0 || !x.is_finite() || (1e-4..1e16).contains(&a) {
                    return x;
                }
                let text = format!("{x:e}");
                text.split('e').next().and_then(|m| m.parse().ok()).unwrap_or(x)
            }
        }
    }

    fn apply_vec(self, v: DVec3) -> DVec3 {
        DVec3::new(self.apply(v.x), self.apply(v.y), self.apply(v.z))
    }
}

/// Computes the world bound of an asset and its 8 guide corners.
#[derive(Clone, Debug, Default)]
pub struct BoundsResolver {
    cache: BBoxCache,
    normalization: ExtentNormalization,
}

impl BoundsResolver {
    pub fn new(cache: BBoxCache, normalization: ExtentNormalization) -> Self {
        Self { cache, normalization }
    }

    pub fn from_config(config: &GuideConfig) -> Self {
        Self::new(config.bbox_cache(), config.normalization)
    }

    /// World-space aligned bound of a node and its subtree.
    pub fn compute_world_extent<'a>(&mut self, stage: &Stage, node: impl Into<NodeRef<'a>>) -> Result<BoundingRange> {
        let id = stage.resolve(node)?;
        let path = stage.path_of(id).map(|p| p.to_string()).unwrap_or_default();
        self.cache
            .compute_world_bound(stage, id)
            .map_err(|e| Error::ExtentComputation { path, source: Box::new(e) })
    }

    /// Normalized world bound of a node and its corners in guide order.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compute_vertex_box<'a>(
        &mut self,
        stage: &Stage,
        node: impl Into<NodeRef<'a>>,
    ) -> Result<(BoundingRange, CornerSet)> {
        let extraction = |e: Error| Error::VertexBox { stage: VertexBoxStage::Extraction, source: Box::new(e) };

        let extent = self.compute_world_extent(stage, node).map_err(extraction)?;
        let range = BoundingRange::new(
            self.normalization.apply_vec(extent.min),
            self.normalization.apply_vec(extent.max),
        );
        if !range.is_finite() {
            return Err(extraction(Error::other(format!("non-finite extent {range:?}"))));
        }
        if range.min.cmpgt(range.max).any() {
            return Err(Error::VertexBox {
                stage: VertexBoxStage::Corners,
                source: Box::new(Error::other(format!("normalized extent is inverted: {range:?}"))),
            });
        }
        if range != extent {
            tracing::debug!("normalized extent {:?} -> {:?}", extent, range);
        }
        Ok((range, box_corners(&range)))
    }
}
