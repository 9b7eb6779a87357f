//! World-space bounds of scene subtrees.
//!
//! [`BBoxCache`] walks a subtree, transforms each gprim's local extent by
//! its local-to-world matrix and accumulates the aligned range. Purpose,
//! visibility, activation and instancing are applied during the walk.
//! A node with an internal reference composes the referenced node's kind
//! and attributes under its own, and takes its children from it.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::extent::local_extent;
use super::visibility::{authored_purpose, compute_purpose, get_visibility, is_invisible};
use super::xform::{local_to_world, XformSample};
use super::{Purpose, VisibilityPolicy};
use crate::core::{TimeCode, Value};
use crate::scene::{NodeId, NodeRef, Specifier, Stage};
use crate::util::{BoundingRange, DMat4, Error, Result};

/// Per-purpose cached bounds: `[min, max]` pairs in `Purpose::ALL` order.
pub const EXTENTS_HINT_ATTR: &str = "extentsHint";

/// Computes world bounds with fixed time, purpose and visibility settings.
///
/// Local extents are cached per node while a query runs, so instanced
/// prototypes are only measured once.
#[derive(Clone, Debug)]
pub struct BBoxCache {
    time: TimeCode,
    purposes: SmallVec<[Purpose; 4]>,
    visibility: VisibilityPolicy,
    use_extents_hint: bool,
    local: HashMap<NodeId, Option<BoundingRange>>,
}

impl Default for BBoxCache {
    fn default() -> Self {
        Self::new(TimeCode::Default, [Purpose::Default, Purpose::Render], VisibilityPolicy::Ignore, false)
    }
}

impl BBoxCache {
    pub fn new(
        time: TimeCode,
        purposes: impl IntoIterator<Item = Purpose>,
        visibility: VisibilityPolicy,
        use_extents_hint: bool,
    ) -> Self {
        let mut included = SmallVec::new();
        for p in purposes {
            if !included.contains(&p) {
                included.push(p);
            }
        }
        Self { time, purposes: included, visibility, use_extents_hint, local: HashMap::new() }
    }

    /// Time the bounds are computed at.
    pub fn time(&self) -> TimeCode {
        self.time
    }

    /// Included purposes.
    pub fn included_purposes(&self) -> &[Purpose] {
        &self.purposes
    }

    /// World-space aligned bound of a node and its subtree.
    ///
    /// Fails with [`Error::EmptyBound`] when nothing under the node passes
    /// the filters.
    pub fn compute_world_bound<'a>(&mut self, stage: &Stage, node: impl Into<NodeRef<'a>>) -> Result<BoundingRange> {
        let id = stage.resolve(node)?;
        let path = stage.path_of(id).map(|p| p.to_string()).unwrap_or_default();
        self.local.clear();

        let parent = stage.node(id).and_then(|n| n.parent());
        let (parent_matrix, parent_purpose) = match parent {
            Some(p) => (local_to_world(stage, p, self.time)?, compute_purpose(stage, p, self.time)?),
            None => (DMat4::IDENTITY, Purpose::Default),
        };
        if self.visibility == VisibilityPolicy::Respect {
            if let Some(p) = parent {
                if is_invisible(stage, p, self.time)? {
                    tracing::debug!("{} is under an invisible ancestor", path);
                    return Err(Error::EmptyBound(path));
                }
            }
        }

        let mut bound = BoundingRange::EMPTY;
        let mut expanding = Vec::new();
        self.visit(stage, id, parent_matrix, parent_purpose, &mut expanding, &mut bound)?;

        if bound.is_empty() {
            return Err(Error::EmptyBound(path));
        }
        if !bound.is_finite() {
            return Err(Error::geometry(path, format!("non-finite bound {bound:?}")));
        }
        tracing::debug!("world bound of {}: {:?}", path, bound);
        Ok(bound)
    }

    fn visit(
        &mut self,
        stage: &Stage,
        id: NodeId,
        parent_matrix: DMat4,
        parent_purpose: Purpose,
        expanding: &mut Vec<NodeId>,
        bound: &mut BoundingRange,
    ) -> Result<()> {
        let Some(node) = stage.node(id) else { return Ok(()) };
        if !node.meta_data().is_active() || node.specifier() == Specifier::Class {
            tracing::trace!("skip {} (inactive or abstract)", node.path());
            return Ok(());
        }
        let purpose = authored_purpose(stage, id, self.time)?.unwrap_or(parent_purpose);
        if !self.purposes.contains(&purpose) {
            tracing::trace!("skip {} (purpose {})", node.path(), purpose);
            return Ok(());
        }
        if self.visibility == VisibilityPolicy::Respect && get_visibility(stage, id, self.time)?.is_invisible() {
            tracing::trace!("skip {} (invisible)", node.path());
            return Ok(());
        }

        let kind = stage.composed_kind(id);
        let matrix = if kind.is_xformable() {
            let sample = XformSample::read(stage, id, self.time)?;
            if sample.inherits {
                parent_matrix * sample.matrix()
            } else {
                sample.matrix()
            }
        } else {
            parent_matrix
        };

        if self.use_extents_hint {
            if let Some(hint) = stage.composed_attribute(id, EXTENTS_HINT_ATTR).and_then(|a| a.get(self.time)) {
                let local = self.hinted_range(node.path().as_str(), hint)?;
                bound.expand_by_box(&local.transformed(&matrix));
                return Ok(());
            }
        }

        if kind.is_gprim() {
            let local = match self.local.get(&id) {
                Some(cached) => *cached,
                None => {
                    let e = local_extent(stage, id, self.time)?;
                    self.local.insert(id, e);
                    e
                }
            };
            if let Some(local) = local {
                tracing::trace!("{} contributes {:?}", node.path(), local);
                bound.expand_by_box(&local.transformed(&matrix));
            }
        }

        let (source, pushed) = self.children_source(stage, id, expanding)?;
        let children = stage.children(source).to_vec();
        let result = children
            .into_iter()
            .try_for_each(|child| self.visit(stage, child, matrix, purpose, expanding, bound));
        expanding.truncate(expanding.len() - pushed);
        result
    }

    /// Node whose children stand for `id`'s: the end of its reference chain.
    fn children_source(&self, stage: &Stage, id: NodeId, expanding: &mut Vec<NodeId>) -> Result<(NodeId, usize)> {
        let mut source = id;
        let mut pushed = 0;
        while let Some(target) = stage.node(source).and_then(|n| n.reference()) {
            let target_id = stage.resolve(target)?;
            if target_id == id || expanding.contains(&target_id) {
                expanding.truncate(expanding.len() - pushed);
                return Err(Error::ReferenceCycle(target.to_string()));
            }
            expanding.push(target_id);
            pushed += 1;
            source = target_id;
        }
        Ok((source, pushed))
    }

    fn hinted_range(&self, path: &str, hint: &Value) -> Result<BoundingRange> {
        let pairs = hint
            .as_vec3_array()
            .filter(|h| !h.is_empty() && h.len() % 2 == 0 && h.len() <= 2 * Purpose::ALL.len())
            .ok_or_else(|| Error::geometry(path, format!("malformed {EXTENTS_HINT_ATTR}")))?;
        let mut range = BoundingRange::EMPTY;
        for p in &self.purposes {
            let i = p.hint_index() * 2;
            if let Some([min, max]) = pairs.get(i..i + 2) {
                range.expand_by_box(&BoundingRange::new(*min, *max));
            }
        }
        Ok(range)
    }
}
