//! Local (object-space) extents of gprims.

use crate::core::{TimeCode, Value};
use crate::scene::{NodeId, Stage};
use crate::util::{BoundingRange, DVec3, Error, Result};

use super::NodeKind;

/// Authored bound of a gprim, `[min, max]`.
pub const EXTENT_ATTR: &str = "extent";
/// Point positions of point-based gprims.
pub const POINTS_ATTR: &str = "points";
/// Per-point widths of points and curves.
pub const WIDTHS_ATTR: &str = "widths";

/// Local extent of a gprim, `None` when it has no geometry.
///
/// Point-based gprims use the authored `extent`, falling back to the bound
/// of their points. Implicit gprims derive it from their parameters. Kind
/// and attributes are read through internal references.
pub fn local_extent(stage: &Stage, id: NodeId, time: TimeCode) -> Result<Option<BoundingRange>> {
    let Some(node) = stage.node(id) else {
        return Err(Error::NodeNotFound(format!("{id:?}")));
    };
    let path = node.path().as_str();
    let attr = |name: &str| stage.composed_attribute(id, name).and_then(|a| a.get(time));
    let real = |name: &str, default: f64| -> Result<f64> {
        match attr(name) {
            None => Ok(default),
            Some(v) => v
                .as_real()
                .ok_or_else(|| Error::geometry(path, format!("{name} is a {}, expected a number", v.describe()))),
        }
    };
    let axis = || -> Result<usize> {
        match attr("axis").and_then(Value::as_token) {
            None | Some("Z") => Ok(2),
            Some("X") => Ok(0),
            Some("Y") => Ok(1),
            Some(other) => Err(Error::geometry(path, format!("invalid axis {other:?}"))),
        }
    };

    let range = match stage.composed_kind(id) {
        k if k.is_point_based() => {
            if let Some(extent) = attr(EXTENT_ATTR) {
                return authored_extent(path, extent).map(Some);
            }
            let Some(points) = attr(POINTS_ATTR) else {
                return Ok(None);
            };
            let points = points
                .as_vec3_array()
                .ok_or_else(|| Error::geometry(path, format!("points is a {}", points.describe())))?;
            if points.is_empty() {
                return Ok(None);
            }
            let bound = BoundingRange::from_points(points.iter().copied());
            match k {
                NodeKind::Mesh | NodeKind::NurbsPatch => bound,
                _ => bound.padded(max_width(attr(WIDTHS_ATTR)) / 2.0),
            }
        }
        NodeKind::Cube => {
            let half = real("size", 2.0)?.abs() / 2.0;
            BoundingRange::new(DVec3::splat(-half), DVec3::splat(half))
        }
        NodeKind::Sphere => {
            let r = real("radius", 1.0)?.abs();
            BoundingRange::new(DVec3::splat(-r), DVec3::splat(r))
        }
        NodeKind::Cylinder | NodeKind::Cone => {
            let r = real("radius", 1.0)?.abs();
            let h = real("height", 2.0)?.abs() / 2.0;
            axis_aligned(axis()?, r, h)
        }
        NodeKind::Capsule => {
            let r = real("radius", 0.5)?.abs();
            let h = real("height", 1.0)?.abs() / 2.0;
            axis_aligned(axis()?, r, h + r)
        }
        _ => return Ok(None),
    };
    if range.is_finite() {
        Ok(Some(range))
    } else {
        Err(Error::geometry(path, "non-finite geometry"))
    }
}

/// Parse an authored `extent` value, which must hold exactly two points.
pub fn authored_extent(path: &str, value: &Value) -> Result<BoundingRange> {
    match value.as_vec3_array() {
        Some([min, max]) => {
            let range = BoundingRange::new(*min, *max);
            if range.is_finite() && min.cmple(*max).all() {
                Ok(range)
            } else {
                Err(Error::geometry(path, format!("malformed extent {range:?}")))
            }
        }
        Some(other) => Err(Error::geometry(path, format!("extent has {} entries, expected 2", other.len()))),
        None => Err(Error::geometry(path, format!("extent is a {}", value.describe()))),
    }
}

fn max_width(widths: Option<&Value>) -> f64 {
    match widths {
        Some(Value::RealArray(w)) => w.iter().copied().filter(|x| x.is_finite()).fold(0.0, f64::max),
        Some(Value::Real(w)) if w.is_finite() => *w,
        _ => 0.0,
    }
}

fn axis_aligned(axis: usize, radius: f64, half_height: f64) -> BoundingRange {
    let mut max = DVec3::splat(radius);
    max[axis] = half_height;
    BoundingRange::new(-max, max)
}
