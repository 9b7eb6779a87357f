//! Fixed box topology of the guide mesh.
//!
//! The eight corners and the face-vertex tables below are a compatibility
//! contract with existing guide files: the corner order must match the
//! indices.

use crate::util::{BoundingRange, DVec3};

/// The 8 box corners in guide order.
pub type CornerSet = [DVec3; 8];

/// Six quads.
pub static FACE_VERTEX_COUNTS: [i32; 6] = [4, 4, 4, 4, 4, 4];

/// Corner indices per face, grouped by [`FACE_VERTEX_COUNTS`].
pub static FACE_VERTEX_INDICES: [i32; 24] = [
    0, 1, 3, 2, // top (max z)
    4, 5, 7, 6, // bottom (min z)
    6, 7, 2, 3, // max y
    5, 4, 1, 0, // min y
    5, 0, 2, 7, // max x
    1, 4, 6, 3, // min x
];

/// Corners of a range in guide order.
pub fn box_corners(range: &BoundingRange) -> CornerSet {
    let (lo, hi) = (range.min, range.max);
    [
        DVec3::new(hi.x, lo.y, hi.z),
        DVec3::new(lo.x, lo.y, hi.z),
        DVec3::new(hi.x, hi.y, hi.z),
        DVec3::new(lo.x, hi.y, hi.z),
        DVec3::new(lo.x, lo.y, lo.z),
        DVec3::new(hi.x, lo.y, lo.z),
        DVec3::new(lo.x, hi.y, lo.z),
        DVec3::new(hi.x, hi.y, lo.z),
    ]
}
