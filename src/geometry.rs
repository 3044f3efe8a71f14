//! Geometry kernel: orientation enumeration, AABB tests, support ratios.
//!
//! All arithmetic is 64-bit floating point with a single tolerance ε.
//! Conventions: x spans the container length, y the height (gravity is −y),
//! z the width. Every function here is pure and total — no failures.

use crate::types::ItemSnapshot;

/// Oriented extents of a carton: `length` along x, `width` along z,
/// `height` along y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedDims {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned box: min-corner plus oriented extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, z: f64, dims: OrientedDims) -> Self {
        Self {
            x,
            y,
            z,
            length: dims.length,
            width: dims.width,
            height: dims.height,
        }
    }

    pub fn x_max(&self) -> f64 {
        self.x + self.length
    }

    pub fn y_max(&self) -> f64 {
        self.y + self.height
    }

    pub fn z_max(&self) -> f64 {
        self.z + self.width
    }

    /// Bottom-face area in the XZ plane.
    pub fn footprint_area(&self) -> f64 {
        self.length * self.width
    }
}

/// Enumerate candidate orientations as `(orientation_index, extents)`.
///
/// Index 0 is always the original orientation `(l, w, h)`. When rotation is
/// allowed, all six axis permutations are produced in a fixed order so the
/// packer's first-fit scan is deterministic.
pub fn orientations(item: &ItemSnapshot) -> Vec<(u8, OrientedDims)> {
    let (l, w, h) = (item.length_cm, item.width_cm, item.height_cm);
    let table = [
        (l, w, h),
        (l, h, w),
        (w, l, h),
        (w, h, l),
        (h, l, w),
        (h, w, l),
    ];
    let count = if item.can_rotate { table.len() } else { 1 };
    table
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, &(length, width, height))| {
            (
                i as u8,
                OrientedDims {
                    length,
                    width,
                    height,
                },
            )
        })
        .collect()
}

/// Bounds check: the box lies inside a container of interior
/// `(length, width, height)` within tolerance ε.
pub fn fits_inside(
    container_length: f64,
    container_width: f64,
    container_height: f64,
    aabb: &Aabb,
    eps: f64,
) -> bool {
    aabb.x >= -eps
        && aabb.y >= -eps
        && aabb.z >= -eps
        && aabb.x_max() <= container_length + eps
        && aabb.y_max() <= container_height + eps
        && aabb.z_max() <= container_width + eps
}

/// Length of the overlap of two 1-D intervals; negative when disjoint.
pub fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
    a_max.min(b_max) - a_min.max(b_min)
}

/// Strict interior overlap of two boxes; shared faces do not count.
pub fn aabb_overlap(a: &Aabb, b: &Aabb, eps: f64) -> bool {
    overlap_1d(a.x, a.x_max(), b.x, b.x_max()) > eps
        && overlap_1d(a.y, a.y_max(), b.y, b.y_max()) > eps
        && overlap_1d(a.z, a.z_max(), b.z, b.z_max()) > eps
}

/// Area of the XZ footprint overlap of two boxes; 0 when disjoint.
pub fn footprint_overlap_area(a: &Aabb, b: &Aabb) -> f64 {
    let over_x = overlap_1d(a.x, a.x_max(), b.x, b.x_max()).max(0.0);
    let over_z = overlap_1d(a.z, a.z_max(), b.z, b.z_max()).max(0.0);
    over_x * over_z
}

/// Fraction of `candidate`'s bottom face covered by top faces of `existing`
/// boxes whose top is at exactly `candidate.y` (within ε). Clamped to [0, 1].
pub fn support_ratio(candidate: &Aabb, existing: &[Aabb], eps: f64) -> f64 {
    let base = candidate.footprint_area();
    if base <= eps {
        return 0.0;
    }
    let supported: f64 = existing
        .iter()
        .filter(|p| (p.y_max() - candidate.y).abs() <= eps)
        .map(|p| footprint_overlap_area(candidate, p))
        .sum();
    (supported / base).clamp(0.0, 1.0)
}

/// True when `upper` sits at or above `lower`'s top face with an
/// overlapping XZ footprint — the configuration the fragile and
/// non-stackable rules forbid for protected `lower` boxes.
pub fn is_above_footprint(upper: &Aabb, lower: &Aabb, eps: f64) -> bool {
    upper.y >= lower.y_max() - eps && footprint_overlap_area(upper, lower) > eps
}

/// True when `upper` rests directly on `lower` (top face contact within ε
/// plus footprint overlap). Used for stack-chain bookkeeping.
pub fn rests_on(upper: &Aabb, lower: &Aabb, eps: f64) -> bool {
    (upper.y - lower.y_max()).abs() <= eps && footprint_overlap_area(upper, lower) > eps
}
