//! Candidate placement positions ("anchors", extreme points).
//!
//! The set starts at the container origin. Each successful placement
//! contributes up to three new anchors at the placed box's +x, +y, +z
//! corners, filtered against container bounds and against points strictly
//! inside existing placements. Iteration order is ascending (y, x, z) —
//! lower first, matching gravity — and is fully deterministic.

use std::cmp::Ordering;

use crate::geometry::Aabb;

/// Ordered anchor set.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    anchors: Vec<(f64, f64, f64)>,
    eps: f64,
}

impl AnchorSet {
    /// Seeded with the container origin.
    pub fn new(eps: f64) -> Self {
        Self {
            anchors: vec![(0.0, 0.0, 0.0)],
            eps,
        }
    }

    /// Anchors in (y, x, z) ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.anchors.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Register a placement: drop anchors the new box swallows, add the
    /// three corner anchors, restore ordering.
    pub fn on_placement(
        &mut self,
        placed: &Aabb,
        container_length: f64,
        container_width: f64,
        container_height: f64,
        existing: &[Aabb],
    ) {
        let eps = self.eps;
        self.anchors
            .retain(|&(x, y, z)| !point_strictly_inside(x, y, z, placed, eps));

        let candidates = [
            (placed.x_max(), placed.y, placed.z),
            (placed.x, placed.y_max(), placed.z),
            (placed.x, placed.y, placed.z_max()),
        ];
        for (x, y, z) in candidates {
            if x >= container_length - eps
                || y >= container_height - eps
                || z >= container_width - eps
            {
                continue;
            }
            if existing
                .iter()
                .any(|b| point_strictly_inside(x, y, z, b, eps))
            {
                continue;
            }
            if self
                .anchors
                .iter()
                .any(|&(ax, ay, az)| close(ax, x, eps) && close(ay, y, eps) && close(az, z, eps))
            {
                continue;
            }
            self.anchors.push((x, y, z));
        }

        self.anchors.sort_by(compare_anchors);
    }
}

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

fn point_strictly_inside(x: f64, y: f64, z: f64, b: &Aabb, eps: f64) -> bool {
    x > b.x + eps
        && x < b.x_max() - eps
        && y > b.y + eps
        && y < b.y_max() - eps
        && z > b.z + eps
        && z < b.z_max() - eps
}

fn compare_anchors(a: &(f64, f64, f64), b: &(f64, f64, f64)) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal))
        .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
}
