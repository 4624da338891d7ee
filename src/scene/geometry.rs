//! Placement rules for circular obstacles.
//!
//! Contains pure predicates over circles and points:
//! - Overlap test against existing obstacles (with an edge-to-edge margin)
//! - Clearance test against the start/goal anchors
//! - Containment test against the square field bounds
//!
//! A placement or resize is legal iff none of the predicates hold.

use super::types::{Obstacle, Point};
use crate::common::FieldConfig;

/// Reason a circle cannot be placed where it was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The circle extends beyond the field.
    OutOfBounds,
    /// The circle is closer than the safe distance to the start or goal.
    NearAnchor,
    /// The circle overlaps another obstacle (margin included).
    Overlap,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::OutOfBounds => write!(f, "out of bounds"),
            Violation::NearAnchor => write!(f, "too close to start/end points"),
            Violation::Overlap => write!(f, "overlaps an existing obstacle"),
        }
    }
}

/// Check whether a circle overlaps any of the given obstacles.
///
/// Two circles overlap when their center distance is strictly less than
/// the sum of their radii plus `margin`. No tolerance beyond the margin.
///
/// # Parameters
///
/// * `x`, `y`, `r` - Candidate circle
/// * `obstacles` - Obstacles to test against (callers exclude the circle itself)
/// * `margin` - Required gap between the two edges
pub fn overlaps<'a>(x: f64, y: f64, r: f64, obstacles: impl IntoIterator<Item = &'a Obstacle>, margin: f64) -> bool {
    let center = Point::new(x, y);
    obstacles.into_iter().any(|obs| center.distance(&obs.center()) < r + obs.radius + margin)
}

/// Check whether a circle comes closer than `safe_distance` to the start or goal.
pub fn too_close_to_anchors(x: f64, y: f64, r: f64, start: &Point, goal: &Point, safe_distance: f64) -> bool {
    let center = Point::new(x, y);
    center.distance(start) < safe_distance + r || center.distance(goal) < safe_distance + r
}

/// Check whether a circle extends beyond `[0, grid_size]` on either axis.
pub fn out_of_bounds(x: f64, y: f64, r: f64, grid_size: f64) -> bool {
    x - r < 0.0 || x + r > grid_size || y - r < 0.0 || y + r > grid_size
}

/// Evaluate all three rules for a circle, cheapest first.
///
/// # Returns
///
/// The first violated rule (bounds, then anchors, then overlap), or `None`
/// if the circle may be placed.
pub fn violation<'a>(
    x: f64,
    y: f64,
    r: f64,
    config: &FieldConfig,
    start: &Point,
    goal: &Point,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
) -> Option<Violation> {
    if out_of_bounds(x, y, r, config.grid_size) {
        return Some(Violation::OutOfBounds);
    }
    if too_close_to_anchors(x, y, r, start, goal, config.safe_distance) {
        return Some(Violation::NearAnchor);
    }
    if overlaps(x, y, r, obstacles, config.overlap_margin) {
        return Some(Violation::Overlap);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::types::ObstacleId;

    fn obs(raw: u64, x: f64, y: f64, radius: f64) -> Obstacle {
        Obstacle {
            id: ObstacleId::from_raw(raw),
            x,
            y,
            radius,
        }
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn overlap_uses_strict_margin_comparison() {
        let existing = vec![obs(1, 100.0, 100.0, 20.0)];
        // 20 + 20 + 10 = 50 is the minimum legal center distance
        assert!(!overlaps(150.0, 100.0, 20.0, &existing, 10.0));
        assert!(overlaps(149.9, 100.0, 20.0, &existing, 10.0));
        assert!(!overlaps(300.0, 300.0, 100.0, std::iter::empty(), 10.0));
    }

    #[test]
    fn anchor_clearance_checks_both_points() {
        let start = p(50.0, 300.0);
        let goal = p(550.0, 300.0);
        assert!(too_close_to_anchors(99.0, 300.0, 20.0, &start, &goal, 30.0));
        assert!(!too_close_to_anchors(100.0, 300.0, 20.0, &start, &goal, 30.0));
        assert!(too_close_to_anchors(501.0, 300.0, 20.0, &start, &goal, 30.0));
    }

    #[test]
    fn bounds_allow_touching_edges() {
        assert!(!out_of_bounds(20.0, 20.0, 20.0, 600.0));
        assert!(!out_of_bounds(580.0, 580.0, 20.0, 600.0));
        assert!(out_of_bounds(19.0, 300.0, 20.0, 600.0));
        assert!(out_of_bounds(300.0, 581.0, 20.0, 600.0));
    }

    #[test]
    fn violation_reports_bounds_before_anchor_and_overlap() {
        let config = FieldConfig::default();
        let start = config.default_start();
        let goal = config.default_goal();
        let existing = vec![obs(1, 200.0, 200.0, 20.0)];

        assert_eq!(violation(10.0, 300.0, 20.0, &config, &start, &goal, &existing), Some(Violation::OutOfBounds));
        assert_eq!(violation(80.0, 300.0, 20.0, &config, &start, &goal, &existing), Some(Violation::NearAnchor));
        assert_eq!(violation(230.0, 200.0, 20.0, &config, &start, &goal, &existing), Some(Violation::Overlap));
        assert_eq!(violation(300.0, 100.0, 20.0, &config, &start, &goal, &existing), None);
    }
}
