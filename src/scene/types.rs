//! Value types shared by the scene core.
//!
//! Contains the geometric primitives (points, obstacles), the edit mode state
//! machine values and the path snapshot reported by the remote optimizer.

use serde::{Deserialize, Serialize};

/// Simple 2D point in field units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Wire representation used by the remote planner (`[x, y]`).
    pub fn to_pair(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Opaque, never reused identifier of an obstacle.
///
/// Ids are handed out by the field from a monotone counter, so ordering ids
/// also orders obstacles by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleId(u64);

impl ObstacleId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obs-{:06}", self.0)
    }
}

/// Circular obstacle. Position is fixed at creation; only the radius changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Obstacle {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Inclusive point-inside-circle test.
    pub fn contains(&self, p: &Point) -> bool {
        let dx = p.x - self.x;
        let dy = p.y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Edit mode of the field. `Idle` is also the obstacle placement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Idle,
    SettingStart,
    SettingEnd,
}

/// What a field click landed on, as decided by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Empty field area.
    Field,
    /// An existing obstacle.
    Obstacle(ObstacleId),
}

/// Diagnostic counters the optimizer attaches to each best solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct SolutionDetails {
    #[serde(default)]
    pub violations: u32,
    #[serde(default)]
    pub collisions: u32,
}

/// One reported state of the remote optimization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathSnapshot {
    /// Ordered path points; empty while no solution exists yet.
    pub path: Vec<Point>,
    pub iteration: u64,
    pub cost: f64,
    pub length: f64,
    pub details: Option<SolutionDetails>,
}

impl PathSnapshot {
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Average segment length, `None` for paths with fewer than two points.
    pub fn average_segment_length(&self) -> Option<f64> {
        if self.path.len() < 2 {
            return None;
        }
        Some(self.length / (self.path.len() - 1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_contains_is_inclusive() {
        let obs = Obstacle {
            id: ObstacleId::from_raw(1),
            x: 100.0,
            y: 100.0,
            radius: 20.0,
        };
        assert!(obs.contains(&Point::new(100.0, 100.0)));
        assert!(obs.contains(&Point::new(120.0, 100.0)));
        assert!(!obs.contains(&Point::new(120.5, 100.0)));
    }

    #[test]
    fn average_segment_length_needs_two_points() {
        let mut snapshot = PathSnapshot {
            path: vec![Point::new(0.0, 0.0)],
            length: 10.0,
            ..Default::default()
        };
        assert_eq!(snapshot.average_segment_length(), None);

        snapshot.path = vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(6.0, 8.0)];
        assert_eq!(snapshot.average_segment_length(), Some(5.0));
    }

    #[test]
    fn obstacle_id_display_is_stable() {
        assert_eq!(ObstacleId::from_raw(42).to_string(), "obs-000042");
    }
}
