//! Request and response bodies of the optimizer HTTP API.

use serde::{Deserialize, Serialize};

use crate::scene::{Obstacle, Point};

/// Status token the optimizer answers with when a run was launched.
pub const OPTIMIZATION_STARTED: &str = "optimization_started";

/// Obstacle as transmitted to the optimizer. The editor's id is not sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleDescriptor {
    pub center: [f64; 2],
    pub radius: f64,
}

impl From<&Obstacle> for ObstacleDescriptor {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            center: [obstacle.x, obstacle.y],
            radius: obstacle.radius,
        }
    }
}

/// Body of `POST /api/init-environment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitEnvironmentRequest {
    pub width: f64,
    pub height: f64,
    pub robot_radius: f64,
    pub start: [f64; 2],
    pub goal: [f64; 2],
    pub obstacles: Vec<ObstacleDescriptor>,
}

impl InitEnvironmentRequest {
    pub fn new<'a>(grid_size: f64, robot_radius: f64, start: Point, goal: Point, obstacles: impl IntoIterator<Item = &'a Obstacle>) -> Self {
        Self {
            width: grid_size,
            height: grid_size,
            robot_radius,
            start: start.to_pair(),
            goal: goal.to_pair(),
            obstacles: obstacles.into_iter().map(ObstacleDescriptor::from).collect(),
        }
    }
}

/// Body of `POST /api/run-pso`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptimizationRequest {
    pub max_iter: u32,
    pub pop_size: u32,
    pub num_control_points: u32,
    pub resolution: u32,
}

/// Response body of `POST /api/run-pso`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunOptimizationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// How the optimizer answered a run request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Started,
    /// Any status token other than `optimization_started`.
    NotStarted(String),
}

impl RunStatus {
    pub fn from_token(token: &str) -> Self {
        if token == OPTIMIZATION_STARTED {
            RunStatus::Started
        } else {
            RunStatus::NotStarted(token.to_string())
        }
    }
}

/// User-tunable optimizer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationParams {
    pub max_iter: u32,
    pub pop_size: u32,
    pub num_control_points: u32,
}

impl OptimizationParams {
    pub const MAX_ITER_RANGE: std::ops::RangeInclusive<u32> = 100..=5000;
    pub const POP_SIZE_RANGE: std::ops::RangeInclusive<u32> = 10..=500;
    pub const CONTROL_POINTS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

    /// Copy with every value forced into its allowed range.
    pub fn clamped(self) -> Self {
        Self {
            max_iter: self.max_iter.clamp(*Self::MAX_ITER_RANGE.start(), *Self::MAX_ITER_RANGE.end()),
            pop_size: self.pop_size.clamp(*Self::POP_SIZE_RANGE.start(), *Self::POP_SIZE_RANGE.end()),
            num_control_points: self
                .num_control_points
                .clamp(*Self::CONTROL_POINTS_RANGE.start(), *Self::CONTROL_POINTS_RANGE.end()),
        }
    }

    pub fn into_request(self, resolution: u32) -> RunOptimizationRequest {
        let params = self.clamped();
        RunOptimizationRequest {
            max_iter: params.max_iter,
            pop_size: params.pop_size,
            num_control_points: params.num_control_points,
            resolution,
        }
    }
}

impl Default for OptimizationParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            pop_size: 100,
            num_control_points: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ObstacleId;

    #[test]
    fn init_request_uses_wire_names_and_drops_ids() {
        let obstacles = vec![Obstacle {
            id: ObstacleId::from_raw(7),
            x: 200.0,
            y: 150.0,
            radius: 30.0,
        }];
        let request = InitEnvironmentRequest::new(600.0, 10.0, Point::new(50.0, 300.0), Point::new(550.0, 300.0), &obstacles);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "width": 600.0,
                "height": 600.0,
                "robotRadius": 10.0,
                "start": [50.0, 300.0],
                "goal": [550.0, 300.0],
                "obstacles": [{"center": [200.0, 150.0], "radius": 30.0}],
            })
        );
    }

    #[test]
    fn run_request_is_clamped_and_camel_cased() {
        let params = OptimizationParams {
            max_iter: 10,
            pop_size: 1000,
            num_control_points: 0,
        };
        let json = serde_json::to_value(params.into_request(50)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"maxIter": 100, "popSize": 500, "numControlPoints": 1, "resolution": 50})
        );
    }

    #[test]
    fn only_started_token_counts_as_started() {
        assert_eq!(RunStatus::from_token("optimization_started"), RunStatus::Started);
        assert_eq!(RunStatus::from_token("error"), RunStatus::NotStarted("error".to_string()));
        assert_eq!(RunStatus::from_token(""), RunStatus::NotStarted(String::new()));
    }
}
