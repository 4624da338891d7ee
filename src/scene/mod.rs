//! Scene editing core.
//!
//! - `types`: points, obstacles, modes and path snapshots
//! - `geometry`: pure placement predicates
//! - `field`: the editable obstacle field
//! - `reconciler`: best-known path from streamed snapshots
//! - `controller`: field + reconciler + remote optimizer
//! - `task`: the embassy task that owns the controller

pub mod controller;
pub mod field;
pub mod geometry;
pub mod reconciler;
pub mod task;
pub mod types;

pub use field::ObstacleField;
pub use reconciler::PathReconciler;
pub use types::{ClickTarget, EditMode, Obstacle, ObstacleId, PathSnapshot, Point, SolutionDetails};
