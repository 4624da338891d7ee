// UI module for the path planning editor
//
// This module organizes the UI into separate components:
// - `top_panel`: Edit buttons, optimizer parameters and connection state
// - `right_panel`: Obstacle inspector and path statistics
// - `map`: Central field display with obstacles, anchors and the path
// - `app_state`: Application state management and main update loop

pub mod app_state;
pub mod map;
pub mod right_panel;
pub mod top_panel;

use chrono::{DateTime, Utc};

use crate::remote::OptimizationParams;
use crate::scene::{ClickTarget, EditMode, Obstacle, ObstacleField, ObstacleId, PathReconciler, PathSnapshot, Point};

pub use app_state::AppState;

/// Read-only copy of the field, published after every scene change.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    pub grid_size: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Obstacles in insertion order, which is also drawing order.
    pub obstacles: Vec<Obstacle>,
    pub start: Point,
    pub goal: Point,
    pub mode: EditMode,
    pub selected: Option<ObstacleId>,
}

impl SceneView {
    pub fn capture(field: &ObstacleField) -> Self {
        let config = field.config();
        Self {
            grid_size: config.grid_size,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
            obstacles: field.obstacles().cloned().collect(),
            start: field.start(),
            goal: field.goal(),
            mode: field.mode(),
            selected: field.selected(),
        }
    }

    pub fn selected_obstacle(&self) -> Option<&Obstacle> {
        let id = self.selected?;
        self.obstacles.iter().find(|o| o.id == id)
    }
}

/// Read-only copy of the reconciled path plus the last optimizer error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathView {
    pub snapshot: PathSnapshot,
    pub update_count: u64,
    pub discarded_count: u64,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PathView {
    pub fn capture(reconciler: &PathReconciler, last_error: Option<&str>) -> Self {
        Self {
            snapshot: reconciler.current().clone(),
            update_count: reconciler.update_count(),
            discarded_count: reconciler.discarded_count(),
            last_update: reconciler.last_update(),
            last_error: last_error.map(str::to_string),
        }
    }
}

/// Views sent through the refresh queue. Both are full copies, so a dropped
/// one is superseded by the next change.
#[derive(Debug)]
pub enum UIRefreshState {
    SceneUpdated(SceneView),
    PathUpdated(PathView),
}

/// Flags the UI must never miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorStatus {
    /// A start request is in flight.
    pub loading: bool,
    /// The push channel has joined its namespace.
    pub connected: bool,
}

/// Editor task side of the link to the UI.
///
/// Views go through the bounded refresh queue and may be dropped when it is
/// full. Status and alerts go through signals, which keep the latest value
/// until the UI takes it.
#[derive(Clone, Copy)]
pub struct UIOutbox {
    pub refresh_tx: crate::UIRefreshQueueSender,
    pub status: &'static crate::StatusSignal,
    pub alerts: &'static crate::AlertSignal,
}

impl UIOutbox {
    pub fn publish(&self, state: UIRefreshState) {
        if self.refresh_tx.try_send(state).is_err() {
            log::debug!("UI refresh queue full, view dropped");
        }
    }

    pub fn status(&self, status: EditorStatus) {
        self.status.signal(status);
    }

    /// Only the latest unread alert is kept; the UI shows one at a time anyway.
    pub fn alert(&self, message: String) {
        self.alerts.signal(message);
    }
}

/// UI side of the link to the editor task.
pub struct UIInbox {
    pub refresh_rx: crate::UIRefreshQueueReceiver,
    pub status: &'static crate::StatusSignal,
    pub alerts: &'static crate::AlertSignal,
}

#[derive(Debug)]
pub enum UICommand {
    FieldClick { point: Point, target: ClickTarget },
    SetMode(EditMode),
    ClearSelection,
    ResizeSelected(f64),
    DeleteSelected,
    ClearObstacles,
    StartPlanning(OptimizationParams),
    StopPlanning,
    ResetAll,
}
