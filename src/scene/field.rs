//! Obstacle field state and editing operations.
//!
//! The field owns the obstacle set, the start/goal anchors, the current
//! edit mode and the single selected obstacle. All mutations go through the
//! operations below; constraint violations never fail, they leave the field
//! unchanged and report why through an outcome value.

use std::collections::BTreeMap;

use super::geometry::{self, Violation};
use super::types::{ClickTarget, EditMode, Obstacle, ObstacleId, Point};
use crate::common::FieldConfig;

/// Result of a placement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed(ObstacleId),
    Rejected(PlacementRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementRejection {
    /// Clicks only place obstacles in `EditMode::Idle`.
    ModeBusy(EditMode),
    /// The minimal footprint already breaks a rule.
    Footprint(Violation),
    /// Every attempt of the relaxation search overlapped an existing obstacle.
    Crowded,
}

/// Result of a resize request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    Resized { id: ObstacleId, radius: f64 },
    Rejected(ResizeRejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeRejection {
    NotSelected,
    UnknownObstacle,
    Violation(Violation),
}

/// What a field click ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    StartMoved(Point),
    GoalMoved(Point),
    Selected(ObstacleId),
    Placement(PlacementOutcome),
}

/// The editable scene: obstacles, anchors, mode and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleField {
    config: FieldConfig,
    // Ids come from a monotone counter, so key order is insertion order.
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    start: Point,
    goal: Point,
    mode: EditMode,
    selected: Option<ObstacleId>,
    next_id: u64,
}

impl ObstacleField {
    pub fn new(config: FieldConfig) -> Self {
        let start = config.default_start();
        let goal = config.default_goal();
        Self {
            config,
            obstacles: BTreeMap::new(),
            start,
            goal,
            mode: EditMode::Idle,
            selected: None,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Obstacles in insertion order.
    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    #[cfg(test)]
    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn goal(&self) -> Point {
        self.goal
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn selected(&self) -> Option<ObstacleId> {
        self.selected
    }

    /// Place a new obstacle centered at `(x, y)`.
    ///
    /// The minimal footprint (`min_radius`) must be inside the field and clear
    /// of the anchors, otherwise the request is rejected. The radius then
    /// starts at `min_radius` and grows by `radius_step` (capped at
    /// `max_radius`) for up to `placement_attempts` tries until the circle no
    /// longer overlaps an existing obstacle. If no attempt fits, nothing is
    /// created: crowded regions refuse new obstacles.
    ///
    /// The new obstacle is not selected.
    pub fn place_obstacle(&mut self, x: f64, y: f64) -> PlacementOutcome {
        if self.mode != EditMode::Idle {
            return PlacementOutcome::Rejected(PlacementRejection::ModeBusy(self.mode));
        }

        let min_radius = self.config.min_radius;
        if geometry::out_of_bounds(x, y, min_radius, self.config.grid_size) {
            log::warn!("Position ({:.1}, {:.1}) out of bounds", x, y);
            return PlacementOutcome::Rejected(PlacementRejection::Footprint(Violation::OutOfBounds));
        }
        if geometry::too_close_to_anchors(x, y, min_radius, &self.start, &self.goal, self.config.safe_distance) {
            log::warn!("Position ({:.1}, {:.1}) too close to start/end points", x, y);
            return PlacementOutcome::Rejected(PlacementRejection::Footprint(Violation::NearAnchor));
        }

        let mut radius = min_radius;
        for _ in 0..self.config.placement_attempts {
            // The full rule set is re-evaluated because the radius grows between attempts.
            if geometry::violation(x, y, radius, &self.config, &self.start, &self.goal, self.obstacles.values()).is_none() {
                let id = self.allocate_id();
                self.obstacles.insert(id, Obstacle { id, x, y, radius });
                log::debug!("Placed obstacle {} at ({:.1}, {:.1}) with radius {}", id, x, y, radius);
                return PlacementOutcome::Placed(id);
            }
            radius = (radius + self.config.radius_step).min(self.config.max_radius);
        }

        log::debug!("No room for an obstacle at ({:.1}, {:.1})", x, y);
        PlacementOutcome::Rejected(PlacementRejection::Crowded)
    }

    /// Change the radius of the selected obstacle.
    ///
    /// `new_radius` is clamped to `[min_radius, max_radius]`. The obstacle
    /// keeps its id and position; an illegal radius leaves it untouched.
    pub fn resize_obstacle(&mut self, id: ObstacleId, new_radius: f64) -> ResizeOutcome {
        if self.selected != Some(id) {
            return ResizeOutcome::Rejected(ResizeRejection::NotSelected);
        }
        let Some(current) = self.obstacles.get(&id) else {
            return ResizeOutcome::Rejected(ResizeRejection::UnknownObstacle);
        };

        let radius = self.config.clamp_radius(new_radius);
        let (x, y) = (current.x, current.y);
        let others = self.obstacles.values().filter(|o| o.id != id);
        if let Some(violation) = geometry::violation(x, y, radius, &self.config, &self.start, &self.goal, others) {
            log::warn!("New radius {} for obstacle {} rejected: {}", radius, id, violation);
            return ResizeOutcome::Rejected(ResizeRejection::Violation(violation));
        }

        if let Some(obstacle) = self.obstacles.get_mut(&id) {
            obstacle.radius = radius;
        }
        ResizeOutcome::Resized { id, radius }
    }

    /// Select an obstacle. Last click wins; there is no multi-select.
    pub fn select_obstacle(&mut self, id: ObstacleId) {
        self.selected = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove the selected obstacle and clear the selection.
    pub fn delete_selected(&mut self) -> Option<Obstacle> {
        let id = self.selected.take()?;
        self.obstacles.remove(&id)
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    /// Single entry point for clicks on the field.
    ///
    /// Start/goal modes are one-shot: the click moves the anchor and the mode
    /// returns to `Idle`. In `Idle`, clicks on an obstacle select it and clicks
    /// on empty field try to place a new obstacle.
    pub fn consume_click(&mut self, point: Point, target: ClickTarget) -> ClickOutcome {
        match self.mode {
            EditMode::SettingStart => {
                self.start = point;
                self.mode = EditMode::Idle;
                ClickOutcome::StartMoved(point)
            }
            EditMode::SettingEnd => {
                self.goal = point;
                self.mode = EditMode::Idle;
                ClickOutcome::GoalMoved(point)
            }
            EditMode::Idle => match target {
                ClickTarget::Obstacle(id) => {
                    self.select_obstacle(id);
                    ClickOutcome::Selected(id)
                }
                ClickTarget::Field => ClickOutcome::Placement(self.place_obstacle(point.x, point.y)),
            },
        }
    }

    /// Remove every obstacle and the selection. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.selected = None;
    }

    pub fn reset_anchors(&mut self) {
        self.start = self.config.default_start();
        self.goal = self.config.default_goal();
    }

    fn allocate_id(&mut self) -> ObstacleId {
        let id = ObstacleId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }
}
