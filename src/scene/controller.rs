//! Composition of the field, the reconciler and the remote optimizer.
//!
//! The controller is the only entry point the editor task uses. It turns
//! user intents into field operations, builds the optimizer requests from
//! the current scene, and routes pushed messages into the reconciler.

use super::field::{ClickOutcome, ObstacleField, ResizeOutcome};
use super::reconciler::{Acceptance, PathReconciler};
use super::types::{ClickTarget, EditMode, Obstacle, Point};
use crate::common::{FieldConfig, PlannerConfig};
use crate::remote::{InitEnvironmentRequest, OptimizationParams, PushMessage, RemoteError, RemotePlanner, RunStatus};

/// Failure of a controller operation that involves the optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The push channel is down; nothing was sent and nothing changed.
    NotConnected,
    Remote(RemoteError),
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerError::NotConnected => write!(f, "Not connected to the optimizer update channel"),
            ControllerError::Remote(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<RemoteError> for ControllerError {
    fn from(e: RemoteError) -> Self {
        ControllerError::Remote(e)
    }
}

/// Effect of a pushed message on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    Path(Acceptance),
    ErrorReported,
    StatusNoted,
}

pub struct SceneController<R: RemotePlanner> {
    field: ObstacleField,
    reconciler: PathReconciler,
    planner: R,
    planner_config: PlannerConfig,
    connected: bool,
    last_error: Option<String>,
}

impl<R: RemotePlanner> SceneController<R> {
    pub fn new(field_config: FieldConfig, planner_config: PlannerConfig, planner: R) -> Self {
        Self {
            field: ObstacleField::new(field_config),
            reconciler: PathReconciler::new(),
            planner,
            planner_config,
            connected: false,
            last_error: None,
        }
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn reconciler(&self) -> &PathReconciler {
        &self.reconciler
    }

    #[cfg(test)]
    pub fn planner(&self) -> &R {
        &self.planner
    }

    /// Last error reported by the optimizer during a run.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn handle_click(&mut self, point: Point, target: ClickTarget) -> ClickOutcome {
        self.field.consume_click(point, target)
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.field.set_mode(mode);
    }

    pub fn clear_selection(&mut self) {
        self.field.clear_selection();
    }

    /// Resize whatever is selected; `None` when nothing is.
    pub fn resize_selected(&mut self, radius: f64) -> Option<ResizeOutcome> {
        let id = self.field.selected()?;
        Some(self.field.resize_obstacle(id, radius))
    }

    pub fn delete_selected(&mut self) -> Option<Obstacle> {
        self.field.delete_selected()
    }

    pub fn clear_obstacles(&mut self) {
        self.field.clear();
    }

    /// Describe the current scene to the optimizer and start a run.
    ///
    /// Fails fast with `NotConnected` when the update channel is down, in
    /// which case no request is sent and no state changes. The run request
    /// is only sent once the environment was accepted.
    ///
    /// A started run begins from an empty path, so its snapshots replace the
    /// previous run's result even when they carry lower iterations. A failed
    /// request leaves the path and the last optimizer error untouched.
    pub fn start_planning(&mut self, params: OptimizationParams) -> Result<RunStatus, ControllerError> {
        if !self.connected {
            log::error!("Not connected to the optimizer update channel");
            return Err(ControllerError::NotConnected);
        }

        let environment = InitEnvironmentRequest::new(
            self.field.config().grid_size,
            self.planner_config.robot_radius,
            self.field.start(),
            self.field.goal(),
            self.field.obstacles(),
        );
        self.planner.init_environment(&environment)?;

        let status = self.planner.run_optimization(&params.into_request(self.planner_config.resolution))?;
        self.last_error = None;
        match &status {
            RunStatus::Started => {
                self.reconciler.clear();
                log::info!("Path optimization started");
            }
            RunStatus::NotStarted(token) => log::warn!("Optimizer did not start a run (status {:?})", token),
        }
        Ok(status)
    }

    /// Ask the optimizer to stop. Snapshots arriving afterwards are still accepted.
    pub fn stop_planning(&mut self) -> Result<(), ControllerError> {
        self.planner.stop_optimization()?;
        Ok(())
    }

    /// Stop the optimizer and return every piece of local state to its initial value.
    ///
    /// The local resets always happen, in order: path, obstacles, anchors.
    /// A failed stop request is logged and returned for reporting only.
    pub fn reset(&mut self) -> Result<(), RemoteError> {
        let stopped = self.planner.stop_optimization();
        if let Err(e) = &stopped {
            log::warn!("Stop request failed during reset: {}", e);
        }

        self.reconciler.clear();
        self.field.clear();
        self.field.reset_anchors();
        self.field.set_mode(EditMode::Idle);
        self.last_error = None;
        log::info!("Complete reset performed");
        stopped
    }

    /// Route a message pushed by the optimizer.
    pub fn receive(&mut self, message: PushMessage) -> Reception {
        match message {
            PushMessage::PathUpdate(snapshot) => Reception::Path(self.reconciler.accept(snapshot)),
            PushMessage::OptimizationError(message) => {
                log::error!("Optimization error: {}", message);
                self.last_error = Some(message);
                Reception::ErrorReported
            }
            PushMessage::ConnectionStatus(status) => {
                log::info!("Optimizer connection status: {}", status);
                Reception::StatusNoted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RunOptimizationRequest;
    use crate::scene::field::PlacementOutcome;
    use crate::scene::types::{ObstacleId, PathSnapshot};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init(InitEnvironmentRequest),
        Run(RunOptimizationRequest),
        Stop,
    }

    #[derive(Default)]
    struct RecordingPlanner {
        calls: RefCell<Vec<Call>>,
        fail_init: bool,
        fail_stop: bool,
        run_token: Option<String>,
    }

    impl RemotePlanner for RecordingPlanner {
        fn init_environment(&self, request: &InitEnvironmentRequest) -> Result<(), RemoteError> {
            self.calls.borrow_mut().push(Call::Init(request.clone()));
            if self.fail_init {
                return Err(RemoteError::Network("connection refused".to_string()));
            }
            Ok(())
        }

        fn run_optimization(&self, request: &RunOptimizationRequest) -> Result<RunStatus, RemoteError> {
            self.calls.borrow_mut().push(Call::Run(request.clone()));
            let token = self.run_token.clone().unwrap_or_else(|| "optimization_started".to_string());
            Ok(RunStatus::from_token(&token))
        }

        fn stop_optimization(&self) -> Result<(), RemoteError> {
            self.calls.borrow_mut().push(Call::Stop);
            if self.fail_stop {
                return Err(RemoteError::Rejected {
                    status: 500,
                    body: "stop failed".to_string(),
                });
            }
            Ok(())
        }
    }

    fn controller(planner: RecordingPlanner) -> SceneController<RecordingPlanner> {
        SceneController::new(FieldConfig::default(), PlannerConfig::default(), planner)
    }

    fn snap(iteration: u64, path: &[(f64, f64)]) -> PathSnapshot {
        PathSnapshot {
            path: path.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            iteration,
            ..Default::default()
        }
    }

    fn populate(controller: &mut SceneController<RecordingPlanner>) -> ObstacleId {
        let outcome = controller.handle_click(Point::new(300.0, 300.0), ClickTarget::Field);
        let ClickOutcome::Placement(PlacementOutcome::Placed(id)) = outcome else {
            panic!("expected placement, got {:?}", outcome);
        };
        controller.handle_click(Point::new(300.0, 300.0), ClickTarget::Obstacle(id));
        controller.set_mode(EditMode::SettingStart);
        controller.handle_click(Point::new(20.0, 20.0), ClickTarget::Field);
        controller.receive(PushMessage::PathUpdate(snap(4, &[(1.0, 1.0)])));
        id
    }

    #[test]
    fn start_planning_without_connection_fails_fast() {
        let mut controller = controller(RecordingPlanner::default());
        populate(&mut controller);
        let field_before = controller.field().clone();

        assert_eq!(controller.start_planning(OptimizationParams::default()), Err(ControllerError::NotConnected));
        assert!(controller.planner().calls.borrow().is_empty());
        assert_eq!(controller.field(), &field_before);
        assert_eq!(controller.reconciler().current().iteration, 4);
    }

    #[test]
    fn start_planning_sends_scene_then_run() {
        let mut controller = controller(RecordingPlanner::default());
        populate(&mut controller);
        controller.set_connected(true);

        let params = OptimizationParams {
            max_iter: 250,
            pop_size: 40,
            num_control_points: 3,
        };
        assert_eq!(controller.start_planning(params), Ok(RunStatus::Started));

        let calls = controller.planner().calls.borrow();
        assert_eq!(calls.len(), 2);
        let Call::Init(init) = &calls[0] else {
            panic!("expected init first, got {:?}", calls[0]);
        };
        assert_eq!(init.width, 600.0);
        assert_eq!(init.robot_radius, 10.0);
        assert_eq!(init.start, [20.0, 20.0]);
        assert_eq!(init.goal, [550.0, 300.0]);
        assert_eq!(init.obstacles.len(), 1);
        assert_eq!(init.obstacles[0].center, [300.0, 300.0]);
        assert_eq!(
            calls[1],
            Call::Run(RunOptimizationRequest {
                max_iter: 250,
                pop_size: 40,
                num_control_points: 3,
                resolution: 50,
            })
        );
    }

    #[test]
    fn failed_init_skips_run() {
        let mut controller = controller(RecordingPlanner {
            fail_init: true,
            ..Default::default()
        });
        controller.set_connected(true);
        let result = controller.start_planning(OptimizationParams::default());
        assert!(matches!(result, Err(ControllerError::Remote(RemoteError::Network(_)))));
        assert_eq!(controller.planner().calls.borrow().len(), 1);
    }

    #[test]
    fn failed_init_keeps_path_and_reported_error() {
        let mut controller = controller(RecordingPlanner {
            fail_init: true,
            ..Default::default()
        });
        populate(&mut controller);
        controller.receive(PushMessage::OptimizationError("diverged".to_string()));
        controller.set_connected(true);

        assert!(controller.start_planning(OptimizationParams::default()).is_err());
        assert_eq!(controller.last_error(), Some("diverged"));
        assert_eq!(controller.reconciler().current().iteration, 4);
    }

    #[test]
    fn rerun_replaces_the_finished_path() {
        let mut controller = controller(RecordingPlanner::default());
        controller.set_connected(true);
        assert_eq!(controller.start_planning(OptimizationParams::default()), Ok(RunStatus::Started));
        for iteration in 0..=100 {
            controller.receive(PushMessage::PathUpdate(snap(iteration, &[(1.0, 1.0), (2.0, 2.0)])));
        }
        controller.receive(PushMessage::OptimizationError("late warning".to_string()));
        assert_eq!(controller.reconciler().current().iteration, 100);

        controller.handle_click(Point::new(300.0, 300.0), ClickTarget::Field);
        assert_eq!(controller.start_planning(OptimizationParams::default()), Ok(RunStatus::Started));
        assert!(controller.reconciler().current().is_empty());
        assert_eq!(controller.reconciler().update_count(), 0);
        assert_eq!(controller.last_error(), None);

        let mut accepted = 0;
        for iteration in 0..=100 {
            let reception = controller.receive(PushMessage::PathUpdate(snap(iteration, &[(5.0, 5.0), (6.0, 6.0)])));
            if reception == Reception::Path(Acceptance::Accepted) {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 101);
        assert_eq!(controller.reconciler().current().path, vec![Point::new(5.0, 5.0), Point::new(6.0, 6.0)]);
    }

    #[test]
    fn refused_run_keeps_the_current_path() {
        let mut controller = controller(RecordingPlanner {
            run_token: Some("busy".to_string()),
            ..Default::default()
        });
        populate(&mut controller);
        controller.set_connected(true);
        assert!(matches!(controller.start_planning(OptimizationParams::default()), Ok(RunStatus::NotStarted(_))));
        assert_eq!(controller.reconciler().current().iteration, 4);
    }

    #[test]
    fn unexpected_status_is_not_started_but_not_an_error() {
        let mut controller = controller(RecordingPlanner {
            run_token: Some("busy".to_string()),
            ..Default::default()
        });
        controller.set_connected(true);
        assert_eq!(controller.start_planning(OptimizationParams::default()), Ok(RunStatus::NotStarted("busy".to_string())));
    }

    #[test]
    fn reset_restores_everything_even_when_stop_fails() {
        for fail_stop in [false, true] {
            let mut controller = controller(RecordingPlanner {
                fail_stop,
                ..Default::default()
            });
            populate(&mut controller);
            controller.set_mode(EditMode::SettingEnd);
            controller.receive(PushMessage::OptimizationError("diverged".to_string()));

            let result = controller.reset();
            assert_eq!(result.is_err(), fail_stop);
            assert_eq!(controller.planner().calls.borrow().as_slice(), &[Call::Stop]);

            let field = controller.field();
            assert!(field.is_empty());
            assert_eq!(field.selected(), None);
            assert_eq!(field.start(), Point::new(50.0, 300.0));
            assert_eq!(field.goal(), Point::new(550.0, 300.0));
            assert_eq!(field.mode(), EditMode::Idle);
            assert_eq!(controller.reconciler().current(), &PathSnapshot::default());
            assert_eq!(controller.reconciler().update_count(), 0);
            assert_eq!(controller.last_error(), None);
        }
    }

    #[test]
    fn snapshots_after_stop_are_still_accepted() {
        let mut controller = controller(RecordingPlanner::default());
        controller.receive(PushMessage::PathUpdate(snap(1, &[(1.0, 1.0)])));
        controller.stop_planning().unwrap();
        assert_eq!(
            controller.receive(PushMessage::PathUpdate(snap(2, &[(2.0, 2.0)]))),
            Reception::Path(Acceptance::Accepted)
        );
        assert_eq!(
            controller.receive(PushMessage::PathUpdate(snap(2, &[(3.0, 3.0)]))),
            Reception::Path(Acceptance::Stale { current: 2, offered: 2 })
        );
    }

    #[test]
    fn optimization_error_leaves_scene_and_path_alone() {
        let mut controller = controller(RecordingPlanner::default());
        populate(&mut controller);
        let field_before = controller.field().clone();
        let path_before = controller.reconciler().state().clone();

        assert_eq!(controller.receive(PushMessage::OptimizationError("diverged".to_string())), Reception::ErrorReported);
        assert_eq!(controller.last_error(), Some("diverged"));
        assert_eq!(controller.field(), &field_before);
        assert_eq!(controller.reconciler().state(), &path_before);
    }

    #[test]
    fn resize_selected_targets_current_selection() {
        let mut controller = controller(RecordingPlanner::default());
        assert_eq!(controller.resize_selected(50.0), None);
        let id = populate(&mut controller);
        assert_eq!(controller.resize_selected(50.0), Some(ResizeOutcome::Resized { id, radius: 50.0 }));
        controller.clear_selection();
        assert_eq!(controller.resize_selected(60.0), None);
        assert_eq!(controller.field().obstacle(id).unwrap().radius, 50.0);
    }
}
