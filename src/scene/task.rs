//! Editor task owning the scene controller.
//!
//! Each loop iteration waits for either a UI command or a push channel
//! event and handles it to completion before taking the next one, so the
//! field and the reconciled path are only ever touched from here. After
//! every change the affected view is republished to the UI.

use embassy_futures::select::{Either, select};

use super::controller::{ControllerError, Reception, SceneController};
use super::field::{ClickOutcome, PlacementOutcome, PlacementRejection, ResizeOutcome, ResizeRejection};
use super::reconciler::Acceptance;
use crate::common::EditorConfig;
use crate::remote::{PlannerClient, PushEvent, RemotePlanner, RunStatus};
use crate::ui::{EditorStatus, PathView, SceneView, UICommand, UIOutbox, UIRefreshState};
use crate::{PushQueueReceiver, UICommandQueueReceiver};

#[embassy_executor::task]
pub async fn editor_task(config: EditorConfig, outbox: UIOutbox, ui_command_rx: UICommandQueueReceiver, push_rx: PushQueueReceiver) {
    let planner = match PlannerClient::new(&config.backend) {
        Ok(planner) => planner,
        Err(e) => {
            log::error!("{}", e);
            outbox.alert(e);
            return;
        }
    };

    let mut controller = SceneController::new(config.field, config.planner, planner);
    publish_scene(&controller, &outbox);
    publish_path(&controller, &outbox);
    publish_status(&controller, &outbox, false);

    loop {
        match select(ui_command_rx.receive(), push_rx.receive()).await {
            Either::First(command) => handle_command(&mut controller, command, &outbox),
            Either::Second(event) => handle_push_event(&mut controller, event, &outbox),
        }
    }
}

/// Apply one UI command and republish what it changed.
pub fn handle_command<R: RemotePlanner>(controller: &mut SceneController<R>, command: UICommand, outbox: &UIOutbox) {
    match command {
        UICommand::FieldClick { point, target } => {
            match controller.handle_click(point, target) {
                ClickOutcome::Placement(PlacementOutcome::Rejected(PlacementRejection::Crowded)) => {
                    log::info!("Click at ({:.1}, {:.1}) ignored: no room for a new obstacle", point.x, point.y);
                }
                ClickOutcome::StartMoved(p) => log::info!("Start moved to ({:.1}, {:.1})", p.x, p.y),
                ClickOutcome::GoalMoved(p) => log::info!("End moved to ({:.1}, {:.1})", p.x, p.y),
                _ => {}
            }
            publish_scene(controller, outbox);
        }
        UICommand::SetMode(mode) => {
            controller.set_mode(mode);
            publish_scene(controller, outbox);
        }
        UICommand::ClearSelection => {
            controller.clear_selection();
            publish_scene(controller, outbox);
        }
        UICommand::ResizeSelected(radius) => {
            if let Some(ResizeOutcome::Rejected(ResizeRejection::Violation(violation))) = controller.resize_selected(radius) {
                log::debug!("Resize to {} refused: {}", radius, violation);
            }
            // Always republish so the slider snaps back to the stored radius.
            publish_scene(controller, outbox);
        }
        UICommand::DeleteSelected => {
            if let Some(obstacle) = controller.delete_selected() {
                log::info!("Deleted obstacle {}", obstacle.id);
            }
            publish_scene(controller, outbox);
        }
        UICommand::ClearObstacles => {
            controller.clear_obstacles();
            publish_scene(controller, outbox);
        }
        UICommand::StartPlanning(params) => {
            publish_status(controller, outbox, true);
            match controller.start_planning(params) {
                Ok(RunStatus::Started) => {}
                Ok(RunStatus::NotStarted(token)) => {
                    outbox.alert(format!("Optimizer did not start a run (status \"{}\")", token));
                }
                Err(ControllerError::NotConnected) => {
                    outbox.alert("Not connected to the optimizer, please wait for the connection".to_string());
                }
                Err(ControllerError::Remote(e)) => {
                    log::error!("Error calculating path: {}", e);
                    outbox.alert(format!("Error calculating path: {}", e));
                }
            }
            publish_status(controller, outbox, false);
            publish_path(controller, outbox);
        }
        UICommand::StopPlanning => {
            if let Err(e) = controller.stop_planning() {
                log::error!("Error stopping optimization: {}", e);
                outbox.alert(format!("Error stopping optimization: {}", e));
            }
        }
        UICommand::ResetAll => {
            // A failed stop is already logged by the controller; the reset itself always completes.
            let _ = controller.reset();
            publish_status(controller, outbox, false);
            publish_scene(controller, outbox);
            publish_path(controller, outbox);
        }
    }
}

/// Apply one push channel event and republish what it changed.
pub fn handle_push_event<R: RemotePlanner>(controller: &mut SceneController<R>, event: PushEvent, outbox: &UIOutbox) {
    match event {
        PushEvent::Connected => {
            controller.set_connected(true);
            publish_status(controller, outbox, false);
        }
        PushEvent::Disconnected(reason) => {
            log::warn!("Optimizer update channel lost: {}", reason);
            controller.set_connected(false);
            publish_status(controller, outbox, false);
        }
        PushEvent::Message(message) => match controller.receive(message) {
            Reception::Path(Acceptance::Accepted) | Reception::ErrorReported => publish_path(controller, outbox),
            Reception::Path(Acceptance::Stale { .. }) | Reception::StatusNoted => {}
        },
    }
}

fn publish_scene<R: RemotePlanner>(controller: &SceneController<R>, outbox: &UIOutbox) {
    outbox.publish(UIRefreshState::SceneUpdated(SceneView::capture(controller.field())));
}

fn publish_path<R: RemotePlanner>(controller: &SceneController<R>, outbox: &UIOutbox) {
    outbox.publish(UIRefreshState::PathUpdated(PathView::capture(controller.reconciler(), controller.last_error())));
}

/// Commands run to completion, so `loading` is only ever true inside `StartPlanning`.
fn publish_status<R: RemotePlanner>(controller: &SceneController<R>, outbox: &UIOutbox, loading: bool) {
    outbox.status(EditorStatus {
        loading,
        connected: controller.is_connected(),
    });
}
