//! # Application State Management
//!
//! This module implements the central `AppState` struct which holds the UI's
//! copy of the editor state and coordinates the rendering of all panels. It
//! implements the `eframe::App` trait to integrate with the egui application
//! framework.
//!
//! ## Responsibilities
//!
//! - Holds the latest `SceneView` and `PathView` published by the editor task
//! - Processes incoming views, status and alerts via its `UIInbox`
//! - Sends user intents to the editor task via `ui_command_tx`
//! - Owns the optimizer parameter inputs until a run is requested
//! - Persists the parameter inputs and panel width across sessions
//!
//! The UI never edits scene state itself: every change goes out as a
//! `UICommand` and comes back as a refreshed view.

use eframe::egui;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::{EditorStatus, PathView, SceneView, UICommand, UIInbox, UIRefreshState};
use crate::common::EditorConfig;
use crate::remote::OptimizationParams;

/// How long a freshly accepted path stays emphasized on the map.
pub const PATH_FLASH_DURATION: Duration = Duration::from_millis(300);

/// Central application state for the editor window.
pub struct AppState {
    /// Optional alert message to display in a modal dialog.
    pub alert: Option<String>,
    /// Views, status and alerts coming from the editor task.
    pub inbox: UIInbox,
    /// Sender for commands from the UI to the editor task.
    pub ui_command_tx: crate::UICommandQueueSender,

    /// Latest field state, `None` until the editor task publishes it.
    pub scene: Option<SceneView>,
    /// Latest reconciled path.
    pub path: PathView,
    /// The path is drawn emphasized until this moment after it changes.
    pub path_flash_until: Option<Instant>,
    /// Optimizer parameters as edited in the top panel.
    pub params: OptimizationParams,
    /// Whether a start request is in flight.
    pub loading: bool,
    /// Whether the push channel is connected.
    pub connected: bool,
    /// Radius shown on the inspector slider; re-synced whenever the scene changes.
    pub radius_input: f64,

    /// Width of the right inspector panel in pixels.
    pub right_panel_width: f32,
    /// Whether to label obstacles with their ids on the map.
    pub show_obstacle_ids: bool,
}

/// Settings persisted across application sessions.
#[derive(Default, Serialize, Deserialize)]
struct PersistedSettings {
    max_iter: Option<u32>,
    pop_size: Option<u32>,
    num_control_points: Option<u32>,
    right_panel_width: Option<f32>,
    show_obstacle_ids: Option<bool>,
}

impl AppState {
    /// Create a new AppState, loading persisted settings if available.
    ///
    /// # Parameters
    ///
    /// * `inbox` - Views, status and alerts from the editor task
    /// * `tx` - Sender for commands to the editor task
    /// * `config` - Editor configuration providing the default parameters
    /// * `storage` - Optional persistent storage for loading saved settings
    pub fn new(inbox: UIInbox, tx: crate::UICommandQueueSender, config: &EditorConfig, storage: Option<&dyn eframe::Storage>) -> Self {
        let persisted: PersistedSettings = storage.and_then(|s| eframe::get_value(s, "app_settings")).unwrap_or_default();

        let params = OptimizationParams {
            max_iter: persisted.max_iter.unwrap_or(config.planner.max_iter),
            pop_size: persisted.pop_size.unwrap_or(config.planner.pop_size),
            num_control_points: persisted.num_control_points.unwrap_or(config.planner.num_control_points),
        }
        .clamped();

        Self {
            alert: None,
            inbox,
            ui_command_tx: tx,
            scene: None,
            path: PathView::default(),
            path_flash_until: None,
            params,
            loading: false,
            connected: false,
            radius_input: config.field.min_radius,
            right_panel_width: persisted.right_panel_width.unwrap_or(360.0),
            show_obstacle_ids: persisted.show_obstacle_ids.unwrap_or(false),
        }
    }

    /// Queue a command for the editor task. A full queue drops the command.
    pub fn send(&self, command: UICommand) {
        if let Err(e) = self.ui_command_tx.try_send(command) {
            log::warn!("UI command queue full, dropping {:?}", e);
        }
    }

    /// Take everything the editor task published since the last frame.
    fn poll(&mut self) {
        while let Ok(msg) = self.inbox.refresh_rx.try_receive() {
            self.apply(msg);
        }
        if let Some(status) = self.inbox.status.try_take() {
            self.apply_status(status);
        }
        if let Some(alert_msg) = self.inbox.alerts.try_take() {
            self.alert = Some(alert_msg);
        }
    }

    fn apply_status(&mut self, status: EditorStatus) {
        self.loading = status.loading;
        self.connected = status.connected;
    }

    fn apply(&mut self, msg: UIRefreshState) {
        match msg {
            UIRefreshState::SceneUpdated(scene) => {
                if let Some(obstacle) = scene.selected_obstacle() {
                    self.radius_input = obstacle.radius;
                }
                self.scene = Some(scene);
            }
            UIRefreshState::PathUpdated(path) => {
                if !path.snapshot.is_empty() && path.update_count != self.path.update_count {
                    self.path_flash_until = Some(Instant::now() + PATH_FLASH_DURATION);
                }
                self.path = path;
            }
        }
    }
}

impl eframe::App for AppState {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            max_iter: Some(self.params.max_iter),
            pop_size: Some(self.params.pop_size),
            num_control_points: Some(self.params.num_control_points),
            right_panel_width: Some(self.right_panel_width),
            show_obstacle_ids: Some(self.show_obstacle_ids),
        };
        eframe::set_value(storage, "app_settings", &settings);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Repaint periodically so pushed path updates are visible without input
        ctx.request_repaint_after(Duration::from_millis(20));

        self.poll();

        if let Some(alert) = self.alert.clone() {
            egui::Window::new("Alert")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(alert);
                        ui.add_space(20.0);

                        if ui.button("OK").clicked() {
                            self.alert = None;
                        }
                        ui.add_space(10.0);
                    });
                });
        }

        // Panels layout: top (fixed), right (resizable), field fills the remaining using CentralPanel
        super::top_panel::render(ctx, self);
        super::right_panel::render(ctx, self);
        super::map::render(ctx, self);
    }
}
