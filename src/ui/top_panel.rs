//! # Top Panel - Edit Controls and Optimizer Parameters
//!
//! This module renders the fixed-height top panel displaying:
//! - Column 1: Edit buttons (Set Start, Set End, Clear Obstacles, Reset All)
//! - Column 2: Optimizer parameters (max iterations, population, control points)
//! - Column 3: Run controls and connection state
//!
//! Buttons only send commands; the resulting state comes back from the
//! editor task on the next refresh.

use crate::remote::OptimizationParams;
use crate::scene::EditMode;
use crate::ui::{AppState, UICommand};
use eframe::egui;
use egui::Color32;

/// Render the top panel with edit and run controls.
///
/// # Parameters
///
/// * `ctx` - egui context
/// * `state` - Mutable application state for reading flags and editing parameters
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("top_controls").exact_height(130.0).show(ctx, |ui| {
        ui.columns(3, |cols| {
            cols[0].vertical(|ui| {
                render_edit_controls(ui, state);
            });

            cols[1].vertical(|ui| {
                render_parameters(ui, state);
            });

            cols[2].vertical(|ui| {
                render_run_controls(ui, state);
            });
        });
    });
}

fn render_edit_controls(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("UAV Path Planning");
    ui.separator();

    let mode = state.scene.as_ref().map(|s| s.mode).unwrap_or_default();
    ui.horizontal(|ui| {
        let start_button = egui::Button::new(egui::RichText::new("Set Start").color(Color32::WHITE))
            .fill(Color32::from_rgb(34, 160, 70))
            .selected(mode == EditMode::SettingStart);
        if ui.add(start_button).clicked() {
            state.send(UICommand::SetMode(EditMode::SettingStart));
        }

        let end_button = egui::Button::new(egui::RichText::new("Set End").color(Color32::WHITE))
            .fill(Color32::from_rgb(200, 50, 50))
            .selected(mode == EditMode::SettingEnd);
        if ui.add(end_button).clicked() {
            state.send(UICommand::SetMode(EditMode::SettingEnd));
        }
    });

    ui.horizontal(|ui| {
        if ui.button("Clear Obstacles").clicked() {
            state.send(UICommand::ClearObstacles);
        }
        let reset_button = egui::Button::new(egui::RichText::new("Reset All").color(Color32::BLACK)).fill(Color32::from_rgb(234, 179, 8));
        if ui.add(reset_button).clicked() {
            state.send(UICommand::ResetAll);
        }
    });

    let obstacle_count = state.scene.as_ref().map_or(0, |s| s.obstacles.len());
    ui.horizontal(|ui| {
        ui.label("Obstacles:");
        ui.label(egui::RichText::new(obstacle_count.to_string()).strong());
    });
}

fn render_parameters(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Optimizer");
    ui.separator();

    egui::Grid::new("optimizer_params").num_columns(2).spacing([12.0, 4.0]).show(ui, |ui| {
        ui.label("Max Iterations:");
        ui.add(egui::DragValue::new(&mut state.params.max_iter).range(OptimizationParams::MAX_ITER_RANGE).speed(10));
        ui.end_row();

        ui.label("Population Size:");
        ui.add(egui::DragValue::new(&mut state.params.pop_size).range(OptimizationParams::POP_SIZE_RANGE).speed(1));
        ui.end_row();

        ui.label("Control Points:");
        ui.add(
            egui::DragValue::new(&mut state.params.num_control_points)
                .range(OptimizationParams::CONTROL_POINTS_RANGE)
                .speed(0.1),
        );
        ui.end_row();
    });
}

fn render_run_controls(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Run");
    ui.separator();

    ui.horizontal(|ui| {
        let title = if state.loading { "Calculating..." } else { "Calculate Path" };
        let calculate = egui::Button::new(egui::RichText::new(title).color(Color32::WHITE)).fill(Color32::from_rgb(59, 130, 246));
        if ui.add_enabled(!state.loading && state.connected, calculate).clicked() {
            state.send(UICommand::StartPlanning(state.params.clamped()));
        }

        if ui.button("Stop").clicked() {
            state.send(UICommand::StopPlanning);
        }
    });

    ui.horizontal(|ui| {
        let (color, text) = if state.connected {
            (Color32::from_rgb(34, 197, 94), "Connected")
        } else {
            (Color32::from_rgb(239, 68, 68), "Disconnected")
        };
        let (dot, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
        ui.painter().circle_filled(dot.center(), 5.0, color);
        ui.label(egui::RichText::new(text).color(color));
    });

    ui.checkbox(&mut state.show_obstacle_ids, "Show obstacle IDs");
}
