//! # Right Panel - Obstacle Inspector and Path Statistics
//!
//! This module renders the resizable right panel displaying:
//! - The selected obstacle (id, center, radius slider, delete button)
//! - Statistics of the best known path (iteration, cost, length, update count)
//! - The last error reported by the optimizer, if any
//! - The path points in a scrollable, virtualized table
//!
//! ## Path Table
//!
//! The point table uses `egui_extras::TableBuilder` so only visible rows are
//! built; long paths at high resolution stay cheap to scroll.

use crate::scene::Obstacle;
use crate::ui::{AppState, PathView, UICommand};
use chrono::Local;
use eframe::egui;
use egui::Color32;

/// Render the right inspector panel.
///
/// # Parameters
///
/// * `ctx` - egui context
/// * `state` - Mutable application state
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    let panel = egui::SidePanel::right("inspector_right")
        .resizable(true)
        .default_width(state.right_panel_width)
        .width_range(260.0..=700.0)
        .show(ctx, |ui| {
            ui.heading("Inspector");
            ui.separator();

            let selected = state.scene.as_ref().and_then(|s| s.selected_obstacle().cloned());
            match selected {
                Some(obstacle) => render_obstacle_inspector(ui, state, &obstacle),
                None => {
                    ui.label("No obstacle selected. Click on an obstacle on the map to select it.");
                }
            }
            ui.separator();

            ui.heading("Path");
            ui.separator();
            render_path_summary(ui, &state.path);

            if let Some(error) = &state.path.last_error {
                ui.add_space(4.0);
                ui.label(egui::RichText::new(format!("Optimization error: {}", error)).color(Color32::from_rgb(239, 68, 68)));
            }

            ui.add_space(4.0);
            let table_h = ui.available_height().max(0.0);
            if table_h > 0.0 && !state.path.snapshot.is_empty() {
                render_path_table(ui, &state.path, table_h);
            }
        });
    state.right_panel_width = panel.response.rect.width();
}

fn render_obstacle_inspector(ui: &mut egui::Ui, state: &mut AppState, obstacle: &Obstacle) {
    let (min_radius, max_radius) = state.scene.as_ref().map_or((20.0, 100.0), |s| (s.min_radius, s.max_radius));

    ui.horizontal(|ui| {
        ui.label("Selected Obstacle:");
        ui.label(egui::RichText::new(obstacle.id.to_string()).strong().color(Color32::from_rgb(0, 128, 255)));
    });
    ui.horizontal(|ui| {
        ui.label("Center: (");
        ui.label(egui::RichText::new(format!("{:.1}", obstacle.x)).strong());
        ui.label(",");
        ui.label(egui::RichText::new(format!("{:.1}", obstacle.y)).strong());
        ui.label(")");
    });

    ui.horizontal(|ui| {
        ui.label("Radius:");
        let slider = egui::Slider::new(&mut state.radius_input, min_radius..=max_radius).step_by(1.0);
        if ui.add(slider).changed() {
            state.send(UICommand::ResizeSelected(state.radius_input));
        }
    });

    ui.horizontal(|ui| {
        let delete = egui::Button::new(egui::RichText::new("Delete Obstacle").color(Color32::WHITE)).fill(Color32::from_rgb(200, 50, 50));
        if ui.add(delete).clicked() {
            state.send(UICommand::DeleteSelected);
        }
        if ui.button("Deselect").clicked() {
            state.send(UICommand::ClearSelection);
        }
    });
}

fn render_path_summary(ui: &mut egui::Ui, path: &PathView) {
    let snapshot = &path.snapshot;
    egui::Grid::new("path_summary").num_columns(2).spacing([12.0, 2.0]).show(ui, |ui| {
        ui.label("Iteration:");
        ui.label(egui::RichText::new(snapshot.iteration.to_string()).strong());
        ui.end_row();

        ui.label("Cost:");
        ui.label(egui::RichText::new(format!("{:.4}", snapshot.cost)).strong());
        ui.end_row();

        ui.label("Length:");
        ui.label(egui::RichText::new(format!("{:.2}", snapshot.length)).strong());
        ui.end_row();

        ui.label("Points:");
        ui.label(egui::RichText::new(snapshot.path.len().to_string()).strong());
        ui.end_row();

        ui.label("Avg. segment:");
        let average = snapshot.average_segment_length().map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
        ui.label(egui::RichText::new(average).strong());
        ui.end_row();

        if let Some(details) = snapshot.details {
            ui.label("Violations:");
            ui.label(egui::RichText::new(details.violations.to_string()).strong());
            ui.end_row();

            ui.label("Collisions:");
            let color = if details.collisions > 0 { Color32::from_rgb(239, 68, 68) } else { Color32::LIGHT_GREEN };
            ui.label(egui::RichText::new(details.collisions.to_string()).strong().color(color));
            ui.end_row();
        }

        ui.label("Updates:");
        ui.label(egui::RichText::new(format!("{} ({} stale dropped)", path.update_count, path.discarded_count)).strong());
        ui.end_row();

        ui.label("Last update:");
        let last_update = match path.last_update {
            Some(t) => t.with_timezone(&Local).format("%H:%M:%S").to_string(),
            None => "--:--:--".to_string(),
        };
        ui.label(egui::RichText::new(last_update).monospace());
        ui.end_row();
    });
}

fn render_path_table(ui: &mut egui::Ui, path: &PathView, table_h: f32) {
    use egui_extras::{Column, TableBuilder};

    let row_height = ui.text_style_height(&egui::TextStyle::Body) * 1.3;
    let body_min_h = (table_h - row_height).max(0.0);
    let points = &path.snapshot.path;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .vscroll(true)
        .min_scrolled_height(body_min_h)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(50.0).at_least(40.0)) // Index
        .column(Column::initial(90.0).at_least(60.0)) // X
        .column(Column::initial(90.0).at_least(60.0)) // Y
        .column(Column::remainder()) // Segment
        .header(row_height, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("X");
            });
            header.col(|ui| {
                ui.strong("Y");
            });
            header.col(|ui| {
                ui.strong("Segment");
            });
        })
        .body(|body| {
            body.rows(row_height, points.len(), |mut row| {
                let idx = row.index();
                let point = points[idx];
                let segment = if idx > 0 { format!("{:.2}", points[idx - 1].distance(&point)) } else { String::new() };
                row.col(|ui| {
                    ui.label(idx.to_string());
                });
                row.col(|ui| {
                    ui.label(format!("{:.2}", point.x));
                });
                row.col(|ui| {
                    ui.label(format!("{:.2}", point.y));
                });
                row.col(|ui| {
                    ui.label(segment);
                });
            });
        });
}
