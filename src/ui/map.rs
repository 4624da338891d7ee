//! # Central Field Visualization
//!
//! This module renders the main 2D field showing:
//! - A light grid every 50 field units
//! - Obstacles as translucent circles, the selected one highlighted with a
//!   dashed radius indicator
//! - The best known path as a polyline, briefly emphasized when it changes
//! - The start (green) and goal (red) anchors
//!
//! ## Coordinate Mapping
//!
//! The field is a square of `grid_size` units with the origin in the top-left
//! corner and y pointing down, exactly like screen space. `FieldTransform`
//! fits the square into the available area and maps both ways with
//! `egui::lerp` and its inverse.
//!
//! ## Click Routing
//!
//! A click is turned into a field point and a `ClickTarget`. The hit test
//! walks the obstacles from the last drawn to the first, so the circle on top
//! receives the click when several overlap visually.

use crate::scene::{ClickTarget, EditMode, Obstacle, Point};
use crate::ui::{AppState, SceneView, UICommand};
use eframe::egui;
use egui::Color32;

const GRID_SPACING: f64 = 50.0;
const ANCHOR_RADIUS: f32 = 10.0;

/// Maps between field units and screen pixels for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTransform {
    pub rect: egui::Rect,
    pub grid_size: f64,
}

impl FieldTransform {
    pub fn new(rect: egui::Rect, grid_size: f64) -> Self {
        Self { rect, grid_size }
    }

    pub fn to_screen(&self, p: Point) -> egui::Pos2 {
        egui::pos2(
            egui::lerp(self.rect.left()..=self.rect.right(), (p.x / self.grid_size) as f32),
            egui::lerp(self.rect.top()..=self.rect.bottom(), (p.y / self.grid_size) as f32),
        )
    }

    pub fn to_field(&self, pos: egui::Pos2) -> Point {
        let tx = (pos.x - self.rect.left()) / self.rect.width();
        let ty = (pos.y - self.rect.top()) / self.rect.height();
        Point::new(tx as f64 * self.grid_size, ty as f64 * self.grid_size)
    }

    /// Pixels per field unit.
    pub fn scale(&self) -> f32 {
        self.rect.width() / self.grid_size as f32
    }
}

/// Decide what a click at `point` landed on.
pub fn hit_test(obstacles: &[Obstacle], point: &Point) -> ClickTarget {
    obstacles
        .iter()
        .rev()
        .find(|o| o.contains(point))
        .map_or(ClickTarget::Field, |o| ClickTarget::Obstacle(o.id))
}

/// Render the central field panel.
///
/// # Parameters
///
/// * `ctx` - egui context for rendering
/// * `state` - Mutable application state, used to send click commands
pub fn render(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let Some(scene) = state.scene.as_ref() else {
            ui.centered_and_justified(|ui| {
                ui.label("Waiting for the editor to start...");
            });
            return;
        };

        // Square drawing area, centered in the available space
        let avail_rect = ui.available_rect_before_wrap();
        let side = avail_rect.width().min(avail_rect.height() - 24.0).max(0.0);
        let rect = egui::Rect::from_center_size(avail_rect.center() - egui::vec2(0.0, 12.0), egui::vec2(side, side));
        let transform = FieldTransform::new(rect, scene.grid_size);

        let response = ui.interact(rect, egui::Id::new("field_canvas"), egui::Sense::click());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, Color32::from_rgb(249, 250, 251));

        let hovered = response
            .hover_pos()
            .map(|pos| hit_test(&scene.obstacles, &transform.to_field(pos)))
            .and_then(|target| match target {
                ClickTarget::Obstacle(id) => Some(id),
                ClickTarget::Field => None,
            });

        draw_grid(&painter, &transform);
        draw_obstacles(&painter, &transform, scene, hovered, state.show_obstacle_ids);
        let flash = state.path_flash_until.is_some_and(|until| until > std::time::Instant::now());
        draw_path(&painter, &transform, &state.path.snapshot.path, flash);
        draw_anchors(&painter, &transform, scene);

        ui.painter().text(
            egui::pos2(rect.left(), rect.bottom() + 4.0),
            egui::Align2::LEFT_TOP,
            mode_hint(scene.mode),
            egui::FontId::proportional(14.0),
            ui.visuals().text_color(),
        );

        if response.clicked() {
            if let Some(click_pos) = response.interact_pointer_pos() {
                let point = transform.to_field(click_pos);
                let target = hit_test(&scene.obstacles, &point);
                state.send(UICommand::FieldClick { point, target });
            }
        }
    });
}

fn mode_hint(mode: EditMode) -> &'static str {
    match mode {
        EditMode::SettingStart => "Click to set the start point",
        EditMode::SettingEnd => "Click to set the end point",
        EditMode::Idle => "Click to add obstacles, click an obstacle to select it",
    }
}

fn draw_grid(painter: &egui::Painter, transform: &FieldTransform) {
    let stroke = egui::Stroke::new(1.0, Color32::from_rgb(221, 221, 221));
    let rect = transform.rect;
    let mut v = 0.0;
    while v <= transform.grid_size {
        let p = transform.to_screen(Point::new(v, v));
        painter.line_segment([egui::pos2(p.x, rect.top()), egui::pos2(p.x, rect.bottom())], stroke);
        painter.line_segment([egui::pos2(rect.left(), p.y), egui::pos2(rect.right(), p.y)], stroke);
        v += GRID_SPACING;
    }
}

fn draw_obstacles(painter: &egui::Painter, transform: &FieldTransform, scene: &SceneView, hovered: Option<crate::scene::ObstacleId>, show_ids: bool) {
    let selected_stroke = Color32::from_rgb(79, 70, 229);

    for obstacle in &scene.obstacles {
        let center = transform.to_screen(obstacle.center());
        let r = obstacle.radius as f32 * transform.scale();
        let is_selected = scene.selected == Some(obstacle.id);

        let fill = if is_selected {
            Color32::from_rgba_unmultiplied(159, 180, 255, 153)
        } else if hovered == Some(obstacle.id) {
            Color32::from_rgba_unmultiplied(229, 231, 235, 153)
        } else {
            Color32::from_rgba_unmultiplied(209, 213, 219, 153)
        };
        let stroke_color = if is_selected { selected_stroke } else { Color32::from_rgb(156, 163, 175) };

        painter.circle_filled(center, r, fill);
        painter.circle_stroke(center, r, egui::Stroke::new(2.0, stroke_color));

        if is_selected {
            // Dashed radius indicator from the center to the rim
            let rim = egui::pos2(center.x + r, center.y);
            let dashes = egui::Shape::dashed_line(&[center, rim], egui::Stroke::new(1.0, selected_stroke), 5.0, 5.0);
            painter.extend(dashes);
        }

        if show_ids {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                obstacle.id.to_string(),
                egui::FontId::monospace(11.0),
                Color32::from_rgb(55, 65, 81),
            );
        }
    }
}

fn draw_path(painter: &egui::Painter, transform: &FieldTransform, path: &[Point], flash: bool) {
    if path.len() < 2 {
        return;
    }
    let (width, color) = if flash {
        (3.0, Color32::from_rgb(99, 102, 241))
    } else {
        (2.0, Color32::from_rgb(79, 70, 229))
    };
    let points: Vec<egui::Pos2> = path.iter().map(|p| transform.to_screen(*p)).collect();
    painter.add(egui::Shape::line(points, egui::Stroke::new(width, color)));
}

fn draw_anchors(painter: &egui::Painter, transform: &FieldTransform, scene: &SceneView) {
    let start_width = if scene.mode == EditMode::SettingStart { 3.0 } else { 2.0 };
    let goal_width = if scene.mode == EditMode::SettingEnd { 3.0 } else { 2.0 };

    let start = transform.to_screen(scene.start);
    painter.circle_filled(start, ANCHOR_RADIUS, Color32::from_rgb(34, 197, 94));
    painter.circle_stroke(start, ANCHOR_RADIUS, egui::Stroke::new(start_width, Color32::from_rgb(21, 128, 61)));

    let goal = transform.to_screen(scene.goal);
    painter.circle_filled(goal, ANCHOR_RADIUS, Color32::from_rgb(239, 68, 68));
    painter.circle_stroke(goal, ANCHOR_RADIUS, egui::Stroke::new(goal_width, Color32::from_rgb(185, 28, 28)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ObstacleId;

    fn obstacle(id: u64, x: f64, y: f64, radius: f64) -> Obstacle {
        Obstacle {
            id: ObstacleId::from_raw(id),
            x,
            y,
            radius,
        }
    }

    #[test]
    fn transform_maps_corners_and_back() {
        let rect = egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(300.0, 300.0));
        let transform = FieldTransform::new(rect, 600.0);

        assert_eq!(transform.to_screen(Point::new(0.0, 0.0)), egui::pos2(100.0, 50.0));
        assert_eq!(transform.to_screen(Point::new(600.0, 600.0)), egui::pos2(400.0, 350.0));
        assert_eq!(transform.scale(), 0.5);

        let p = transform.to_field(egui::pos2(250.0, 200.0));
        assert!((p.x - 300.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn hit_test_prefers_topmost_obstacle() {
        let obstacles = vec![obstacle(1, 100.0, 100.0, 40.0), obstacle(2, 130.0, 100.0, 40.0)];
        assert_eq!(hit_test(&obstacles, &Point::new(115.0, 100.0)), ClickTarget::Obstacle(ObstacleId::from_raw(2)));
        assert_eq!(hit_test(&obstacles, &Point::new(70.0, 100.0)), ClickTarget::Obstacle(ObstacleId::from_raw(1)));
        assert_eq!(hit_test(&obstacles, &Point::new(300.0, 300.0)), ClickTarget::Field);
    }

    #[test]
    fn hit_test_includes_the_rim() {
        let obstacles = vec![obstacle(1, 100.0, 100.0, 20.0)];
        assert_eq!(hit_test(&obstacles, &Point::new(120.0, 100.0)), ClickTarget::Obstacle(ObstacleId::from_raw(1)));
        assert_eq!(hit_test(&obstacles, &Point::new(120.5, 100.0)), ClickTarget::Field);
    }
}
