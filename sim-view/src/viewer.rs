//! Interactive viewer for the space-colonization tree, built with eframe/egui.
//!
//! [`Viewer`] owns a [`Tree`] and the editable [`Config`] it was grown from,
//! and implements [`eframe::App`] to draw the branches, the attraction points
//! and the ground line, and to drive the simulation.

use eframe::App;
use glam::{DVec2, Vec2};
use rand::{Rng, rng};
use sca_tree_core::{
    Config, ConfigError, StepReport, Tree, attractor::AttractorSet, config::CrownShape,
};

/// World point shown at the center of the drawing area.
const VIEW_CENTER: Vec2 = Vec2::new(0.0, 0.5);
const OUTLINE_WIDTH: f32 = 3.0;

const WOOD: egui::Color32 = egui::Color32::from_rgb(139, 98, 62);
const OUTLINE: egui::Color32 = egui::Color32::from_rgb(40, 30, 22);
const GROUND: egui::Color32 = egui::Color32::from_rgb(90, 70, 50);

/// Shape of the attraction-point batch a click injects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnTool {
    RectAttractors,
    OvalAttractors,
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle keyboard shortcuts and UI interactions.
/// 2. If `running` is `true` and enough time has passed, call [`Tree::update`].
/// 3. Render the ground, the branches and, with the debug overlay on, the
///    attraction points.
///
/// Edits to `cfg` take effect on the next reset.
pub struct Viewer {
    tree: Tree,
    cfg: Config,

    rng: rand::rngs::ThreadRng,

    running: bool,
    show_debug: bool,
    wireframe: bool,
    zoom: f32,
    pan: egui::Vec2,

    spawn_tool: SpawnTool,
    spawn_count: usize,
    spawn_half_extents: Vec2,

    last_report: StepReport,
    status: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
    max_fast_forward_steps: usize,
}

impl Viewer {
    /// Creates a viewer growing a fresh tree from `cfg`.
    ///
    /// ### Returns
    /// The viewer, or the validation error if `cfg` is unusable.
    pub fn new(cfg: Config, max_fast_forward_steps: usize) -> Result<Self, ConfigError> {
        let tree = Tree::new(cfg)?;

        Ok(Self {
            tree,
            cfg,
            rng: rng(),
            running: true,
            show_debug: true,
            wireframe: false,
            zoom: 300.0,
            pan: egui::vec2(0.0, 0.0),
            spawn_tool: SpawnTool::OvalAttractors,
            spawn_count: 40,
            spawn_half_extents: Vec2::new(0.2, 0.15),
            last_report: StepReport::default(),
            status: None,
            step_interval: 1.0 / 60.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
            max_fast_forward_steps,
        })
    }

    /// Regrows the tree from the current `cfg`.
    ///
    /// An invalid `cfg` leaves the current tree in place and reports the
    /// error in the status bar.
    fn reset(&mut self) {
        match Tree::new(self.cfg) {
            Ok(tree) => {
                self.tree = tree;
                self.last_report = StepReport::default();
                self.status = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "reset rejected");
                self.status = Some(e.to_string());
            }
        }
    }

    /// Picks a new random seed and regrows.
    fn reseed(&mut self) {
        self.cfg.seed = Some(self.rng.random());
        self.reset();
    }

    /// Advances the simulation by a single step, even if fully grown.
    fn step_once(&mut self) {
        self.last_report = self.tree.force_step();
    }

    fn fast_forward(&mut self) {
        if let Err(e) = self.tree.grow_to_completion(self.max_fast_forward_steps) {
            tracing::warn!(error = %e, "fast-forward stopped early");
            self.status = Some(e.to_string());
        }
    }

    /// Scatters a batch of attraction points around `center` and lets the
    /// tree react to them right away.
    fn inject_points(&mut self, center: Vec2) {
        let tree_cfg = *self.tree.config();
        let center = center.as_dvec2();
        let half_extents = self.spawn_half_extents.as_dvec2();

        let batch = match self.spawn_tool {
            SpawnTool::RectAttractors => AttractorSet::random_in_rect(
                center,
                half_extents,
                self.spawn_count,
                &tree_cfg,
                &mut self.rng,
            ),
            SpawnTool::OvalAttractors => AttractorSet::random_in_oval(
                center,
                half_extents,
                self.spawn_count,
                &tree_cfg,
                &mut self.rng,
            ),
        };
        self.tree.add_attraction_points(batch);
        self.step_once();
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are shifted so [`VIEW_CENTER`] lands in the middle
    /// of `rect`, scaled by `zoom` and offset by `pan`. The y-axis is flipped
    /// so that positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let p = p - VIEW_CENTER;
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`] (up to floating point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y) + VIEW_CENTER
    }

    fn to_screen(&self, p: DVec2, rect: egui::Rect) -> egui::Pos2 {
        self.world_to_screen(p.as_vec2(), rect)
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (pause, debug, step, wire) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::D),
                i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::W),
            )
        });
        if pause {
            self.running = !self.running;
        }
        if debug {
            self.show_debug = !self.show_debug;
        }
        if step {
            self.step_once();
        }
        if wire {
            self.wireframe = !self.wireframe;
        }
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f64` [`egui::DragValue`].
    fn labeled_drag_f64(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f64,
        range: std::ops::RangeInclusive<f64>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, overlays, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("⏩ Grow").clicked() {
                    self.fast_forward();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                if ui.button("Reseed").clicked() {
                    self.reseed();
                }

                ui.separator();
                ui.checkbox(&mut self.show_debug, "Debug");
                ui.checkbox(&mut self.wireframe, "Wireframe");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 50.0..=2000.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (tree counts, last step, timing).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                let m = self.tree.metrics();
                ui.label(format!("steps = {}", m.steps));
                ui.label(format!("points = {}", m.attraction_points));
                ui.label(format!("segments = {}", m.segments));
                ui.label(format!("branches = {}", m.branches));
                if let Some(seed) = self.tree.seed() {
                    ui.label(format!("seed = {seed}"));
                }
                if self.tree.is_fully_grown() {
                    ui.colored_label(egui::Color32::LIGHT_GREEN, "fully grown");
                }
                ui.separator();
                ui.label(format!(
                    "last step: +{} grown, +{} spawned, -{} points",
                    self.last_report.grown_branches,
                    self.last_report.spawned_branches,
                    self.last_report.consumed_points
                ));
                if let Some(status) = &self.status {
                    ui.colored_label(egui::Color32::LIGHT_RED, status.as_str());
                }
            });
        });
    }

    /// Builds the right-hand configuration panel; changes apply on reset.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Attraction points");
                Self::labeled_drag_usize(
                    ui,
                    "count:",
                    &mut self.cfg.attraction_point_count,
                    0..=5000,
                    1.0,
                );
                Self::labeled_drag_f64(
                    ui,
                    "influence_radius:",
                    &mut self.cfg.influence_radius,
                    0.01..=2.0,
                    0.005,
                );
                Self::labeled_drag_f64(
                    ui,
                    "kill_radius:",
                    &mut self.cfg.kill_radius,
                    0.001..=2.0,
                    0.005,
                );
                ui.horizontal(|ui| {
                    ui.label("crown:");
                    ui.selectable_value(&mut self.cfg.crown_shape, CrownShape::Rect, "Rect");
                    ui.selectable_value(&mut self.cfg.crown_shape, CrownShape::Oval, "Oval");
                });

                ui.separator();
                ui.label("Growth");
                Self::labeled_drag_f64(
                    ui,
                    "step_length:",
                    &mut self.cfg.step_length,
                    0.0005..=0.1,
                    0.0005,
                );
                Self::labeled_drag_f64(
                    ui,
                    "trunk_width:",
                    &mut self.cfg.trunk_width,
                    0.01..=1.0,
                    0.005,
                );
                Self::labeled_drag_f64(
                    ui,
                    "width_decay_ratio:",
                    &mut self.cfg.width_decay_ratio,
                    0.5..=0.999,
                    0.001,
                );
                Self::labeled_drag_f64(
                    ui,
                    "meander (deg):",
                    &mut self.cfg.meander_amplitude_deg,
                    0.0..=90.0,
                    0.5,
                );
                Self::labeled_drag_f64(
                    ui,
                    "min_vertical_growth:",
                    &mut self.cfg.min_vertical_growth,
                    -1.0..=1.0,
                    0.01,
                );
                ui.checkbox(&mut self.cfg.trunk_attracted, "trunk follows attraction");

                ui.separator();
                ui.label("Branching");
                Self::labeled_drag_f64(
                    ui,
                    "min angle (deg):",
                    &mut self.cfg.min_branching_angle_deg,
                    0.0..=180.0,
                    0.5,
                );
                Self::labeled_drag_f64(
                    ui,
                    "max angle (deg):",
                    &mut self.cfg.max_branching_angle_deg,
                    0.0..=180.0,
                    0.5,
                );
                Self::labeled_drag_usize(
                    ui,
                    "max_branches:",
                    &mut self.cfg.max_branches,
                    1..=100_000,
                    10.0,
                );

                ui.separator();
                ui.label("Click to add points");
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.spawn_tool, SpawnTool::RectAttractors, "■ Rect");
                    ui.selectable_value(&mut self.spawn_tool, SpawnTool::OvalAttractors, "○ Oval");
                });
                Self::labeled_drag_usize(ui, "batch:", &mut self.spawn_count, 1..=1000, 1.0);
                ui.horizontal(|ui| {
                    ui.label("half extents:");
                    ui.add(
                        egui::DragValue::new(&mut self.spawn_half_extents.x)
                            .range(0.01..=2.0)
                            .speed(0.005),
                    );
                    ui.add(
                        egui::DragValue::new(&mut self.spawn_half_extents.y)
                            .range(0.01..=2.0)
                            .speed(0.005),
                    );
                });

                ui.separator();
                if ui.button("Apply (reset)").clicked() {
                    self.reset();
                }
                if ui.button("Reset cfg to default").clicked() {
                    let seed = self.cfg.seed;
                    self.cfg = Config::default();
                    self.cfg.seed = seed;
                }
            });
    }

    /// Draws a visual hint for the current spawn tool at the hovered world position.
    fn ui_tool_hint(&self, painter: &egui::Painter, rect: egui::Rect, hover_world: Option<Vec2>) {
        let Some(center) = hover_world else {
            return;
        };

        let stroke = egui::Stroke::new(1.5, egui::Color32::YELLOW);
        let half_extents = self.spawn_half_extents;

        match self.spawn_tool {
            SpawnTool::RectAttractors => {
                let corners = [
                    Vec2::new(-half_extents.x, -half_extents.y),
                    Vec2::new(half_extents.x, -half_extents.y),
                    Vec2::new(half_extents.x, half_extents.y),
                    Vec2::new(-half_extents.x, half_extents.y),
                ];
                let points: Vec<egui::Pos2> = corners
                    .iter()
                    .map(|&off| self.world_to_screen(center + off, rect))
                    .collect();
                painter.add(egui::Shape::closed_line(points, stroke));
            }

            SpawnTool::OvalAttractors => {
                let segments = 64;
                let mut pts = Vec::with_capacity(segments);
                use std::f32::consts::TAU;
                for i in 0..segments {
                    let t = (i as f32) / (segments as f32) * TAU;
                    let local = Vec2::new(t.cos() * half_extents.x, t.sin() * half_extents.y);
                    pts.push(self.world_to_screen(center + local, rect));
                }
                painter.add(egui::Shape::closed_line(pts, stroke));
            }
        }
    }

    fn draw_ground(&self, painter: &egui::Painter, rect: egui::Rect) {
        let a = self.world_to_screen(Vec2::new(-1.0, 0.0), rect);
        let b = self.world_to_screen(Vec2::new(1.0, 0.0), rect);
        painter.line_segment([a, b], egui::Stroke::new(OUTLINE_WIDTH, GROUND));
    }

    /// Draws every branch as a polyline whose stroke follows segment widths.
    fn draw_branches(&self, painter: &egui::Painter, rect: egui::Rect) {
        let passes: &[(f32, egui::Color32)] = if self.wireframe {
            &[(0.0, egui::Color32::LIGHT_GREEN)]
        } else {
            &[(OUTLINE_WIDTH, OUTLINE), (0.0, WOOD)]
        };

        for &(extra, color) in passes {
            for branch in self.tree.branches() {
                for pair in branch.segments.windows(2) {
                    let a = self.to_screen(pair[0].pos, rect);
                    let b = self.to_screen(pair[1].pos, rect);
                    let width = if self.wireframe {
                        1.0
                    } else {
                        (pair[1].width as f32 * self.zoom).max(1.0) + extra
                    };
                    painter.line_segment([a, b], egui::Stroke::new(width, color));
                }
            }
        }
    }

    /// Attraction points with their kill and influence circles, plus branch tips.
    fn draw_debug_overlay(&self, painter: &egui::Painter, rect: egui::Rect) {
        let influence = egui::Stroke::new(
            1.0,
            egui::Color32::from_rgba_unmultiplied(255, 255, 255, 12),
        );
        let kill = egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(255, 80, 80, 40));

        for point in self.tree.attraction_points() {
            let p = self.to_screen(point.pos, rect);
            painter.circle_stroke(p, point.influence_radius as f32 * self.zoom, influence);
            painter.circle_stroke(p, point.kill_radius as f32 * self.zoom, kill);
            painter.circle_filled(p, 2.0, egui::Color32::WHITE);
        }

        for branch in self.tree.branches() {
            let p = self.to_screen(branch.tip().pos, rect);
            painter.circle_filled(p, 2.5, egui::Color32::RED);
        }
    }

    /// Builds the central panel where the tree is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.pan += delta;
            }

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));

            if response.clicked()
                && let Some(center) = hover_world
            {
                self.inject_points(center);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());

                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(50.0, 2000.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.draw_ground(&painter, rect);
            self.draw_branches(&painter, rect);
            if self.show_debug {
                self.draw_debug_overlay(&painter, rect);
            }
            self.ui_tool_hint(&painter, rect, hover_world);

            // Auto-run simulation if requested.
            if self.running && !self.tree.is_fully_grown() {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.last_report = self.tree.update();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn seeded_viewer() -> Viewer {
        let mut cfg = Config::default();
        cfg.seed = Some(17);
        cfg.attraction_point_count = 100;
        Viewer::new(cfg, 10_000).unwrap()
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = seeded_viewer();
        viewer.zoom = 250.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let eps = 1e-4;
        for p in [Vec2::new(0.0, 0.0), Vec2::new(0.7, 0.2), Vec2::new(-1.0, 1.0)] {
            let back = viewer.screen_to_world(viewer.world_to_screen(p, rect), rect);
            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn view_center_maps_to_rect_center() {
        let viewer = seeded_viewer();
        let rect = test_rect();
        assert_eq!(viewer.world_to_screen(VIEW_CENTER, rect), rect.center());
        // world up is screen up
        let above = viewer.world_to_screen(VIEW_CENTER + Vec2::Y, rect);
        assert!(above.y < rect.center().y);
    }

    #[test]
    fn reset_regrows_from_the_same_seed() {
        let mut viewer = seeded_viewer();
        viewer.fast_forward();
        assert!(viewer.tree.is_fully_grown());
        let grown = viewer.tree.metrics();

        viewer.reset();
        assert_eq!(viewer.tree.branches().len(), 1);
        assert_eq!(viewer.tree.steps(), 0);
        assert_eq!(viewer.tree.attraction_points().len(), 100);

        viewer.fast_forward();
        assert_eq!(viewer.tree.metrics(), grown);
    }

    #[test]
    fn reset_with_invalid_config_keeps_current_tree() {
        let mut viewer = seeded_viewer();
        viewer.step_once();
        viewer.cfg.kill_radius = 10.0;

        viewer.reset();

        assert_eq!(viewer.tree.steps(), 1);
        assert!(viewer.status.is_some());
    }

    #[test]
    fn step_once_advances_even_when_paused() {
        let mut viewer = seeded_viewer();
        viewer.running = false;

        viewer.step_once();

        assert_eq!(viewer.tree.steps(), 1);
        assert_eq!(viewer.tree.branches()[0].segments.len(), 2);
        assert_eq!(viewer.last_report.grown_branches, 1);
    }

    #[test]
    fn inject_points_adds_a_batch_and_steps() {
        let mut viewer = seeded_viewer();
        viewer.spawn_count = 25;
        let before = viewer.tree.attraction_points().len();

        // far from the trunk so nothing is consumed right away
        viewer.inject_points(Vec2::new(0.0, 5.0));

        assert_eq!(viewer.tree.attraction_points().len(), before + 25);
        assert_eq!(viewer.tree.steps(), 1);
    }
}
