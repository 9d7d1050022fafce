//! Interactive snow-crystal viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`CrystalAutomaton`] and
//! implements [`eframe::App`] to grow, reset and draw it. The viewer holds
//! no growth logic of its own: it calls `step`/`reset`, reads the frozen
//! mask and writes parameters through the automaton's clamping setters.

use eframe::App;
use glam::{IVec2, Vec2};
use snow_core::{
    Config, ConfigError, CrystalAutomaton,
    config::{ALPHA_RANGE, BETA_RANGE, GAMMA_RANGE, Params},
};

const SQRT_3: f32 = 1.732_050_8;

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions (buttons, sliders, pan/zoom).
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Draw the grid on a hexagonal layout.
///
/// ### Fields
/// - `automaton` - The crystal being grown.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Screen pixels per world unit (one cell is about two units wide).
/// - `pan` - Screen-space pan offset in pixels.
/// - `show_water` - Shade unfrozen cells by their water content.
///
/// - `last_new_frozen` - Cells frozen by the most recent step.
/// - `last_error` - Message of the last failed reset or step, if any.
///
/// - `step_interval` - Target time between automatic steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
pub struct Viewer {
    automaton: CrystalAutomaton,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    show_water: bool,

    last_new_frozen: usize,
    last_error: Option<String>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer around a freshly seeded automaton.
    ///
    /// ### Errors
    /// Returns the automaton's [`ConfigError`] if `config` is invalid.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            automaton: CrystalAutomaton::new(config)?,
            running: false,
            zoom: 4.0,
            pan: egui::vec2(0.0, 0.0),
            show_water: false,
            last_new_frozen: 0,
            last_error: None,
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    /// Reseeds the crystal with the current parameters and stops auto-running.
    fn reset(&mut self) {
        let params = self.automaton.params();
        match self.automaton.reset(params) {
            Ok(()) => self.last_error = None,
            Err(err) => {
                log::error!("reset failed: {err}");
                self.last_error = Some(err.to_string());
            }
        }
        self.last_new_frozen = 0;
        self.running = false;
    }

    /// Advances the crystal by a single generation.
    ///
    /// A failed step stops auto-running and is shown in the status bar;
    /// the crystal keeps its previous state.
    fn step_once(&mut self) {
        match self.automaton.step() {
            Ok(added) => self.last_new_frozen = added,
            Err(err) => {
                log::error!("step failed: {err}");
                self.last_error = Some(err.to_string());
                self.running = false;
            }
        }
    }

    /// Maps a grid cell to world space on a pointy-top hex layout centered
    /// on the seed. Neighboring cells end up `sqrt(3)` apart.
    fn cell_to_world(&self, c: IVec2) -> Vec2 {
        let d = (c - self.automaton.center()).as_vec2();
        Vec2::new(SQRT_3 * (d.x + 0.5 * d.y), 1.5 * d.y)
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space; the inverse of
    /// [`Viewer::world_to_screen`] up to rounding.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Draws a labeled parameter slider and returns the new value if it moved.
    fn param_slider(
        ui: &mut egui::Ui,
        label: &str,
        value: f64,
        range: std::ops::RangeInclusive<f64>,
    ) -> Option<f64> {
        let mut edited = value;
        let response = ui.add(egui::Slider::new(&mut edited, range).text(label));
        response.changed().then_some(edited)
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Grow").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.checkbox(&mut self.show_water, "Water");
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=20.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (step counter, crystal size, timing).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("new = {}", self.last_new_frozen));
                ui.label(format!("frozen = {}", self.automaton.frozen_count()));
                ui.label(format!("step = {}", self.automaton.step_count()));
                ui.separator();
                ui.label(self.automaton.rule_name());
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel for the tunable parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Parameters");
                ui.separator();

                let params = self.automaton.params();
                if let Some(alpha) = Self::param_slider(ui, "alpha", params.alpha, ALPHA_RANGE) {
                    self.automaton.set_alpha(alpha);
                }
                if let Some(beta) = Self::param_slider(ui, "beta", params.beta, BETA_RANGE) {
                    self.automaton.set_beta(beta);
                }
                if let Some(gamma) = Self::param_slider(ui, "gamma", params.gamma, GAMMA_RANGE) {
                    self.automaton.set_gamma(gamma);
                }

                ui.separator();
                ui.label(format!(
                    "grid = {0}x{0}, border = {1}",
                    self.automaton.width(),
                    self.automaton.grid().border_margin()
                ));

                ui.separator();
                if ui.button("Reset params to default").clicked() {
                    let defaults = Params::default();
                    self.automaton.set_alpha(defaults.alpha);
                    self.automaton.set_beta(defaults.beta);
                    self.automaton.set_gamma(defaults.gamma);
                }
            });
    }

    /// Builds the central panel where the crystal is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.5, 20.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            let grid = self.automaton.grid();
            let topo = *grid.topology();
            let radius = (0.9 * self.zoom).max(1.0);

            for (id, c) in topo.coords().enumerate() {
                let p = self.world_to_screen(self.cell_to_world(c), rect);
                if !rect.contains(p) {
                    continue;
                }

                let color = if grid.frozen()[id] {
                    egui::Color32::WHITE
                } else if grid.is_border(c) {
                    egui::Color32::from_rgb(30, 30, 50)
                } else if self.show_water {
                    let level = (grid.water()[id].clamp(0.0, 1.0) * 160.0) as u8;
                    egui::Color32::from_rgb(0, level / 2, level)
                } else {
                    continue;
                };

                painter.circle_filled(p, radius, color);
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
