//! Interactive particle-life viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and
//! implements [`eframe::App`] to draw the particle field and expose every
//! coefficient, count and global setting as a control.

use eframe::App;
use glam::Vec2;
use sim_core::{
    config::{BoundaryMode, CoefficientRanges, Config, Param},
    error::{ConfigError, PresetError},
    preset::Preset,
    store::{GroupSpec, MAX_GROUP_COUNT},
    types::{GroupId, Rgb},
    world::{Simulation, TickStats},
};
use std::path::Path;

/// Colors and particle counts the viewer starts with.
const DEFAULT_GROUPS: [(&str, Rgb, usize); 4] = [
    ("yellow", Rgb::new(255, 230, 40), 400),
    ("red", Rgb::new(230, 40, 40), 400),
    ("green", Rgb::new(40, 210, 70), 400),
    ("blue", Rgb::new(50, 110, 255), 400),
];

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`Simulation`] owning groups, coefficients
///   and config.
/// - UI state (pan/zoom, selected receiver group, preset path, timing).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions; edits go straight into the simulation and
///    are picked up by the next tick.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Draw every group as colored points.
///
/// ### Fields
/// - `sim` - The particle-life simulation being displayed.
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Zoom factor for world-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
/// - `point_radius` - Screen radius of a drawn particle.
/// - `selected` - Receiver group whose coefficient row is being edited.
/// - `preset_path` - File used by Save/Load (`.txt` selects the flat format).
/// - `status` - Result of the last save/load, shown in the status bar.
/// - `last_stats` - Statistics of the most recent tick.
/// - `step_interval` - Target time step between automatic simulation steps (seconds).
/// - `last_step_time` - Time stamp of the last step (egui time).
/// - `last_step_dt` - Actual time delta between the last two steps (for display only).
pub struct Viewer {
    sim: Simulation,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    point_radius: f32,

    selected: GroupId,
    preset_path: String,
    status: String,

    last_stats: TickStats,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer with the default four groups and random coefficients.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`], or the configuration error that
    /// prevented the simulation from being built.
    pub fn new() -> Result<Self, ConfigError> {
        let specs = DEFAULT_GROUPS
            .iter()
            .map(|&(name, color, count)| GroupSpec::new(name, color, count))
            .collect();
        let sim = Simulation::with_random_matrix(specs, Config::default(), rand::random())?;

        Ok(Self {
            sim,
            running: false,
            zoom: 0.8,
            pan: egui::vec2(0.0, 0.0),
            point_radius: 1.5,
            selected: 0,
            preset_path: "particle-life.json".to_owned(),
            status: String::new(),
            last_stats: TickStats::default(),
            step_interval: 0.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    /// Regenerates every group and stops auto-running.
    fn restart(&mut self) {
        self.sim.restart();
        self.last_stats = TickStats::default();
        self.running = false;
    }

    /// Advances the simulation by a single tick.
    fn step_once(&mut self) {
        self.last_stats = self.sim.tick();
    }

    /// Writes the current setup to `preset_path`.
    fn save_preset(&self) -> Result<(), PresetError> {
        let preset = self.sim.preset();
        let path = Path::new(&self.preset_path);
        if is_flat_path(path) {
            std::fs::write(path, preset.format_flat())?;
            log::info!("saved flat preset to {}", path.display());
            Ok(())
        } else {
            preset.save(path)
        }
    }

    /// Replaces the current setup with the one stored at `preset_path`.
    ///
    /// A flat file only stores numbers, so group names and colors are kept
    /// from the current setup and the file must have the same group count.
    fn load_preset(&mut self) -> Result<(), PresetError> {
        let path = Path::new(&self.preset_path);
        let preset = if is_flat_path(path) {
            Preset::parse_flat(&std::fs::read_to_string(path)?, &self.sim.preset())?
        } else {
            Preset::load(path)?
        };
        self.sim.load_preset(preset)?;
        self.selected = self.selected.min(self.sim.specs().len().saturating_sub(1));
        Ok(())
    }

    /// Center of the simulated field in world coordinates.
    fn field_center(&self) -> Vec2 {
        let b = self.sim.config().bounds;
        Vec2::new(b.width, b.height) * 0.5
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The field center is mapped to the center of `rect`, scaled by
    /// `zoom` and offset by `pan`. World y grows downward, like screen y.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let local = (p - self.field_center()) * self.zoom;
        egui::pos2(
            center.x + local.x + self.pan.x,
            center.y + local.y + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (p.y - center.y - self.pan.y) / self.zoom;
        Vec2::new(x, y) + self.field_center()
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
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

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Restart").clicked() {
                    self.restart();
                }

                if ui.button("Randomize").clicked() {
                    self.sim.randomize();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
                ui.add(egui::Slider::new(&mut self.point_radius, 0.5..=6.0).text("Point"));
            });
        });
    }

    /// Builds the bottom status bar (tick, particle count, last tick stats).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("neighbour hits = {}", self.last_stats.neighbour_hits));
                ui.label(format!(
                    "pairs = {} (+{} skipped)",
                    self.last_stats.pairs_applied, self.last_stats.pairs_skipped
                ));
                ui.label(format!("particles = {}", self.sim.total_particles()));
                ui.label(format!("tick = {}", self.sim.ticks()));
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(self.status.as_str());
                }
            });
        });
    }

    /// Builds the right-hand panel for global settings, groups, and the
    /// coefficient row of the selected receiver group.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("World");
                    self.ui_world_settings(ui);

                    ui.separator();
                    ui.heading("Groups");
                    self.ui_group_counts(ui);

                    ui.separator();
                    ui.heading("Coefficients");
                    self.ui_coefficients(ui);

                    ui.separator();
                    ui.heading("Preset");
                    self.ui_preset(ui);
                });
            });
    }

    /// Builds the global settings controls (field size, forces, toggles).
    ///
    /// Edits are made on a copy and only handed to the simulation when
    /// something changed; see [`Viewer::apply_config`].
    fn ui_world_settings(&mut self, ui: &mut egui::Ui) {
        let mut edited = *self.sim.config();
        let cfg = &mut edited;

        Self::labeled_drag_f32(ui, "width:", &mut cfg.bounds.width, 50.0..=5000.0, 5.0);
        Self::labeled_drag_f32(ui, "height:", &mut cfg.bounds.height, 50.0..=5000.0, 5.0);
        Self::labeled_drag_f32(ui, "wall repel:", &mut cfg.bounds.wall_repel, 0.0..=100.0, 0.5);
        Self::labeled_drag_f32(ui, "gravity:", &mut cfg.bounds.gravity, -1.0..=1.0, 0.01);

        ui.checkbox(&mut cfg.bounds_enabled, "Keep inside bounds");
        egui::ComboBox::from_label("Boundary")
            .selected_text(format!("{:?}", cfg.boundary_mode))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut cfg.boundary_mode, BoundaryMode::Reflect, "Reflect");
                ui.selectable_value(&mut cfg.boundary_mode, BoundaryMode::Clamp, "Clamp");
            });
        ui.checkbox(&mut cfg.infinite_radius, "Infinite radius");

        let mut wide = cfg.ranges == CoefficientRanges::wide();
        if ui.checkbox(&mut wide, "Strength ±200").changed() {
            cfg.ranges = if wide {
                CoefficientRanges::wide()
            } else {
                CoefficientRanges::classic()
            };
        }

        ui.checkbox(&mut cfg.evolve.enabled, "Evolve parameters");
        ui.add_enabled_ui(cfg.evolve.enabled, |ui| {
            ui.add(egui::Slider::new(&mut cfg.evolve.chance, 0.0..=100.0).text("chance %"));
            ui.add(egui::Slider::new(&mut cfg.evolve.amount, 0.0..=100.0).text("amount %"));
        });

        if edited != *self.sim.config() {
            self.apply_config(edited);
        }
    }

    /// Hands an edited config to the simulation.
    ///
    /// An invalid config is rejected, logged and reported in the status
    /// bar; the simulation keeps its previous config.
    fn apply_config(&mut self, config: Config) {
        if let Err(e) = self.sim.set_config(config) {
            log::warn!("rejected settings: {e}");
            self.status = format!("rejected settings: {e}");
        }
    }

    /// Builds one row per group with a color picker and a particle count.
    ///
    /// Changes are requested from the simulation and take effect on the
    /// next tick.
    fn ui_group_counts(&mut self, ui: &mut egui::Ui) {
        let specs: Vec<GroupSpec> = self.sim.specs().to_vec();
        for (id, spec) in specs.iter().enumerate() {
            let mut count = spec.count;
            let mut rgb = [spec.color.r, spec.color.g, spec.color.b];
            ui.horizontal(|ui| {
                ui.color_edit_button_srgb(&mut rgb);
                ui.colored_label(color32(spec.color), spec.name.as_str());
                ui.add(
                    egui::DragValue::new(&mut count)
                        .range(0..=MAX_GROUP_COUNT)
                        .speed(5.0),
                );
            });
            if count != spec.count
                && let Err(e) = self.sim.set_group_count(id, count)
            {
                log::warn!("could not resize group {id}: {e}");
            }
            let color = Rgb::new(rgb[0], rgb[1], rgb[2]);
            if color != spec.color
                && let Err(e) = self.sim.set_group_color(id, color)
            {
                log::warn!("could not recolor group {id}: {e}");
            }
        }
    }

    /// Builds the coefficient sliders for the selected receiver group.
    ///
    /// One collapsible section per source group, each with a slider per
    /// [`Param`] bounded by the configured ranges.
    fn ui_coefficients(&mut self, ui: &mut egui::Ui) {
        let specs: Vec<GroupSpec> = self.sim.specs().to_vec();
        if specs.is_empty() {
            return;
        }
        self.selected = self.selected.min(specs.len() - 1);

        egui::ComboBox::from_label("Receiver")
            .selected_text(specs[self.selected].name.as_str())
            .show_ui(ui, |ui| {
                for (id, spec) in specs.iter().enumerate() {
                    ui.selectable_value(&mut self.selected, id, spec.name.as_str());
                }
            });

        let ranges = self.sim.config().ranges;
        let receiver = self.selected;
        for (source, spec) in specs.iter().enumerate() {
            egui::CollapsingHeader::new(
                egui::RichText::new(format!("from {}", spec.name)).color(color32(spec.color)),
            )
            .id_salt(("pair", receiver, source))
            .default_open(source == receiver)
            .show(ui, |ui| {
                let coef = self.sim.matrix_mut().get_mut(receiver, source);
                for param in Param::ALL {
                    let r = ranges.range(param);
                    ui.add(egui::Slider::new(coef.get_mut(param), r.min..=r.max).text(param.name()));
                }
            });
        }
    }

    /// Builds the preset path field and the Save/Load buttons.
    fn ui_preset(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("path:");
            ui.text_edit_singleline(&mut self.preset_path);
        });
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.status = match self.save_preset() {
                    Ok(()) => format!("saved {}", self.preset_path),
                    Err(e) => {
                        log::warn!("save failed: {e}");
                        format!("save failed: {e}")
                    }
                };
            }
            if ui.button("Load").clicked() {
                self.status = match self.load_preset() {
                    Ok(()) => format!("loaded {}", self.preset_path),
                    Err(e) => {
                        log::warn!("load failed: {e}");
                        format!("load failed: {e}")
                    }
                };
            }
        });
    }

    /// Builds the central panel where the particle field is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
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
                    self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                    let screen_after = self.world_to_screen(world_before, rect);
                    self.pan += pointer_screen - screen_after;
                }

                // Field outline.
                let b = self.sim.config().bounds;
                let corners = [
                    Vec2::new(0.0, 0.0),
                    Vec2::new(b.width, 0.0),
                    Vec2::new(b.width, b.height),
                    Vec2::new(0.0, b.height),
                ];
                let outline: Vec<egui::Pos2> = corners
                    .iter()
                    .map(|&c| self.world_to_screen(c, rect))
                    .collect();
                painter.add(egui::Shape::closed_line(
                    outline,
                    egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
                ));

                // Particles.
                for group in self.sim.groups() {
                    let color = color32(group.color);
                    for pos in group.positions() {
                        painter.circle_filled(self.world_to_screen(pos, rect), self.point_radius, color);
                    }
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

fn color32(c: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(c.r, c.g, c.b)
}

fn is_flat_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("particle-life-viewer-{}-{name}", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new().unwrap();
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(640.5, 333.25),
        ];

        let eps = 1e-3;

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);

            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn field_center_maps_to_rect_center_without_pan() {
        let viewer = Viewer::new().unwrap();
        let rect = test_rect();

        let screen = viewer.world_to_screen(viewer.field_center(), rect);

        assert_eq!(screen, rect.center());
    }

    #[test]
    fn new_uses_default_groups() {
        let viewer = Viewer::new().unwrap();

        assert_eq!(viewer.sim.specs().len(), DEFAULT_GROUPS.len());
        assert_eq!(viewer.sim.total_particles(), 1600);
        assert!(!viewer.running);
    }

    #[test]
    fn step_once_advances_and_records_stats() {
        let mut viewer = Viewer::new().unwrap();
        for id in 0..DEFAULT_GROUPS.len() {
            viewer.sim.set_group_count(id, 20).unwrap();
        }

        viewer.step_once();

        assert_eq!(viewer.sim.ticks(), 1);
        assert_eq!(viewer.sim.total_particles(), 80);
        assert_eq!(viewer.last_stats.pairs_applied, 16);
        assert_eq!(viewer.last_stats.groups_regenerated, 4);
    }

    #[test]
    fn restart_stops_running_and_resets_ticks() {
        let mut viewer = Viewer::new().unwrap();
        viewer.sim.set_group_count(0, 10).unwrap();
        viewer.step_once();
        viewer.running = true;

        viewer.restart();

        assert!(!viewer.running);
        assert_eq!(viewer.sim.ticks(), 0);
        assert_eq!(viewer.last_stats, TickStats::default());
        assert_eq!(viewer.sim.groups()[0].len(), 10);
    }

    #[test]
    fn save_then_load_json_restores_setup() {
        let mut viewer = Viewer::new().unwrap();
        viewer.preset_path = temp_path("preset.json");
        let saved = viewer.sim.preset();
        viewer.save_preset().unwrap();

        viewer.sim.randomize();
        let mut cfg = *viewer.sim.config();
        cfg.bounds.gravity = 0.5;
        viewer.apply_config(cfg);
        viewer.load_preset().unwrap();
        let _ = std::fs::remove_file(&viewer.preset_path);

        assert_eq!(viewer.sim.preset(), saved);
    }

    #[test]
    fn save_then_load_flat_restores_numbers() {
        let mut viewer = Viewer::new().unwrap();
        viewer.preset_path = temp_path("preset.txt");
        let saved = viewer.sim.preset();
        viewer.save_preset().unwrap();

        viewer.sim.randomize();
        viewer.sim.set_group_count(2, 3).unwrap();
        viewer.load_preset().unwrap();
        let _ = std::fs::remove_file(&viewer.preset_path);

        assert_eq!(viewer.sim.preset(), saved);
    }

    #[test]
    fn apply_config_keeps_previous_settings_when_invalid() {
        let mut viewer = Viewer::new().unwrap();
        let before = *viewer.sim.config();

        let mut cfg = before;
        cfg.bounds.height = 0.0;
        viewer.apply_config(cfg);

        assert_eq!(*viewer.sim.config(), before);
        assert!(viewer.status.starts_with("rejected settings"));

        cfg.bounds.height = 640.0;
        viewer.apply_config(cfg);
        assert_eq!(viewer.sim.config().bounds.height, 640.0);
    }

    #[test]
    fn load_missing_preset_reports_error() {
        let mut viewer = Viewer::new().unwrap();
        viewer.preset_path = temp_path("missing.json");

        assert!(viewer.load_preset().is_err());
    }
}
