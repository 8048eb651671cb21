//! SurveyViewerWidget - A self-contained egui widget for viewing AEM survey grids
//!
//! This widget owns a [`RenderLoop`] and the pan/zoom state of the surface it
//! draws. It uploads the colorized field and the ramp preview as textures,
//! turns hover positions into picks and hosts the ramp editor overlay.
//! Multiple instances can be used side-by-side without sharing state.

use std::time::Duration;

use egui::{Color32, Key, PointerButton, Pos2, Rect, Response, TextureHandle, TextureOptions, Ui, Vec2};
use serde_json::json;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::field::ScalarField;
use crate::pick::PickResult;
use crate::ramp::{self, ColorRamp, Rgb};
use crate::ramp_table::RampTable;
use crate::render_loop::{ActiveField, RenderLoop};
use crate::view::{self, SurfaceView};

/// Duration to show zoom level overlay after zooming
const ZOOM_OVERLAY_DURATION: f64 = 0.5;
/// Polling interval while the equalization job is in flight
const EQUALIZE_POLL: Duration = Duration::from_millis(50);
/// Size of the ramp preview strip in the editor
const RAMP_STRIP_SIZE: Vec2 = Vec2::new(220.0, 14.0);

/// Actions returned from zoom controls overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ZoomAction {
    None,
    ZoomIn,
    ZoomOut,
    Reset,
}

/// Actions returned from the ramp editor overlay
#[derive(Clone, Copy, Debug, PartialEq)]
enum RampAction {
    None,
    ToggleEqualization,
    ToggleEditor,
    Preset(&'static str),
    AddAfter(usize),
    Remove(usize),
    Recolor(usize, Rgb),
    Move(usize, f32),
}

/// A self-contained widget for viewing one survey grid.
pub struct SurveyViewerWidget {
    /// Field, ramp and equalization state
    render: RenderLoop,

    // === View transformation ===
    view: SurfaceView,
    /// Widget rect from the last frame, used by zoom calls from outside
    last_viewport: Option<Rect>,

    // === Textures ===
    /// Colorized active field
    texture: Option<TextureHandle>,
    /// Unfolded ramp table shown in the editor
    ramp_texture: Option<TextureHandle>,

    // === UI state ===
    show_ramp_editor: bool,
    /// Frame clock of the latest frame, stamps edits arriving between frames
    clock: f64,
    /// Context of the latest frame, to wake the loop after outside edits
    ctx: Option<egui::Context>,
    /// Time when zoom last changed (for showing zoom overlay)
    zoom_changed_time: Option<f64>,
    /// Previous zoom level (to detect changes)
    prev_zoom_level: f32,

    // === Outbound notifications ===
    /// Pick made by a click, waiting to be reported
    clicked: Option<PickResult>,
    /// Something a host might display changed
    state_changed: bool,
}

impl Default for SurveyViewerWidget {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl SurveyViewerWidget {
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_render_loop(RenderLoop::new(config))
    }

    /// Widget around an existing render loop (tests inject their own spawner).
    pub fn with_render_loop(render: RenderLoop) -> Self {
        Self {
            render,
            view: SurfaceView::new(),
            last_viewport: None,
            texture: None,
            ramp_texture: None,
            show_ramp_editor: true,
            clock: 0.0,
            ctx: None,
            zoom_changed_time: None,
            prev_zoom_level: 1.0,
            clicked: None,
            state_changed: false,
        }
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    // =========================================================================
    // Field
    // =========================================================================

    /// Display a new field, resetting the view to fit.
    pub fn set_field(&mut self, field: ScalarField) {
        self.render.load_field(field);
        self.view.reset();
        self.changed();
    }

    pub fn has_field(&self) -> bool {
        self.render.has_field()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.render.dimensions()
    }

    pub fn value_range(&self) -> (f32, f32) {
        self.render.value_range()
    }

    // =========================================================================
    // Equalization
    // =========================================================================

    pub fn toggle_equalization(&mut self) {
        self.render.toggle_equalization();
        self.changed();
    }

    pub fn set_equalization(&mut self, enabled: bool) {
        self.render.set_equalization(enabled);
        self.changed();
    }

    /// Whether equalization is requested (it may still be computing).
    pub fn is_equalized(&self) -> bool {
        self.render.is_equalize_requested()
    }

    pub fn is_equalizing(&self) -> bool {
        self.render.is_equalizing()
    }

    pub fn last_error(&self) -> Option<&ViewerError> {
        self.render.last_error()
    }

    // =========================================================================
    // Ramp
    // =========================================================================

    pub fn ramp(&self) -> &ColorRamp {
        self.render.ramp()
    }

    pub fn set_ramp(&mut self, ramp: ColorRamp) {
        self.render.set_ramp(self.clock, ramp);
        self.changed();
    }

    pub fn add_stop(&mut self, after: usize) -> Result<(), ViewerError> {
        self.render.add_stop(self.clock, after)?;
        self.changed();
        Ok(())
    }

    pub fn remove_stop(&mut self, index: usize) -> Result<(), ViewerError> {
        self.render.remove_stop(self.clock, index)?;
        self.changed();
        Ok(())
    }

    pub fn recolor_stop(&mut self, index: usize, color: Rgb) -> Result<(), ViewerError> {
        self.render.recolor_stop(self.clock, index, color)?;
        self.changed();
        Ok(())
    }

    pub fn move_stop(&mut self, index: usize, position: f32) -> Result<(), ViewerError> {
        self.render.move_stop(self.clock, index, position)?;
        self.changed();
        Ok(())
    }

    pub fn use_preset(&mut self, title: &str) -> bool {
        let found = self.render.use_preset(self.clock, title);
        if found {
            self.changed();
        }
        found
    }

    /// The compiled table, including any edit still inside the coalescing window.
    pub fn ramp_table(&mut self) -> &RampTable {
        self.render.flush_ramp();
        self.render.table()
    }

    // =========================================================================
    // Picking
    // =========================================================================

    /// Latest hover pick.
    pub fn query(&self) -> Option<PickResult> {
        self.render.query()
    }

    pub fn query_readout(&self) -> Option<String> {
        self.render.query_readout()
    }

    /// Take the pick made by the latest click, if not yet reported.
    pub fn take_clicked(&mut self) -> Option<PickResult> {
        self.clicked.take()
    }

    /// Check and clear the state-changed flag.
    pub fn take_state_changed(&mut self) -> bool {
        std::mem::take(&mut self.state_changed)
    }

    /// Snapshot handed to state-change listeners.
    pub fn state_json(&self) -> serde_json::Value {
        let (width, height) = self.dimensions();
        let (vmin, vmax) = self.value_range();
        json!({
            "width": width,
            "height": height,
            "vmin": vmin,
            "vmax": vmax,
            "equalized": self.is_equalized(),
            "equalizing": self.is_equalizing(),
            "zoom": self.zoom_level(),
            "ramp": self.ramp(),
            "error": self.last_error().map(|e| e.to_string()),
        })
    }

    /// Pick as handed to pick listeners.
    pub fn pick_json(&self, pick: &PickResult) -> serde_json::Value {
        let config = self.render.config();
        json!({
            "x": pick.location.x,
            "y": pick.location.y,
            "index": pick.location.index,
            "value": pick.value,
            "readout": pick.readout(config.readout_precision, &config.readout_unit),
        })
    }

    // =========================================================================
    // View
    // =========================================================================

    fn viewport_center(&self) -> Pos2 {
        self.last_viewport.map(|r| r.center()).unwrap_or(Pos2::ZERO)
    }

    pub fn zoom_in(&mut self) {
        let c = self.viewport_center();
        self.view.zoom_in(c, c);
        self.changed();
    }

    pub fn zoom_out(&mut self) {
        let c = self.viewport_center();
        self.view.zoom_out(c, c);
        self.changed();
    }

    pub fn zoom_to_fit(&mut self) {
        self.view.reset();
        self.changed();
    }

    /// Zoom level relative to fit-to-view
    pub fn zoom_level(&self) -> f32 {
        self.view.zoom
    }

    /// Set the zoom level, keeping the viewport center fixed.
    pub fn set_zoom(&mut self, level: f32) {
        if !level.is_finite() || level <= 0.0 {
            return;
        }
        let c = self.viewport_center();
        self.view.zoom_around_point(level / self.view.zoom, c, c);
        self.changed();
    }

    pub fn is_default_view(&self) -> bool {
        self.view.is_default()
    }

    /// Mark state as changed and wake the render loop.
    fn changed(&mut self) {
        self.state_changed = true;
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }

    // =========================================================================
    // Textures
    // =========================================================================

    fn rebuild_texture(&mut self, ctx: &egui::Context) {
        self.texture = self
            .render
            .build_color_image()
            .map(|image| ctx.load_texture("survey_field", image, TextureOptions::NEAREST));
    }

    fn rebuild_ramp_texture(&mut self, ctx: &egui::Context) {
        let image = self.render.table().to_strip_image();
        self.ramp_texture = Some(ctx.load_texture("ramp_strip", image, TextureOptions::NEAREST));
    }

    // =========================================================================
    // Main rendering
    // =========================================================================

    /// Show the widget, rendering into the given UI with a specified container size.
    pub fn show(&mut self, ui: &mut Ui, container_size: Vec2) -> Response {
        let ctx = ui.ctx().clone();
        let now = ctx.input(|i| i.time);
        self.clock = now;
        self.ctx = Some(ctx.clone());

        let update = self.render.frame(now);
        if update.any() {
            self.rebuild_texture(&ctx);
            self.state_changed = true;
        }
        if update.status_changed {
            self.state_changed = true;
        }
        if update.table_changed {
            self.rebuild_ramp_texture(&ctx);
        }

        // Keep polling while something completes off-frame
        if self.render.is_equalizing() {
            ctx.request_repaint_after(EQUALIZE_POLL);
        }
        if self.render.is_ramp_pending() {
            let window = self.render.config().ramp_debounce_secs;
            ctx.request_repaint_after(Duration::from_secs_f64(window));
        }

        let (rect, response) = ui.allocate_exact_size(container_size, egui::Sense::click_and_drag());
        self.last_viewport = Some(rect);

        self.handle_keyboard_input(&ctx, rect.center());

        let ramp_action = self.render_ramp_editor(&ctx, rect);
        self.apply_ramp_action(ramp_action);

        if !self.has_field() {
            let painter = ui.painter_at(rect);
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "No survey grid loaded",
                egui::FontId::default(),
                ui.style().visuals.text_color(),
            );
            self.render_build_info(&ctx, rect);
            return response;
        }

        let field_size = self.dimensions();
        let base_size = SurfaceView::fit_size(container_size, field_size);
        let surface = self.view.surface_rect(rect, base_size);
        let viewport_center = rect.center();

        // Field row 0 is the top of the surface, as in the texture
        if let Some(texture) = &self.texture {
            let painter = ui.painter_at(rect);
            painter.image(
                texture.id(),
                surface,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // Handle pinch / ctrl-wheel zoom
        let zoom_delta = ui.input(|i| i.zoom_delta());
        if zoom_delta != 1.0 {
            if let Some(pointer_pos) = ui.input(|i| i.pointer.latest_pos()) {
                if rect.contains(pointer_pos) {
                    self.view.zoom_around_point(zoom_delta, pointer_pos, viewport_center);
                }
            }
        }

        // Handle scroll wheel
        let scroll_delta = ui.input(|i| i.raw_scroll_delta);
        if scroll_delta.y != 0.0 && zoom_delta == 1.0 {
            if let Some(pointer_pos) = ui.input(|i| i.pointer.latest_pos()) {
                if rect.contains(pointer_pos) {
                    let zoom_factor = if scroll_delta.y > 0.0 {
                        view::SCROLL_ZOOM_STEP
                    } else {
                        1.0 / view::SCROLL_ZOOM_STEP
                    };
                    self.view.zoom_around_point(zoom_factor, pointer_pos, viewport_center);
                }
            }
        }

        // Handle pan via drag
        if response.dragged_by(PointerButton::Primary) || response.dragged_by(PointerButton::Middle) {
            let drag_delta = response.drag_delta();
            if drag_delta != Vec2::ZERO {
                self.view.pan_by(drag_delta);
                self.state_changed = true;
            }
        }

        // Hover picks the active field under the pointer
        match response
            .hover_pos()
            .and_then(|pos| self.view.screen_to_surface(pos, surface))
        {
            Some((u, v)) => {
                self.render.pick(u, v);
            }
            None => self.render.clear_query(),
        }

        if response.clicked() {
            if let Some(pick) = self.render.query() {
                log::debug!("Picked {}", pick);
                self.clicked = Some(pick);
            }
        }

        // Track zoom changes for overlay display
        let current_zoom = self.zoom_level();
        if (current_zoom - self.prev_zoom_level).abs() > 0.001 {
            self.zoom_changed_time = Some(now);
            self.prev_zoom_level = current_zoom;
            self.state_changed = true;
        }

        let zoom_action = self.render_zoom_controls(&ctx, rect);
        self.render_status_overlay(&ctx, rect);
        self.render_zoom_info_overlay(&ctx, rect, now);
        self.render_hover_overlay(&ctx, rect);
        self.render_build_info(&ctx, rect);

        match zoom_action {
            ZoomAction::None => {}
            ZoomAction::ZoomIn => self.view.zoom_in(viewport_center, viewport_center),
            ZoomAction::ZoomOut => self.view.zoom_out(viewport_center, viewport_center),
            ZoomAction::Reset => self.view.reset(),
        }

        response
    }

    /// Keyboard shortcuts: E toggles equalization, +/-/0 zoom.
    fn handle_keyboard_input(&mut self, ctx: &egui::Context, viewport_center: Pos2) {
        // Leave keys alone while a text field or drag value has focus
        if ctx.wants_keyboard_input() {
            return;
        }

        let (toggle, zoom_in, zoom_out, reset) = ctx.input(|i| {
            (
                i.key_pressed(Key::E),
                i.key_pressed(Key::Equals) || i.key_pressed(Key::Plus),
                i.key_pressed(Key::Minus),
                i.key_pressed(Key::Num0),
            )
        });

        if toggle && self.has_field() {
            self.toggle_equalization();
        }
        if zoom_in {
            self.view.zoom_in(viewport_center, viewport_center);
        }
        if zoom_out {
            self.view.zoom_out(viewport_center, viewport_center);
        }
        if reset {
            self.view.reset();
        }
    }

    fn apply_ramp_action(&mut self, action: RampAction) {
        let result = match action {
            RampAction::None => Ok(()),
            RampAction::ToggleEqualization => {
                self.toggle_equalization();
                Ok(())
            }
            RampAction::ToggleEditor => {
                self.show_ramp_editor = !self.show_ramp_editor;
                Ok(())
            }
            RampAction::Preset(title) => {
                self.use_preset(title);
                Ok(())
            }
            RampAction::AddAfter(i) => self.add_stop(i),
            RampAction::Remove(i) => self.remove_stop(i),
            RampAction::Recolor(i, color) => self.recolor_stop(i, color),
            RampAction::Move(i, position) => self.move_stop(i, position),
        };
        if let Err(e) = result {
            log::warn!("Ramp edit rejected: {}", e);
        }
    }

    // =========================================================================
    // Overlays
    // =========================================================================

    /// Render zoom control buttons at bottom-right of widget.
    /// Returns an action to be applied after rendering.
    fn render_zoom_controls(&self, ctx: &egui::Context, widget_rect: Rect) -> ZoomAction {
        let button_size = egui::vec2(28.0, 28.0);
        let margin = 10.0;
        let spacing = 4.0;

        let num_buttons = 3.0;
        let base_x = widget_rect.max.x - margin - button_size.x * num_buttons - spacing * (num_buttons - 1.0);
        let base_y = widget_rect.max.y - margin - button_size.y;

        let mut action = ZoomAction::None;

        egui::Area::new(egui::Id::new("zoom_controls"))
            .fixed_pos(egui::pos2(base_x, base_y))
            .show(ctx, |ui| {
                let text_color = get_overlay_text_color(ui);

                overlay_frame(ui).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = spacing;

                        let can_reset = !self.is_default_view();
                        let reset_color = if can_reset { text_color } else { text_color.gamma_multiply(0.3) };
                        let reset_btn = egui::Button::new(egui::RichText::new("⟲").color(reset_color))
                            .fill(Color32::TRANSPARENT);
                        if ui.add_sized(button_size, reset_btn).clicked() && can_reset {
                            action = ZoomAction::Reset;
                        }

                        let minus_btn = egui::Button::new(egui::RichText::new("−").color(text_color))
                            .fill(Color32::TRANSPARENT);
                        if ui.add_sized(button_size, minus_btn).clicked() {
                            action = ZoomAction::ZoomOut;
                        }

                        let plus_btn = egui::Button::new(egui::RichText::new("+").color(text_color))
                            .fill(Color32::TRANSPARENT);
                        if ui.add_sized(button_size, plus_btn).clicked() {
                            action = ZoomAction::ZoomIn;
                        }
                    });
                });
            });

        action
    }

    /// Render the equalize toggle, preset picker and stop list at top-right.
    /// Returns an action to be applied after rendering.
    fn render_ramp_editor(&self, ctx: &egui::Context, widget_rect: Rect) -> RampAction {
        let margin = 10.0;
        let mut action = RampAction::None;

        egui::Area::new(egui::Id::new("ramp_editor"))
            .fixed_pos(egui::pos2(widget_rect.max.x - margin - 260.0, widget_rect.min.y + margin))
            .show(ctx, |ui| {
                let text_color = get_overlay_text_color(ui);

                overlay_frame(ui).show(ui, |ui| {
                    ui.set_width(248.0);

                    ui.horizontal(|ui| {
                        let eq_label = egui::RichText::new("Equalize").color(text_color);
                        let eq = ui
                            .add_enabled_ui(self.has_field(), |ui| {
                                ui.selectable_label(self.is_equalized(), eq_label)
                            })
                            .inner;
                        if eq.on_hover_text("Histogram equalization (E)").clicked() {
                            action = RampAction::ToggleEqualization;
                        }
                        if self.is_equalizing() {
                            ui.spinner();
                        }

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let arrow = if self.show_ramp_editor { "▾" } else { "▸" };
                            let label = egui::RichText::new(format!("Ramp {}", arrow)).color(text_color);
                            if ui.selectable_label(self.show_ramp_editor, label).clicked() {
                                action = RampAction::ToggleEditor;
                            }
                        });
                    });

                    if let Some(texture) = &self.ramp_texture {
                        ui.add(egui::Image::new((texture.id(), RAMP_STRIP_SIZE)));
                    }

                    if !self.show_ramp_editor {
                        return;
                    }

                    egui::ComboBox::from_id_salt("ramp_preset")
                        .selected_text("Preset")
                        .show_ui(ui, |ui| {
                            for preset in ramp::presets() {
                                if ui.selectable_label(false, preset.title).clicked() {
                                    action = RampAction::Preset(preset.title);
                                }
                            }
                        });

                    ui.separator();

                    let stops = self.ramp().stops();
                    for (i, stop) in stops.iter().enumerate() {
                        ui.horizontal(|ui| {
                            let mut rgb = stop.color.0;
                            if ui.color_edit_button_srgb(&mut rgb).changed() {
                                action = RampAction::Recolor(i, Rgb(rgb));
                            }

                            let mut position = stop.position;
                            let drag = egui::DragValue::new(&mut position)
                                .range(0.0..=1.0)
                                .speed(0.005)
                                .fixed_decimals(3);
                            if ui.add(drag).changed() {
                                action = RampAction::Move(i, position);
                            }

                            ui.label(egui::RichText::new(stop.color.to_string()).color(text_color).monospace());

                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.small_button("−").on_hover_text("Remove stop").clicked() {
                                    action = RampAction::Remove(i);
                                }
                                if ui.small_button("+").on_hover_text("Add stop after").clicked() {
                                    action = RampAction::AddAfter(i);
                                }
                            });
                        });
                    }

                    if stops.is_empty() && ui.button("Add stop").clicked() {
                        action = RampAction::AddAfter(0);
                    }
                });
            });

        action
    }

    /// Equalization progress or failure, centered at the top
    fn render_status_overlay(&self, ctx: &egui::Context, widget_rect: Rect) {
        let text = if self.is_equalizing() {
            "Equalizing…".to_string()
        } else if let Some(e) = self.last_error().filter(|_| self.render.active_kind() == ActiveField::Original) {
            format!("Equalization failed: {}", e)
        } else {
            return;
        };

        egui::Area::new(egui::Id::new("status_overlay"))
            .fixed_pos(egui::pos2(widget_rect.min.x + 10.0, widget_rect.min.y + 10.0))
            .show(ctx, |ui| {
                let text_color = get_overlay_text_color(ui);
                let bg = get_overlay_bg(ui);
                egui::Frame::popup(ui.style()).fill(bg).show(ui, |ui| {
                    ui.style_mut().wrap_mode = Some(egui::TextWrapMode::Extend);
                    ui.label(egui::RichText::new(text).color(text_color));
                });
            });
    }

    /// Render zoom level overlay while zooming
    fn render_zoom_info_overlay(&self, ctx: &egui::Context, widget_rect: Rect, current_time: f64) {
        let should_show = match self.zoom_changed_time {
            Some(changed_time) => (current_time - changed_time) < ZOOM_OVERLAY_DURATION,
            None => false,
        };
        if !should_show {
            return;
        }
        ctx.request_repaint_after(Duration::from_secs_f64(ZOOM_OVERLAY_DURATION));

        let zoom_text = format_zoom_multiple(self.zoom_level());

        egui::Area::new(egui::Id::new("zoom_info_overlay"))
            .fixed_pos(egui::pos2(widget_rect.center().x - 50.0, widget_rect.center().y - 20.0))
            .show(ctx, |ui| {
                let text_color = get_overlay_text_color(ui);
                let bg = get_overlay_bg(ui);
                egui::Frame::popup(ui.style())
                    .fill(bg)
                    .corner_radius(8.0)
                    .inner_margin(egui::Margin::symmetric(16, 8))
                    .show(ui, |ui| {
                        ui.style_mut().wrap_mode = Some(egui::TextWrapMode::Extend);
                        ui.label(egui::RichText::new(zoom_text).color(text_color).size(24.0));
                    });
            });
    }

    /// Render build info at bottom-left of widget
    fn render_build_info(&self, ctx: &egui::Context, widget_rect: Rect) {
        if !self.render.config().show_build_info {
            return;
        }
        let margin = 10.0;

        egui::Area::new(egui::Id::new("build_info"))
            .fixed_pos(egui::pos2(widget_rect.min.x + margin, widget_rect.max.y - margin - 20.0))
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(build_info())
                        .color(Color32::from_white_alpha(80))
                        .small(),
                );
            });
    }

    /// Render the pick readout above the build info
    fn render_hover_overlay(&self, ctx: &egui::Context, widget_rect: Rect) {
        let Some(pick) = self.query() else {
            return;
        };
        let config = self.render.config();
        let text = format_readout(&pick, config.readout_precision, &config.readout_unit);

        egui::Area::new(egui::Id::new("hover_overlay"))
            .fixed_pos(egui::pos2(widget_rect.min.x + 10.0, widget_rect.max.y - 60.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.style_mut().wrap_mode = Some(egui::TextWrapMode::Extend);
                    ui.label(egui::RichText::new(text).monospace());
                });
            });
    }
}

/// `[x, y, index] = value unit`
fn format_readout(pick: &PickResult, precision: usize, unit: &str) -> String {
    let l = pick.location;
    format!("[{}, {}, {}] = {}", l.x, l.y, l.index, pick.readout(precision, unit))
}

fn build_info() -> String {
    format!("aemview {} · {}", env!("CARGO_PKG_VERSION"), env!("BUILD_TIMESTAMP"))
}

/// Get a translucent background color appropriate for light/dark mode
fn get_overlay_bg(ui: &Ui) -> Color32 {
    if ui.visuals().dark_mode {
        Color32::from_black_alpha(180)
    } else {
        Color32::from_white_alpha(220)
    }
}

/// Get text color appropriate for light/dark mode overlays
fn get_overlay_text_color(ui: &Ui) -> Color32 {
    if ui.visuals().dark_mode {
        Color32::WHITE
    } else {
        Color32::from_gray(30)
    }
}

/// Create a frame style for overlay controls that adapts to light/dark mode
fn overlay_frame(ui: &Ui) -> egui::Frame {
    egui::Frame::new()
        .fill(get_overlay_bg(ui))
        .corner_radius(4.0)
        .inner_margin(egui::Margin::symmetric(6, 4))
}

fn format_zoom_multiple(zoom: f32) -> String {
    format!("{:.3}x", zoom)
}
