//! Per-frame coordination of field, ramp and equalization state
//!
//! `RenderLoop` decides which field is bound for display, starts the
//! background equalization on first use, and turns ramp edits into compiled
//! tables no faster than the coalescing window allows. It is driven once per
//! frame through [`RenderLoop::frame`] and never blocks.

use std::sync::Arc;

use egui::ColorImage;

use crate::config::ViewerConfig;
use crate::debounce::Coalescer;
use crate::error::ViewerError;
use crate::field::ScalarField;
use crate::pick::{self, PickResult};
use crate::ramp::{self, ColorRamp, Rgb};
use crate::ramp_table::RampTable;
use crate::sampler::{self, Scaling};
use crate::task::{spawn_background, EqualizeSlot, EqualizeStatus, Spawner};

/// Which field is bound for rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActiveField {
    #[default]
    Original,
    Equalized,
}

/// What changed during a frame and must be re-uploaded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    pub field_changed: bool,
    pub table_changed: bool,
    /// A background equalization finished, successfully or not
    pub status_changed: bool,
}

impl FrameUpdate {
    pub fn any(&self) -> bool {
        self.field_changed || self.table_changed
    }
}

pub struct RenderLoop {
    config: ViewerConfig,

    // === Field state ===
    original: Option<Arc<ScalarField>>,
    /// Bound field; replaced wholesale, never written through
    active: Option<Arc<ScalarField>>,
    active_kind: ActiveField,
    /// User asked for equalization (may still be computing)
    equalize_requested: bool,
    slot: EqualizeSlot,
    spawner: Spawner,
    last_error: Option<ViewerError>,

    // === Ramp state ===
    /// Ramp as currently edited
    ramp: ColorRamp,
    pending_ramp: Coalescer<ColorRamp>,
    table: RampTable,

    // === Dirty flags ===
    field_dirty: bool,
    table_dirty: bool,
    status_dirty: bool,

    /// Result of the latest pick
    query: Option<PickResult>,
}

impl RenderLoop {
    /// Render loop that equalizes in the background.
    pub fn new(config: ViewerConfig) -> Self {
        Self::with_spawner(config, Box::new(spawn_background))
    }

    /// Render loop whose equalization jobs are handed to `spawner`.
    pub fn with_spawner(config: ViewerConfig, spawner: Spawner) -> Self {
        let preset = ramp::preset(&config.initial_preset).unwrap_or_else(|| {
            log::warn!("Unknown preset '{}', using default", config.initial_preset);
            &ramp::presets()[0]
        });
        let ramp = preset.ramp();
        let table = RampTable::compile(&ramp);
        let pending_ramp = Coalescer::new(config.ramp_debounce_secs);

        Self {
            config,
            original: None,
            active: None,
            active_kind: ActiveField::Original,
            equalize_requested: false,
            slot: EqualizeSlot::new(),
            spawner,
            last_error: None,
            ramp,
            pending_ramp,
            table,
            field_dirty: false,
            table_dirty: true,
            status_dirty: false,
            query: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // =========================================================================
    // Field
    // =========================================================================

    /// Bind a freshly loaded field. Any equalization of the previous field is
    /// discarded, and the view goes back to the raw readings.
    pub fn load_field(&mut self, field: ScalarField) {
        let (min_val, max_val) = field.value_range();
        log::info!(
            "Loaded {}x{} field, range [{}, {}], {} missing",
            field.width(),
            field.height(),
            min_val,
            max_val,
            field.missing_count()
        );

        self.slot.reset();
        let field = Arc::new(field);
        self.original = Some(field.clone());
        self.active = Some(field);
        self.active_kind = ActiveField::Original;
        self.equalize_requested = false;
        self.last_error = None;
        self.query = None;
        self.field_dirty = true;
    }

    pub fn has_field(&self) -> bool {
        self.active.is_some()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.active.as_ref().map(|f| f.dimensions()).unwrap_or((0, 0))
    }

    /// The field currently bound for rendering and picking.
    pub fn active_field(&self) -> Option<&ScalarField> {
        self.active.as_deref()
    }

    pub fn active_kind(&self) -> ActiveField {
        self.active_kind
    }

    /// Finite range of the raw readings.
    pub fn value_range(&self) -> (f32, f32) {
        self.original.as_ref().map(|f| f.value_range()).unwrap_or((0.0, 1.0))
    }

    // =========================================================================
    // Equalization
    // =========================================================================

    pub fn is_equalize_requested(&self) -> bool {
        self.equalize_requested
    }

    /// True while waiting for the background job to publish.
    pub fn is_equalizing(&self) -> bool {
        self.equalize_requested && matches!(self.slot.status(), EqualizeStatus::Running)
    }

    pub fn toggle_equalization(&mut self) {
        self.set_equalization(!self.equalize_requested);
    }

    /// Switch between raw and equalized display. The first switch to
    /// equalized starts the background job; later switches reuse its result.
    pub fn set_equalization(&mut self, enabled: bool) {
        let Some(original) = self.original.clone() else {
            return;
        };
        self.equalize_requested = enabled;

        if !enabled {
            self.bind(original, ActiveField::Original);
            return;
        }

        if let Some(job) = self.slot.start(original) {
            log::debug!("Starting equalization job (generation {})", job.generation());
            (self.spawner)(job);
        }
        self.apply_equalize_status();
    }

    /// Bind the equalized field if it has been published, or give up on a failure.
    fn apply_equalize_status(&mut self) {
        if !self.equalize_requested || self.active_kind == ActiveField::Equalized {
            return;
        }
        match self.slot.status() {
            EqualizeStatus::Ready(equalized) => {
                self.bind(equalized, ActiveField::Equalized);
                self.status_dirty = true;
            }
            EqualizeStatus::Failed(e) => {
                log::warn!("Equalization unavailable: {}", e);
                self.last_error = Some(e);
                self.equalize_requested = false;
                self.status_dirty = true;
            }
            EqualizeStatus::Idle | EqualizeStatus::Running => {}
        }
    }

    fn bind(&mut self, field: Arc<ScalarField>, kind: ActiveField) {
        if self.active_kind == kind && self.active.is_some() {
            return;
        }
        self.active = Some(field);
        self.active_kind = kind;
        self.field_dirty = true;
        self.refresh_query();
    }

    /// Error from the last failed operation, if any.
    pub fn last_error(&self) -> Option<&ViewerError> {
        self.last_error.as_ref()
    }

    // =========================================================================
    // Ramp editing
    // =========================================================================

    /// The ramp as currently edited (may be ahead of the compiled table).
    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    /// The latest compiled table.
    pub fn table(&self) -> &RampTable {
        &self.table
    }

    pub fn is_ramp_pending(&self) -> bool {
        self.pending_ramp.is_pending()
    }

    /// Apply an edit and schedule a recompile. Failed edits change nothing.
    pub fn edit_ramp<T>(
        &mut self,
        now: f64,
        edit: impl FnOnce(&mut ColorRamp) -> Result<T, ViewerError>,
    ) -> Result<T, ViewerError> {
        let out = edit(&mut self.ramp)?;
        self.pending_ramp.push(now, self.ramp.clone());
        Ok(out)
    }

    pub fn set_ramp(&mut self, now: f64, ramp: ColorRamp) {
        self.ramp = ramp;
        self.pending_ramp.push(now, self.ramp.clone());
    }

    pub fn add_stop(&mut self, now: f64, after: usize) -> Result<(), ViewerError> {
        self.edit_ramp(now, |r| r.insert_after(after))
    }

    pub fn remove_stop(&mut self, now: f64, index: usize) -> Result<(), ViewerError> {
        self.edit_ramp(now, |r| r.remove(index).map(|_| ()))
    }

    pub fn recolor_stop(&mut self, now: f64, index: usize, color: Rgb) -> Result<(), ViewerError> {
        self.edit_ramp(now, |r| r.recolor(index, color))
    }

    pub fn move_stop(&mut self, now: f64, index: usize, position: f32) -> Result<(), ViewerError> {
        self.edit_ramp(now, |r| r.reposition(index, position))
    }

    /// Replace the ramp with a named preset. Returns false for unknown titles.
    pub fn use_preset(&mut self, now: f64, title: &str) -> bool {
        match ramp::preset(title) {
            Some(p) => {
                log::info!("Using ramp preset '{}'", p.title);
                self.set_ramp(now, p.ramp());
                true
            }
            None => false,
        }
    }

    /// Compile the pending ramp right away, skipping the window.
    pub fn flush_ramp(&mut self) {
        if let Some(ramp) = self.pending_ramp.flush() {
            self.recompile(&ramp);
        }
    }

    fn recompile(&mut self, ramp: &ColorRamp) {
        self.table = RampTable::compile(ramp);
        self.table_dirty = true;
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Advance one frame at time `now` (seconds) and report what changed
    /// since the previous frame.
    pub fn frame(&mut self, now: f64) -> FrameUpdate {
        self.apply_equalize_status();

        if let Some(ramp) = self.pending_ramp.poll(now) {
            self.recompile(&ramp);
        }

        let update = FrameUpdate {
            field_changed: self.field_dirty,
            table_changed: self.table_dirty,
            status_changed: self.status_dirty,
        };
        self.field_dirty = false;
        self.table_dirty = false;
        self.status_dirty = false;
        update
    }

    /// How values of the active field map onto the ramp.
    pub fn scaling(&self) -> Scaling {
        match self.active_kind {
            ActiveField::Equalized => Scaling::Equalized,
            ActiveField::Original => {
                let (min, max) = self.value_range();
                Scaling::Raw { min, max }
            }
        }
    }

    /// Colorize the active field through the compiled table.
    pub fn build_color_image(&self) -> Option<ColorImage> {
        let field = self.active.as_ref()?;
        let scaling = self.scaling();
        let rgba: Vec<u8> = field
            .values()
            .iter()
            .flat_map(|&v| sampler::colorize(&self.table, scaling, v))
            .collect();
        Some(ColorImage::from_rgba_unmultiplied(
            [field.width() as usize, field.height() as usize],
            &rgba,
        ))
    }

    // =========================================================================
    // Picking
    // =========================================================================

    /// Pick the active field at surface coordinate `(u, v)` and remember it.
    pub fn pick(&mut self, u: f32, v: f32) -> Option<PickResult> {
        self.query = self.active.as_ref().and_then(|f| pick::pick(f, u, v));
        self.query
    }

    pub fn clear_query(&mut self) {
        self.query = None;
    }

    pub fn query(&self) -> Option<PickResult> {
        self.query
    }

    /// Formatted readout of the latest pick, e.g. `0.01234 S/m`.
    pub fn query_readout(&self) -> Option<String> {
        self.query
            .map(|q| q.readout(self.config.readout_precision, &self.config.readout_unit))
    }

    /// Re-read the remembered pick from the newly bound field.
    fn refresh_query(&mut self) {
        let Some(q) = self.query else {
            return;
        };
        self.query = self
            .active
            .as_ref()
            .and_then(|f| f.get(q.location.index))
            .filter(|v| !crate::field::is_missing(*v))
            .map(|value| PickResult { value, ..q });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::equalize::{OUTPUT_MAX, OUTPUT_MIN};
    use crate::ramp::RampStop;
    use crate::task::EqualizeJob;

    type Queue = Rc<RefCell<Vec<EqualizeJob>>>;

    fn queued_loop() -> (RenderLoop, Queue) {
        let queue: Queue = Rc::new(RefCell::new(Vec::new()));
        let q = queue.clone();
        let config = ViewerConfig {
            ramp_debounce_secs: 0.1,
            ..ViewerConfig::default()
        };
        let rl = RenderLoop::with_spawner(config, Box::new(move |job| q.borrow_mut().push(job)));
        (rl, queue)
    }

    fn scenario_field() -> ScalarField {
        ScalarField::new(vec![1.0, 2.0, 3.0, 4.0, f32::NAN, 6.0, 7.0, 8.0, 9.0], 3, 3).unwrap()
    }

    fn run_all(queue: &Queue) {
        let jobs: Vec<EqualizeJob> = queue.borrow_mut().drain(..).collect();
        for job in jobs {
            job.run();
        }
    }

    #[test]
    fn test_initial_frame_uploads_table() {
        let (mut rl, _) = queued_loop();
        let update = rl.frame(0.0);
        assert!(update.table_changed);
        assert!(!update.field_changed);
        assert!(!rl.frame(0.1).any());
    }

    #[test]
    fn test_load_marks_field_dirty() {
        let (mut rl, _) = queued_loop();
        rl.load_field(scenario_field());
        assert!(rl.frame(0.0).field_changed);
        assert_eq!(rl.dimensions(), (3, 3));
        assert_eq!(rl.active_kind(), ActiveField::Original);
    }

    #[test]
    fn test_equalization_is_lazy_and_cached() {
        let (mut rl, queue) = queued_loop();
        rl.load_field(scenario_field());
        rl.frame(0.0);

        rl.toggle_equalization();
        assert_eq!(queue.borrow().len(), 1);
        assert!(rl.is_equalizing());

        // Frames keep serving the original until the job publishes
        assert!(!rl.frame(0.016).field_changed);
        assert_eq!(rl.active_kind(), ActiveField::Original);

        // A second request while running joins the in-flight job
        rl.set_equalization(true);
        assert_eq!(queue.borrow().len(), 1);

        run_all(&queue);
        assert!(rl.frame(0.032).field_changed);
        assert_eq!(rl.active_kind(), ActiveField::Equalized);
        let active = rl.active_field().unwrap();
        assert!(active.get(4).unwrap().is_nan());
        assert!(active
            .values()
            .iter()
            .filter(|v| !v.is_nan())
            .all(|v| (OUTPUT_MIN..=OUTPUT_MAX).contains(v)));

        // Off and on again: no second job
        rl.toggle_equalization();
        assert_eq!(rl.active_kind(), ActiveField::Original);
        assert_eq!(rl.active_field().unwrap().get(0), Some(1.0));
        rl.toggle_equalization();
        assert_eq!(rl.active_kind(), ActiveField::Equalized);
        assert!(queue.borrow().is_empty());
    }

    #[test]
    fn test_reload_discards_in_flight_result() {
        let (mut rl, queue) = queued_loop();
        rl.load_field(scenario_field());
        rl.set_equalization(true);

        let values = (0..16).map(|i| i as f32 * 10.0).collect();
        rl.load_field(ScalarField::new(values, 4, 4).unwrap());
        run_all(&queue);

        rl.frame(0.0);
        assert_eq!(rl.active_kind(), ActiveField::Original);
        assert_eq!(rl.dimensions(), (4, 4));
        assert!(!rl.is_equalize_requested());

        // Requesting again equalizes the new field
        rl.set_equalization(true);
        run_all(&queue);
        rl.frame(0.1);
        assert_eq!(rl.active_kind(), ActiveField::Equalized);
        assert_eq!(rl.active_field().unwrap().len(), 16);
    }

    #[test]
    fn test_failed_equalization_keeps_original() {
        let (mut rl, queue) = queued_loop();
        rl.load_field(ScalarField::new(vec![f32::NAN; 4], 2, 2).unwrap());
        rl.set_equalization(true);
        run_all(&queue);
        let update = rl.frame(0.0);

        assert!(update.status_changed);
        assert!(!update.field_changed);
        assert_eq!(rl.active_kind(), ActiveField::Original);
        assert!(!rl.is_equalize_requested());
        assert_eq!(rl.last_error(), Some(&ViewerError::EmptyField));
        assert!(!rl.frame(0.1).status_changed);
    }

    #[test]
    fn test_ramp_edits_are_coalesced() {
        let (mut rl, _) = queued_loop();
        rl.frame(0.0);
        let before = rl.table().clone();

        rl.set_ramp(1.0, ColorRamp::new(vec![RampStop::new(0.0, Rgb::BLACK)]));
        rl.recolor_stop(1.02, 0, Rgb::new(255, 0, 0)).unwrap();
        rl.recolor_stop(1.05, 0, Rgb::new(0, 255, 0)).unwrap();

        assert!(!rl.frame(1.06).table_changed);
        assert_eq!(rl.table(), &before);

        assert!(rl.frame(1.11).table_changed);
        assert_eq!(rl.table().texel(0), [0, 255, 0, 255]);
        assert!(!rl.frame(1.2).table_changed);
    }

    #[test]
    fn test_failed_edit_schedules_nothing() {
        let (mut rl, _) = queued_loop();
        rl.frame(0.0);
        assert!(rl.remove_stop(0.0, 99).is_err());
        assert!(!rl.is_ramp_pending());
    }

    #[test]
    fn test_preset_and_flush() {
        let (mut rl, _) = queued_loop();
        rl.frame(0.0);
        assert!(rl.use_preset(5.0, "AEM Legend"));
        assert!(!rl.use_preset(5.0, "missing"));
        rl.flush_ramp();
        assert!(rl.frame(5.0).table_changed);
        assert_eq!(rl.table().texel(0), [0x00, 0x00, 0x8d, 255]);
    }

    #[test]
    fn test_pick_reads_active_field() {
        let (mut rl, queue) = queued_loop();
        rl.load_field(scenario_field());

        // Top-left cell
        let r = rl.pick(0.1, 0.9).unwrap();
        assert_eq!(r.value, 1.0);
        assert_eq!(rl.query_readout().as_deref(), Some("1.00000 S/m"));

        // Center cell is missing
        assert!(rl.pick(0.5, 0.5).is_none());
        assert!(rl.query_readout().is_none());

        rl.pick(0.1, 0.9);
        rl.set_equalization(true);
        run_all(&queue);
        rl.frame(0.0);
        assert_eq!(rl.query().unwrap().value, OUTPUT_MIN);
    }

    #[test]
    fn test_color_image_has_transparent_holes() {
        let (mut rl, _) = queued_loop();
        rl.load_field(scenario_field());
        let image = rl.build_color_image().unwrap();
        assert_eq!(image.size, [3, 3]);
        assert_eq!(image.pixels[4].a(), 0);
        assert_eq!(image.pixels[0].a(), 255);
    }
}
