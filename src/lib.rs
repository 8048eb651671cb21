//! aemview - A browser-based viewer for airborne electromagnetic survey grids
//!
//! Conductivity sections arrive from JavaScript as flat `f32` grids. They are
//! colorized through an editable color ramp, optionally after histogram
//! equalization, and hovering the surface reads back the raw value under the
//! pointer.
//!
//! ## Architecture
//!
//! - [`field`], [`ramp`], [`ramp_table`], [`equalize`], [`sampler`], [`pick`]:
//!   the data model and the pure transforms between field values, ramp
//!   positions and colors
//! - [`render_loop::RenderLoop`]: per-frame state owner, with background
//!   equalization ([`task`]) and coalesced ramp recompiles ([`debounce`])
//! - `SurveyViewerWidget`: Self-contained egui widget with all viewing state
//! - `ViewerApp`: Thin eframe App shell that hosts the widget
//! - `ViewerHandle`: WASM interface for JavaScript to control the viewer

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use web_sys::HtmlCanvasElement;

#[cfg(target_arch = "wasm32")]
mod app;
pub mod config;
pub mod debounce;
pub mod equalize;
pub mod error;
pub mod field;
pub mod pick;
pub mod ramp;
pub mod ramp_table;
pub mod render_loop;
pub mod sampler;
pub mod task;
pub mod view;
mod widget;

pub use config::ViewerConfig;
pub use error::ViewerError;
pub use field::ScalarField;
pub use ramp::{ColorRamp, RampStop, Rgb};
pub use widget::SurveyViewerWidget;

#[cfg(target_arch = "wasm32")]
use app::ViewerApp;

/// Callbacks that can be registered from JavaScript
#[cfg(target_arch = "wasm32")]
#[derive(Default)]
pub struct ViewerCallbacks {
    /// Called when viewer state changes (equalization, ramp, zoom, pan)
    pub on_state_change: Option<js_sys::Function>,
    /// Called when the user clicks on the surface (with cell and value)
    pub on_pick: Option<js_sys::Function>,
}

/// A handle to a viewer instance. Each handle manages its own canvas and state.
///
/// It holds an Rc to the widget so it can call methods on it, and also stores
/// the eframe runner for the application lifecycle.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct ViewerHandle {
    /// The widget instance (shared with ViewerApp)
    widget: Rc<RefCell<SurveyViewerWidget>>,
    /// Callbacks registered from JavaScript
    callbacks: Rc<RefCell<ViewerCallbacks>>,
    /// The eframe runner (kept alive to maintain the render loop)
    runner: eframe::WebRunner,
}

#[cfg(target_arch = "wasm32")]
fn js_err(e: ViewerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl ViewerHandle {
    /// Create a new viewer instance attached to the given canvas element.
    ///
    /// `config_json` is an optional JSON object of viewer settings, e.g.
    /// `{ "rampDebounceSecs": 0.2, "initialPreset": "AEM Legend" }`.
    #[wasm_bindgen]
    pub async fn create(canvas: HtmlCanvasElement, config_json: Option<String>) -> Result<ViewerHandle, JsValue> {
        #[cfg(debug_assertions)]
        {
            eframe::WebLogger::init(log::LevelFilter::Debug).ok();
        }
        #[cfg(not(debug_assertions))]
        {
            eframe::WebLogger::init(log::LevelFilter::Warn).ok();
        }

        let config = ViewerConfig::from_json(config_json.as_deref().unwrap_or("")).map_err(js_err)?;

        // Create the widget that will be shared between the handle and the app
        let widget = Rc::new(RefCell::new(SurveyViewerWidget::new(config)));
        let widget_for_app = widget.clone();

        let callbacks = Rc::new(RefCell::new(ViewerCallbacks::default()));
        let callbacks_for_app = callbacks.clone();

        let web_options = eframe::WebOptions::default();
        let runner = eframe::WebRunner::new();

        runner
            .start(
                canvas,
                web_options,
                Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, widget_for_app.clone(), callbacks_for_app.clone())))),
            )
            .await?;

        Ok(ViewerHandle { widget, callbacks, runner })
    }

    /// Set the grid to display.
    ///
    /// # Arguments
    /// * `buffer` - ArrayBuffer of `f32` samples in row-major order, top row first;
    ///   NaN marks a missing sample
    /// * `width` - Samples per row
    /// * `height` - Number of rows
    #[wasm_bindgen(js_name = setFieldData)]
    pub fn set_field_data(&self, buffer: &js_sys::ArrayBuffer, width: u32, height: u32) -> Result<(), JsValue> {
        let values = js_sys::Float32Array::new(buffer).to_vec();
        let field = ScalarField::new(values, width, height).map_err(js_err)?;
        self.widget.borrow_mut().set_field(field);
        Ok(())
    }

    /// Set the grid from raw little-endian `f32` bytes, as read from a `.bin` file.
    #[wasm_bindgen(js_name = setFieldBytes)]
    pub fn set_field_bytes(&self, bytes: &[u8], width: u32, height: u32) -> Result<(), JsValue> {
        let field = ScalarField::from_le_bytes(bytes, width, height).map_err(js_err)?;
        self.widget.borrow_mut().set_field(field);
        Ok(())
    }

    /// End event loop and release resources
    #[wasm_bindgen(js_name = destroy)]
    pub fn destroy(&self) {
        self.runner.destroy();
    }

    /// Get the finite value range of the loaded grid as [min, max]
    #[wasm_bindgen(js_name = getValueRange)]
    pub fn get_value_range(&self) -> js_sys::Float32Array {
        let (min_val, max_val) = self.widget.borrow().value_range();
        let result = js_sys::Float32Array::new_with_length(2);
        result.copy_from(&[min_val, max_val]);
        result
    }

    // =========================================================================
    // Equalization
    // =========================================================================

    /// Switch between raw and histogram-equalized display
    #[wasm_bindgen(js_name = toggleEqualization)]
    pub fn toggle_equalization(&self) {
        self.widget.borrow_mut().toggle_equalization();
    }

    #[wasm_bindgen(js_name = setEqualization)]
    pub fn set_equalization(&self, enabled: bool) {
        self.widget.borrow_mut().set_equalization(enabled);
    }

    /// Whether equalized display is requested; it may still be computing
    #[wasm_bindgen(js_name = isEqualized)]
    pub fn is_equalized(&self) -> bool {
        self.widget.borrow().is_equalized()
    }

    #[wasm_bindgen(js_name = isEqualizing)]
    pub fn is_equalizing(&self) -> bool {
        self.widget.borrow().is_equalizing()
    }

    // =========================================================================
    // Ramp editing
    // =========================================================================

    /// Get the ramp as a JSON array of `{ position, color }` stops
    #[wasm_bindgen(js_name = getRamp)]
    pub fn get_ramp(&self) -> String {
        self.widget.borrow().ramp().to_json()
    }

    /// Replace the whole ramp from a JSON array of `{ position, color }` stops
    #[wasm_bindgen(js_name = setRamp)]
    pub fn set_ramp(&self, json: &str) -> Result<(), JsValue> {
        let ramp = ColorRamp::from_json(json).map_err(js_err)?;
        self.widget.borrow_mut().set_ramp(ramp);
        Ok(())
    }

    /// Insert a white stop at position 0 after `index`
    #[wasm_bindgen(js_name = addStop)]
    pub fn add_stop(&self, index: usize) -> Result<(), JsValue> {
        self.widget.borrow_mut().add_stop(index).map_err(js_err)
    }

    #[wasm_bindgen(js_name = removeStop)]
    pub fn remove_stop(&self, index: usize) -> Result<(), JsValue> {
        self.widget.borrow_mut().remove_stop(index).map_err(js_err)
    }

    /// Recolor a stop from a `#rrggbb` string
    #[wasm_bindgen(js_name = recolorStop)]
    pub fn recolor_stop(&self, index: usize, color: &str) -> Result<(), JsValue> {
        let color: Rgb = color.parse().map_err(js_err)?;
        self.widget.borrow_mut().recolor_stop(index, color).map_err(js_err)
    }

    /// Move a stop; positions are clamped to [0, 1]
    #[wasm_bindgen(js_name = moveStop)]
    pub fn move_stop(&self, index: usize, position: f32) -> Result<(), JsValue> {
        self.widget.borrow_mut().move_stop(index, position).map_err(js_err)
    }

    /// Load a built-in ramp by title. Returns false for unknown titles.
    #[wasm_bindgen(js_name = usePreset)]
    pub fn use_preset(&self, title: &str) -> bool {
        self.widget.borrow_mut().use_preset(title)
    }

    /// Titles of the built-in ramps
    #[wasm_bindgen(js_name = getPresets)]
    pub fn get_presets(&self) -> Vec<String> {
        ramp::presets().iter().map(|p| p.title.to_string()).collect()
    }

    /// The compiled 16x16 RGBA ramp table (1024 bytes)
    #[wasm_bindgen(js_name = getRampTable)]
    pub fn get_ramp_table(&self) -> js_sys::Uint8Array {
        let bytes = self.widget.borrow_mut().ramp_table().as_bytes();
        js_sys::Uint8Array::from(bytes.as_slice())
    }

    // =========================================================================
    // Picking
    // =========================================================================

    /// Readout of the cell under the pointer, e.g. `0.01234 S/m`, or undefined
    #[wasm_bindgen(js_name = getQueryResult)]
    pub fn get_query_result(&self) -> Option<String> {
        self.widget.borrow().query_readout()
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Zoom in by one step (1.25x)
    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.widget.borrow_mut().zoom_in();
    }

    /// Zoom out by one step (1/1.25x)
    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.widget.borrow_mut().zoom_out();
    }

    /// Reset zoom and pan to fit-to-view
    #[wasm_bindgen(js_name = zoomToFit)]
    pub fn zoom_to_fit(&self) {
        self.widget.borrow_mut().zoom_to_fit();
    }

    /// Set zoom level directly (1.0 = fit to view)
    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, level: f32) {
        self.widget.borrow_mut().set_zoom(level);
    }

    /// Get current zoom level (1.0 = fit to view)
    #[wasm_bindgen(js_name = getZoom)]
    pub fn get_zoom(&self) -> f32 {
        self.widget.borrow().zoom_level()
    }

    // =========================================================================
    // Callback registration
    // =========================================================================

    /// Register a callback to be called when viewer state changes.
    /// The callback receives:
    /// { width, height, vmin, vmax, equalized, equalizing, zoom, ramp, error }
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&self, callback: js_sys::Function) {
        self.callbacks.borrow_mut().on_state_change = Some(callback);
    }

    /// Register a callback to be called when the user clicks on the surface.
    /// The callback receives: { x, y, index, value, readout }.
    #[wasm_bindgen(js_name = onPick)]
    pub fn on_pick(&self, callback: js_sys::Function) {
        self.callbacks.borrow_mut().on_pick = Some(callback);
    }

    /// Clear all registered callbacks.
    #[wasm_bindgen(js_name = clearCallbacks)]
    pub fn clear_callbacks(&self) {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks.on_state_change = None;
        callbacks.on_pick = None;
    }
}
