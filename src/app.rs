//! eframe application shell hosting one [`SurveyViewerWidget`]

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;

use crate::widget::SurveyViewerWidget;
use crate::ViewerCallbacks;

/// Thin App around the widget. The widget is shared with the JavaScript
/// handle, which mutates it between frames.
pub struct ViewerApp {
    widget: Rc<RefCell<SurveyViewerWidget>>,
    callbacks: Rc<RefCell<ViewerCallbacks>>,
}

impl ViewerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        widget: Rc<RefCell<SurveyViewerWidget>>,
        callbacks: Rc<RefCell<ViewerCallbacks>>,
    ) -> Self {
        Self { widget, callbacks }
    }

    /// Report clicks and state changes collected during the frame.
    fn notify(&self) {
        // Build payloads first so no widget borrow is held while JS runs
        let (clicked, state) = {
            let mut widget = self.widget.borrow_mut();
            let clicked = widget.take_clicked().map(|p| widget.pick_json(&p));
            let state = widget.take_state_changed().then(|| widget.state_json());
            (clicked, state)
        };

        let callbacks = self.callbacks.borrow();
        if let (Some(pick), Some(cb)) = (clicked, &callbacks.on_pick) {
            call_with_json(cb, &pick);
        }
        if let (Some(state), Some(cb)) = (state, &callbacks.on_state_change) {
            call_with_json(cb, &state);
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| {
                let size = ui.available_size();
                self.widget.borrow_mut().show(ui, size);
            });

        self.notify();
    }
}

fn call_with_json(callback: &js_sys::Function, value: &serde_json::Value) {
    let arg = match js_sys::JSON::parse(&value.to_string()) {
        Ok(arg) => arg,
        Err(e) => {
            log::warn!("Could not build callback argument: {:?}", e);
            return;
        }
    };
    if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
        log::warn!("Callback threw: {:?}", e);
    }
}
