//! Background equalization
//!
//! Equalizing a survey line sorts millions of samples, so it runs outside
//! the frame callback. The result lands in an [`EqualizeSlot`] in one step:
//! readers see either no result or the complete field. Reloading the field
//! bumps the slot's generation, and a job from an older generation throws its
//! result away instead of publishing it.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::equalize::equalize;
use crate::error::ViewerError;
use crate::field::ScalarField;

/// Observable state of the equalized field.
#[derive(Clone, Debug)]
pub enum EqualizeStatus {
    /// Never requested for the current field
    Idle,
    /// A job is in flight
    Running,
    Ready(Arc<ScalarField>),
    Failed(ViewerError),
}

#[derive(Debug)]
struct SlotState {
    generation: u64,
    status: EqualizeStatus,
}

/// Shared, lazily filled cache for the equalized field.
#[derive(Clone, Debug)]
pub struct EqualizeSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl Default for EqualizeSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl EqualizeSlot {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState {
                generation: 0,
                status: EqualizeStatus::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panicking job cannot leave the state half-written, so poison is ignored
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> EqualizeStatus {
        self.lock().status.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Forget any result and orphan any job in flight.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.status = EqualizeStatus::Idle;
    }

    /// Claim the slot for a new job.
    ///
    /// Returns `None` when a job is already running (the caller joins it) or
    /// when a result, successful or not, is already cached.
    pub fn start(&self, field: Arc<ScalarField>) -> Option<EqualizeJob> {
        let mut state = self.lock();
        match state.status {
            EqualizeStatus::Idle => {
                state.status = EqualizeStatus::Running;
                Some(EqualizeJob {
                    generation: state.generation,
                    field,
                    slot: self.clone(),
                })
            }
            _ => None,
        }
    }

    fn publish(&self, generation: u64, result: Result<ScalarField, ViewerError>) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            log::warn!(
                "Discarding equalization result from generation {} (current {})",
                generation,
                state.generation
            );
            return false;
        }
        state.status = match result {
            Ok(field) => EqualizeStatus::Ready(Arc::new(field)),
            Err(e) => EqualizeStatus::Failed(e),
        };
        true
    }
}

/// One pending equalization of one field.
pub struct EqualizeJob {
    generation: u64,
    field: Arc<ScalarField>,
    slot: EqualizeSlot,
}

impl EqualizeJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Compute and publish. Returns whether the result was published.
    pub fn run(self) -> bool {
        // Orphaned by a reload before it got to run
        if self.slot.generation() != self.generation {
            log::debug!("Skipping stale equalization job (generation {})", self.generation);
            return false;
        }
        let start = now_ms();
        let result = equalize(&self.field);
        match &result {
            Ok(_) => log::info!(
                "Histogram equalization of {}x{} took {:.1} ms",
                self.field.width(),
                self.field.height(),
                now_ms() - start
            ),
            Err(e) => log::warn!("Histogram equalization failed: {}", e),
        }
        self.slot.publish(self.generation, result)
    }
}

/// Hands a job to whatever executes it.
pub type Spawner = Box<dyn Fn(EqualizeJob)>;

/// Default spawner: a `spawn_local` future that first yields to the browser.
#[cfg(target_arch = "wasm32")]
pub fn spawn_background(job: EqualizeJob) {
    wasm_bindgen_futures::spawn_local(async move {
        yield_to_browser().await;
        job.run();
    });
}

/// Default spawner: a named worker thread, or inline if no thread is available.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_background(job: EqualizeJob) {
    let (tx, rx) = std::sync::mpsc::channel::<EqualizeJob>();
    let spawned = std::thread::Builder::new()
        .name("equalize".to_string())
        .spawn(move || {
            if let Ok(job) = rx.recv() {
                job.run();
            }
        });
    match spawned {
        Ok(_) => {
            if let Err(std::sync::mpsc::SendError(job)) = tx.send(job) {
                job.run();
            }
        }
        Err(e) => {
            log::warn!("Could not start equalization thread ({}), running inline", e);
            job.run();
        }
    }
}

/// Yield once to the browser event loop via a zero-duration setTimeout.
#[cfg(target_arch = "wasm32")]
async fn yield_to_browser() {
    use wasm_bindgen::prelude::*;

    let Some(win) = web_sys::window() else {
        return;
    };
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let cb = Closure::once_into_js(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), 0);
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> Arc<ScalarField> {
        let values = (0..64).map(|i| (i % 13) as f32).collect();
        Arc::new(ScalarField::new(values, 8, 8).unwrap())
    }

    #[test]
    fn test_publish_once() {
        let slot = EqualizeSlot::new();
        let job = slot.start(field()).unwrap();
        assert!(matches!(slot.status(), EqualizeStatus::Running));

        // Second request joins the running job
        assert!(slot.start(field()).is_none());

        assert!(job.run());
        match slot.status() {
            EqualizeStatus::Ready(eq) => assert_eq!(eq.len(), 64),
            other => panic!("expected ready, got {:?}", other),
        }

        // Cached: no new job
        assert!(slot.start(field()).is_none());
    }

    #[test]
    fn test_stale_job_is_discarded() {
        let slot = EqualizeSlot::new();
        let stale = slot.start(field()).unwrap();
        slot.reset();
        assert!(!stale.run());
        assert!(matches!(slot.status(), EqualizeStatus::Idle));

        let fresh = slot.start(field()).unwrap();
        assert_eq!(fresh.generation(), 1);
        assert!(fresh.run());
    }

    #[test]
    fn test_orphaned_job_skips_work() {
        let slot = EqualizeSlot::new();
        let stale = slot.start(field()).unwrap();
        slot.reset();
        let fresh = slot.start(field()).unwrap();

        // The stale job must neither publish nor disturb the running one
        assert!(!stale.run());
        assert!(matches!(slot.status(), EqualizeStatus::Running));
        assert!(fresh.run());
        assert!(matches!(slot.status(), EqualizeStatus::Ready(_)));
    }

    #[test]
    fn test_failure_is_cached() {
        let slot = EqualizeSlot::new();
        let flat = Arc::new(ScalarField::new(vec![1.0; 4], 2, 2).unwrap());
        slot.start(flat.clone()).unwrap().run();
        assert!(matches!(
            slot.status(),
            EqualizeStatus::Failed(ViewerError::ZeroBinWidth { .. })
        ));
        assert!(slot.start(flat).is_none());
    }

    #[test]
    fn test_background_spawn_publishes() {
        let slot = EqualizeSlot::new();
        spawn_background(slot.start(field()).unwrap());
        for _ in 0..500 {
            if matches!(slot.status(), EqualizeStatus::Ready(_)) {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("background equalization never published");
    }
}
