//! Coalescing of bursty edits
//!
//! Every edit overwrites the pending value. The first edit of a burst opens a
//! window, and once the window has elapsed the next poll hands out only the
//! latest value. Times are in seconds on the frame clock.

/// Last-write-wins edit coalescer.
#[derive(Clone, Debug)]
pub struct Coalescer<T> {
    /// Window length in seconds
    window: f64,
    /// Start of the current burst and the latest value seen in it
    pending: Option<(f64, T)>,
    /// Edits folded into the current burst
    burst_len: usize,
}

impl<T> Coalescer<T> {
    pub fn new(window: f64) -> Self {
        Self {
            window: window.max(0.0),
            pending: None,
            burst_len: 0,
        }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    /// Record an edit, replacing any value already pending.
    pub fn push(&mut self, now: f64, value: T) {
        let since = match self.pending.take() {
            Some((since, _)) => since,
            None => now,
        };
        self.pending = Some((since, value));
        self.burst_len += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the latest value once the burst window has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<T> {
        let due = matches!(&self.pending, Some((since, _)) if now - since >= self.window);
        if due {
            self.flush()
        } else {
            None
        }
    }

    /// Take the latest value immediately.
    pub fn flush(&mut self) -> Option<T> {
        let (_, value) = self.pending.take()?;
        if self.burst_len > 1 {
            log::debug!("Coalesced {} edits into one", self.burst_len);
        }
        self.burst_len = 0;
        Some(value)
    }

    /// Drop whatever is pending.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.burst_len = 0;
    }
}
