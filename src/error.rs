//! Error types shared by the field, ramp and equalization code

use thiserror::Error;

/// Everything that can go wrong in the viewer core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// Equalization was asked to run on a field with no finite samples.
    #[error("field has no non-missing samples")]
    EmptyField,
    /// Infinite samples make the histogram extent unbounded.
    #[error("field contains infinite samples")]
    NonFiniteSample,
    /// The interquartile range collapsed, so the Freedman-Diaconis bin width is zero.
    #[error("zero bin width (interquartile range {iqr})")]
    ZeroBinWidth { iqr: f32 },
    /// Buffer length does not match the declared dimensions.
    #[error("buffer size mismatch: expected {expected} samples ({width}x{height}), got {actual}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// A color string could not be parsed as `#rrggbb` / `#rgb`.
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    /// A ramp edit referenced a stop that does not exist.
    #[error("stop index {index} out of range (ramp has {len} stops)")]
    StopIndex { index: usize, len: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid ramp: {0}")]
    InvalidRamp(String),
}

impl ViewerError {
    pub fn stop_index(index: usize, len: usize) -> Self {
        Self::StopIndex { index, len }
    }
}
