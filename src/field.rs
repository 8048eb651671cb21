//! Scalar survey grid
//!
//! A `ScalarField` is an immutable, row-major grid of `f32` samples where NaN
//! marks a cell with no measurement. Rows run top to bottom.

use crate::error::ViewerError;

/// Returns true for the missing-value sentinel.
#[inline]
pub fn is_missing(v: f32) -> bool {
    v.is_nan()
}

/// Row-major 2-D grid of survey readings.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    values: Vec<f32>,
    width: u32,
    height: u32,
    /// Finite extent, cached at construction
    min_val: f32,
    max_val: f32,
}

impl ScalarField {
    /// Wrap a decoded buffer, checking it matches `width x height`.
    pub fn new(values: Vec<f32>, width: u32, height: u32) -> Result<Self, ViewerError> {
        let expected = (width as usize) * (height as usize);
        if values.len() != expected {
            return Err(ViewerError::DimensionMismatch {
                width,
                height,
                expected,
                actual: values.len(),
            });
        }

        let (min_val, max_val) = finite_extent(&values);
        Ok(Self {
            values,
            width,
            height,
            min_val,
            max_val,
        })
    }

    /// Decode a little-endian `f32` byte buffer of exactly `width x height` samples.
    pub fn from_le_bytes(bytes: &[u8], width: u32, height: u32) -> Result<Self, ViewerError> {
        let expected = (width as usize) * (height as usize);
        if bytes.len() != expected * 4 {
            return Err(ViewerError::DimensionMismatch {
                width,
                height,
                expected,
                actual: bytes.len().div_ceil(4),
            });
        }
        let values = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::new(values, width, height)
    }

    /// Build a sibling field with the same shape from already-mapped values.
    pub(crate) fn with_values(&self, values: Vec<f32>) -> Result<Self, ViewerError> {
        Self::new(values, self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample at a linear index, `None` past the end.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Sample at `(x, y)` with `y = 0` the top row.
    pub fn get_xy(&self, x: u32, y: u32) -> Option<f32> {
        if x < self.width && y < self.height {
            self.get((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }

    /// Smallest and largest finite sample. `(0, 1)` when there are none,
    /// and the range is widened by one when all samples are equal.
    pub fn value_range(&self) -> (f32, f32) {
        (self.min_val, self.max_val)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| is_missing(**v)).count()
    }
}

fn finite_extent(values: &[f32]) -> (f32, f32) {
    let mut min_val = f32::INFINITY;
    let mut max_val = f32::NEG_INFINITY;

    for &v in values {
        if v.is_finite() {
            min_val = min_val.min(v);
            max_val = max_val.max(v);
        }
    }

    if !min_val.is_finite() {
        min_val = 0.0;
    }
    if !max_val.is_finite() {
        max_val = 1.0;
    }
    if (max_val - min_val).abs() < f32::EPSILON {
        max_val = min_val + 1.0;
    }
    (min_val, max_val)
}
