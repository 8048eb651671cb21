//! Scalar to ramp color lookup
//!
//! Every rendering path goes through these functions so that previews and
//! the displayed surface agree texel for texel. The table is addressed as a
//! 1-D gradient folded into a `TABLE_SIZE`-wide square:
//!
//! ```text
//! s = fract(N * v)          column, 0..1
//! t = floor(N * v) / N      row, 0..1
//! ```

use crate::equalize::{OUTPUT_MAX, OUTPUT_MIN};
use crate::field::is_missing;
use crate::ramp_table::{RampTable, TABLE_SIZE, TEXEL_COUNT};

/// Fully transparent pixel used for missing samples
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// How field values are turned into ramp positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scaling {
    /// Values already produced by the equalizer, in `[OUTPUT_MIN, OUTPUT_MAX]`
    Equalized,
    /// Raw readings normalized by the field's finite extent
    Raw { min: f32, max: f32 },
}

impl Scaling {
    pub fn ramp_position(&self, value: f32) -> f32 {
        match *self {
            Scaling::Equalized => equalized_ramp_position(value),
            Scaling::Raw { min, max } => raw_ramp_position(value, min, max),
        }
    }
}

/// Ramp position of an equalized value, clamped to 0..1.
pub fn equalized_ramp_position(value: f32) -> f32 {
    ((value - OUTPUT_MIN) / (OUTPUT_MAX - OUTPUT_MIN)).clamp(0.0, 1.0)
}

/// Ramp position of a raw value within `[min, max]`, clamped to 0..1.
/// A degenerate extent maps everything to 0.
pub fn raw_ramp_position(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range.abs() > f32::EPSILON && range.is_finite() {
        ((value - min) / range).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Texture coordinate `(s, t)` of ramp position `v`.
pub fn ramp_coord(v: f32) -> (f32, f32) {
    let n = TABLE_SIZE as f32;
    let scaled = n * v;
    (scaled.fract(), scaled.floor() / n)
}

/// Linear texel index addressed by `(s, t)`.
///
/// `v = 1` gives `t = 1`, one row past the table; that case resolves to the
/// last texel rather than wrapping.
pub fn texel_index(s: f32, t: f32) -> usize {
    let n = TABLE_SIZE as f32;
    let row = (t * n).round().max(0.0) as usize;
    let col = ((s * n).floor().max(0.0) as usize).min(TABLE_SIZE - 1);
    (row * TABLE_SIZE + col).min(TEXEL_COUNT - 1)
}

/// RGBA for a non-missing value at ramp position `v`.
pub fn sample(table: &RampTable, v: f32) -> [u8; 4] {
    let (s, t) = ramp_coord(v.clamp(0.0, 1.0));
    table.texel(texel_index(s, t))
}

/// Colorize a sample, short-circuiting missing values to transparent.
pub fn colorize(table: &RampTable, scaling: Scaling, value: f32) -> [u8; 4] {
    if is_missing(value) {
        TRANSPARENT
    } else {
        sample(table, scaling.ramp_position(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ramp::{ColorRamp, RampStop, Rgb};

    fn gray_table() -> RampTable {
        RampTable::compile(&ColorRamp::new(vec![
            RampStop::new(0.0, Rgb::BLACK),
            RampStop::new(1.0, Rgb::WHITE),
        ]))
    }

    #[test]
    fn test_equalized_position_endpoints() {
        assert_eq!(equalized_ramp_position(OUTPUT_MIN), 0.0);
        assert!((equalized_ramp_position(OUTPUT_MAX) - 1.0).abs() < 1e-6);
        assert_eq!(equalized_ramp_position(-5.0), 0.0);
        assert_eq!(equalized_ramp_position(5.0), 1.0);
    }

    #[test]
    fn test_raw_position() {
        assert_eq!(raw_ramp_position(15.0, 10.0, 20.0), 0.5);
        assert_eq!(raw_ramp_position(25.0, 10.0, 20.0), 1.0);
        assert_eq!(raw_ramp_position(3.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn test_coord_is_tiled() {
        let (s, t) = ramp_coord(0.5);
        assert_eq!((s, t), (0.0, 0.5));
        assert_eq!(texel_index(s, t), 128);

        // Halfway through the first row
        let (s, t) = ramp_coord(0.5 / 16.0);
        assert_eq!((s, t), (0.5, 0.0));
        assert_eq!(texel_index(s, t), 8);
    }

    #[test]
    fn test_row_boundaries_do_not_skip() {
        // Consecutive texel starts must map to consecutive indices
        for k in 0..TEXEL_COUNT {
            let v = (k as f32 + 0.5) / TEXEL_COUNT as f32;
            let (s, t) = ramp_coord(v);
            assert_eq!(texel_index(s, t), k, "v = {}", v);
        }
    }

    #[test]
    fn test_top_of_range_hits_last_texel() {
        let (s, t) = ramp_coord(1.0);
        assert_eq!((s, t), (0.0, 1.0));
        assert_eq!(texel_index(s, t), TEXEL_COUNT - 1);

        let table = gray_table();
        assert_eq!(sample(&table, 1.0), [255, 255, 255, 255]);
        assert_eq!(sample(&table, 7.0), [255, 255, 255, 255]);
        assert_eq!(sample(&table, 0.0), [0, 0, 0, 255]);
        assert_eq!(sample(&table, -3.0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let table = gray_table();
        for i in 0..100 {
            let v = i as f32 / 99.0;
            assert_eq!(sample(&table, v), sample(&table, v));
        }
    }

    #[test]
    fn test_colorize_missing_is_transparent() {
        let table = gray_table();
        assert_eq!(colorize(&table, Scaling::Equalized, f32::NAN), TRANSPARENT);
        let raw = Scaling::Raw { min: 0.0, max: 10.0 };
        assert_eq!(colorize(&table, raw, f32::NAN), TRANSPARENT);
        assert_eq!(colorize(&table, raw, 10.0), [255, 255, 255, 255]);
    }
}
