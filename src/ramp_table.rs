//! Compiled color ramp lookup table
//!
//! A [`ColorRamp`] is discretized into `TABLE_SIZE x TABLE_SIZE` RGBA texels.
//! Texel `k` (row-major) holds the gradient color at `k / (TEXEL_COUNT - 1)`,
//! so the square table is a 1-D gradient folded into rows.

use egui::ColorImage;

use crate::ramp::ColorRamp;

/// Width and height of the table in texels
pub const TABLE_SIZE: usize = 16;

/// Total number of addressable texels
pub const TEXEL_COUNT: usize = TABLE_SIZE * TABLE_SIZE;

/// Immutable RGBA lookup table built from a ramp snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RampTable {
    texels: Vec<[u8; 4]>,
}

impl RampTable {
    /// Sample the ramp at every texel position.
    ///
    /// A ramp without stops has nothing to interpolate and compiles to a
    /// fully transparent table.
    pub fn compile(ramp: &ColorRamp) -> Self {
        let positions = (0..TEXEL_COUNT).map(|k| k as f32 / (TEXEL_COUNT - 1) as f32);
        let texels = match ramp.sample_many(positions) {
            Some(colors) => colors
                .into_iter()
                .map(|c| [to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), 255])
                .collect(),
            None => {
                log::warn!("Compiling empty color ramp to a transparent table");
                vec![[0, 0, 0, 0]; TEXEL_COUNT]
            }
        };
        log::debug!("Compiled ramp table from {} stops", ramp.len());
        Self { texels }
    }

    /// Texel by linear index. Indices past the end clamp to the last texel.
    pub fn texel(&self, index: usize) -> [u8; 4] {
        self.texels[index.min(TEXEL_COUNT - 1)]
    }

    pub fn texels(&self) -> &[[u8; 4]] {
        &self.texels
    }

    /// Flat RGBA bytes in texel order, as a texture upload would consume them.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.texels.iter().flatten().copied().collect()
    }

    /// Unfolded `TEXEL_COUNT x 1` strip for previewing the ramp.
    pub fn to_strip_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied([TEXEL_COUNT, 1], &self.as_bytes())
    }
}

fn to_u8(c: f32) -> u8 {
    c.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ramp::{RampStop, Rgb};

    #[test]
    fn test_black_to_white() {
        let ramp = ColorRamp::new(vec![
            RampStop::new(0.0, "#000000".parse().unwrap()),
            RampStop::new(1.0, "#ffffff".parse().unwrap()),
        ]);
        let table = RampTable::compile(&ramp);
        assert_eq!(table.texels().len(), 256);
        assert_eq!(table.texel(0), [0, 0, 0, 255]);
        assert_eq!(table.texel(255), [255, 255, 255, 255]);
        let mid = table.texel(128);
        assert!((mid[0] as i32 - 128).abs() <= 1, "mid-gray, got {:?}", mid);
        assert_eq!(mid[0], mid[1]);
        assert_eq!(mid[1], mid[2]);
    }

    #[test]
    fn test_single_stop_is_uniform() {
        for p in [0.0, 0.3, 1.0] {
            let c = Rgb::new(12, 200, 99);
            let table = RampTable::compile(&ColorRamp::new(vec![RampStop::new(p, c)]));
            assert!(table.texels().iter().all(|t| *t == [12, 200, 99, 255]));
        }
    }

    #[test]
    fn test_empty_ramp_is_transparent_but_full_size() {
        let table = RampTable::compile(&ColorRamp::default());
        assert_eq!(table.texels().len(), TEXEL_COUNT);
        assert!(table.texels().iter().all(|t| t[3] == 0));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let ramp = crate::ramp::presets()[0].ramp();
        let a = RampTable::compile(&ramp);
        let b = RampTable::compile(&ramp);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), TEXEL_COUNT * 4);
    }

    #[test]
    fn test_texel_index_clamps() {
        let table = RampTable::compile(&ColorRamp::new(vec![RampStop::new(0.0, Rgb::WHITE)]));
        assert_eq!(table.texel(10_000), table.texel(TEXEL_COUNT - 1));
    }

    #[test]
    fn test_strip_image_size() {
        let table = RampTable::compile(&crate::ramp::presets()[1].ramp());
        assert_eq!(table.to_strip_image().size, [TEXEL_COUNT, 1]);
    }
}
