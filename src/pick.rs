//! Surface coordinate to field sample lookup
//!
//! Surface coordinates `(u, v)` are normalized to 0..1 with `v = 0` at the
//! bottom of the rendered surface, while field rows run top to bottom, so the
//! vertical axis is flipped before indexing.

use std::fmt;

use crate::field::{is_missing, ScalarField};

/// Grid cell hit by a pick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickLocation {
    pub x: u32,
    pub y: u32,
    /// Row-major index into the field
    pub index: usize,
}

/// A successful pick: the cell and its raw value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickResult {
    pub location: PickLocation,
    pub value: f32,
}

impl PickResult {
    /// Short readout such as `0.01234 S/m`.
    pub fn readout(&self, precision: usize, unit: &str) -> String {
        format!("{:.*} {}", precision, self.value, unit)
    }
}

impl fmt::Display for PickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = self.location;
        write!(f, "[{}, {}, {}] = {:.5}", l.x, l.y, l.index, self.value)
    }
}

/// Map a surface coordinate to a grid cell.
///
/// Coordinates outside `[0, 1]` (or NaN) miss. The far edges `u = 1` and
/// `v = 0` clamp onto the last column and row.
pub fn locate(u: f32, v: f32, width: u32, height: u32) -> Option<PickLocation> {
    if width == 0 || height == 0 {
        return None;
    }
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return None;
    }

    let x = ((width as f32 * u).floor() as u32).min(width - 1);
    let y = ((height as f32 * (1.0 - v)).floor() as u32).min(height - 1);
    let index = (y as usize) * (width as usize) + (x as usize);

    if index < (width as usize) * (height as usize) {
        Some(PickLocation { x, y, index })
    } else {
        None
    }
}

/// Pick the raw value under `(u, v)`. Misses and missing samples give `None`.
pub fn pick(field: &ScalarField, u: f32, v: f32) -> Option<PickResult> {
    let location = locate(u, v, field.width(), field.height())?;
    let value = field.get(location.index)?;
    if is_missing(value) {
        return None;
    }
    Some(PickResult { location, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: u32, height: u32) -> ScalarField {
        let values = (0..width * height).map(|i| i as f32).collect();
        ScalarField::new(values, width, height).unwrap()
    }

    #[test]
    fn test_cell_centers_round_trip() {
        let (w, h) = (7u32, 5u32);
        for y in 0..h {
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32;
                let v = 1.0 - (y as f32 + 0.5) / h as f32;
                let loc = locate(u, v, w, h).unwrap();
                assert_eq!((loc.x, loc.y), (x, y));
                assert_eq!(loc.index, (y * w + x) as usize);
            }
        }
    }

    #[test]
    fn test_edges_stay_in_bounds() {
        let (w, h) = (4, 3);
        let corner = locate(1.0, 0.0, w, h).unwrap();
        assert_eq!((corner.x, corner.y, corner.index), (3, 2, 11));

        let top_left = locate(0.0, 1.0, w, h).unwrap();
        assert_eq!((top_left.x, top_left.y, top_left.index), (0, 0, 0));

        let top_right = locate(1.0, 1.0, w, h).unwrap();
        assert_eq!(top_right.index, 3);
    }

    #[test]
    fn test_outside_surface_misses() {
        assert_eq!(locate(-0.01, 0.5, 4, 4), None);
        assert_eq!(locate(0.5, 1.01, 4, 4), None);
        assert_eq!(locate(f32::NAN, 0.5, 4, 4), None);
        assert_eq!(locate(0.5, 0.5, 0, 4), None);
    }

    #[test]
    fn test_pick_reports_value() {
        let f = grid(4, 4);
        let r = pick(&f, 0.6, 0.9).unwrap();
        assert_eq!(r.location, PickLocation { x: 2, y: 0, index: 2 });
        assert_eq!(r.value, 2.0);
        assert_eq!(r.readout(5, "S/m"), "2.00000 S/m");
        assert_eq!(r.to_string(), "[2, 0, 2] = 2.00000");
    }

    #[test]
    fn test_pick_missing_is_none() {
        let f = ScalarField::new(vec![1.0, f32::NAN, 3.0, 4.0], 2, 2).unwrap();
        // Top-right cell is index 1
        assert_eq!(pick(&f, 0.75, 0.75), None);
        assert!(pick(&f, 0.25, 0.75).is_some());
    }

    #[test]
    fn test_zero_reading_is_a_value() {
        let f = grid(2, 2);
        let r = pick(&f, 0.1, 0.9).unwrap();
        assert_eq!(r.value, 0.0);
        assert_eq!(r.readout(5, "S/m"), "0.00000 S/m");
    }

    #[test]
    fn test_pick_is_idempotent() {
        let f = grid(16, 9);
        assert_eq!(pick(&f, 0.3, 0.4), pick(&f, 0.3, 0.4));
    }
}
