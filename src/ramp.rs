//! Editable color ramps
//!
//! A ramp is a user-edited list of `(position, color)` stops. Stops may be
//! unsorted or share positions; [`ColorRamp::color_at`] resolves them the way
//! a multi-stop linear gradient does.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// An opaque sRGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgb(self.0[0], self.0[1], self.0[2])
    }

    pub fn from_color32(c: egui::Color32) -> Self {
        Rgb([c.r(), c.g(), c.b()])
    }
}

impl FromStr for Rgb {
    type Err = ViewerError;

    /// Parse `#rrggbb` or the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ViewerError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| bad());
        match hex.len() {
            6 => Ok(Rgb([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Rgb([r * 17, g * 17, b * 17]))
            }
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ViewerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// A single control point of a ramp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampStop {
    /// Position along the ramp, 0..1
    pub position: f32,
    pub color: Rgb,
}

impl RampStop {
    pub fn new(position: f32, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// Ordered list of stops, in the order the user defined them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorRamp {
    stops: Vec<RampStop>,
}

impl ColorRamp {
    pub fn new(stops: Vec<RampStop>) -> Self {
        Self { stops }
    }

    /// Parse a JSON array of `{ "position": f32, "color": "#rrggbb" }`.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        serde_json::from_str(json).map_err(|e| ViewerError::InvalidRamp(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // A Vec of plain structs with string colors cannot fail to serialize
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn stops(&self) -> &[RampStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Insert a white stop at position 0 right after `index`.
    /// On an empty ramp the stop becomes the only one.
    pub fn insert_after(&mut self, index: usize) -> Result<(), ViewerError> {
        let stop = RampStop::new(0.0, Rgb::WHITE);
        if self.stops.is_empty() {
            self.stops.push(stop);
            return Ok(());
        }
        self.check_index(index)?;
        self.stops.insert(index + 1, stop);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<RampStop, ViewerError> {
        self.check_index(index)?;
        Ok(self.stops.remove(index))
    }

    pub fn recolor(&mut self, index: usize, color: Rgb) -> Result<(), ViewerError> {
        self.check_index(index)?;
        self.stops[index].color = color;
        Ok(())
    }

    /// Move a stop. The position is clamped to 0..1; NaN is rejected.
    pub fn reposition(&mut self, index: usize, position: f32) -> Result<(), ViewerError> {
        self.check_index(index)?;
        if position.is_nan() {
            return Err(ViewerError::InvalidRamp("stop position is NaN".to_string()));
        }
        self.stops[index].position = position.clamp(0.0, 1.0);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), ViewerError> {
        if index < self.stops.len() {
            Ok(())
        } else {
            Err(ViewerError::stop_index(index, self.stops.len()))
        }
    }

    // =========================================================================
    // Gradient evaluation
    // =========================================================================

    /// Stops sorted by position, ties kept in definition order.
    fn sorted_stops(&self) -> Vec<RampStop> {
        let mut sorted: Vec<RampStop> = self
            .stops
            .iter()
            .filter(|s| !s.position.is_nan())
            .map(|s| RampStop::new(s.position.clamp(0.0, 1.0), s.color))
            .collect();
        // sort_by is stable, which is what makes "later stop wins" hold
        sorted.sort_by(|a, b| a.position.total_cmp(&b.position));
        sorted
    }

    /// Continuous gradient color at `t` as floating-point channels (0..255).
    /// `None` for a ramp with no usable stops.
    pub fn color_at(&self, t: f32) -> Option<[f32; 3]> {
        let sorted = self.sorted_stops();
        gradient_at(&sorted, t)
    }

    /// Evaluate many positions against one sort of the stops.
    pub(crate) fn sample_many(&self, ts: impl Iterator<Item = f32>) -> Option<Vec<[f32; 3]>> {
        let sorted = self.sorted_stops();
        if sorted.is_empty() {
            return None;
        }
        ts.map(|t| gradient_at(&sorted, t)).collect()
    }
}

fn gradient_at(sorted: &[RampStop], t: f32) -> Option<[f32; 3]> {
    let first = sorted.first()?;
    let t = t.clamp(0.0, 1.0);

    // Last stop at or before t; later duplicates win because of the stable sort
    let Some(i) = sorted.iter().rposition(|s| s.position <= t) else {
        return Some(channels(first.color));
    };
    let a = sorted[i];
    let Some(&b) = sorted.get(i + 1) else {
        return Some(channels(a.color));
    };

    // b.position > t >= a.position, so the segment has nonzero width
    let frac = (t - a.position) / (b.position - a.position);
    let ca = channels(a.color);
    let cb = channels(b.color);
    Some([
        ca[0] + (cb[0] - ca[0]) * frac,
        ca[1] + (cb[1] - ca[1]) * frac,
        ca[2] + (cb[2] - ca[2]) * frac,
    ])
}

fn channels(c: Rgb) -> [f32; 3] {
    [c.0[0] as f32, c.0[1] as f32, c.0[2] as f32]
}

/// A named ramp offered in the editor.
#[derive(Clone, Copy, Debug)]
pub struct Preset {
    pub title: &'static str,
    stops: &'static [(f32, Rgb)],
}

impl Preset {
    pub fn ramp(&self) -> ColorRamp {
        ColorRamp::new(
            self.stops
                .iter()
                .map(|&(position, color)| RampStop::new(position, color))
                .collect(),
        )
    }
}

const PRESETS: &[Preset] = &[
    Preset {
        title: "Default",
        stops: &[
            (0.0, Rgb::new(0x40, 0x40, 0x40)),
            (0.1, Rgb::new(0xff, 0x4e, 0x00)),
            (0.2, Rgb::new(0xfd, 0xfd, 0x2e)),
            (0.3, Rgb::new(0xb2, 0xab, 0xd2)),
            (1.0, Rgb::new(0x5e, 0x3c, 0x99)),
        ],
    },
    Preset {
        title: "AEM Legend",
        stops: &[
            (0.0, Rgb::new(0x00, 0x00, 0x8d)),
            (0.46, Rgb::new(0x02, 0xdd, 0xfd)),
            (0.96, Rgb::new(0xff, 0xdd, 0x30)),
            (1.0, Rgb::new(0x7d, 0x03, 0x06)),
        ],
    },
];

/// Built-in ramps, the first one being the startup default.
pub fn presets() -> &'static [Preset] {
    PRESETS
}

/// Look up a preset by title (case-insensitive).
pub fn preset(title: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.title.eq_ignore_ascii_case(title))
}
