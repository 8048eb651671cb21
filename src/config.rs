//! Viewer settings passed in from JavaScript

use serde::Deserialize;

use crate::error::ViewerError;

/// Runtime options. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Window in seconds over which ramp edits are coalesced
    pub ramp_debounce_secs: f64,
    /// Decimal places in the value readout
    pub readout_precision: usize,
    /// Unit appended to the value readout
    pub readout_unit: String,
    /// Title of the ramp preset loaded at startup
    pub initial_preset: String,
    /// Show the build timestamp overlay
    pub show_build_info: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            ramp_debounce_secs: 0.1,
            readout_precision: 5,
            readout_unit: "S/m".to_string(),
            initial_preset: "Default".to_string(),
            show_build_info: true,
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON object; an empty or blank string gives the defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(json).map_err(|e| ViewerError::InvalidConfig(e.to_string()))?;
        if !config.ramp_debounce_secs.is_finite() || config.ramp_debounce_secs < 0.0 {
            return Err(ViewerError::InvalidConfig(format!(
                "rampDebounceSecs must be a non-negative number, got {}",
                config.ramp_debounce_secs
            )));
        }
        Ok(config)
    }
}
