//! Construction-time configuration.
//!
//! Every value here is fixed for the lifetime of the renderer / estimator
//! built from it. Defaults reproduce the helmet prototype: a 100 px radar
//! inset, 1 ft to 20 ft display window, cyan moving and yellow static
//! markers on a black background.

use crate::error::{HudError, HudResult};
use crate::orientation::EstimatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 8-bit RGB colour.
pub type Rgb = [u8; 3];

const MM_PER_FOOT: f64 = 12.0 * 25.4;

/// Geometry and palette of the radar inset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Side length of the square canvas (pixels)
    pub canvas_size_px: u32,
    /// Sensor blind-zone radius (millimetres)
    pub min_range_mm: f64,
    /// Range mapped to the canvas half-size (millimetres)
    pub max_range_mm: f64,
    /// Distance between range rings (millimetres)
    pub ring_spacing_mm: f64,
    /// Full opening angle of the sensor cone (degrees)
    pub field_of_view_deg: f64,
    /// Radius of a track marker (pixels)
    pub icon_radius_px: u32,
    pub motion_color: Rgb,
    pub static_color: Rgb,
    pub background_color: Rgb,
    /// Range rings, labels and FOV bounds
    pub geometry_color: Rgb,
    /// Own-position glyph
    pub marker_color: Rgb,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            canvas_size_px: 100,
            min_range_mm: MM_PER_FOOT,
            max_range_mm: 20.0 * MM_PER_FOOT,
            ring_spacing_mm: 1000.0,
            field_of_view_deg: 73.0,
            icon_radius_px: 5,
            motion_color: [0, 255, 255],
            static_color: [255, 255, 0],
            background_color: [0, 0, 0],
            geometry_color: [70, 110, 70],
            marker_color: [255, 255, 255],
        }
    }
}

impl DisplayConfig {
    /// Reject degenerate geometry. Called once when a renderer is built.
    pub fn validate(&self) -> HudResult<()> {
        if self.canvas_size_px == 0 {
            return Err(HudError::config("canvas_size_px must be > 0"));
        }
        if !(self.min_range_mm.is_finite() && self.max_range_mm.is_finite()) {
            return Err(HudError::config("range window must be finite"));
        }
        if self.min_range_mm < 0.0 {
            return Err(HudError::config(format!(
                "min_range_mm ({}) must be ≥ 0",
                self.min_range_mm
            )));
        }
        if self.max_range_mm <= self.min_range_mm {
            return Err(HudError::config(format!(
                "max_range_mm ({}) must exceed min_range_mm ({})",
                self.max_range_mm, self.min_range_mm
            )));
        }
        if !(self.ring_spacing_mm.is_finite() && self.ring_spacing_mm > 0.0) {
            return Err(HudError::config(format!(
                "ring_spacing_mm ({}) must be > 0",
                self.ring_spacing_mm
            )));
        }
        if !(self.field_of_view_deg > 0.0 && self.field_of_view_deg < 360.0) {
            return Err(HudError::config(format!(
                "field_of_view_deg ({}) must lie in (0, 360)",
                self.field_of_view_deg
            )));
        }
        if self.icon_radius_px < 1 || self.icon_radius_px > self.canvas_size_px {
            return Err(HudError::config(format!(
                "icon_radius_px ({}) must lie in [1, canvas_size_px]",
                self.icon_radius_px
            )));
        }
        if self.ring_spacing_mm * self.scale() < 1.0 {
            return Err(HudError::config(format!(
                "ring_spacing_mm ({}) puts rings less than 1 px apart",
                self.ring_spacing_mm
            )));
        }
        Ok(())
    }

    /// Canvas half-size: the pixel radius of `max_range_mm`.
    pub fn radius_px(&self) -> f64 {
        self.canvas_size_px as f64 / 2.0
    }

    /// Pixels per millimetre of range.
    pub fn scale(&self) -> f64 {
        self.radius_px() / self.max_range_mm
    }

    /// Own-position marker in canvas coordinates (top-centre).
    pub fn origin(&self) -> (f64, f64) {
        (self.radius_px(), 0.0)
    }
}

/// Everything a HUD instance is built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub display: DisplayConfig,
    pub estimator: EstimatorConfig,
}

impl HudConfig {
    pub fn from_json(json: &str) -> HudResult<Self> {
        serde_json::from_str(json).map_err(|e| HudError::config(e.to_string()))
    }

    /// Load a JSON config file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> HudResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HudError::config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> HudResult<()> {
        self.display.validate()?;
        self.estimator.validate()
    }
}
