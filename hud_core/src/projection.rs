//! Polar ↔ canvas projection.
//!
//! # Convention
//! - Origin at the own-position marker, top-centre of the canvas.
//! - Bearing 0° runs down the vertical axis, away from the marker; positive
//!   bearing is clockwise in the device frame:
//!   `x = sin(b)·r + origin_x`, `y = cos(b)·r + origin_y`.
//! - Linear radial scale: `max_range_mm` maps to the canvas half-size.
//!   Farther ranges clamp to that edge so a distant track keeps its direction.

use crate::config::DisplayConfig;
use crate::error::HudResult;

/// Wrap a bearing into (-180, 180] degrees.
pub fn normalize_bearing_deg(bearing_deg: f64) -> f64 {
    let wrapped = bearing_deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Scale and origin derived from a validated [`DisplayConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    origin: (f64, f64),
    /// pixels per millimetre
    scale: f64,
    max_range_mm: f64,
}

impl Projection {
    /// Fails with a configuration error on degenerate geometry.
    pub fn new(config: &DisplayConfig) -> HudResult<Self> {
        config.validate()?;
        Ok(Self {
            origin: config.origin(),
            scale: config.scale(),
            max_range_mm: config.max_range_mm,
        })
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Pixel radius of the outer edge.
    pub fn edge_radius_px(&self) -> f64 {
        self.max_range_mm * self.scale
    }

    /// Radius in pixels for a range, clamped to `[0, max_range_mm]`.
    pub fn radius_px(&self, range_mm: f64) -> f64 {
        let r = if range_mm.is_nan() {
            0.0
        } else {
            range_mm.clamp(0.0, self.max_range_mm)
        };
        r * self.scale
    }

    /// `(range, bearing)` → canvas coordinates (sub-pixel).
    pub fn to_pixel(&self, range_mm: f64, bearing_deg: f64) -> (f64, f64) {
        let r = self.radius_px(range_mm);
        let (sin, cos) = bearing_deg.to_radians().sin_cos();
        (self.origin.0 + sin * r, self.origin.1 + cos * r)
    }

    /// Canvas coordinates → `(range, bearing)`; bearing in (-180, 180].
    /// The origin itself maps to `(0, 0)`.
    pub fn to_polar(&self, x_px: f64, y_px: f64) -> (f64, f64) {
        let dx = x_px - self.origin.0;
        let dy = y_px - self.origin.1;
        let r = dx.hypot(dy);
        if r == 0.0 {
            return (0.0, 0.0);
        }
        let bearing = normalize_bearing_deg(dx.atan2(dy).to_degrees());
        (r / self.scale, bearing)
    }
}

/// One-shot form of [`Projection::to_pixel`].
pub fn to_pixel(range_mm: f64, bearing_deg: f64, config: &DisplayConfig) -> HudResult<(f64, f64)> {
    Ok(Projection::new(config)?.to_pixel(range_mm, bearing_deg))
}

/// One-shot form of [`Projection::to_polar`].
pub fn to_polar(x_px: f64, y_px: f64, config: &DisplayConfig) -> HudResult<(f64, f64)> {
    Ok(Projection::new(config)?.to_polar(x_px, y_px))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HudError;
    use approx::assert_abs_diff_eq;

    fn config() -> DisplayConfig {
        DisplayConfig {
            canvas_size_px: 200,
            min_range_mm: 0.0,
            max_range_mm: 4000.0,
            ring_spacing_mm: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn round_trip_within_range() {
        let p = Projection::new(&config()).unwrap();
        let mut bearing = -179.5;
        while bearing <= 180.0 {
            for range in [1.0, 250.0, 1999.0, 3999.9, 4000.0] {
                let (x, y) = p.to_pixel(range, bearing);
                let (r, b) = p.to_polar(x, y);
                assert_abs_diff_eq!(r, range, epsilon = 1e-6);
                assert_abs_diff_eq!(b, bearing, epsilon = 1e-9);
            }
            bearing += 6.5;
        }
        let (x, y) = p.to_pixel(1234.0, 180.0);
        let (_, b) = p.to_polar(x, y);
        assert_abs_diff_eq!(b, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn over_range_clamps_to_edge() {
        let p = Projection::new(&config()).unwrap();
        let (ox, oy) = p.origin();
        for range in [4000.0, 4001.0, 1.0e6, f64::INFINITY] {
            let (x, y) = p.to_pixel(range, 33.0);
            assert_abs_diff_eq!((x - ox).hypot(y - oy), 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_bearing_on_vertical_axis() {
        let p = Projection::new(&config()).unwrap();
        for range in [0.0, 10.0, 2500.0, 9000.0] {
            let (x, y) = p.to_pixel(range, 0.0);
            assert_abs_diff_eq!(x, 100.0, epsilon = 1e-12);
            assert!(y >= 0.0);
        }
    }

    #[test]
    fn half_range_lands_half_way_down_the_axis() {
        // A full-size scale (range / max * size) would put this track at
        // (100, 100); the half-size scale keeps max_range on the inset edge.
        let (x, y) = to_pixel(2000.0, 0.0, &config()).unwrap();
        assert_abs_diff_eq!(x, 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn positive_bearing_moves_right() {
        let p = Projection::new(&config()).unwrap();
        let (x, _) = p.to_pixel(1000.0, 90.0);
        assert_abs_diff_eq!(x, 125.0, epsilon = 1e-9);
        let (x, _) = p.to_pixel(1000.0, -90.0);
        assert_abs_diff_eq!(x, 75.0, epsilon = 1e-9);
    }

    #[test]
    fn negative_or_nan_range_projects_onto_origin() {
        let p = Projection::new(&config()).unwrap();
        assert_eq!(p.to_pixel(-50.0, 45.0), p.origin());
        assert_eq!(p.to_pixel(f64::NAN, 45.0), p.origin());
    }

    #[test]
    fn degenerate_config_fails_fast() {
        let cfg = DisplayConfig {
            max_range_mm: 0.0,
            min_range_mm: 0.0,
            ..config()
        };
        assert!(matches!(
            Projection::new(&cfg),
            Err(HudError::Configuration(_))
        ));
        assert!(to_polar(0.0, 0.0, &cfg).is_err());
    }

    #[test]
    fn bearing_normalisation() {
        assert_abs_diff_eq!(normalize_bearing_deg(-180.0), 180.0);
        assert_abs_diff_eq!(normalize_bearing_deg(540.0), 180.0);
        assert_abs_diff_eq!(normalize_bearing_deg(190.0), -170.0);
        assert_abs_diff_eq!(normalize_bearing_deg(-45.0), -45.0);
    }
}
