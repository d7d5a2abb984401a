//! Radar inset renderer.
//!
//! # Frame layout (drawn fresh on every call)
//! 1. Background fill
//! 2. Range rings at every multiple of `ring_spacing_mm` up to `max_range_mm`,
//!    each labelled with its distance
//! 3. Sensor blind-zone outline at `min_range_mm`
//! 4. Field-of-view boundary lines
//! 5. Own-position glyph (triangle pointing forward)
//! 6. One filled disc per track, in input order; overlapping markers overpaint
//!
//! Rendering never fails once the renderer exists: malformed tracks are
//! sanitised and logged, off-canvas geometry is clipped.

use crate::canvas::{to_px, Px, RadarCanvas};
use crate::config::DisplayConfig;
use crate::error::HudResult;
use crate::glyphs::{range_label, GLYPH_HEIGHT};
use crate::projection::Projection;
use crate::types::Track;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Motion classification
// ---------------------------------------------------------------------------

/// Decides whether a track is drawn in the "moving" colour.
pub trait MotionClassifier {
    fn is_moving(&self, track: &Track) -> bool;
}

impl<F> MotionClassifier for F
where
    F: Fn(&Track) -> bool,
{
    fn is_moving(&self, track: &Track) -> bool {
        self(track)
    }
}

/// Every track is static.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverMoving;

impl MotionClassifier for NeverMoving {
    fn is_moving(&self, _track: &Track) -> bool {
        false
    }
}

/// Moving when the tracker reports a ground speed above a threshold.
/// Tracks without a speed estimate are static.
#[derive(Clone, Copy, Debug)]
pub struct SpeedThreshold {
    pub min_speed_mm_s: f64,
}

impl Default for SpeedThreshold {
    fn default() -> Self {
        Self {
            min_speed_mm_s: 500.0, // slow walk
        }
    }
}

impl MotionClassifier for SpeedThreshold {
    fn is_moving(&self, track: &Track) -> bool {
        track.speed_mm_s.is_some_and(|s| s > self.min_speed_mm_s)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// A range ring, precomputed at construction.
#[derive(Clone, Debug, PartialEq)]
struct Ring {
    radius_px: i64,
    label: String,
}

/// Renders track batches into fresh [`RadarCanvas`]es. Holds no per-frame state.
#[derive(Clone, Debug)]
pub struct RadarRenderer {
    config: DisplayConfig,
    projection: Projection,
    rings: Vec<Ring>,
}

impl RadarRenderer {
    /// Validate the configuration and precompute the static geometry.
    pub fn new(config: DisplayConfig) -> HudResult<Self> {
        let projection = Projection::new(&config)?;
        let tolerance = config.max_range_mm * 1e-9;
        let rings: Vec<Ring> = (1u64..)
            .map(|k| k as f64 * config.ring_spacing_mm)
            .take_while(|r| *r <= config.max_range_mm + tolerance)
            .map(|r| Ring {
                radius_px: projection.radius_px(r).round() as i64,
                label: range_label(r),
            })
            .collect();
        debug!(
            canvas = config.canvas_size_px,
            rings = rings.len(),
            "radar renderer ready"
        );
        Ok(Self {
            config,
            projection,
            rings,
        })
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Radii (pixels) of the range rings, innermost first.
    pub fn ring_radii_px(&self) -> Vec<i64> {
        self.rings.iter().map(|r| r.radius_px).collect()
    }

    pub fn ring_labels(&self) -> Vec<&str> {
        self.rings.iter().map(|r| r.label.as_str()).collect()
    }

    /// Draw one frame.
    pub fn render<C>(&self, tracks: &[Track], classifier: &C) -> RadarCanvas
    where
        C: MotionClassifier + ?Sized,
    {
        let mut canvas = RadarCanvas::new(self.config.canvas_size_px, self.config.background_color);
        self.draw_static_geometry(&mut canvas);
        for (index, track) in tracks.iter().enumerate() {
            self.draw_track(&mut canvas, index, track, classifier);
        }
        canvas
    }

    fn draw_static_geometry(&self, canvas: &mut RadarCanvas) {
        let cfg = &self.config;
        let origin = to_px(self.projection.origin());
        let color = cfg.geometry_color;

        for ring in &self.rings {
            canvas.circle(origin, ring.radius_px, color);
            // just inside the ring, right of the forward axis
            let label_at: Px = (origin.0 + 2, origin.1 + ring.radius_px - GLYPH_HEIGHT - 1);
            canvas.text(label_at, &ring.label, color);
        }

        if cfg.min_range_mm > 0.0 {
            let blind = self.projection.radius_px(cfg.min_range_mm).round() as i64;
            canvas.circle(origin, blind, color);
        }

        let half_fov = cfg.field_of_view_deg / 2.0;
        for bound in [-half_fov, half_fov] {
            let end = to_px(self.projection.to_pixel(cfg.max_range_mm, bound));
            canvas.line(origin, end, color);
        }

        let size = cfg.icon_radius_px as i64;
        canvas.fill_triangle(
            (origin.0 - size, origin.1),
            (origin.0 + size, origin.1),
            (origin.0, origin.1 + 2 * size),
            cfg.marker_color,
        );
    }

    fn draw_track<C>(&self, canvas: &mut RadarCanvas, index: usize, track: &Track, classifier: &C)
    where
        C: MotionClassifier + ?Sized,
    {
        let track = match track.validate() {
            Ok(()) => *track,
            Err(e) => {
                warn!(index, error = %e, "sanitising malformed track");
                track.sanitized()
            }
        };
        let color = if classifier.is_moving(&track) {
            self.config.motion_color
        } else {
            self.config.static_color
        };
        let center = to_px(self.projection.to_pixel(track.range_mm, track.bearing_deg));
        canvas.fill_circle(center, self.config.icon_radius_px as i64, color);
    }
}

/// One-shot render: validates `config`, draws, and drops the renderer.
pub fn render<C>(tracks: &[Track], config: &DisplayConfig, classifier: &C) -> HudResult<RadarCanvas>
where
    C: MotionClassifier + ?Sized,
{
    Ok(RadarRenderer::new(config.clone())?.render(tracks, classifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HudError;

    fn config() -> DisplayConfig {
        DisplayConfig {
            canvas_size_px: 200,
            max_range_mm: 4000.0,
            ring_spacing_mm: 1000.0,
            ..Default::default()
        }
    }

    fn renderer() -> RadarRenderer {
        RadarRenderer::new(config()).unwrap()
    }

    #[test]
    fn rings_at_every_spacing_multiple() {
        assert_eq!(renderer().ring_radii_px(), vec![25, 50, 75, 100]);
        let r = RadarRenderer::new(DisplayConfig {
            ring_spacing_mm: 1500.0,
            ..config()
        })
        .unwrap();
        assert_eq!(r.ring_radii_px(), vec![38, 75]);
        assert_eq!(r.ring_labels(), vec!["1.5m", "3m"]);
    }

    #[test]
    fn quarter_metre_rings_are_labelled_exactly() {
        let r = RadarRenderer::new(DisplayConfig {
            max_range_mm: 1000.0,
            ring_spacing_mm: 250.0,
            ..config()
        })
        .unwrap();
        assert_eq!(r.ring_radii_px(), vec![25, 50, 75, 100]);
        assert_eq!(r.ring_labels(), vec!["0.25m", "0.5m", "0.75m", "1m"]);
    }

    #[test]
    fn oversized_icon_is_a_config_error() {
        let bad = DisplayConfig {
            canvas_size_px: 10,
            icon_radius_px: u32::MAX,
            ..config()
        };
        assert!(matches!(
            RadarRenderer::new(bad),
            Err(HudError::Configuration(_))
        ));
    }

    #[test]
    fn half_range_track_drawn_on_axis() {
        let cfg = config();
        let canvas = renderer().render(&[Track::new(2000.0, 0.0)], &NeverMoving);
        assert_eq!(canvas.pixel(100, 50), Some(cfg.static_color));
        assert_eq!(canvas.pixel(100 + 5, 50), Some(cfg.static_color));
        assert_eq!(canvas.pixel(100 + 6, 50).map(|p| p == cfg.static_color), Some(false));
    }

    #[test]
    fn render_is_idempotent() {
        let r = renderer();
        let tracks = [
            Track::new(1200.0, -20.0).with_speed(1500.0),
            Track::new(3300.0, 15.0),
            Track::new(8000.0, 60.0),
        ];
        let classifier = SpeedThreshold::default();
        let a = r.render(&tracks, &classifier);
        let b = r.render(&tracks, &classifier);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn static_geometry_present() {
        let cfg = config();
        let canvas = renderer().render(&[], &NeverMoving);
        // first ring crosses the forward axis 25 px below the marker
        assert_eq!(canvas.pixel(100, 25), Some(cfg.geometry_color));
        // FOV boundary reaches the edge at +36.5°
        assert_eq!(canvas.pixel(159, 80), Some(cfg.geometry_color));
        // own-position glyph
        assert_eq!(canvas.pixel(100, 3), Some(cfg.marker_color));
        // "1m" label just inside the first ring: '1' starts with a single centre pixel
        assert_eq!(canvas.pixel(103, 19), Some(cfg.geometry_color));
        assert_eq!(canvas.pixel(102, 19), Some(cfg.background_color));
        assert_eq!(canvas.pixel(102, 20), Some(cfg.geometry_color));
        // labels add pixels beyond the bare circles
        assert!(canvas.count(cfg.geometry_color) > 400);
        assert!(canvas.count(cfg.background_color) > 30_000);
    }

    #[test]
    fn moving_and_static_colours() {
        let cfg = config();
        let tracks = [
            Track::new(2000.0, 30.0).with_speed(2000.0),
            Track::new(2000.0, -30.0).with_speed(10.0),
        ];
        let r = renderer();
        let canvas = r.render(&tracks, &SpeedThreshold::default());
        let (x, y) = to_px(r.projection().to_pixel(2000.0, 30.0));
        assert_eq!(canvas.pixel(x as u32, y as u32), Some(cfg.motion_color));
        let (x, y) = to_px(r.projection().to_pixel(2000.0, -30.0));
        assert_eq!(canvas.pixel(x as u32, y as u32), Some(cfg.static_color));
    }

    #[test]
    fn closure_classifier_and_last_drawn_wins() {
        let cfg = config();
        let tracks = [Track::new(3000.0, 0.0), Track::new(3000.0, 0.5)];
        let second_moves = |t: &Track| t.bearing_deg > 0.0;
        let canvas = renderer().render(&tracks, &second_moves);
        assert_eq!(canvas.pixel(100, 75), Some(cfg.motion_color));
    }

    #[test]
    fn over_range_track_pinned_to_edge() {
        let cfg = DisplayConfig {
            canvas_size_px: 201,
            ..config()
        };
        let r = RadarRenderer::new(cfg.clone()).unwrap();
        let canvas = r.render(&[Track::new(1.0e9, 0.0)], &NeverMoving);
        assert_eq!(canvas.pixel(101, 100), Some(cfg.static_color));
    }

    #[test]
    fn malformed_track_does_not_spoil_the_frame() {
        let r = renderer();
        let good = [Track::new(1500.0, -10.0), Track::new(2500.0, 25.0)];
        let with_bad = [good[0], Track::new(f64::NAN, f64::INFINITY), good[1]];
        let sanitized = [good[0], Track::new(0.0, 0.0), good[1]];
        let a = r.render(&with_bad, &NeverMoving);
        let b = r.render(&sanitized, &NeverMoving);
        assert_eq!(a, b);
    }

    #[test]
    fn tracks_behind_are_clipped() {
        let r = renderer();
        let empty = r.render(&[], &NeverMoving);
        let behind = r.render(&[Track::new(2000.0, 180.0)], &NeverMoving);
        assert_eq!(empty, behind);
    }

    #[test]
    fn one_shot_render_validates() {
        let bad = DisplayConfig {
            field_of_view_deg: 400.0,
            ..config()
        };
        assert!(matches!(
            render(&[], &bad, &NeverMoving),
            Err(HudError::Configuration(_))
        ));
        assert!(render(&[], &config(), &NeverMoving).is_ok());
    }
}
