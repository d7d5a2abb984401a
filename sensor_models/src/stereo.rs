//! Stereo depth tracker: parameters and the spatial → polar conversion that
//! turns its detections into [`Track`]s.
//!
//! # Frame
//! Camera frame, millimetres: `x` right, `y` up, `z` forward along the
//! optical axis. Range is measured in the ground plane (`x`, `z`), so a
//! detection's height does not change where it lands on the radar.

use hud_core::Track;
use serde::{Deserialize, Serialize};

/// Physical configuration of the stereo tracker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StereoTrackerParams {
    /// Nearest usable depth (mm)
    pub min_depth_mm: f64,
    /// Farthest usable depth (mm)
    pub max_depth_mm: f64,
    /// Horizontal field of view (degrees, full angle)
    pub hfov_deg: f64,
    /// Probability that a visible object is reported in a given frame
    pub p_detection: f64,
    /// Mean number of spurious detections per frame
    pub clutter_rate: f64,
    /// Frame rate of the detection network (Hz)
    pub frame_rate: f64,
    /// Depth noise std at 1 m (mm); stereo depth error grows with depth²
    pub depth_noise_std_mm: f64,
    /// Lateral noise std (mm)
    pub lateral_noise_std_mm: f64,
    /// Objects faster than this are reported with a speed estimate (mm/s)
    pub speed_report_min_mm_s: f64,
}

impl Default for StereoTrackerParams {
    fn default() -> Self {
        Self {
            min_depth_mm: 100.0,
            max_depth_mm: 5000.0,
            hfov_deg: 73.0,
            p_detection: 0.9,
            clutter_rate: 0.1,
            frame_rate: 30.0,
            depth_noise_std_mm: 10.0,
            lateral_noise_std_mm: 20.0,
            speed_report_min_mm_s: 0.0,
        }
    }
}

impl StereoTrackerParams {
    /// Seconds between two track batches.
    pub fn frame_period(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Whether the tracker can see `p` at all.
    pub fn in_view(&self, p: &SpatialPoint) -> bool {
        if p.z_mm < self.min_depth_mm || p.z_mm > self.max_depth_mm {
            return false;
        }
        p.bearing_deg().abs() <= self.hfov_deg / 2.0
    }

    /// Depth noise std at the depth of `p`.
    pub fn depth_noise_at(&self, p: &SpatialPoint) -> f64 {
        let z_m = p.z_mm / 1000.0;
        self.depth_noise_std_mm * z_m * z_m
    }
}

/// A detection's centroid in the camera frame (mm).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_mm: f64,
}

impl SpatialPoint {
    pub fn new(x_mm: f64, y_mm: f64, z_mm: f64) -> Self {
        Self { x_mm, y_mm, z_mm }
    }

    /// Ground-plane distance.
    pub fn range_mm(&self) -> f64 {
        self.x_mm.hypot(self.z_mm)
    }

    /// Clockwise from the optical axis: right of centre is positive.
    pub fn bearing_deg(&self) -> f64 {
        self.x_mm.atan2(self.z_mm).to_degrees()
    }

    pub fn to_track(&self) -> Track {
        Track::new(self.range_mm(), self.bearing_deg())
    }

    /// Inverse of [`SpatialPoint::to_track`] at ground height.
    pub fn from_polar(range_mm: f64, bearing_deg: f64) -> Self {
        let b = bearing_deg.to_radians();
        Self::new(range_mm * b.sin(), 0.0, range_mm * b.cos())
    }
}

impl From<SpatialPoint> for Track {
    fn from(p: SpatialPoint) -> Self {
        p.to_track()
    }
}
