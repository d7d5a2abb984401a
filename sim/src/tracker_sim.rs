//! Stereo tracker simulator.
//!
//! Generates one track batch per camera frame with:
//! - Depth noise growing with depth², uniform lateral noise
//! - Miss probability (1 - P_D)
//! - Poisson clutter inside the depth window and view cone
//! - Speed estimates for objects moving over the ground

use crate::target::GroundObject;
use hud_core::Track;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::{SpatialPoint, StereoTrackerParams};

/// Where the camera is and where it looks, in the world frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraPose {
    /// Rider position (mm)
    pub position: (f64, f64),
    /// Head yaw, positive to the right (rad)
    pub yaw: f64,
}

impl CameraPose {
    /// World point → camera frame, at the given centroid height.
    pub fn to_camera(&self, world: (f64, f64), height_mm: f64) -> SpatialPoint {
        let dx = world.0 - self.position.0;
        let dz = world.1 - self.position.1;
        let (s, c) = self.yaw.sin_cos();
        SpatialPoint::new(dx * c - dz * s, height_mm, dx * s + dz * c)
    }
}

/// Generates track batches from a set of ground objects.
pub struct TrackerSim {
    pub params: StereoTrackerParams,
    rng: ChaCha8Rng,
}

impl TrackerSim {
    pub fn new(params: StereoTrackerParams, seed: u64) -> Self {
        Self {
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One frame of detections at time `t`.
    pub fn frame(&mut self, objects: &[GroundObject], t: f64, pose: &CameraPose) -> Vec<Track> {
        let mut tracks = Vec::new();

        for object in objects {
            if !object.is_active(t) {
                continue;
            }
            let p = pose.to_camera(object.position(), object.height_mm);
            if !self.params.in_view(&p) {
                continue;
            }
            if self.rng.gen::<f64>() > self.params.p_detection {
                continue;
            }

            let depth_std = self.params.depth_noise_at(&p);
            let lateral_std = self.params.lateral_noise_std_mm;
            let noisy = SpatialPoint::new(
                p.x_mm + self.uniform(lateral_std),
                p.y_mm,
                p.z_mm + self.uniform(depth_std),
            );
            let mut track = noisy.to_track();
            let speed = object.speed();
            if speed > self.params.speed_report_min_mm_s {
                track = track.with_speed(speed);
            }
            tracks.push(track);
        }

        for _ in 0..self.poisson(self.params.clutter_rate) {
            let depth = self.params.min_depth_mm
                + self.rng.gen::<f64>() * (self.params.max_depth_mm - self.params.min_depth_mm);
            let half = self.params.hfov_deg / 2.0;
            let bearing = self.rng.gen::<f64>() * 2.0 * half - half;
            tracks.push(Track::new(depth / bearing.to_radians().cos(), bearing));
        }

        tracks
    }

    /// Uniform noise in ±`std`.
    fn uniform(&mut self, std: f64) -> f64 {
        self.rng.gen::<f64>() * std * 2.0 - std
    }

    /// Poisson draw by multiplying uniforms until the product drops below e^{-λ}.
    fn poisson(&mut self, lambda: f64) -> usize {
        if lambda <= 0.0 {
            return 0;
        }
        let threshold = (-lambda).exp();
        let mut n = 0usize;
        let mut prod = self.rng.gen::<f64>();
        while prod > threshold && n < 50 {
            prod *= self.rng.gen::<f64>();
            n += 1;
        }
        n
    }
}
