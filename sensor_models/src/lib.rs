//! `sensor_models` — Stereo tracker and IMU parameters, spatial → polar conversion.

pub mod imu;
pub mod stereo;

pub use imu::{ImuOutput, ImuParams};
pub use stereo::{SpatialPoint, StereoTrackerParams};
