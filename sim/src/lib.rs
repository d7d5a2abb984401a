//! `sim` — Scenario simulator: ground objects, stereo tracker, IMU, replay.

pub mod imu_sim;
pub mod replay;
pub mod scenarios;
pub mod target;
pub mod tracker_sim;

pub use imu_sim::{HeadMotion, ImuSim};
pub use replay::{load_replay, save_replay, ReplayFrame, ReplayInertialSource, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use target::{GroundObject, MotionSpec};
pub use tracker_sim::{CameraPose, TrackerSim};
