//! `hud_core` — Radar overlay rendering and head-attitude estimation for a rider HUD.
//!
//! # Module layout
//! - [`types`]       — Tracks, inertial samples, Euler readout
//! - [`config`]      — Display / estimator configuration (serde, JSON)
//! - [`error`]       — `HudError` and `HudResult`
//! - [`projection`]  — Polar ↔ canvas mapping
//! - [`canvas`]      — RGB pixel buffer and raster primitives
//! - [`glyphs`]      — Tiny bitmap font for ring labels
//! - [`renderer`]    — Radar inset renderer and motion classifiers
//! - [`orientation`] — Attitude estimator state machine and strategies
//! - [`madgwick`]    — Gradient-descent gyro/accelerometer fusion
//! - [`source`]      — Non-blocking track / inertial input streams
//! - [`pipeline`]    — Per-frame driver tying it all together

pub mod canvas;
pub mod config;
pub mod error;
pub mod glyphs;
pub mod madgwick;
pub mod orientation;
pub mod pipeline;
pub mod projection;
pub mod renderer;
pub mod source;
pub mod types;

pub use canvas::RadarCanvas;
pub use config::{DisplayConfig, HudConfig, Rgb};
pub use error::{HudError, HudResult};
pub use orientation::{EstimatorConfig, FilterMode, OrientationEstimator};
pub use pipeline::{HudFrame, HudPipeline};
pub use projection::{to_pixel, to_polar, Projection};
pub use renderer::{render, MotionClassifier, NeverMoving, RadarRenderer, SpeedThreshold};
pub use source::{InertialSource, SourcePoll, TrackSource};
pub use types::{EulerAngles, InertialReading, InertialSample, Track};
