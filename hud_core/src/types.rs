//! Fundamental records flowing from the sensing subsystem into the core.

use crate::error::{HudError, HudResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Track — one polar measurement of a sensed object, for one frame
// ---------------------------------------------------------------------------

/// A polar measurement of one tracked object relative to the device.
///
/// Produced once per frame by the tracker and consumed once by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Distance to the object (millimetres, ≥ 0)
    pub range_mm: f64,
    /// Angle from the device forward axis, clockwise-positive (degrees, (-180, 180])
    pub bearing_deg: f64,
    /// Ground speed reported by the tracker, when it estimates one (mm/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mm_s: Option<f64>,
}

impl Track {
    pub fn new(range_mm: f64, bearing_deg: f64) -> Self {
        Self {
            range_mm,
            bearing_deg,
            speed_mm_s: None,
        }
    }

    pub fn with_speed(mut self, speed_mm_s: f64) -> Self {
        self.speed_mm_s = Some(speed_mm_s);
        self
    }

    /// Check the numeric content of the track.
    ///
    /// An infinite range is accepted: projection clamps it to the outer edge.
    pub fn validate(&self) -> HudResult<()> {
        if self.range_mm.is_nan() || self.range_mm < 0.0 {
            return Err(HudError::malformed(
                "track",
                format!("range {} mm is not a non-negative number", self.range_mm),
            ));
        }
        if !self.bearing_deg.is_finite() {
            return Err(HudError::malformed(
                "track",
                format!("bearing {} deg is not finite", self.bearing_deg),
            ));
        }
        if let Some(speed) = self.speed_mm_s {
            if !speed.is_finite() || speed < 0.0 {
                return Err(HudError::malformed(
                    "track",
                    format!("speed {speed} mm/s is not a non-negative number"),
                ));
            }
        }
        Ok(())
    }

    /// Copy of the track with unusable fields replaced: bad range → 0,
    /// bad bearing → straight ahead, bad speed → unknown.
    pub fn sanitized(&self) -> Track {
        let range_mm = if self.range_mm.is_nan() || self.range_mm < 0.0 {
            0.0
        } else {
            self.range_mm
        };
        let bearing_deg = if self.bearing_deg.is_finite() {
            self.bearing_deg
        } else {
            0.0
        };
        let speed_mm_s = self.speed_mm_s.filter(|s| s.is_finite() && *s >= 0.0);
        Track {
            range_mm,
            bearing_deg,
            speed_mm_s,
        }
    }
}

// ---------------------------------------------------------------------------
// Inertial samples
// ---------------------------------------------------------------------------

/// Payload of an inertial sample; which variant arrives depends on the IMU mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InertialReading {
    /// Calibrated accelerometer (any unit) and optional gyroscope (rad/s).
    Raw {
        accel: [f64; 3],
        #[serde(default)]
        gyro: Option<[f64; 3]>,
    },
    /// Orientation already fused on the sensor, as `[w, x, y, z]`.
    RotationVector { quaternion: [f64; 4] },
}

/// One inertial reading together with its timing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Sensor clock at which the sample was taken (seconds)
    pub timestamp_s: f64,
    /// Integration step since the previous sample (seconds, > 0)
    pub dt_s: f64,
    pub reading: InertialReading,
}

impl InertialSample {
    pub fn raw(timestamp_s: f64, dt_s: f64, accel: [f64; 3], gyro: Option<[f64; 3]>) -> Self {
        Self {
            timestamp_s,
            dt_s,
            reading: InertialReading::Raw { accel, gyro },
        }
    }

    pub fn rotation_vector(timestamp_s: f64, dt_s: f64, quaternion: [f64; 4]) -> Self {
        Self {
            timestamp_s,
            dt_s,
            reading: InertialReading::RotationVector { quaternion },
        }
    }

    /// Reject non-positive steps and non-finite components.
    pub fn validate(&self) -> HudResult<()> {
        if !self.dt_s.is_finite() || self.dt_s <= 0.0 {
            return Err(HudError::malformed(
                "inertial sample",
                format!("dt {} s is not a positive number", self.dt_s),
            ));
        }
        let finite = match &self.reading {
            InertialReading::Raw { accel, gyro } => {
                accel.iter().all(|v| v.is_finite())
                    && gyro.map_or(true, |g| g.iter().all(|v| v.is_finite()))
            }
            InertialReading::RotationVector { quaternion } => {
                quaternion.iter().all(|v| v.is_finite())
            }
        };
        if !finite {
            return Err(HudError::malformed(
                "inertial sample",
                "reading contains non-finite components",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attitude readout
// ---------------------------------------------------------------------------

/// Euler-angle readout of the attitude quaternion (radians).
///
/// Z-Y-X convention: yaw about Z, then pitch about the new Y, then roll about
/// the new X. Identical for every estimator strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    /// `(roll, pitch, yaw)` in degrees.
    pub fn to_degrees(&self) -> (f64, f64, f64) {
        (
            self.roll.to_degrees(),
            self.pitch.to_degrees(),
            self.yaw.to_degrees(),
        )
    }
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (r, p, y) = self.to_degrees();
        write!(f, "roll={r:.1}° pitch={p:.1}° yaw={y:.1}°")
    }
}
