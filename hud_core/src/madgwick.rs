//! Gradient-descent (Madgwick) attitude filter, IMU variant.
//!
//! ## Update
//! q̇ = ½ q ⊗ (0, ω) − β · ∇f / ‖∇f‖,   q ← normalise(q + q̇·dt)
//!
//! where `f(q, â)` is the mismatch between the gravity direction predicted by
//! `q` and the normalised accelerometer reading `â`, and `∇f = Jᵀ f`.
//! β (`gain`) trades convergence speed against accelerometer noise.
//!
//! No magnetometer: yaw is integrated from the gyroscope only.

use crate::error::{HudError, HudResult};
use crate::orientation::OrientationFilter;
use crate::types::{InertialReading, InertialSample};
use nalgebra::{Matrix3x4, Quaternion, UnitQuaternion, Vector3};

/// Below this accelerometer magnitude the reading carries no direction.
const MIN_ACCEL_NORM: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct MadgwickFilter {
    gain: f64,
}

impl MadgwickFilter {
    pub fn new(gain: f64) -> HudResult<Self> {
        if !(gain.is_finite() && gain >= 0.0) {
            return Err(HudError::Configuration(format!(
                "fusion gain ({gain}) must be a finite non-negative number"
            )));
        }
        Ok(Self { gain })
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Normalised gradient of the gravity objective at `q`, or `None` when the
    /// accelerometer gives no usable direction or `q` already agrees with it.
    fn gravity_step(q: &Quaternion<f64>, accel: &Vector3<f64>) -> Option<Quaternion<f64>> {
        let norm = accel.norm();
        if norm < MIN_ACCEL_NORM {
            return None;
        }
        let a = accel / norm;
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);

        let f = Vector3::new(
            2.0 * (x * z - w * y) - a.x,
            2.0 * (w * x + y * z) - a.y,
            2.0 * (0.5 - x * x - y * y) - a.z,
        );
        #[rustfmt::skip]
        let jacobian = Matrix3x4::new(
            -2.0 * y,  2.0 * z, -2.0 * w, 2.0 * x,
             2.0 * x,  2.0 * w,  2.0 * z, 2.0 * y,
             0.0,     -4.0 * x, -4.0 * y, 0.0,
        );
        let grad = jacobian.transpose() * f;
        let grad_norm = grad.norm();
        if grad_norm < 1e-12 {
            return None;
        }
        let s = grad / grad_norm;
        Some(Quaternion::new(s[0], s[1], s[2], s[3]))
    }
}

impl OrientationFilter for MadgwickFilter {
    /// A missing prior starts from the identity attitude.
    fn step(
        &mut self,
        prior: Option<UnitQuaternion<f64>>,
        sample: &InertialSample,
    ) -> HudResult<UnitQuaternion<f64>> {
        let (accel, gyro) = match sample.reading {
            InertialReading::Raw { accel, gyro } => (accel, gyro.unwrap_or([0.0; 3])),
            InertialReading::RotationVector { .. } => {
                return Err(HudError::MalformedInput {
                    record: "inertial sample",
                    reason: "fusion filter needs raw accelerometer readings".into(),
                })
            }
        };

        let q = prior.unwrap_or_else(UnitQuaternion::identity).into_inner();
        let omega = Quaternion::new(0.0, gyro[0], gyro[1], gyro[2]);
        let mut q_dot = q * omega * 0.5;

        if let Some(step) = Self::gravity_step(&q, &Vector3::from(accel)) {
            q_dot -= step * self.gain;
        }

        let next = q + q_dot * sample.dt_s;
        let norm = next.norm();
        if !norm.is_finite() || norm < 1e-12 {
            return Err(HudError::MalformedInput {
                record: "inertial sample",
                reason: format!("integration step left the unit sphere (norm {norm})"),
            });
        }
        Ok(UnitQuaternion::new_normalize(next))
    }

    fn name(&self) -> &'static str {
        "fusion"
    }
}
