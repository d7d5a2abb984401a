//! Head-motion and IMU simulator.
//!
//! A [`HeadMotion`] gives the true attitude as a function of time; the
//! simulator differentiates it to body rates, projects gravity into the
//! sensor frame and adds noise and gyro bias. In rotation-vector mode the
//! true quaternion is reported with per-component noise instead.

use hud_core::{EulerAngles, InertialSample};
use nalgebra::{UnitQuaternion, Vector3};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::{ImuOutput, ImuParams};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

const GRAVITY: f64 = 9.81;

/// True head attitude over time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HeadMotion {
    /// Fixed attitude (rad).
    Still { roll: f64, pitch: f64 },
    /// Shoulder checks: yaw = amplitude · sin(2πt / period).
    YawSweep { amplitude: f64, period: f64 },
    /// Nodding: pitch = amplitude · sin(2πt / period).
    Nod { amplitude: f64, period: f64 },
}

impl HeadMotion {
    pub fn euler(&self, t: f64) -> EulerAngles {
        match *self {
            HeadMotion::Still { roll, pitch } => EulerAngles {
                roll,
                pitch,
                yaw: 0.0,
            },
            HeadMotion::YawSweep { amplitude, period } => EulerAngles {
                yaw: amplitude * (TAU * t / period).sin(),
                ..Default::default()
            },
            HeadMotion::Nod { amplitude, period } => EulerAngles {
                pitch: amplitude * (TAU * t / period).sin(),
                ..Default::default()
            },
        }
    }

    /// Body → world rotation at `t`.
    pub fn attitude(&self, t: f64) -> UnitQuaternion<f64> {
        let e = self.euler(t);
        UnitQuaternion::from_euler_angles(e.roll, e.pitch, e.yaw)
    }

    /// Body-frame angular rate at `t` (rad/s), by central difference.
    pub fn body_rate(&self, t: f64) -> Vector3<f64> {
        let h = 1e-4;
        let delta = self.attitude(t - h).inverse() * self.attitude(t + h);
        delta.scaled_axis() / (2.0 * h)
    }
}

/// Generates inertial samples at the IMU report rate.
pub struct ImuSim {
    pub params: ImuParams,
    pub motion: HeadMotion,
    rng: ChaCha8Rng,
    next_index: u64,
}

impl ImuSim {
    pub fn new(params: ImuParams, motion: HeadMotion, seed: u64) -> Self {
        Self {
            params,
            motion,
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    /// All samples with timestamps before `t_end`.
    pub fn samples_until(&mut self, t_end: f64) -> Vec<InertialSample> {
        let dt = self.params.sample_period();
        let mut out = Vec::new();
        loop {
            let t = self.next_index as f64 * dt;
            // tolerate rounding at the boundary
            if t >= t_end - 1e-9 {
                break;
            }
            out.push(self.sample_at(t, dt));
            self.next_index += 1;
        }
        out
    }

    fn sample_at(&mut self, t: f64, dt: f64) -> InertialSample {
        let q = self.motion.attitude(t);
        match self.params.output {
            ImuOutput::Raw => {
                let accel = q.inverse_transform_vector(&(Vector3::z() * GRAVITY));
                let rate = self.motion.body_rate(t);
                let (an, gn, bias) = (
                    self.params.accel_noise_std,
                    self.params.gyro_noise_std,
                    self.params.gyro_bias,
                );
                let accel = [
                    accel.x + self.uniform(an),
                    accel.y + self.uniform(an),
                    accel.z + self.uniform(an),
                ];
                let gyro = [
                    rate.x + bias[0] + self.uniform(gn),
                    rate.y + bias[1] + self.uniform(gn),
                    rate.z + bias[2] + self.uniform(gn),
                ];
                InertialSample::raw(t, dt, accel, Some(gyro))
            }
            ImuOutput::RotationVector => {
                let n = self.params.rotation_noise_std;
                let quaternion = [
                    q.w + self.uniform(n),
                    q.i + self.uniform(n),
                    q.j + self.uniform(n),
                    q.k + self.uniform(n),
                ];
                InertialSample::rotation_vector(t, dt, quaternion)
            }
        }
    }

    fn uniform(&mut self, std: f64) -> f64 {
        self.rng.gen::<f64>() * std * 2.0 - std
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hud_core::InertialReading;

    fn quiet(output: ImuOutput) -> ImuParams {
        ImuParams {
            accel_noise_std: 0.0,
            gyro_noise_std: 0.0,
            rotation_noise_std: 0.0,
            output,
            ..Default::default()
        }
    }

    #[test]
    fn samples_are_evenly_spaced() {
        let mut sim = ImuSim::new(quiet(ImuOutput::Raw), HeadMotion::Still { roll: 0.0, pitch: 0.0 }, 0);
        let first = sim.samples_until(0.1);
        assert_eq!(first.len(), 25);
        let second = sim.samples_until(0.2);
        assert_eq!(second.len(), 25);
        assert_abs_diff_eq!(second[0].timestamp_s, 0.1, epsilon = 1e-9);
        assert!(first.iter().all(|s| s.dt_s == 0.004));
    }

    #[test]
    fn still_head_measures_gravity() {
        let tilt = 0.2;
        let mut sim = ImuSim::new(quiet(ImuOutput::Raw), HeadMotion::Still { roll: tilt, pitch: 0.0 }, 0);
        let s = sim.samples_until(0.004)[0];
        let InertialReading::Raw { accel, gyro } = s.reading else {
            panic!("expected raw reading");
        };
        assert_abs_diff_eq!(accel[1], GRAVITY * tilt.sin(), epsilon = 1e-9);
        assert_abs_diff_eq!(accel[2], GRAVITY * tilt.cos(), epsilon = 1e-9);
        assert_abs_diff_eq!(gyro.unwrap()[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn yaw_sweep_rate_matches_derivative() {
        let motion = HeadMotion::YawSweep {
            amplitude: 1.0,
            period: 2.0,
        };
        // d/dt sin(πt) at t = 0 is π
        assert_abs_diff_eq!(motion.body_rate(0.0).z, std::f64::consts::PI, epsilon = 1e-6);
        assert_abs_diff_eq!(motion.euler(0.5).yaw, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_vector_mode_reports_truth() {
        let motion = HeadMotion::Nod {
            amplitude: 0.3,
            period: 1.0,
        };
        let mut sim = ImuSim::new(quiet(ImuOutput::RotationVector), motion.clone(), 0);
        let samples = sim.samples_until(0.3);
        let last = samples.last().unwrap();
        let InertialReading::RotationVector { quaternion } = last.reading else {
            panic!("expected rotation vector");
        };
        let truth = motion.attitude(last.timestamp_s);
        assert_abs_diff_eq!(quaternion[0], truth.w, epsilon = 1e-12);
        assert_abs_diff_eq!(quaternion[2], truth.j, epsilon = 1e-12);
    }
}
