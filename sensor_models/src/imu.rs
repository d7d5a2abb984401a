//! Inertial measurement unit parameters.

use serde::{Deserialize, Serialize};

/// What the IMU reports to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImuOutput {
    /// Calibrated accelerometer + gyroscope; fused on the host
    #[default]
    Raw,
    /// On-sensor fused orientation quaternion
    RotationVector,
}

/// Physical configuration of the IMU.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImuParams {
    /// Accelerometer output rate (Hz)
    pub accel_rate: f64,
    /// Gyroscope output rate (Hz)
    pub gyro_rate: f64,
    /// Rate at which paired samples reach the estimator (Hz)
    pub report_rate: f64,
    /// Packets accumulate on the device until this many are pending
    pub batch_report_threshold: u32,
    /// The device blocks once this many packets are queued
    pub max_batch_reports: u32,
    /// Accelerometer white noise std (m/s²)
    pub accel_noise_std: f64,
    /// Gyroscope white noise std (rad/s)
    pub gyro_noise_std: f64,
    /// Constant gyroscope bias (rad/s)
    pub gyro_bias: [f64; 3],
    /// Rotation-vector component noise std
    pub rotation_noise_std: f64,
    pub output: ImuOutput,
}

impl Default for ImuParams {
    fn default() -> Self {
        Self {
            accel_rate: 500.0,
            gyro_rate: 400.0,
            report_rate: 250.0, // 4 ms integration step
            batch_report_threshold: 1,
            max_batch_reports: 10,
            accel_noise_std: 0.05,
            gyro_noise_std: 0.002,
            gyro_bias: [0.0; 3],
            rotation_noise_std: 0.0005,
            output: ImuOutput::Raw,
        }
    }
}

impl ImuParams {
    /// Nominal integration step (s).
    pub fn sample_period(&self) -> f64 {
        1.0 / self.report_rate
    }

    /// Paired samples cannot arrive faster than the slower raw sensor.
    pub fn effective_report_rate(&self) -> f64 {
        self.report_rate.min(self.accel_rate).min(self.gyro_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_setup() {
        let p = ImuParams::default();
        assert_eq!(p.sample_period(), 0.004);
        assert_eq!(p.effective_report_rate(), 250.0);
        assert_eq!(p.batch_report_threshold, 1);
        assert_eq!(p.max_batch_reports, 10);
        let fast = ImuParams {
            report_rate: 1000.0,
            ..Default::default()
        };
        assert_eq!(fast.effective_report_rate(), 400.0);
    }
}
