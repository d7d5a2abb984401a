//! Scenario definitions.
//!
//! Each scenario is a named configuration of ground objects, rider motion,
//! head motion and sensor parameters. All scenarios are deterministic given
//! the same seed.

use crate::{
    imu_sim::{HeadMotion, ImuSim},
    replay::{ReplayFrame, ReplayLog},
    target::{GroundObject, MotionSpec},
    tracker_sim::{CameraPose, TrackerSim},
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::{ImuOutput, ImuParams, StereoTrackerParams};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// Riding down a street: parked cars, a crossing pedestrian, an overtaking cyclist
    Commute,
    /// Busy plaza: 25 pedestrians wandering in front of the rider
    Crowded,
    /// Shoulder checks while passing a few objects; exercises the estimator
    HeadCheck,
    /// Rider stopped, head still, nothing around; rotation-vector IMU
    Idle,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub duration: f64, // seconds
    /// Rider speed along +z (mm/s)
    pub rider_speed: f64,
    pub objects: Vec<GroundObject>,
    pub head: HeadMotion,
    pub tracker: StereoTrackerParams,
    pub imu: ImuParams,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Commute => Self::commute(seed),
            ScenarioKind::Crowded => Self::crowded(seed),
            ScenarioKind::HeadCheck => Self::head_check(seed),
            ScenarioKind::Idle => Self::idle(seed),
        }
    }

    /// Run the simulation and record every frame the HUD would receive.
    pub fn record(&self) -> ReplayLog {
        let mut objects = self.objects.clone();
        let mut tracker = TrackerSim::new(self.tracker.clone(), self.seed);
        let mut imu = ImuSim::new(self.imu.clone(), self.head.clone(), self.seed.wrapping_add(1000));

        let dt = self.tracker.frame_period();
        let n_frames = (self.duration / dt).round() as usize;
        let mut frames = Vec::with_capacity(n_frames);

        for k in 0..n_frames {
            let t = k as f64 * dt;
            let truth = self.head.euler(t);
            let pose = CameraPose {
                position: (0.0, self.rider_speed * t),
                yaw: truth.yaw,
            };
            let tracks = tracker.frame(&objects, t, &pose);
            // samples up to and including this frame's exposure
            let samples = imu.samples_until(t + 1e-6);
            frames.push(ReplayFrame {
                time: t,
                tracks,
                samples,
                truth: Some(truth),
            });
            for object in &mut objects {
                object.step(t, dt);
            }
        }

        let log = ReplayLog {
            scenario_name: self.name.clone(),
            seed: self.seed,
            frame_period: dt,
            frames,
        };
        info!(
            scenario = %self.name,
            frames = log.frames.len(),
            samples = log.sample_count(),
            "scenario recorded"
        );
        log
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Commute
    // -----------------------------------------------------------------------
    fn commute(seed: u64) -> Self {
        let mut objects: Vec<GroundObject> = (0..6)
            .map(|i| {
                // parked cars along the right kerb
                GroundObject::stationary(i, [1800.0, 3000.0 + i as f64 * 5000.0])
            })
            .collect();
        // pedestrian crossing left to right
        objects.push(
            GroundObject::new(10, [-3000.0, 9000.0], [1300.0, 0.0], MotionSpec::ConstantVelocity)
                .active_between(Some(2.0), None),
        );
        // cyclist overtaking on the left, then cutting in
        objects.push(GroundObject::new(
            11,
            [-1200.0, -2000.0],
            [0.0, 6500.0],
            MotionSpec::Segmented {
                segments: vec![(6.0, MotionSpec::ConstantTurn { omega: 0.15 })],
            },
        ));

        Scenario {
            name: "commute".into(),
            seed,
            duration: 12.0,
            rider_speed: 4000.0,
            objects,
            head: HeadMotion::Nod {
                amplitude: 0.05,
                period: 0.8,
            },
            tracker: StereoTrackerParams::default(),
            imu: ImuParams::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Crowded
    // -----------------------------------------------------------------------
    fn crowded(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

        let objects = (0..25)
            .map(|i| {
                let x = (rng.gen::<f64>() - 0.5) * 6000.0;
                let z = 500.0 + rng.gen::<f64>() * 5000.0;
                let speed = rng.gen::<f64>() * 1400.0;
                let heading = rng.gen::<f64>() * std::f64::consts::TAU;
                let motion = if rng.gen::<f64>() < 0.3 {
                    MotionSpec::ConstantTurn {
                        omega: (rng.gen::<f64>() - 0.5) * 0.6,
                    }
                } else {
                    MotionSpec::ConstantVelocity
                };
                let mut o = GroundObject::new(
                    i as u64,
                    [x, z],
                    [speed * heading.sin(), speed * heading.cos()],
                    motion,
                );
                o.height_mm = 300.0 + rng.gen::<f64>() * 400.0;
                o
            })
            .collect();

        Scenario {
            name: "crowded".into(),
            seed,
            duration: 10.0,
            rider_speed: 1000.0,
            objects,
            head: HeadMotion::Still {
                roll: 0.0,
                pitch: 0.05,
            },
            tracker: StereoTrackerParams {
                clutter_rate: 0.5,
                p_detection: 0.85,
                ..Default::default()
            },
            imu: ImuParams::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 3: Head check
    // -----------------------------------------------------------------------
    fn head_check(seed: u64) -> Self {
        let objects = vec![
            GroundObject::stationary(0, [0.0, 12000.0]),
            GroundObject::stationary(1, [-2500.0, 8000.0]),
            GroundObject::new(2, [2000.0, 6000.0], [0.0, 1500.0], MotionSpec::ConstantVelocity),
        ];

        Scenario {
            name: "head_check".into(),
            seed,
            duration: 8.0,
            rider_speed: 3000.0,
            objects,
            head: HeadMotion::YawSweep {
                amplitude: 0.6,
                period: 4.0,
            },
            tracker: StereoTrackerParams::default(),
            imu: ImuParams {
                gyro_bias: [0.0, 0.0, 0.002],
                ..Default::default()
            },
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 4: Idle
    // -----------------------------------------------------------------------
    fn idle(seed: u64) -> Self {
        Scenario {
            name: "idle".into(),
            seed,
            duration: 3.0,
            rider_speed: 0.0,
            objects: Vec::new(),
            head: HeadMotion::Still {
                roll: 0.1,
                pitch: -0.05,
            },
            tracker: StereoTrackerParams {
                clutter_rate: 0.0,
                ..Default::default()
            },
            imu: ImuParams {
                output: ImuOutput::RotationVector,
                report_rate: 100.0,
                ..Default::default()
            },
        }
    }
}
