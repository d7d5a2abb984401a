//! Orientation estimator: one state machine, interchangeable filter strategies.
//!
//! # States
//! `Uninitialized → Ready` on the first accepted sample or on binding to a
//! ready inertial source; `Ready → Ready` on every update. Reading the
//! attitude while `Uninitialized` is a [`HudError::NotReady`].
//!
//! # Strategies
//! - [`MadgwickFilter`] (fusion): gyro integration plus gravity correction.
//! - [`RotationVectorFilter`] (direct): adopt the sensor's fused quaternion.
//!
//! Both feed the same quaternion state, so the Euler readout is mode-agnostic.

use crate::error::{HudError, HudResult};
use crate::madgwick::MadgwickFilter;
use crate::source::{InertialSource, SourcePoll};
use crate::types::{EulerAngles, InertialReading, InertialSample};
use nalgebra::{Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Madgwick's recommended β for an IMU without magnetometer.
pub const DEFAULT_FUSION_GAIN: f64 = 0.033;

/// About one second of samples at the nominal 250 Hz.
pub const DEFAULT_MAX_DRAIN_SAMPLES: usize = 256;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Update strategy selected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Gyro + accelerometer fusion with correction gain β.
    Fusion { gain: f64 },
    /// Upstream sensor reports a fused rotation vector.
    Direct,
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Fusion {
            gain: DEFAULT_FUSION_GAIN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub mode: FilterMode,
    /// Upper bound on samples pulled by one `drain`; the rest wait for the
    /// next frame so an endless stream cannot stall the frame loop.
    pub max_drain_samples: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::default(),
            max_drain_samples: DEFAULT_MAX_DRAIN_SAMPLES,
        }
    }
}

impl EstimatorConfig {
    pub fn fusion(gain: f64) -> Self {
        Self {
            mode: FilterMode::Fusion { gain },
            ..Default::default()
        }
    }

    pub fn direct() -> Self {
        Self {
            mode: FilterMode::Direct,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> HudResult<()> {
        if self.max_drain_samples == 0 {
            return Err(HudError::config("max_drain_samples must be ≥ 1"));
        }
        self.build_filter().map(|_| ())
    }

    fn build_filter(&self) -> HudResult<Box<dyn OrientationFilter>> {
        Ok(match self.mode {
            FilterMode::Fusion { gain } => Box::new(MadgwickFilter::new(gain)?),
            FilterMode::Direct => Box::new(RotationVectorFilter),
        })
    }
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// One attitude update step.
pub trait OrientationFilter: fmt::Debug + Send {
    /// Advance `prior` (None before the first sample) by one sample.
    /// Samples this strategy cannot use are `MalformedInput`.
    fn step(
        &mut self,
        prior: Option<UnitQuaternion<f64>>,
        sample: &InertialSample,
    ) -> HudResult<UnitQuaternion<f64>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Adopts the latest fused quaternion as-is (after renormalisation).
#[derive(Clone, Copy, Debug, Default)]
pub struct RotationVectorFilter;

impl OrientationFilter for RotationVectorFilter {
    fn step(
        &mut self,
        _prior: Option<UnitQuaternion<f64>>,
        sample: &InertialSample,
    ) -> HudResult<UnitQuaternion<f64>> {
        let [w, x, y, z] = match sample.reading {
            InertialReading::RotationVector { quaternion } => quaternion,
            InertialReading::Raw { .. } => {
                return Err(HudError::MalformedInput {
                    record: "inertial sample",
                    reason: "direct mode needs rotation-vector readings".into(),
                })
            }
        };
        let q = Quaternion::new(w, x, y, z);
        UnitQuaternion::try_new(q, 1e-9).ok_or_else(|| HudError::MalformedInput {
            record: "inertial sample",
            reason: "rotation vector has zero norm".into(),
        })
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Euler readout, Z-Y-X convention (see [`EulerAngles`]).
pub fn euler_from_quaternion(q: &UnitQuaternion<f64>) -> EulerAngles {
    let (roll, pitch, yaw) = q.euler_angles();
    EulerAngles { roll, pitch, yaw }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Uninitialized,
    Ready { attitude: UnitQuaternion<f64> },
}

/// Outcome of draining a source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub integrated: usize,
    pub rejected: usize,
    /// The source reported end of stream.
    pub closed: bool,
    /// Stopped at `max_drain_samples` with samples possibly still pending.
    pub limited: bool,
}

/// Attitude estimator; owns the quaternion state exclusively.
#[derive(Debug)]
pub struct OrientationEstimator {
    filter: Box<dyn OrientationFilter>,
    state: State,
    max_drain_samples: usize,
    last_timestamp_s: Option<f64>,
    accepted: u64,
    rejected: u64,
}

impl OrientationEstimator {
    pub fn new(config: EstimatorConfig) -> HudResult<Self> {
        config.validate()?;
        let mut estimator = Self::with_filter(config.build_filter()?);
        estimator.max_drain_samples = config.max_drain_samples;
        Ok(estimator)
    }

    /// Build around a custom strategy.
    pub fn with_filter(filter: Box<dyn OrientationFilter>) -> Self {
        Self {
            filter,
            state: State::Uninitialized,
            max_drain_samples: DEFAULT_MAX_DRAIN_SAMPLES,
            last_timestamp_s: None,
            accepted: 0,
            rejected: 0,
        }
    }

    pub fn mode(&self) -> &'static str {
        self.filter.name()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    /// Samples accepted / rejected since construction or the last reset.
    pub fn counts(&self) -> (u64, u64) {
        (self.accepted, self.rejected)
    }

    /// Timestamp of the last accepted sample.
    pub fn last_timestamp_s(&self) -> Option<f64> {
        self.last_timestamp_s
    }

    /// Bind to a live source. A ready source makes the estimator `Ready`
    /// (level, facing forward) until the first sample arrives.
    pub fn bind<S>(&mut self, source: &S) -> HudResult<()>
    where
        S: InertialSource + ?Sized,
    {
        if !source.is_ready() {
            return Err(HudError::NotReady("inertial source is not streaming"));
        }
        if self.state == State::Uninitialized {
            debug!(mode = self.mode(), "estimator bound to inertial source");
            self.state = State::Ready {
                attitude: UnitQuaternion::identity(),
            };
        }
        Ok(())
    }

    /// Integrate one sample and return the new attitude.
    ///
    /// A malformed sample leaves the state untouched and is reported as
    /// `MalformedInput`; callers running a frame loop log it and carry on.
    pub fn update(&mut self, sample: &InertialSample) -> HudResult<EulerAngles> {
        let prior = match self.state {
            State::Ready { attitude } => Some(attitude),
            State::Uninitialized => None,
        };
        let next = sample
            .validate()
            .and_then(|()| self.filter.step(prior, sample));
        let attitude = match next {
            Ok(q) => q,
            Err(e) => {
                self.rejected += 1;
                return Err(e);
            }
        };
        if prior.is_none() {
            debug!(mode = self.mode(), "estimator initialised from first sample");
        }
        self.state = State::Ready { attitude };
        self.last_timestamp_s = Some(sample.timestamp_s);
        self.accepted += 1;
        Ok(euler_from_quaternion(&attitude))
    }

    /// Integrate the pending samples of `source` (batch-drain before a render),
    /// at most `max_drain_samples` per call.
    pub fn drain<S>(&mut self, source: &mut S) -> HudResult<DrainStats>
    where
        S: InertialSource + ?Sized,
    {
        if !source.is_ready() {
            return Err(HudError::NotReady("inertial source is not streaming"));
        }
        let mut stats = DrainStats::default();
        loop {
            if stats.integrated + stats.rejected >= self.max_drain_samples {
                stats.limited = true;
                break;
            }
            match source.poll_sample() {
                SourcePoll::Ready(sample) => self.integrate_logged(&sample, &mut stats),
                SourcePoll::Empty => break,
                SourcePoll::Closed => {
                    stats.closed = true;
                    break;
                }
            }
        }
        Ok(stats)
    }

    /// Integrate a batch of samples, logging and skipping bad ones.
    pub fn integrate_all<'a, I>(&mut self, samples: I) -> DrainStats
    where
        I: IntoIterator<Item = &'a InertialSample>,
    {
        let mut stats = DrainStats::default();
        for sample in samples {
            self.integrate_logged(sample, &mut stats);
        }
        stats
    }

    fn integrate_logged(&mut self, sample: &InertialSample, stats: &mut DrainStats) {
        match self.update(sample) {
            Ok(_) => stats.integrated += 1,
            Err(e) => {
                warn!(timestamp = sample.timestamp_s, error = %e, "skipping inertial sample");
                stats.rejected += 1;
            }
        }
    }

    /// Current attitude as Euler angles.
    pub fn attitude(&self) -> HudResult<EulerAngles> {
        self.quaternion().map(|q| euler_from_quaternion(&q))
    }

    /// Current attitude quaternion (unit norm).
    pub fn quaternion(&self) -> HudResult<UnitQuaternion<f64>> {
        match self.state {
            State::Ready { attitude } => Ok(attitude),
            State::Uninitialized => Err(HudError::NotReady(
                "no inertial sample received and no source bound",
            )),
        }
    }

    /// Back to `Uninitialized`, counters cleared.
    pub fn reset(&mut self) {
        self.state = State::Uninitialized;
        self.last_timestamp_s = None;
        self.accepted = 0;
        self.rejected = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{IterSource, SourceQueue};
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.004;

    fn raw(accel: [f64; 3], gyro: [f64; 3]) -> InertialSample {
        InertialSample::raw(0.0, DT, accel, Some(gyro))
    }

    fn rv(q: &UnitQuaternion<f64>) -> InertialSample {
        InertialSample::rotation_vector(0.0, 0.01, [q.w, q.i, q.j, q.k])
    }

    #[test]
    fn readout_before_first_sample_is_not_ready() {
        let est = OrientationEstimator::new(EstimatorConfig::default()).unwrap();
        assert!(!est.is_ready());
        assert!(matches!(est.attitude(), Err(HudError::NotReady(_))));
        assert!(matches!(est.quaternion(), Err(HudError::NotReady(_))));
    }

    #[test]
    fn fusion_converges_at_rest_and_stays_put() {
        let tilt: f64 = 0.3;
        let accel = [0.0, 9.81 * tilt.sin(), 9.81 * tilt.cos()];
        let mut est = OrientationEstimator::new(EstimatorConfig::fusion(0.5)).unwrap();
        for _ in 0..3000 {
            est.update(&raw(accel, [0.0; 3])).unwrap();
        }
        let settled = est.attitude().unwrap();
        assert_abs_diff_eq!(settled.roll, tilt, epsilon = 0.01);
        assert_abs_diff_eq!(settled.pitch, 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(settled.yaw, 0.0, epsilon = 0.01);

        for _ in 0..2000 {
            let a = est.update(&raw(accel, [0.0; 3])).unwrap();
            assert!((a.roll - settled.roll).abs() < 0.01);
            assert!(a.pitch.abs() < 0.01);
            let norm = est.quaternion().unwrap().into_inner().norm();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn direct_mode_adopts_rotation_vector() {
        let q = UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3);
        let mut est = OrientationEstimator::new(EstimatorConfig::direct()).unwrap();
        let a = est.update(&rv(&q)).unwrap();
        assert_abs_diff_eq!(a.roll, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(a.pitch, -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(a.yaw, 0.3, epsilon = 1e-12);

        // un-normalised input is renormalised
        let s = InertialSample::rotation_vector(0.0, 0.01, [2.0 * q.w, 2.0 * q.i, 2.0 * q.j, 2.0 * q.k]);
        est.update(&s).unwrap();
        assert_abs_diff_eq!(est.quaternion().unwrap().into_inner().norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(est.attitude().unwrap().yaw, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn readout_convention_is_mode_agnostic() {
        // a pure 1 rad yaw reached by integration in fusion mode…
        let mut fusion = OrientationEstimator::new(EstimatorConfig::fusion(0.1)).unwrap();
        for _ in 0..500 {
            fusion.update(&raw([0.0, 0.0, 1.0], [0.0, 0.0, 0.5])).unwrap();
        }
        // …reads out like the same quaternion adopted in direct mode
        let q = fusion.quaternion().unwrap();
        let mut direct = OrientationEstimator::new(EstimatorConfig::direct()).unwrap();
        direct.update(&rv(&q)).unwrap();
        let (a, b) = (fusion.attitude().unwrap(), direct.attitude().unwrap());
        assert_abs_diff_eq!(a.yaw, b.yaw, epsilon = 1e-12);
        assert_abs_diff_eq!(a.roll, b.roll, epsilon = 1e-12);
        assert_abs_diff_eq!(a.yaw, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn malformed_samples_leave_state_untouched() {
        let mut est = OrientationEstimator::new(EstimatorConfig::direct()).unwrap();
        let zero = InertialSample::rotation_vector(0.0, 0.01, [0.0; 4]);
        assert!(matches!(
            est.update(&zero),
            Err(HudError::MalformedInput { .. })
        ));
        assert!(!est.is_ready());

        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.7);
        est.update(&rv(&q)).unwrap();
        let wrong_kind = raw([0.0, 0.0, 1.0], [0.0; 3]);
        assert!(est.update(&wrong_kind).is_err());
        let bad_dt = InertialSample::rotation_vector(0.0, -1.0, [1.0, 0.0, 0.0, 0.0]);
        assert!(est.update(&bad_dt).is_err());
        assert_abs_diff_eq!(est.attitude().unwrap().yaw, 0.7, epsilon = 1e-12);
        assert_eq!(est.counts(), (1, 3));
    }

    #[test]
    fn overflowing_fusion_step_keeps_previous_attitude() {
        let mut est = OrientationEstimator::new(EstimatorConfig::fusion(DEFAULT_FUSION_GAIN)).unwrap();
        for _ in 0..10 {
            est.update(&raw([0.0, 0.0, 9.81], [0.0, 0.0, 0.5])).unwrap();
        }
        let before = est.quaternion().unwrap();
        let wild = InertialSample::raw(0.0, 1.0, [0.0, 0.0, 9.81], Some([1e300; 3]));
        assert!(matches!(
            est.update(&wild),
            Err(HudError::MalformedInput { .. })
        ));
        assert_eq!(est.quaternion().unwrap(), before);
        assert_eq!(est.counts(), (10, 1));
    }

    #[test]
    fn binding_requires_a_ready_source() {
        let mut est = OrientationEstimator::new(EstimatorConfig::default()).unwrap();
        let mut queue: SourceQueue<InertialSample> = SourceQueue::new();
        assert!(matches!(est.bind(&queue), Err(HudError::NotReady(_))));
        assert!(matches!(est.drain(&mut queue), Err(HudError::NotReady(_))));

        queue.bind();
        est.bind(&queue).unwrap();
        let a = est.attitude().unwrap();
        assert_eq!(a, EulerAngles::default());
    }

    #[test]
    fn drain_integrates_everything_pending() {
        let mut est = OrientationEstimator::new(EstimatorConfig::default()).unwrap();
        let mut queue = SourceQueue::new();
        queue.bind();
        for i in 0..10 {
            queue.push(InertialSample::raw(i as f64 * DT, DT, [0.0, 0.0, 1.0], None));
        }
        queue.push(InertialSample::raw(1.0, 0.0, [0.0, 0.0, 1.0], None));
        let stats = est.drain(&mut queue).unwrap();
        assert_eq!(
            stats,
            DrainStats {
                integrated: 10,
                rejected: 1,
                closed: false,
                limited: false,
            }
        );
        assert_abs_diff_eq!(est.last_timestamp_s().unwrap(), 9.0 * DT);

        queue.close();
        assert!(est.drain(&mut queue).unwrap().closed);
    }

    #[test]
    fn drain_of_endless_source_is_bounded() {
        let config = EstimatorConfig {
            max_drain_samples: 8,
            ..Default::default()
        };
        let mut est = OrientationEstimator::new(config).unwrap();
        let level = InertialSample::raw(0.0, DT, [0.0, 0.0, 1.0], Some([0.0; 3]));
        let mut endless = IterSource::new(std::iter::repeat(level));

        let stats = est.drain(&mut endless).unwrap();
        assert_eq!(stats.integrated, 8);
        assert!(stats.limited);
        assert!(!stats.closed);
        // the next frame picks up where this one stopped
        assert_eq!(est.drain(&mut endless).unwrap().integrated, 8);
        assert_eq!(est.counts(), (16, 0));
    }

    #[test]
    fn zero_drain_bound_is_a_config_error() {
        let config = EstimatorConfig {
            max_drain_samples: 0,
            ..Default::default()
        };
        assert!(matches!(
            OrientationEstimator::new(config),
            Err(HudError::Configuration(_))
        ));
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut est = OrientationEstimator::new(EstimatorConfig::default()).unwrap();
        est.update(&raw([0.0, 0.0, 1.0], [0.0; 3])).unwrap();
        assert!(est.is_ready());
        est.reset();
        assert!(est.attitude().is_err());
        assert_eq!(est.counts(), (0, 0));
    }

    #[test]
    fn invalid_gain_is_a_config_error() {
        assert!(matches!(
            OrientationEstimator::new(EstimatorConfig::fusion(f64::INFINITY)),
            Err(HudError::Configuration(_))
        ));
        assert!(EstimatorConfig::fusion(-1.0).validate().is_err());
        assert!(EstimatorConfig::direct().validate().is_ok());
    }
}
