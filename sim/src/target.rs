//! Ground objects around the rider and their motion.
//!
//! World frame, millimetres: the ground plane with `x` to the rider's right
//! and `z` along the rider's direction of travel at t = 0. Each object has a
//! state `[px, pz, vx, vz]` and a [`MotionSpec`] describing how it moves.

use serde::{Deserialize, Serialize};

/// How an object moves between steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSpec {
    /// Parked car, pole, standing pedestrian.
    Stationary,
    /// Constant velocity.
    ConstantVelocity,
    /// Constant turn rate in the ground plane. `omega` in rad/s, positive clockwise.
    ConstantTurn { omega: f64 },
    /// Switch motion model at given sim times.
    /// `segments` is sorted by start time; the active spec is the last one
    /// whose start is ≤ the current time. Before the first segment: CV.
    Segmented { segments: Vec<(f64, MotionSpec)> },
}

impl MotionSpec {
    fn advance(&self, s: &mut [f64; 4], t: f64, dt: f64) {
        match self {
            MotionSpec::Stationary => {
                s[2] = 0.0;
                s[3] = 0.0;
            }
            MotionSpec::ConstantVelocity => {
                s[0] += s[2] * dt;
                s[1] += s[3] * dt;
            }
            MotionSpec::ConstantTurn { omega } => {
                let v = s[2].hypot(s[3]);
                // heading measured from +z toward +x
                let heading = s[2].atan2(s[3]);
                s[0] += v * heading.sin() * dt;
                s[1] += v * heading.cos() * dt;
                let new_heading = heading + omega * dt;
                s[2] = v * new_heading.sin();
                s[3] = v * new_heading.cos();
            }
            MotionSpec::Segmented { segments } => {
                match segments.iter().filter(|(start, _)| *start <= t).last() {
                    Some((_, spec)) => spec.advance(s, t, dt),
                    None => MotionSpec::ConstantVelocity.advance(s, t, dt),
                }
            }
        }
    }
}

/// A simulated object with ground-truth state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundObject {
    pub id: u64,
    /// True state [px, pz, vx, vz] (mm, mm/s)
    pub state: [f64; 4],
    /// Height of the detection centroid above the camera (mm)
    pub height_mm: f64,
    pub motion: MotionSpec,
    /// Object leaves the scene at this time
    pub disappear_at: Option<f64>,
    /// Object enters the scene at this time
    pub appear_at: Option<f64>,
}

impl GroundObject {
    pub fn new(id: u64, pos: [f64; 2], vel: [f64; 2], motion: MotionSpec) -> Self {
        Self {
            id,
            state: [pos[0], pos[1], vel[0], vel[1]],
            height_mm: 0.0,
            motion,
            disappear_at: None,
            appear_at: None,
        }
    }

    pub fn stationary(id: u64, pos: [f64; 2]) -> Self {
        Self::new(id, pos, [0.0, 0.0], MotionSpec::Stationary)
    }

    pub fn active_between(mut self, appear_at: Option<f64>, disappear_at: Option<f64>) -> Self {
        self.appear_at = appear_at;
        self.disappear_at = disappear_at;
        self
    }

    /// Propagate the true state by `dt` seconds.
    pub fn step(&mut self, t: f64, dt: f64) {
        self.motion.advance(&mut self.state, t, dt);
    }

    /// True if the object is in the scene at time `t`.
    pub fn is_active(&self, t: f64) -> bool {
        if self.appear_at.is_some_and(|appear| t < appear) {
            return false;
        }
        if self.disappear_at.is_some_and(|gone| t >= gone) {
            return false;
        }
        true
    }

    pub fn position(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    /// Ground speed (mm/s).
    pub fn speed(&self) -> f64 {
        self.state[2].hypot(self.state[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_velocity_moves_linearly() {
        let mut o = GroundObject::new(0, [0.0, 1000.0], [100.0, -200.0], MotionSpec::ConstantVelocity);
        for i in 0..10 {
            o.step(i as f64 * 0.1, 0.1);
        }
        assert_abs_diff_eq!(o.state[0], 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(o.state[1], 800.0, epsilon = 1e-9);
    }

    #[test]
    fn stationary_never_moves() {
        let mut o = GroundObject::stationary(1, [500.0, 3000.0]);
        o.step(0.0, 1.0);
        assert_eq!(o.position(), (500.0, 3000.0));
        assert_eq!(o.speed(), 0.0);
    }

    #[test]
    fn turn_preserves_speed() {
        let mut o = GroundObject::new(2, [0.0, 0.0], [0.0, 1000.0], MotionSpec::ConstantTurn { omega: 0.5 });
        for i in 0..100 {
            o.step(i as f64 * 0.05, 0.05);
        }
        assert_abs_diff_eq!(o.speed(), 1000.0, epsilon = 1e-9);
        // turned right
        assert!(o.state[2] > 0.0);
    }

    #[test]
    fn segments_switch_by_time() {
        let motion = MotionSpec::Segmented {
            segments: vec![(1.0, MotionSpec::Stationary)],
        };
        let mut o = GroundObject::new(3, [0.0, 0.0], [0.0, 1000.0], motion);
        o.step(0.5, 0.5);
        assert_abs_diff_eq!(o.state[1], 500.0);
        o.step(1.0, 0.5);
        assert_abs_diff_eq!(o.state[1], 500.0);
        assert_eq!(o.speed(), 0.0);
    }

    #[test]
    fn activity_window() {
        let o = GroundObject::stationary(4, [0.0, 0.0]).active_between(Some(1.0), Some(2.0));
        assert!(!o.is_active(0.5));
        assert!(o.is_active(1.0));
        assert!(!o.is_active(2.0));
    }
}
