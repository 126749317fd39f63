//! Motion (prediction) model and process noise.
//!
//! The model serves two callers with deliberately different behavior:
//! - The **true robot** moves deterministically through [MotionModel::apply]; the
//!   localization engine separately subjects `Forward` results to a collision and
//!   bounds acceptance check.
//! - **Particles** are predicted with the commanded displacement plus independent
//!   Gaussian noise on each axis ([MotionModel::displacement] +
//!   [MotionModel::sample_noise]). The noise is what keeps the population diverse
//!   enough for resampling to discriminate between hypotheses over time. Particles
//!   are never collision-checked or bounds-clamped.
//!
//! All randomness is drawn from a caller-provided generator so simulations and tests
//! can seed it deterministically.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::{ControlIntent, Pose};

/// Kinematic constants plus the process-noise distribution for one robot.
#[derive(Clone, Copy, Debug)]
pub struct MotionModel {
    speed: f64,
    turn_angle: f64,
    noise_std: f64,
    noise: Normal<f64>,
}

impl Default for MotionModel {
    fn default() -> Self {
        MotionModel::new(5.0, 5.0, 10.0)
    }
}

impl MotionModel {
    /// Create a new motion model.
    ///
    /// # Arguments
    /// * `speed` - Displacement magnitude per `Forward` tick.
    /// * `turn_angle` - Heading increment in degrees per turn tick.
    /// * `noise_std` - Standard deviation of the per-axis Gaussian displacement noise
    ///   applied to particle predictions.
    ///
    /// # Panics
    /// Panics if `speed` is negative or `noise_std` is negative.
    pub fn new(speed: f64, turn_angle: f64, noise_std: f64) -> MotionModel {
        assert!(speed >= 0.0, "Speed must be non-negative, got {}", speed);
        assert!(
            noise_std >= 0.0,
            "Motion noise standard deviation must be non-negative, got {}",
            noise_std
        );
        let noise = Normal::new(0.0, noise_std).unwrap();
        MotionModel {
            speed,
            turn_angle,
            noise_std,
            noise,
        }
    }

    /// Displacement magnitude per `Forward` tick.
    pub fn speed(&self) -> f64 {
        self.speed
    }
    /// Heading increment per turn tick, in degrees.
    pub fn turn_angle(&self) -> f64 {
        self.turn_angle
    }
    /// Standard deviation of the particle displacement noise.
    pub fn noise_std(&self) -> f64 {
        self.noise_std
    }

    /// Commanded displacement for a `Forward` tick at the given heading.
    ///
    /// Screen-frame projection: `(speed * cos θ, −speed * sin θ)`, with `y` growing
    /// downward.
    pub fn displacement(&self, heading_degrees: f64) -> (f64, f64) {
        let theta = heading_degrees.to_radians();
        (self.speed * theta.cos(), -self.speed * theta.sin())
    }

    /// Deterministically apply a control intent to a pose.
    ///
    /// `Forward` translates along the pose's own heading with the heading unchanged;
    /// turns change only the heading; `Idle` is the identity. No noise and no
    /// collision checking; acceptance is the engine's concern.
    pub fn apply(&self, pose: &Pose, control: ControlIntent) -> Pose {
        match control {
            ControlIntent::Forward => {
                let (dx, dy) = self.displacement(pose.heading);
                Pose::new(pose.x + dx, pose.y + dy, pose.heading)
            }
            ControlIntent::TurnLeft => Pose::new(pose.x, pose.y, pose.heading + self.turn_angle),
            ControlIntent::TurnRight => Pose::new(pose.x, pose.y, pose.heading - self.turn_angle),
            ControlIntent::Idle => *pose,
        }
    }

    /// Draw one independent Gaussian noise sample per displacement axis.
    pub fn sample_noise(&self, rng: &mut StdRng) -> (f64, f64) {
        (self.noise.sample(rng), self.noise.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;

    #[test]
    fn test_forward_displacement_east() {
        let motion = MotionModel::new(5.0, 5.0, 0.0);
        let moved = motion.apply(&Pose::new(100.0, 100.0, 0.0), ControlIntent::Forward);
        assert_approx_eq!(moved.x, 105.0, 1e-12);
        assert_approx_eq!(moved.y, 100.0, 1e-12);
        assert_eq!(moved.heading, 0.0);
    }
    #[test]
    fn test_forward_displacement_up_is_negative_y() {
        let motion = MotionModel::new(5.0, 5.0, 0.0);
        let moved = motion.apply(&Pose::new(100.0, 100.0, 90.0), ControlIntent::Forward);
        assert_approx_eq!(moved.x, 100.0, 1e-9);
        assert_approx_eq!(moved.y, 95.0, 1e-9);
    }
    #[test]
    fn test_turns_change_only_heading() {
        let motion = MotionModel::default();
        let pose = Pose::new(10.0, 20.0, 30.0);
        let left = motion.apply(&pose, ControlIntent::TurnLeft);
        let right = motion.apply(&pose, ControlIntent::TurnRight);
        assert_eq!((left.x, left.y, left.heading), (10.0, 20.0, 35.0));
        assert_eq!((right.x, right.y, right.heading), (10.0, 20.0, 25.0));
    }
    #[test]
    fn test_idle_is_identity() {
        let motion = MotionModel::default();
        let pose = Pose::new(1.0, 2.0, 3.0);
        assert_eq!(motion.apply(&pose, ControlIntent::Idle), pose);
    }
    #[test]
    fn test_noise_statistics() {
        // Seeded sample mean of Normal(0, 10) over 4000 axis draws stays well within
        // five standard errors of zero.
        let motion = MotionModel::new(5.0, 5.0, 10.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut sum = 0.0;
        let draws = 2000;
        for _ in 0..draws {
            let (nx, ny) = motion.sample_noise(&mut rng);
            sum += nx + ny;
        }
        let mean = sum / (2.0 * draws as f64);
        assert!(mean.abs() < 0.8, "Sample mean {} too far from zero", mean);
    }
    #[test]
    fn test_zero_noise_std_is_silent() {
        let motion = MotionModel::new(5.0, 5.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(motion.sample_noise(&mut rng), (0.0, 0.0));
    }
}
