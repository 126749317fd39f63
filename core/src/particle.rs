//! Particle population and the Monte Carlo localization engine.
//!
//! [ParticleSet] is the population data structure: a fixed-size ordered sequence of
//! weighted pose hypotheses with the weight bookkeeping (normalization, degenerate
//! fallback, multinomial resampling, effective sample size) attached. [MclFilter] is
//! the engine that owns a population, the true robot pose, and the world/sensor/motion
//! collaborators, and advances them one control tick at a time.
//!
//! ## Degeneracy
//!
//! The measurement likelihood `1 / (|z_true − z_i| + ε)` is intentionally sharp: a
//! particle whose simulated reading nearly matches the true reading can end up with
//! orders of magnitude more weight than the rest of the population, and most of the
//! importance mass can collapse onto a handful of particles within a few ticks.
//! [ParticleSet::effective_sample_size] exposes the standard `1/Σw²` diagnostic for
//! observing this; the likelihood itself is part of the filter's contract and is not
//! softened here.

use nalgebra::{Matrix2, Vector2};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::motion::MotionModel;
use crate::sensor::RangeSensor;
use crate::world::World;
use crate::{ControlIntent, Pose};

/// Guard added to the absolute range mismatch before inversion, preventing a perfect
/// match from producing an infinite weight.
pub const LIKELIHOOD_EPSILON: f64 = 1e-10;

/// One pose hypothesis with its importance weight.
///
/// Particles are value types: resampling freely duplicates and discards them, and a
/// particle has no identity beyond its index in the population during a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Hypothesized pose
    pub pose: Pose,
    /// Importance weight, non-negative
    pub weight: f64,
}

impl Particle {
    /// Create a new particle.
    pub fn new(pose: Pose, weight: f64) -> Particle {
        Particle { pose, weight }
    }
}

/// A fixed-size ordered population of particles.
///
/// The population size is set at construction and preserved by every operation;
/// resampling replaces the contents but never the length.
#[derive(Clone, Debug)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Scatter a fresh population uniformly over the world.
    ///
    /// Positions are uniform over `[0, width) x [0, height)`, headings uniform over
    /// `[0, 360)` degrees, and all weights start at `1/N`.
    ///
    /// # Panics
    /// Panics if `num_particles` is zero.
    pub fn scatter(num_particles: usize, world: &World, rng: &mut StdRng) -> ParticleSet {
        assert!(num_particles > 0, "Number of particles must be positive");
        let uniform_weight = 1.0 / num_particles as f64;
        let particles = (0..num_particles)
            .map(|_| {
                Particle::new(
                    Pose::new(
                        rng.random_range(0.0..world.width()),
                        rng.random_range(0.0..world.height()),
                        rng.random_range(0.0..360.0),
                    ),
                    uniform_weight,
                )
            })
            .collect();
        ParticleSet { particles }
    }

    /// Build a population from explicit particles.
    ///
    /// # Panics
    /// Panics if `particles` is empty.
    pub fn from_particles(particles: Vec<Particle>) -> ParticleSet {
        assert!(!particles.is_empty(), "Particle set must not be empty");
        ParticleSet { particles }
    }

    /// Population size `N`.
    pub fn len(&self) -> usize {
        self.particles.len()
    }
    /// Always false; present for clippy's `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
    /// Immutable view of the population.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
    /// Mutable view of the population, for prediction updates.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
    /// The current weight vector.
    pub fn weights(&self) -> Vec<f64> {
        self.particles.iter().map(|p| p.weight).collect()
    }

    /// Overwrite all weights.
    ///
    /// # Panics
    /// Panics if `weights` does not match the population size.
    pub fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(weights.len(), self.particles.len());
        for (particle, &weight) in self.particles.iter_mut().zip(weights.iter()) {
            particle.weight = weight;
        }
    }

    /// Normalize weights to sum to one.
    ///
    /// If the raw weight sum is zero or non-finite (possible only when every raw
    /// weight underflowed or overflowed), the population falls back to uniform `1/N`
    /// weights instead of dividing by zero or propagating NaN. The fallback is
    /// self-healing: the next measurement re-discriminates.
    pub fn normalize_weights(&mut self) {
        let sum: f64 = self.particles.iter().map(|p| p.weight).sum();
        if sum > 0.0 && sum.is_finite() {
            for particle in &mut self.particles {
                particle.weight /= sum;
            }
        } else {
            let uniform = 1.0 / self.particles.len() as f64;
            for particle in &mut self.particles {
                particle.weight = uniform;
            }
        }
    }

    /// Multinomial importance resampling.
    ///
    /// Draws `N` indices independently, with replacement, with probability
    /// proportional to weight (each draw inverts the cumulative weight distribution at
    /// an independent uniform variate, not stratified or systematic resampling), then
    /// replaces the population with the drawn poses at uniform `1/N` weight. If the
    /// weight sum is zero or non-finite the draw degrades to index-uniform.
    pub fn resample_multinomial(&mut self, rng: &mut StdRng) {
        let n = self.particles.len();
        let weights: Vec<f64> = self.particles.iter().map(|p| p.weight).collect();
        let total: f64 = weights.iter().sum();
        let uniform_weight = 1.0 / n as f64;
        let mut cumulative = Vec::with_capacity(n);
        let mut running = 0.0;
        for &weight in &weights {
            running += weight;
            cumulative.push(running);
        }
        let mut resampled = Vec::with_capacity(n);
        for _ in 0..n {
            let index = if total > 0.0 && total.is_finite() {
                let u = rng.random::<f64>() * total;
                cumulative.partition_point(|&c| c <= u).min(n - 1)
            } else {
                rng.random_range(0..n)
            };
            resampled.push(Particle::new(self.particles[index].pose, uniform_weight));
        }
        self.particles = resampled;
    }

    /// Effective sample size `1 / Σ w_i²`, the standard particle-degeneracy
    /// diagnostic. Returns 0 when the sum of squares is zero.
    pub fn effective_sample_size(&self) -> f64 {
        let sum_of_squares: f64 = self.particles.iter().map(|p| p.weight * p.weight).sum();
        if sum_of_squares > 0.0 {
            1.0 / sum_of_squares
        } else {
            0.0
        }
    }

    /// Weighted mean of the particle positions.
    ///
    /// Assumes normalized weights (call [ParticleSet::normalize_weights] first when
    /// the weights are raw).
    pub fn mean_position(&self) -> Vector2<f64> {
        let mut mean = Vector2::zeros();
        for particle in &self.particles {
            mean += particle.weight * Vector2::new(particle.pose.x, particle.pose.y);
        }
        mean
    }

    /// Weighted covariance of the particle positions about the weighted mean.
    ///
    /// Assumes normalized weights, like [ParticleSet::mean_position].
    pub fn position_covariance(&self) -> Matrix2<f64> {
        let mean = self.mean_position();
        let mut covariance = Matrix2::zeros();
        for particle in &self.particles {
            let diff = Vector2::new(particle.pose.x, particle.pose.y) - mean;
            covariance += particle.weight * diff * diff.transpose();
        }
        covariance
    }

    /// Unweighted mean squared position distance from a reference pose.
    ///
    /// The convergence metric used by the simulation harness and tests.
    pub fn mean_squared_error(&self, reference: &Pose) -> f64 {
        let n = self.particles.len() as f64;
        self.particles
            .iter()
            .map(|p| (p.pose.x - reference.x).powi(2) + (p.pose.y - reference.y).powi(2))
            .sum::<f64>()
            / n
    }
}

/// Per-tick output of the localization engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutput {
    /// The true-pose range measurement for this tick.
    pub range: f64,
    /// Whether a `Forward` intent survived the collision/bounds acceptance check.
    /// Always false for turns and `Idle`.
    pub forward_accepted: bool,
    /// Effective sample size of the normalized weights, captured before resampling.
    pub effective_sample_size: f64,
}

/// Monte Carlo localization engine.
///
/// Owns the particle population, the true robot pose, and the world, sensor, and
/// motion collaborators (all injected at construction, nothing global), plus a seeded
/// random generator so whole runs are reproducible. One call to [MclFilter::tick]
/// advances everything by one control step.
///
/// # Example
/// ```rust
/// use mcl::ControlIntent;
/// use mcl::particle::MclFilter;
///
/// let mut filter = MclFilter::with_defaults(42);
/// let output = filter.tick(ControlIntent::Forward);
/// assert!(output.range <= 1000.0);
/// assert_eq!(filter.particles().len(), 100);
/// ```
pub struct MclFilter {
    world: World,
    sensor: RangeSensor,
    motion: MotionModel,
    robot: Pose,
    robot_size: f64,
    particles: ParticleSet,
    rng: StdRng,
}

impl MclFilter {
    /// Create a new engine.
    ///
    /// The population is scattered uniformly over the world; the robot starts at
    /// `initial_pose` and is the engine's responsibility from then on.
    ///
    /// # Arguments
    /// * `world` - Static geometry, constructed once.
    /// * `sensor` - Range sensor configuration, shared by the true pose and every particle.
    /// * `motion` - Kinematic constants and process noise.
    /// * `num_particles` - Population size `N`, fixed for the engine's lifetime.
    /// * `initial_pose` - Starting true robot pose.
    /// * `robot_size` - Side length of the robot's square collision footprint.
    /// * `seed` - Seed for all randomness (scatter, process noise, resampling draws).
    ///
    /// # Panics
    /// Panics if `num_particles` is zero or `robot_size` is not strictly positive.
    pub fn new(
        world: World,
        sensor: RangeSensor,
        motion: MotionModel,
        num_particles: usize,
        initial_pose: Pose,
        robot_size: f64,
        seed: u64,
    ) -> MclFilter {
        assert!(num_particles > 0, "Number of particles must be positive");
        assert!(
            robot_size > 0.0,
            "Robot footprint size must be positive, got {}",
            robot_size
        );
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = ParticleSet::scatter(num_particles, &world, &mut rng);
        MclFilter {
            world,
            sensor,
            motion,
            robot: initial_pose,
            robot_size,
            particles,
            rng,
        }
    }

    /// Create an engine with the default configuration: 100 particles in a 1000x800
    /// world with the standard obstacle layout, default sensor and motion constants,
    /// and the robot centered at (500, 400) heading 0°.
    pub fn with_defaults(seed: u64) -> MclFilter {
        let world = World::new(1000.0, 800.0, World::standard_obstacles());
        MclFilter::new(
            world,
            RangeSensor::default(),
            MotionModel::default(),
            100,
            Pose::new(500.0, 400.0, 0.0),
            30.0,
            seed,
        )
    }

    /// Advance the filter by one control tick.
    ///
    /// Runs the fixed pipeline:
    /// 1. Apply the control to the true robot pose; `Forward` is rejected (pose
    ///    retained) on footprint collision or bounds exit.
    /// 2. If and only if a `Forward` was accepted, shift every particle by the
    ///    commanded displacement (computed from the *robot's* heading, not each
    ///    particle's own) plus independent Gaussian noise per axis. Particle
    ///    headings are untouched, and particles are never collision-checked.
    /// 3. Measure the true range.
    /// 4. Weight each particle by the inverse mismatch between its simulated reading
    ///    (along its own heading) and the true reading.
    /// 5. Normalize, with the degenerate-uniform fallback.
    /// 6. Resample multinomially, replacing the population.
    ///
    /// Each phase completes for the whole population before the next begins.
    pub fn tick(&mut self, control: ControlIntent) -> TickOutput {
        let forward_accepted = self.advance_robot(control);
        if forward_accepted {
            let (dx, dy) = self.motion.displacement(self.robot.heading);
            for particle in self.particles.particles_mut() {
                let (nx, ny) = self.motion.sample_noise(&mut self.rng);
                particle.pose.x += dx + nx;
                particle.pose.y += dy + ny;
            }
        }
        let range = self.sensor.simulate(&self.robot, &self.world);
        let weights: Vec<f64> = self
            .particles
            .particles()
            .iter()
            .map(|particle| {
                let predicted = self.sensor.simulate(&particle.pose, &self.world);
                1.0 / ((range - predicted).abs() + LIKELIHOOD_EPSILON)
            })
            .collect();
        self.particles.set_weights(&weights);
        self.particles.normalize_weights();
        let effective_sample_size = self.particles.effective_sample_size();
        self.particles.resample_multinomial(&mut self.rng);
        TickOutput {
            range,
            forward_accepted,
            effective_sample_size,
        }
    }

    /// Apply the control to the true robot pose. Returns whether a `Forward` intent
    /// was accepted; turning and idling always succeed but report false.
    fn advance_robot(&mut self, control: ControlIntent) -> bool {
        match control {
            ControlIntent::Forward => {
                let proposed = self.motion.apply(&self.robot, control);
                if self
                    .world
                    .footprint_clear(proposed.x, proposed.y, self.robot_size)
                {
                    self.robot = proposed;
                    true
                } else {
                    false
                }
            }
            ControlIntent::TurnLeft | ControlIntent::TurnRight => {
                self.robot = self.motion.apply(&self.robot, control);
                false
            }
            ControlIntent::Idle => false,
        }
    }

    /// The true robot pose.
    pub fn robot(&self) -> &Pose {
        &self.robot
    }
    /// Immutable population snapshot; valid to read between ticks only.
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }
    /// The static world geometry.
    pub fn world(&self) -> &World {
        &self.world
    }
    /// The sensor configuration.
    pub fn sensor(&self) -> &RangeSensor {
        &self.sensor
    }
    /// The motion model.
    pub fn motion(&self) -> &MotionModel {
        &self.motion
    }
    /// Population size `N`.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }
}
