//! Monte Carlo localization toolbox for planar range-sensing robots
//!
//! This crate provides a set of tools for implementing Sequential Monte Carlo
//! ("particle filter") localization in Rust. The filter estimates the unknown position
//! and heading of a mobile robot moving through a 2-D world populated with rectangular
//! obstacles, using nothing but a single simulated range sensor and knowledge of the
//! commanded motion. It is designed as an estimation core: rendering, input polling,
//! and display loops are external collaborators that feed control intents in and read
//! population snapshots out once per tick.
//!
//! This crate is primarily built off of three additional dependencies:
//! - [`nalgebra`](https://crates.io/crates/nalgebra): Provides the linear algebra tools for population statistics.
//! - [`rand`](https://crates.io/crates/rand) and [`rand_distr`](https://crates.io/crates/rand_distr): Provides random number generation for particle scatter, process noise, and resampling.
//! - [`serde`](https://crates.io/crates/serde) and [`csv`](https://crates.io/crates/csv): Provides serialization for simulation records.
//!
//! ## Crate overview
//!
//! This crate is organized into several modules:
//! - [world]: Contains the static obstacle geometry, world bounds, and ray-intersection queries.
//! - [sensor]: Contains the ray-march range sensor model.
//! - [motion]: Contains the motion (prediction) model and its process noise.
//! - [particle]: Contains the particle population and the localization engine itself.
//! - [sim]: Contains scripted-scenario simulation utilities and CSV records.
//!
//! ## Coordinate conventions
//!
//! The world uses a screen-style frame: `x` grows to the right, `y` grows *downward*,
//! and headings are measured in degrees with 0° along +x and positive angles rotating
//! toward −y (counterclockwise on screen). All displacement math therefore takes the
//! form `(dx, dy) = speed * (cos θ, −sin θ)`. Headings are not wrapped during motion;
//! only the trigonometric projections of a heading are ever consumed, so an unbounded
//! accumulated heading is harmless. [wrap_to_180] and [wrap_to_360] are provided for
//! presentation and error metrics.
//!
//! ## Per-tick pipeline
//!
//! Each control step runs a fixed sequential pipeline over the population:
//! predict (commanded displacement plus Gaussian noise, applied to every particle) →
//! measure (ray-cast from the true pose) → weight (inverse range mismatch) →
//! normalize (with a degenerate-uniform fallback) → resample (multinomial, with
//! replacement). The population size is invariant across every phase. See
//! [particle::MclFilter] for the engine that owns this pipeline.

pub mod motion;
pub mod particle;
pub mod sensor;
pub mod sim;
pub mod world;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A 2-D pose hypothesis: position plus heading.
///
/// Heading is stored in degrees (0° = +x, positive toward −y). Poses are plain value
/// types; the motion model returns new poses rather than mutating in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Horizontal position in world units
    pub x: f64,
    /// Vertical position in world units (grows downward)
    pub y: f64,
    /// Heading in degrees
    pub heading: f64,
}

impl Pose {
    /// Create a new pose from position and heading (degrees).
    pub fn new(x: f64, y: f64, heading: f64) -> Pose {
        Pose { x, y, heading }
    }
    /// Heading converted to radians.
    pub fn heading_radians(&self) -> f64 {
        self.heading.to_radians()
    }
    /// Euclidean distance between this pose's position and another's.
    ///
    /// # Example
    /// ```rust
    /// use mcl::Pose;
    /// let a = Pose::new(0.0, 0.0, 0.0);
    /// let b = Pose::new(3.0, 4.0, 90.0);
    /// assert_eq!(a.distance_to(&b), 5.0);
    /// ```
    pub fn distance_to(&self, other: &Pose) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pose {{ x: {:.2}, y: {:.2}, heading: {:.2} deg }}",
            self.x, self.y, self.heading
        )
    }
}

impl From<(f64, f64, f64)> for Pose {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Pose::new(tuple.0, tuple.1, tuple.2)
    }
}

impl From<Pose> for [f64; 3] {
    fn from(pose: Pose) -> Self {
        [pose.x, pose.y, pose.heading]
    }
}

impl TryFrom<&[f64]> for Pose {
    type Error = &'static str;
    /// Attempts to create a Pose from a slice of 3 elements `[x, y, heading]`.
    fn try_from(slice: &[f64]) -> Result<Self, Self::Error> {
        if slice.len() != 3 {
            return Err("Slice must have length 3 for Pose");
        }
        Ok(Pose::new(slice[0], slice[1], slice[2]))
    }
}

/// Discrete control intent for one tick.
///
/// The external control collaborator (keyboard, script, planner) reduces its input to
/// exactly one of these per tick. The closed set keeps motion-model dispatch
/// exhaustively checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ControlIntent {
    /// Drive forward along the current heading
    Forward,
    /// Increment the heading by the configured turn angle
    TurnLeft,
    /// Decrement the heading by the configured turn angle
    TurnRight,
    /// Hold position and heading
    #[default]
    Idle,
}

impl ControlIntent {
    /// Stable lowercase name, matching the CLI spelling.
    pub fn name(&self) -> &'static str {
        match self {
            ControlIntent::Forward => "forward",
            ControlIntent::TurnLeft => "turn-left",
            ControlIntent::TurnRight => "turn-right",
            ControlIntent::Idle => "idle",
        }
    }
}

impl Display for ControlIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// --- Miscellaneous functions for wrapping angles ---
/// Wrap an angle to the range -180 to 180 degrees
///
/// This function is generic and can be used with any type that implements the necessary traits.
///
/// # Arguments
/// * `angle` - The angle to be wrapped, which can be of any type that implements the necessary traits.
/// # Returns
/// * The wrapped angle, which will be in the range -180 to 180 degrees.
/// # Example
/// ```rust
/// use mcl::wrap_to_180;
/// let angle = 190.0;
/// let wrapped_angle = wrap_to_180(angle);
/// assert_eq!(wrapped_angle, -170.0); // 190 degrees wrapped to -170 degrees
/// ```
pub fn wrap_to_180<T>(angle: T) -> T
where
    T: PartialOrd + Copy + std::ops::SubAssign + std::ops::AddAssign + From<f64>,
{
    let mut wrapped: T = angle;
    while wrapped > T::from(180.0) {
        wrapped -= T::from(360.0);
    }
    while wrapped < T::from(-180.0) {
        wrapped += T::from(360.0);
    }
    wrapped
}
/// Wrap an angle to the range 0 to 360 degrees
///
/// This function is generic and can be used with any type that implements the necessary traits.
///
/// # Arguments
/// * `angle` - The angle to be wrapped, which can be of any type that implements the necessary traits.
/// # Returns
/// * The wrapped angle, which will be in the range 0 to 360 degrees.
/// # Example
/// ```rust
/// use mcl::wrap_to_360;
/// let angle = 370.0;
/// let wrapped_angle = wrap_to_360(angle);
/// assert_eq!(wrapped_angle, 10.0); // 370 degrees wrapped to 10 degrees
/// ```
pub fn wrap_to_360<T>(angle: T) -> T
where
    T: PartialOrd + Copy + std::ops::SubAssign + std::ops::AddAssign + From<f64>,
{
    let mut wrapped: T = angle;
    while wrapped > T::from(360.0) {
        wrapped -= T::from(360.0);
    }
    while wrapped < T::from(0.0) {
        wrapped += T::from(360.0);
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_to_180() {
        assert_eq!(super::wrap_to_180(190.0), -170.0);
        assert_eq!(super::wrap_to_180(-190.0), 170.0);
        assert_eq!(super::wrap_to_180(0.0), 0.0);
        assert_eq!(super::wrap_to_180(180.0), 180.0);
        assert_eq!(super::wrap_to_180(-180.0), -180.0);
    }
    #[test]
    fn test_wrap_to_360() {
        assert_eq!(super::wrap_to_360(370.0), 10.0);
        assert_eq!(super::wrap_to_360(-10.0), 350.0);
        assert_eq!(super::wrap_to_360(0.0), 0.0);
    }
    #[test]
    fn test_pose_new() {
        let pose = Pose::new(10.0, 20.0, 45.0);
        assert_eq!(pose.x, 10.0);
        assert_eq!(pose.y, 20.0);
        assert_eq!(pose.heading, 45.0);
    }
    #[test]
    fn test_pose_heading_radians() {
        let pose = Pose::new(0.0, 0.0, 180.0);
        assert_approx_eq!(pose.heading_radians(), std::f64::consts::PI, 1e-12);
    }
    #[test]
    fn test_pose_from_tuple_roundtrip() {
        let pose: Pose = (1.0, 2.0, 3.0).into();
        let array: [f64; 3] = pose.into();
        assert_eq!(array, [1.0, 2.0, 3.0]);
    }
    #[test]
    fn test_pose_try_from_slice() {
        let pose = Pose::try_from([5.0, 6.0, 7.0].as_slice()).unwrap();
        assert_eq!(pose, Pose::new(5.0, 6.0, 7.0));
        assert!(Pose::try_from([1.0, 2.0].as_slice()).is_err());
    }
    #[test]
    fn test_control_intent_names() {
        assert_eq!(ControlIntent::Forward.name(), "forward");
        assert_eq!(ControlIntent::TurnLeft.name(), "turn-left");
        assert_eq!(ControlIntent::TurnRight.name(), "turn-right");
        assert_eq!(ControlIntent::Idle.name(), "idle");
        assert_eq!(ControlIntent::default(), ControlIntent::Idle);
    }
}
