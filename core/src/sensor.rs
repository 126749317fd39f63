//! Ray-march range sensor model.
//!
//! Simulates a single fixed-mount distance sensor by delegating to
//! [World::cast_ray](crate::world::World::cast_ray). The simulation is pure: the same
//! pose and world always yield the same reading, and the same unit-step march
//! resolution is used for the true pose and for every particle, which is what makes
//! the measurement likelihood comparison meaningful.

use serde::{Deserialize, Serialize};

use crate::Pose;
use crate::world::World;

/// Configuration and behavior of the simulated range sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeSensor {
    /// Beam direction relative to the carrying pose's heading, in degrees.
    pub angle_offset: f64,
    /// Maximum sensing range; also the reading reported when nothing is hit.
    pub max_range: f64,
    /// Physical mount distance from the pose's geometric center, subtracted
    /// unconditionally from every hit distance. Close hits may therefore report
    /// negative readings; they are passed through unclamped.
    pub mount_offset: f64,
}

impl Default for RangeSensor {
    fn default() -> Self {
        RangeSensor {
            angle_offset: 0.0,
            max_range: 1000.0,
            mount_offset: 16.0,
        }
    }
}

impl RangeSensor {
    /// Create a new range sensor configuration.
    ///
    /// # Panics
    /// Panics if `max_range` is not strictly positive or `mount_offset` is negative.
    pub fn new(angle_offset: f64, max_range: f64, mount_offset: f64) -> RangeSensor {
        assert!(
            max_range > 0.0,
            "Sensor max range must be positive, got {}",
            max_range
        );
        assert!(
            mount_offset >= 0.0,
            "Sensor mount offset must be non-negative, got {}",
            mount_offset
        );
        RangeSensor {
            angle_offset,
            max_range,
            mount_offset,
        }
    }

    /// Simulate one range reading from the given pose.
    ///
    /// The absolute beam direction is `pose.heading + angle_offset`. Returns the hit
    /// distance (mount offset already subtracted), or `max_range` unchanged when the
    /// beam leaves world bounds or exhausts its range without a hit.
    pub fn simulate(&self, pose: &Pose, world: &World) -> f64 {
        match world.cast_ray(
            pose.x,
            pose.y,
            pose.heading + self.angle_offset,
            self.max_range,
            self.mount_offset,
        ) {
            Some(hit) => hit.distance,
            None => self.max_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Obstacle;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_empty_world_returns_max_range() {
        let world = World::new(1000.0, 800.0, Vec::new());
        let sensor = RangeSensor::default();
        let reading = sensor.simulate(&Pose::new(500.0, 400.0, 0.0), &world);
        assert_eq!(reading, sensor.max_range);
    }
    #[test]
    fn test_range_exhaustion_returns_max_range() {
        // Short-range sensor in a large empty world: the march runs out of range
        // while still in bounds.
        let world = World::new(1000.0, 800.0, Vec::new());
        let sensor = RangeSensor::new(0.0, 50.0, 16.0);
        let reading = sensor.simulate(&Pose::new(500.0, 400.0, 0.0), &world);
        assert_eq!(reading, 50.0);
    }
    #[test]
    fn test_eastward_block_reading() {
        let world = World::new(
            1000.0,
            800.0,
            vec![Obstacle::new(100.0, 100.0, 50.0, 50.0)],
        );
        let sensor = RangeSensor::default();
        let reading = sensor.simulate(&Pose::new(0.0, 100.0, 0.0), &world);
        assert_approx_eq!(reading, 84.0, 1e-12);
    }
    #[test]
    fn test_angle_offset_rotates_beam() {
        // Heading −90° plus a 90° offset points the beam along +x.
        let world = World::new(
            1000.0,
            800.0,
            vec![Obstacle::new(100.0, 100.0, 50.0, 50.0)],
        );
        let sensor = RangeSensor::new(90.0, 1000.0, 16.0);
        let reading = sensor.simulate(&Pose::new(0.0, 100.0, -90.0), &world);
        assert_approx_eq!(reading, 84.0, 1e-9);
    }
    #[test]
    fn test_simulate_is_pure() {
        let world = World::new(1000.0, 800.0, World::standard_obstacles());
        let sensor = RangeSensor::default();
        let pose = Pose::new(400.0, 300.0, 37.0);
        assert_eq!(sensor.simulate(&pose, &world), sensor.simulate(&pose, &world));
    }
}
