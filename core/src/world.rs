//! Static world geometry: bounds, rectangular obstacles, and ray queries.
//!
//! The world is the leaf component of the localization stack. It owns an ordered
//! sequence of axis-aligned rectangular obstacles plus the world bounds, is immutable
//! after construction, and answers three kinds of geometric questions:
//! point-in-obstacle containment, rectangle overlap (for robot footprint collision),
//! and ray intersection via a unit-step march (the basis of the range sensor model).
//!
//! ## Edge conventions
//!
//! Containment is inclusive of an obstacle's left/top edge and exclusive of its
//! right/bottom edge, and rectangle overlap is strict (edge contact with zero
//! overlapping area does not collide). Ray samples are tested against the half-open
//! bounds `[0, width) x [0, height)`; the robot footprint acceptance check instead
//! uses the closed interval on the footprint center. Both conventions are load-bearing
//! for measurement reproducibility and are pinned by unit tests.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangular obstacle.
///
/// Immutable for the lifetime of a run. Also used as a throwaway value for the robot's
/// square footprint during collision checks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl Obstacle {
    /// Create a new obstacle rectangle from its top-left corner and extents.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Obstacle {
        Obstacle {
            x,
            y,
            width,
            height,
        }
    }

    /// Test whether a point lies inside this rectangle.
    ///
    /// Inclusive of the left/top edge, exclusive of the right/bottom edge, so adjacent
    /// rectangles tile the plane without double-counting boundary samples.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Test whether two rectangles strictly overlap.
    ///
    /// Touching edges (zero overlapping area) do not count as an overlap.
    pub fn overlaps(&self, other: &Obstacle) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Result of a successful ray intersection query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Euclidean distance from the ray origin to the hit sample, minus the mount offset.
    ///
    /// May be negative when the hit is closer to the origin than the mount offset; the
    /// value is passed through unclamped.
    pub distance: f64,
    /// Index of the hit obstacle within the world's obstacle sequence.
    pub obstacle_index: usize,
}

/// The static environment: world bounds plus an ordered obstacle sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    width: f64,
    height: f64,
    obstacles: Vec<Obstacle>,
}

impl World {
    /// Create a new world.
    ///
    /// # Arguments
    /// * `width` - Horizontal world extent, must be positive.
    /// * `height` - Vertical world extent, must be positive.
    /// * `obstacles` - Ordered obstacle sequence; order matters for hit attribution.
    ///
    /// # Panics
    /// Panics if either dimension is not strictly positive.
    pub fn new(width: f64, height: f64, obstacles: Vec<Obstacle>) -> World {
        assert!(
            width > 0.0 && height > 0.0,
            "World dimensions must be positive, got {}x{}",
            width,
            height
        );
        World {
            width,
            height,
            obstacles,
        }
    }

    /// The default five-rectangle obstacle layout for a 1000x800 world.
    pub fn standard_obstacles() -> Vec<Obstacle> {
        vec![
            Obstacle::new(200.0, 200.0, 100.0, 300.0),
            Obstacle::new(500.0, 100.0, 200.0, 100.0),
            Obstacle::new(700.0, 100.0, 100.0, 300.0),
            Obstacle::new(600.0, 500.0, 100.0, 100.0),
            Obstacle::new(200.0, 640.0, 700.0, 100.0),
        ]
    }

    /// Horizontal world extent.
    pub fn width(&self) -> f64 {
        self.width
    }
    /// Vertical world extent.
    pub fn height(&self) -> f64 {
        self.height
    }
    /// The obstacle sequence, in construction order.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Test whether a point lies inside the half-open world bounds `[0, width) x [0, height)`.
    pub fn in_bounds(&self, px: f64, py: f64) -> bool {
        px >= 0.0 && px < self.width && py >= 0.0 && py < self.height
    }

    /// Test whether a rectangle strictly overlaps any obstacle.
    pub fn collides(&self, rect: &Obstacle) -> bool {
        self.obstacles.iter().any(|obstacle| obstacle.overlaps(rect))
    }

    /// Acceptance test for a proposed robot center position.
    ///
    /// The center must stay inside the closed interval `[0, width] x [0, height]` and
    /// the square footprint of side `size` centered on it must not overlap any
    /// obstacle. Used only for the true robot; particles are never checked.
    pub fn footprint_clear(&self, cx: f64, cy: f64, size: f64) -> bool {
        if !(0.0..=self.width).contains(&cx) || !(0.0..=self.height).contains(&cy) {
            return false;
        }
        let footprint = Obstacle::new(cx - size / 2.0, cy - size / 2.0, size, size);
        !self.collides(&footprint)
    }

    /// March a ray through the world in unit steps and report the first obstacle hit.
    ///
    /// The sample point after travelling `t` units along direction `angle_degrees`
    /// (0° = +x, positive toward −y) is
    /// `(origin_x + trunc(t cos θ), origin_y − trunc(t sin θ))`; offsets are
    /// truncated toward zero, so the march visits the same lattice of sample points
    /// from every pose at the same distance. Obstacles are tested in sequence order at each step, so the
    /// first step at which any obstacle contains the sample wins, with ties broken by
    /// obstacle order.
    ///
    /// # Arguments
    /// * `origin_x`, `origin_y` - Ray origin.
    /// * `angle_degrees` - Absolute ray direction in degrees.
    /// * `max_range` - March length bound; sampling stops once `t >= max_range`.
    /// * `mount_offset` - Fixed sensor mount distance subtracted from every hit.
    ///
    /// # Returns
    /// * `Some(RayHit)` on the first containing sample. The reported distance is the
    ///   Euclidean distance from the origin to the sample minus `mount_offset`, and
    ///   may be negative for very close hits.
    /// * `None` if the sample leaves world bounds or the range is exhausted first.
    pub fn cast_ray(
        &self,
        origin_x: f64,
        origin_y: f64,
        angle_degrees: f64,
        max_range: f64,
        mount_offset: f64,
    ) -> Option<RayHit> {
        let theta = angle_degrees.to_radians();
        let (cos_theta, sin_theta) = (theta.cos(), theta.sin());
        let mut travelled = 0.0_f64;
        while travelled < max_range {
            let sample_x = origin_x + (travelled * cos_theta).trunc();
            let sample_y = origin_y - (travelled * sin_theta).trunc();
            if !self.in_bounds(sample_x, sample_y) {
                return None;
            }
            for (obstacle_index, obstacle) in self.obstacles.iter().enumerate() {
                if obstacle.contains(sample_x, sample_y) {
                    let dx = sample_x - origin_x;
                    let dy = sample_y - origin_y;
                    return Some(RayHit {
                        distance: (dx * dx + dy * dy).sqrt() - mount_offset,
                        obstacle_index,
                    });
                }
            }
            travelled += 1.0;
        }
        None
    }
}
