//! Integration tests for the planar Monte Carlo localization engine.
//!
//! These tests drive whole seeded filter runs and assert the population-level
//! contracts: fixed population size, normalized weights, convergence of the
//! population toward the true pose under informative measurements, and the
//! deliberate asymmetry between the collision-checked robot and the
//! never-clamped particles.

use assert_approx_eq::assert_approx_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use mcl::motion::MotionModel;
use mcl::particle::{MclFilter, ParticleSet};
use mcl::sensor::RangeSensor;
use mcl::sim::{forward_scenario, run_scenario};
use mcl::world::{Obstacle, World};
use mcl::{ControlIntent, Pose};

/// A filter staring down a single block from the west, used by the convergence
/// and rejection tests.
fn single_block_filter(robot: Pose, seed: u64) -> MclFilter {
    let world = World::new(
        1000.0,
        800.0,
        vec![Obstacle::new(700.0, 350.0, 100.0, 100.0)],
    );
    MclFilter::new(
        world,
        RangeSensor::default(),
        MotionModel::default(),
        100,
        robot,
        30.0,
        seed,
    )
}

#[test]
fn population_size_and_weight_sum_invariant_across_ticks() {
    let mut filter = MclFilter::with_defaults(7);
    let script = [
        ControlIntent::Forward,
        ControlIntent::TurnLeft,
        ControlIntent::Forward,
        ControlIntent::TurnRight,
        ControlIntent::Idle,
        ControlIntent::Forward,
    ];
    for round in 0..8 {
        for &control in &script {
            filter.tick(control);
            assert_eq!(filter.particles().len(), 100, "round {}", round);
            let weight_sum: f64 = filter
                .particles()
                .particles()
                .iter()
                .map(|p| p.weight)
                .sum();
            assert_approx_eq!(weight_sum, 1.0, 1e-6);
        }
    }
}

#[test]
fn population_converges_toward_robot_under_forward_drive() {
    // Robot drives east from (200, 400) toward a block at x = 700; the range
    // reading shrinks every tick, and only hypotheses that track it survive
    // resampling. The mean squared position error over the last ten ticks must
    // drop below the error over the first ten.
    let mut filter = single_block_filter(Pose::new(200.0, 400.0, 0.0), 42);
    let records = run_scenario(&mut filter, &forward_scenario(50));
    assert_eq!(records.len(), 50);
    assert!(records.iter().all(|r| r.forward_accepted));

    let early: f64 = records[..10].iter().map(|r| r.mean_squared_error).sum::<f64>() / 10.0;
    let late: f64 = records[40..].iter().map(|r| r.mean_squared_error).sum::<f64>() / 10.0;
    assert!(
        late < early,
        "Population failed to converge: early mse {:.1}, late mse {:.1}",
        early,
        late
    );
}

#[test]
fn rejected_forward_leaves_robot_and_particles_fixed() {
    // Proposed footprint [80, 110] x [110, 140] strictly overlaps the block, so
    // the move is rejected and the prediction step is skipped: every post-tick
    // pose must be one of the pre-tick poses (resampling only permutes and
    // duplicates).
    let world = World::new(1000.0, 800.0, vec![Obstacle::new(100.0, 100.0, 50.0, 50.0)]);
    let mut filter = MclFilter::new(
        world,
        RangeSensor::default(),
        MotionModel::default(),
        100,
        Pose::new(90.0, 125.0, 0.0),
        30.0,
        3,
    );
    let before: Vec<Pose> = filter
        .particles()
        .particles()
        .iter()
        .map(|p| p.pose)
        .collect();
    let robot_before = *filter.robot();

    let output = filter.tick(ControlIntent::Forward);
    assert!(!output.forward_accepted);
    assert_eq!(*filter.robot(), robot_before);
    for particle in filter.particles().particles() {
        assert!(
            before.contains(&particle.pose),
            "Particle moved on a rejected tick: {}",
            particle.pose
        );
    }
}

#[test]
fn accepted_forward_moves_particles_with_the_robot() {
    let mut filter = single_block_filter(Pose::new(200.0, 400.0, 0.0), 17);
    let before: Vec<Pose> = filter
        .particles()
        .particles()
        .iter()
        .map(|p| p.pose)
        .collect();

    let output = filter.tick(ControlIntent::Forward);
    assert!(output.forward_accepted);
    assert_approx_eq!(filter.robot().x, 205.0, 1e-12);
    // Gaussian displacement noise makes a coincidental return to a pre-tick pose
    // impossible: the whole surviving population must be at fresh positions.
    assert!(
        filter
            .particles()
            .particles()
            .iter()
            .all(|p| !before.contains(&p.pose)),
        "Expected every particle to move on an accepted Forward tick"
    );
}

#[test]
fn particles_are_never_bounds_clamped() {
    // Empty world: every reading is max range, so weights stay uniform and the
    // population simply rides the commanded displacement. The robot pins against
    // the right bound (inclusive) while particles keep drifting past it.
    let world = World::new(1000.0, 800.0, Vec::new());
    let mut filter = MclFilter::new(
        world,
        RangeSensor::default(),
        MotionModel::default(),
        100,
        Pose::new(500.0, 400.0, 0.0),
        30.0,
        23,
    );
    for _ in 0..120 {
        filter.tick(ControlIntent::Forward);
    }
    assert_approx_eq!(filter.robot().x, 1000.0, 1e-9);
    assert!(
        filter
            .particles()
            .particles()
            .iter()
            .any(|p| p.pose.x > 1000.0),
        "Expected part of the population to drift out of bounds"
    );
}

#[test]
fn scatter_does_not_avoid_obstacles() {
    // Particle initialization is uniform over the world with no collision
    // rejection; with the standard layout covering about a fifth of the area, a
    // large scatter lands particles inside obstacles.
    let world = World::new(1000.0, 800.0, World::standard_obstacles());
    let mut rng = StdRng::seed_from_u64(99);
    let set = ParticleSet::scatter(10_000, &world, &mut rng);
    let inside = set
        .particles()
        .iter()
        .filter(|p| {
            world
                .obstacles()
                .iter()
                .any(|o| o.contains(p.pose.x, p.pose.y))
        })
        .count();
    assert!(inside > 0, "No scattered particle landed inside an obstacle");
}

#[test]
fn idle_tick_reports_block_distance() {
    // Robot at (0, 100) heading 0 with a block at (100, 100) reads
    // 100 - 16 = 84 on an idle tick (no motion, measurement only).
    let world = World::new(1000.0, 800.0, vec![Obstacle::new(100.0, 100.0, 50.0, 50.0)]);
    let mut filter = MclFilter::new(
        world,
        RangeSensor::default(),
        MotionModel::default(),
        50,
        Pose::new(0.0, 100.0, 0.0),
        30.0,
        1,
    );
    let output = filter.tick(ControlIntent::Idle);
    assert_approx_eq!(output.range, 84.0, 1e-12);
    assert!(!output.forward_accepted);
}
