//! Simulation utilities and CSV data logging for localization runs.
//!
//! This module provides:
//! - A struct (`TickRecord`) for reading and writing per-tick results to/from CSV files
//! - A closed-loop scenario runner that drives an engine through a scripted control sequence
//! - Control-script builders for the canned scenarios used by the CLI and tests

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use crate::ControlIntent;
use crate::particle::MclFilter;

/// One row of simulation output: the engine's per-tick observables plus population
/// statistics, flattened for CSV.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TickRecord {
    /// Tick index, starting at zero
    pub tick: usize,
    /// Control intent name for this tick
    pub control: String,
    /// Whether a `Forward` intent survived the acceptance check
    pub forward_accepted: bool,
    /// True-pose range measurement
    pub range: f64,
    /// True robot x
    pub robot_x: f64,
    /// True robot y
    pub robot_y: f64,
    /// True robot heading in degrees (unwrapped)
    pub robot_heading: f64,
    /// Population mean x (post-resample)
    pub mean_x: f64,
    /// Population mean y (post-resample)
    pub mean_y: f64,
    /// Mean squared position distance from the population to the true pose
    pub mean_squared_error: f64,
    /// Effective sample size of the normalized weights, captured before resampling
    pub effective_sample_size: f64,
}

impl TickRecord {
    /// Reads a CSV file and returns a vector of `TickRecord` structs.
    ///
    /// # Arguments
    /// * `path` - Path to the CSV file to read.
    ///
    /// # Returns
    /// * `Ok(Vec<TickRecord>)` if successful.
    /// * `Err` if the file cannot be read or parsed.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, Box<dyn std::error::Error>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }

    /// Writes a vector of TickRecord structs to a CSV file.
    ///
    /// # Arguments
    /// * `records` - Records to write
    /// * `path` - Path where the CSV file will be saved
    ///
    /// # Returns
    /// * `io::Result<()>` - Ok if successful, Err otherwise
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Drive an engine through a scripted control sequence, one tick per control, and
/// collect a record per tick.
///
/// Population statistics are sampled after each tick completes, so they describe the
/// post-resample population a renderer would also see.
pub fn run_scenario(filter: &mut MclFilter, controls: &[ControlIntent]) -> Vec<TickRecord> {
    let mut records = Vec::with_capacity(controls.len());
    for (tick, &control) in controls.iter().enumerate() {
        let output = filter.tick(control);
        let robot = *filter.robot();
        let mean = filter.particles().mean_position();
        records.push(TickRecord {
            tick,
            control: control.to_string(),
            forward_accepted: output.forward_accepted,
            range: output.range,
            robot_x: robot.x,
            robot_y: robot.y,
            robot_heading: robot.heading,
            mean_x: mean.x,
            mean_y: mean.y,
            mean_squared_error: filter.particles().mean_squared_error(&robot),
            effective_sample_size: output.effective_sample_size,
        });
    }
    records
}

/// A straight-line drive: `ticks` consecutive `Forward` intents.
pub fn forward_scenario(ticks: usize) -> Vec<ControlIntent> {
    vec![ControlIntent::Forward; ticks]
}

/// A patrol loop: 40 `Forward` ticks, then 18 `TurnLeft` ticks (a 90° turn at the
/// default 5° increment), repeated to length.
pub fn patrol_scenario(ticks: usize) -> Vec<ControlIntent> {
    (0..ticks)
        .map(|tick| {
            if tick % 58 < 40 {
                ControlIntent::Forward
            } else {
                ControlIntent::TurnLeft
            }
        })
        .collect()
}
