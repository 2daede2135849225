//! # Locomotion Executable Parameters
//!
//! This module provide parameters for the locomotion executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct LocoExecParams {

    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Narrow the speed envelope when obstacles are close.
    pub obstacle_detection: bool,

    /// Circular obstacles seen by the simulated proximity sensor, as `[x, y, radius]`.
    ///
    /// Units: millimeters
    #[serde(default)]
    pub sim_obstacles_mm: Vec<[f64; 3]>,

    /// Via points the simulated planner routes through.
    ///
    /// Units: millimeters
    #[serde(default)]
    pub sim_via_points_mm: Vec<[f64; 2]>
}
