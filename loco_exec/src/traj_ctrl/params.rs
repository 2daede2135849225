//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {

    /// Arc length ahead of the robot's projection onto the path at which the
    /// pursuit goal is placed. Also the fixed radius used in the curvature
    /// calculation.
    ///
    /// Units: millimeters
    pub lookahead_mm: f64,

    /// Multiplier applied to the constant deceleration braking distance.
    ///
    /// This is an empirical allowance for actuation lag, not a physical
    /// quantity. Calibrate on the robot rather than deriving it.
    pub braking_dist_factor: f64,

    /// Speed given to the intermediate points of a planned route, so that the
    /// robot flows through them instead of stopping at each one.
    ///
    /// Units: millimeters/second
    pub flow_speed_mms: f64,

    /// A flow-through point is dropped once the robot is within this many
    /// admitted position errors of it and no longer approaching it.
    pub flow_drop_radius_factor: f64,

    /// Heading error to the objective above which the robot stops and turns
    /// in place. Must be below pi/2, where the heading-scaled speed ceiling
    /// reaches zero and the pursuit arc can no longer steer.
    ///
    /// Units: radians
    pub align_threshold_rad: f64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            lookahead_mm: 150.0,
            braking_dist_factor: 2.0,
            flow_speed_mms: 200.0,
            flow_drop_radius_factor: 3.0,
            align_threshold_rad: 1.0
        }
    }
}
