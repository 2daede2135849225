//! # Locomotion control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be executed by locomotion control.
///
/// Positions are in millimeters in the table frame, angles in radians following the right hand
/// rule about the robot's Z+ (upwards) axis.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocoCmd {
    /// Drive to the given pose along a straight single-point trajectory.
    GoToPose {
        x_mm: f64,
        y_mm: f64,
        theta_rad: f64
    },

    /// Ask the path planner for a route to the given pose, then follow it.
    NavigateTo {
        x_mm: f64,
        y_mm: f64,
        theta_rad: f64
    },

    /// Drive straight for a signed distance, positive forwards.
    GoStraight {
        distance_mm: f64
    },

    /// Turn on the spot by a signed angle, positive anticlockwise.
    Turn {
        angle_rad: f64
    },

    /// Drive at a fixed body velocity until told otherwise.
    DirectSpeed {
        vx_mms: f64,
        vy_mms: f64,
        vtheta_rads: f64
    },

    /// Drive into a reference edge until both drive sides slip, then reset the pose. Omitted
    /// coordinates keep their current estimate.
    StartRepositioning {
        x_mm: Option<f64>,
        y_mm: Option<f64>,
        theta_rad: Option<f64>
    },

    /// Bring the robot to a stop, remembering the active mode.
    Stop,

    /// Resume the mode active before the last stop.
    Restart
}
