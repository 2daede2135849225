//! # Motor Board Equipment Interface
//!
//! The motor board closes the wheel speed loops and runs odometry. The locomotion core sends it a
//! body velocity demand every cycle and is told about the robot's pose and wheel slip through
//! asynchronous reports.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Body velocity demand sent to the motor board.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct SpeedCmd {
    /// Longitudinal speed, positive forwards.
    ///
    /// Units: millimeters/second
    pub vx_mms: f64,

    /// Lateral speed, positive to the left.
    ///
    /// Units: millimeters/second
    pub vy_mms: f64,

    /// Yaw rate, positive anticlockwise.
    ///
    /// Units: radians/second
    pub vtheta_rads: f64,
}

/// Absolute pose sample produced by the motor board's odometry.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct OdomReport {
    pub x_mm: f64,
    pub y_mm: f64,

    /// Heading, not necessarily normalised.
    pub theta_rad: f64,
}

/// Measured speed and wheel slip state.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct SpeedReport {
    pub vx_mms: f64,
    pub vy_mms: f64,
    pub vtheta_rads: f64,

    /// The left drive side is commanded to move but isn't moving over the ground.
    pub drifting_left: bool,

    /// The right drive side is commanded to move but isn't moving over the ground.
    pub drifting_right: bool,
}

/// Overwrite the odometry pose held by the motor board.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default)]
pub struct RepositionCmd {
    pub x_mm: f64,
    pub y_mm: f64,
    pub theta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a motor board link.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum MotError {
    #[error("The motor board rejected the command with status {0}")]
    Status(i32),

    #[error("The motor board is not connected")]
    Disconnected,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Outbound link to the motor board.
///
/// Both methods are fire-and-forget from the point of view of the control loop, they must not
/// block waiting for the motion to happen.
pub trait MotLink {
    /// Send the velocity demand for this cycle.
    fn send_speed_cmd(&mut self, cmd: &SpeedCmd) -> Result<(), MotError>;

    /// Ask the motor board to overwrite its odometry pose.
    ///
    /// The pose must only be committed locally if this returns `Ok`.
    fn send_repositioning(&mut self, cmd: &RepositionCmd) -> Result<(), MotError>;
}

impl MotError {
    /// Build a result from a raw status code as returned by the board, where `0` is success.
    pub fn from_status(status: i32) -> Result<(), MotError> {
        match status {
            0 => Ok(()),
            s => Err(MotError::Status(s)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(MotError::from_status(0), Ok(()));
        assert_eq!(MotError::from_status(-3), Err(MotError::Status(-3)));
    }

    #[test]
    fn test_speed_cmd_json() {
        let cmd: SpeedCmd =
            serde_json::from_str(r#"{"vx_mms": 120.0, "vy_mms": 0.0, "vtheta_rads": -0.5}"#)
                .unwrap();

        assert_eq!(cmd.vx_mms, 120.0);
        assert_eq!(cmd.vtheta_rads, -0.5);
    }
}
