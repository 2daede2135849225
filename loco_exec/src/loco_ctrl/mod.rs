//! # Locomotion control module
//!
//! Locomotion control is the supervisor of the control core. It holds the
//! robot's pose and the active mode, and once per cycle asks the controller
//! for that mode to produce a velocity demand, saturates it and sends it to
//! the motor board.
//!
//! Modes:
//! - `PositionControl` - follow a trajectory with [`crate::traj_ctrl`].
//! - `DirectSpeed` - hold a velocity given by the caller.
//! - `Stopped` - come to rest, remembering the mode to resume.
//! - `Repositioning` - drive into a hard stop and reset the pose.
//! - `RelativeControl` - drive straight or turn by an amount with
//!   [`crate::rel_ctrl`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_reposition;
mod calc_saturation;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use calc_reposition::RepositionTarget;
pub use params::*;
pub use state::*;
use comms_if::eqpt::mot::MotError;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Failed to send a command to the motor board: {0}")]
    Actuation(#[from] MotError),

    #[error("Failed to load the locomotion parameters: {0}")]
    ParamLoad(#[from] LoadError)
}

/// The active mode of the supervisor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    PositionControl,
    DirectSpeed,
    Stopped,
    Repositioning,
    RelativeControl
}
