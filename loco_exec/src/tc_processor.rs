//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::tc::Tc;
use loco_lib::{loco_ctrl::LocoCtrl, nav::PathPlanner};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub(crate) fn exec(loco_ctrl: &mut LocoCtrl, planner: &mut dyn PathPlanner, tc: &Tc) {

    // Handle different Tcs
    match tc {
        Tc::Heartbeat => {
            debug!("Recieved Heartbeat");
        },
        Tc::LocoCtrl(cmd) => {
            if !loco_ctrl.exec_cmd(cmd, planner) {
                warn!("LocoCtrl could not accept {:?}", cmd);
            }
        }
    }

}
