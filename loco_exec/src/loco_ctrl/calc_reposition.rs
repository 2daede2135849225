//! Repositioning calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal imports
use super::*;
use crate::kin::Velocity;
use crate::loc::Pose;
use comms_if::eqpt::mot::{MotLink, RepositionCmd};
use util::maths::norm_angle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose to adopt once the robot is against the hard stop. Coordinates
/// left as `None` keep their current estimate.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct RepositionTarget {
    pub x_mm: Option<f64>,
    pub y_mm: Option<f64>,
    pub theta_rad: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RepositionTarget {
    /// Fill the unset coordinates from `current`.
    pub fn resolve(&self, current: &Pose) -> RepositionCmd {
        RepositionCmd {
            x_mm: self.x_mm.unwrap_or_else(|| current.x()),
            y_mm: self.y_mm.unwrap_or_else(|| current.y()),
            theta_rad: norm_angle(self.theta_rad.unwrap_or(current.heading_rad))
        }
    }
}

impl LocoCtrl {

    /// Compute the repositioning demand for this cycle.
    ///
    /// Drives forward slowly until both sides slip, then resets the pose. If
    /// only one side slips the robot yaws towards the side that is still
    /// gripping.
    pub(crate) fn calc_reposition(
        &mut self,
        mot: &mut dyn MotLink,
        dt_s: f64
    ) -> Velocity {
        if !self.is_repositioning {
            return Velocity::zero()
        }

        if self.drift.both() {
            let cmd = self.reposition_target.resolve(&self.pose);
            self.reposition_robot(mot, &cmd);
            self.is_repositioning = false;
            return Velocity::zero()
        }

        self.reposition_elapsed_s += dt_s;
        if let Some(timeout_s) = self.params.reposition.timeout_s {
            if self.reposition_elapsed_s >= timeout_s {
                warn!(
                    "Repositioning timed out after {:.2} s, pose left at {:?}",
                    self.reposition_elapsed_s, self.pose
                );
                self.is_repositioning = false;
                return Velocity::zero()
            }
        }

        let p = &self.params.reposition;
        let vtheta_rads = match (self.drift.left, self.drift.right) {
            (true, false) => p.yaw_bias_rads,
            (false, true) => -p.yaw_bias_rads,
            _ => 0.0
        };

        Velocity::new(p.speed_mms, 0.0, vtheta_rads)
    }

    /// Ask the motor board to adopt the pose, and only on success adopt it
    /// locally.
    fn reposition_robot(&mut self, mot: &mut dyn MotLink, cmd: &RepositionCmd) {
        match mot.send_repositioning(cmd) {
            Ok(()) => {
                self.pose = Pose::new(cmd.x_mm, cmd.y_mm, cmd.theta_rad);
                info!("Repositioned to {:?}", self.pose);
            },
            Err(e) => warn!(
                "Repositioning to {:?} rejected, keeping pose {:?}: {}",
                cmd, self.pose, e
            )
        }
    }
}
