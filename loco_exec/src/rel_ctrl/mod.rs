//! # Relative motion control module
//!
//! Drives a single "go straight" or "turn" command to completion. Progress is
//! accumulated from the change in pose between cycles, so the controller never
//! depends on where the robot started.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use crate::kin::{braking_rate, ramp_toward, KinLimits, Velocity};
use crate::loc::Pose;
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct RelCtrl {
    limits: KinLimits,

    /// Multiplier on the braking distance, as for trajectory control.
    braking_factor: f64,

    goal: Option<RelGoal>,

    /// Displacement covered since the goal was issued, along the goal's axis.
    progress: f64,

    /// Pose seen on the previous cycle.
    last_pose: Pose,

    finished: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A relative motion goal. Signs give the direction.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub enum RelGoal {
    Straight { distance_mm: f64 },
    Rotate { angle_rad: f64 }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RelCtrl {
    pub fn new(limits: KinLimits, braking_factor: f64) -> Self {
        Self {
            limits,
            braking_factor,
            goal: None,
            progress: 0.0,
            last_pose: Pose::default(),
            finished: true
        }
    }

    pub fn new_straight_goal(&mut self, distance_mm: f64, pose: &Pose) {
        self.set_goal(RelGoal::Straight { distance_mm }, pose)
    }

    pub fn new_rotate_goal(&mut self, angle_rad: f64, pose: &Pose) {
        self.set_goal(RelGoal::Rotate { angle_rad }, pose)
    }

    fn set_goal(&mut self, goal: RelGoal, pose: &Pose) {
        info!("New relative goal {:?}", goal);

        self.goal = Some(goal);
        self.progress = 0.0;
        self.last_pose = *pose;
        self.finished = false;
    }

    pub fn goal(&self) -> Option<RelGoal> {
        self.goal
    }

    /// True once the accumulated displacement is within the admitted error of
    /// the goal, or if there is no goal.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Signed displacement still to cover.
    pub fn remaining(&self) -> f64 {
        match self.goal {
            Some(RelGoal::Straight { distance_mm }) => distance_mm - self.progress,
            Some(RelGoal::Rotate { angle_rad }) => angle_rad - self.progress,
            None => 0.0
        }
    }

    /// Compute the velocity demand for this cycle.
    pub fn proc(&mut self, pose: &Pose, current: &Velocity, dt_s: f64) -> Velocity {
        let goal = match self.goal {
            Some(g) => g,
            None => return Velocity::zero()
        };

        // Accumulate progress along the goal's axis
        self.progress += match goal {
            RelGoal::Straight { .. } => {
                (pose.position_mm - self.last_pose.position_mm)
                    .dot(&self.last_pose.forward2())
            },
            RelGoal::Rotate { .. } => {
                get_ang_dist(self.last_pose.heading_rad, pose.heading_rad)
            }
        };
        self.last_pose = *pose;

        let remaining = self.remaining();

        let (tolerance, accel, max_rate) = match goal {
            RelGoal::Straight { .. } => (
                self.limits.admitted_position_error_mm,
                self.limits.accel_max_mmss,
                self.limits.linear_speed_max_mms
            ),
            RelGoal::Rotate { .. } => (
                self.limits.admitted_angle_error_rad,
                self.limits.rotation_accel_max_radss,
                self.limits.rotation_speed_max_rads
            )
        };

        if remaining.abs() <= tolerance {
            if !self.finished {
                info!("Relative goal {:?} finished, residual {:.4}", goal, remaining);
            }
            self.finished = true;
            return Velocity::zero()
        }
        self.finished = false;

        let rate = braking_rate(remaining, accel, self.braking_factor, max_rate);

        debug!("Relative goal remaining {:.4}, rate demand {:.4}", remaining, rate);

        let lin_step = self.limits.accel_max_mmss * dt_s;
        let rot_step = self.limits.rotation_accel_max_radss * dt_s;

        match goal {
            RelGoal::Straight { .. } => Velocity::new(
                ramp_toward(current.vx_mms, rate, lin_step),
                0.0,
                ramp_toward(current.vtheta_rads, 0.0, rot_step)
            ),
            RelGoal::Rotate { .. } => Velocity::new(
                ramp_toward(current.vx_mms, 0.0, lin_step),
                0.0,
                ramp_toward(current.vtheta_rads, rate, rot_step)
            )
        }
    }
}
