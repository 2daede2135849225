//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use nalgebra::Vector2;
use serde::Serialize;
use std::f64::consts::FRAC_PI_2;

// Internal
use super::*;
use crate::kin::{braking_rate, ramp_toward, KinLimits, Velocity};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct TrajCtrl {
    limits: KinLimits,
    params: Params,

    /// Executing mode
    mode: Mode,

    /// The points still to be reached.
    trajectory: Trajectory,

    /// Position of the last point passed, the start of the first segment of
    /// the remaining polyline.
    anchor_mm: Option<Vector2<f64>>,

    report: StatusReport
}

/// The status report containing monitoring quantities from the last cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Heading error to the current objective point.
    pub alpha_rad: f64,

    /// Distance from the robot to the closest point on the path.
    pub cross_track_mm: f64,

    /// The pursuit goal point, if one was computed this cycle.
    pub pursuit_goal_mm: Option<Vector2<f64>>,

    /// Curvature of the commanded arc.
    pub curvature_mm: f64,

    /// True if the braking check asked for deceleration.
    pub decelerating: bool,

    /// Number of points left in the trajectory.
    pub points_remaining: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of TrajCtrl.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// No trajectory is loaded.
    Off,

    /// Pursuing the path towards the front point.
    FollowPath,

    /// On a stopping point, turning in place to its goal heading.
    HeadingAdjust
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    pub fn new(limits: KinLimits, params: Params) -> Self {
        Self {
            limits,
            params,
            mode: Mode::Off,
            trajectory: Trajectory::default(),
            anchor_mm: None,
            report: StatusReport::default()
        }
    }

    /// Replace the current trajectory.
    ///
    /// The robot's current position becomes the start of the path.
    pub fn new_trajectory(&mut self, trajectory: Trajectory, pose: &Pose) {
        info!(
            "New trajectory of {} point(s), ending at {:?}",
            trajectory.len(),
            trajectory.iter().last().map(|p| p.goal_pose)
        );

        self.mode = match trajectory.is_empty() {
            true => Mode::Off,
            false => Mode::FollowPath
        };
        self.trajectory = trajectory;
        self.anchor_mm = Some(pose.position_mm);
        self.report = StatusReport::default();
    }

    /// Drop the current trajectory.
    pub fn clear(&mut self) {
        self.trajectory.clear();
        self.anchor_mm = None;
        self.mode = Mode::Off;
    }

    /// True once every point of the trajectory has been reached.
    pub fn is_finished(&self) -> bool {
        self.trajectory.is_empty()
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Compute the velocity demand for this cycle.
    ///
    /// `current` is the velocity commanded last cycle, which the ramps are
    /// applied against.
    pub fn proc(&mut self, pose: &Pose, current: &Velocity, dt_s: f64) -> Velocity {
        // ---- POINT ADVANCEMENT ----

        let was_active = self.mode != Mode::Off;
        self.advance(pose, current);

        let objective = match self.trajectory.front() {
            Some(p) => *p,
            None => {
                if was_active {
                    info!("Trajectory finished at {:?}", pose);
                }
                self.clear();
                self.report = StatusReport::default();
                return Velocity::zero()
            }
        };

        if self.mode == Mode::HeadingAdjust {
            return self.turn_in_place(
                current,
                pose.heading_error_to(objective.goal_pose.heading_rad),
                dt_s
            )
        }

        // ---- GOAL SEARCH ----

        let goal_mm = self.pursuit_goal(pose);

        // Truncation may have changed the front point
        let objective = match self.trajectory.front() {
            Some(p) => *p,
            None => objective
        };

        // ---- LONGITUDINAL SPEED ----

        let alpha_rad = pose.bearing_to(&objective.position_mm());
        self.report.alpha_rad = alpha_rad;
        self.report.points_remaining = self.trajectory.len();

        // Objective too far off the heading for the pursuit arc to reach it,
        // align first.
        if alpha_rad.abs() >= self.params.align_threshold_rad {
            trace!("Objective at {:.3} rad, aligning in place", alpha_rad);
            return self.turn_in_place(current, alpha_rad, dt_s)
        }

        let speed_mms = self.longitudinal_speed(
            pose, current, &objective, alpha_rad, dt_s);

        // ---- CURVATURE ----

        let body_mm = pose.to_body(&goal_mm);
        let lookahead_sq = self.params.lookahead_mm * self.params.lookahead_mm;
        let curvature_mm = 2.0 * body_mm[1] / lookahead_sq;
        self.report.curvature_mm = curvature_mm;

        trace!(
            "Pursuit goal {:?} (body {:?}), speed {:.1} mm/s, curvature {:.5}",
            goal_mm, body_mm, speed_mms, curvature_mm
        );

        Velocity::new(speed_mms, 0.0, curvature_mm * speed_mms)
    }

    /// Drop the front points which have been reached.
    fn advance(&mut self, pose: &Pose, current: &Velocity) {
        let pos_err_mm = self.limits.admitted_position_error_mm;
        let ang_err_rad = self.limits.admitted_angle_error_rad;

        // Velocity in the table frame, the chassis has no lateral motion.
        let vel_mms = pose.forward2() * current.vx_mms;

        while let Some(point) = self.trajectory.front() {
            let to_point_mm = point.position_mm() - pose.position_mm;
            let dist_mm = to_point_mm.norm();
            let at_position = dist_mm <= pos_err_mm;

            let reached = if point.is_stop() {
                if at_position {
                    let head_err_rad = pose.heading_error_to(
                        point.goal_pose.heading_rad);

                    if head_err_rad.abs() > ang_err_rad {
                        if self.mode != Mode::HeadingAdjust {
                            debug!(
                                "On stopping point, adjusting heading by {:.3} rad",
                                head_err_rad
                            );
                            self.mode = Mode::HeadingAdjust;
                        }
                        return
                    }
                    true
                }
                else {
                    false
                }
            }
            else {
                at_position || (
                    dist_mm <= self.params.flow_drop_radius_factor * pos_err_mm
                    && vel_mms.dot(&to_point_mm) <= 0.0
                )
            };

            if !reached {
                break;
            }

            debug!("Reached trajectory point {:?}", point.goal_pose);
            self.anchor_mm = Some(point.position_mm());
            self.trajectory.pop_front();
        }

        self.mode = match self.trajectory.is_empty() {
            true => Mode::Off,
            false => Mode::FollowPath
        };
    }

    /// Find the pursuit goal point, dropping any flow-through points the
    /// robot has already passed.
    fn pursuit_goal(&mut self, pose: &Pose) -> Vector2<f64> {
        let lookahead_mm = self.params.lookahead_mm;

        // With a single point left aim straight at it, no further than the
        // lookahead.
        if self.trajectory.len() < 2 {
            let target_mm = match self.trajectory.front() {
                Some(p) => p.position_mm(),
                None => pose.position_mm
            };
            let diff = target_mm - pose.position_mm;
            let dist_mm = diff.norm();

            self.report.cross_track_mm = 0.0;

            let goal_mm = if dist_mm > lookahead_mm {
                pose.position_mm + diff * (lookahead_mm / dist_mm)
            }
            else {
                target_mm
            };
            self.report.pursuit_goal_mm = Some(goal_mm);
            return goal_mm
        }

        let mut vertices: Vec<Vector2<f64>> = Vec::with_capacity(
            self.trajectory.len() + 1);
        if let Some(a) = self.anchor_mm {
            vertices.push(a);
        }
        vertices.extend(self.trajectory.positions());

        let proj = match closest_point(&vertices, &pose.position_mm) {
            Some(p) => p,
            None => return pose.position_mm
        };
        self.report.cross_track_mm = proj.distance_mm;

        let goal_mm = lookahead_point(&vertices, &proj, lookahead_mm);
        self.report.pursuit_goal_mm = Some(goal_mm);

        // Vertices before the start of the closest segment are behind us. The
        // anchor (if any) is vertex 0 and is not a trajectory point.
        let offset = match self.anchor_mm {
            Some(_) => 1,
            None => 0
        };
        let num_passed = (proj.segment_index + 1).saturating_sub(offset);

        for _ in 0..num_passed {
            match self.trajectory.front() {
                Some(p) if !p.is_stop() && self.trajectory.len() > 1 => {
                    trace!("Passed trajectory point {:?}", p.goal_pose);
                    self.anchor_mm = Some(p.position_mm());
                    self.trajectory.pop_front();
                },
                _ => break
            }
        }

        goal_mm
    }

    /// Ramp the linear speed towards the heading-scaled ceiling, or down the
    /// braking profile if the robot would otherwise overshoot the objective.
    fn longitudinal_speed(
        &mut self,
        pose: &Pose,
        current: &Velocity,
        objective: &TrajectoryPoint,
        alpha_rad: f64,
        dt_s: f64
    ) -> f64 {
        let accel_mmss = self.limits.accel_max_mmss;
        let vmax_mms = self.limits.linear_speed_max_mms;
        let factor = self.params.braking_dist_factor;

        let ceiling_mms = vmax_mms * (1.0 - alpha_rad.abs() / FRAC_PI_2).max(0.0);
        let ramped_mms = ramp_toward(current.vx_mms, ceiling_mms, accel_mmss * dt_s);

        let v_mms = ramped_mms.max(0.0);
        let vg_mms = objective.goal_speed_mms.min(vmax_mms);

        // Where the robot would come to rest (or reach the goal speed) if it
        // started braking now.
        let brake_dist_mm = factor
            * (v_mms * v_mms - vg_mms * vg_mms).max(0.0)
            / (2.0 * accel_mmss);
        let stop_point_mm = pose.position_mm + pose.forward2() * brake_dist_mm;
        let stop_to_obj_mm = objective.position_mm() - stop_point_mm;

        let decelerate = stop_to_obj_mm.norm() <= self.limits.admitted_position_error_mm
            || stop_to_obj_mm.dot(&pose.forward2()) < 0.0;
        self.report.decelerating = decelerate;

        if !decelerate {
            return ramped_mms
        }

        // Follow the braking profile down, which keeps a creep speed until
        // the objective is reached.
        let dist_mm = pose.distance_to(&objective.position_mm());
        let profile_mms = (vg_mms * vg_mms + 2.0 * accel_mmss * dist_mm / factor)
            .sqrt();

        (current.vx_mms - accel_mmss * dt_s)
            .max(profile_mms)
            .min(ramped_mms)
    }

    /// Bring the linear speed to zero and turn through `remaining_rad`.
    fn turn_in_place(
        &mut self,
        current: &Velocity,
        remaining_rad: f64,
        dt_s: f64
    ) -> Velocity {
        let rot_accel = self.limits.rotation_accel_max_radss;

        let rate_rads = braking_rate(
            remaining_rad,
            rot_accel,
            self.params.braking_dist_factor,
            self.limits.rotation_speed_max_rads
        );

        self.report.points_remaining = self.trajectory.len();

        Velocity::new(
            ramp_toward(current.vx_mms, 0.0, self.limits.accel_max_mmss * dt_s),
            0.0,
            ramp_toward(current.vtheta_rads, rate_rads, rot_accel * dt_s)
        )
    }
}
