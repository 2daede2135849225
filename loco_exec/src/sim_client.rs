//! # Simulation Client
//!
//! Simulated equipment for testing and development without a robot. The simulation currently
//! provides:
//!
//! - [`SimMot`] - a motor board which integrates each velocity command over the control period
//!   and posts odometry and slip reports back, as the real board does.
//! - [`SimProx`] - a proximity sensor seeing a set of circular obstacles on the table.
//!
//! The simulated robot is a unicycle, and can be made to slip either by placing a wall across the
//! table or by forcing the slip flags.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;

use crate::loc::{DriftFlags, OdomSender, Pose};
use comms_if::eqpt::{
    mot::{MotError, MotLink, OdomReport, RepositionCmd, SpeedCmd, SpeedReport},
    prox::{ConeDistance, ProxSource},
};
use util::maths::get_ang_dist;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulated motor board.
pub struct SimMot {
    odom: OdomSender,

    /// Period each velocity command is applied for.
    ///
    /// Units: seconds
    period_s: f64,

    pose: Pose,

    /// A wall along `x = wall_x_mm` the robot can't drive through.
    wall_x_mm: Option<f64>,

    /// Slip flags reported instead of the simulated ones.
    drift_override: Option<DriftFlags>,

    /// Status returned to repositioning commands.
    reposition_status: i32,

    connected: bool,

    last_cmd: Option<SpeedCmd>,
}

/// Simulated proximity sensor.
#[derive(Debug, Clone, Default)]
pub struct SimProx {
    /// Obstacle centres and radii in the table frame.
    obstacles_mm: Vec<(Vector2<f64>, f64)>,

    /// Pose of the robot the sensor is mounted on.
    robot_pose: Pose,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SimMot {
    pub fn new(odom: OdomSender, period_s: f64) -> Self {
        Self {
            odom,
            period_s,
            pose: Pose::default(),
            wall_x_mm: None,
            drift_override: None,
            reposition_status: 0,
            connected: true,
            last_cmd: None,
        }
    }

    /// Teleport the simulated robot.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_wall_x(&mut self, wall_x_mm: Option<f64>) {
        self.wall_x_mm = wall_x_mm;
    }

    pub fn set_drift_override(&mut self, drift: Option<DriftFlags>) {
        self.drift_override = drift;
    }

    /// Set the status code returned to repositioning commands, `0` for success.
    pub fn set_reposition_status(&mut self, status: i32) {
        self.reposition_status = status;
    }

    /// A disconnected board rejects every command.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn last_cmd(&self) -> Option<SpeedCmd> {
        self.last_cmd
    }

    /// Apply the command for one period, returning the slip flags.
    fn integrate(&mut self, cmd: &SpeedCmd) -> DriftFlags {
        let dt_s = self.period_s;
        let mid_heading = self.pose.heading_rad + 0.5 * cmd.vtheta_rads * dt_s;

        let mut x_mm = self.pose.x() + cmd.vx_mms * dt_s * mid_heading.cos();
        let y_mm = self.pose.y() + cmd.vx_mms * dt_s * mid_heading.sin();
        let heading_rad = self.pose.heading_rad + cmd.vtheta_rads * dt_s;

        // Pushing into the wall both sides spin without moving
        let mut drift = DriftFlags::default();
        if let Some(wall) = self.wall_x_mm {
            if self.pose.x() <= wall && x_mm > wall {
                x_mm = wall;
                drift = DriftFlags { left: true, right: true };
            }
        }

        self.pose = Pose::new(x_mm, y_mm, heading_rad);

        self.drift_override.unwrap_or(drift)
    }
}

impl MotLink for SimMot {
    fn send_speed_cmd(&mut self, cmd: &SpeedCmd) -> Result<(), MotError> {
        if !self.connected {
            return Err(MotError::Disconnected);
        }

        self.last_cmd = Some(*cmd);
        let drift = self.integrate(cmd);

        trace!("SimMot pose {:?}, drift {:?}", self.pose, drift);

        self.odom.handle_odometry_report(OdomReport {
            x_mm: self.pose.x(),
            y_mm: self.pose.y(),
            theta_rad: self.pose.heading_rad,
        });
        self.odom.handle_speed_report(SpeedReport {
            vx_mms: cmd.vx_mms,
            vy_mms: cmd.vy_mms,
            vtheta_rads: cmd.vtheta_rads,
            drifting_left: drift.left,
            drifting_right: drift.right,
        });

        Ok(())
    }

    fn send_repositioning(&mut self, cmd: &RepositionCmd) -> Result<(), MotError> {
        if !self.connected {
            return Err(MotError::Disconnected);
        }

        MotError::from_status(self.reposition_status)?;
        self.pose = Pose::new(cmd.x_mm, cmd.y_mm, cmd.theta_rad);

        Ok(())
    }
}

impl SimProx {
    /// Create a sensor seeing circular obstacles, given as `(centre, radius)`.
    pub fn new(obstacles_mm: Vec<(Vector2<f64>, f64)>) -> Self {
        Self {
            obstacles_mm,
            robot_pose: Pose::default(),
        }
    }

    /// Move the sensor along with the robot.
    pub fn set_robot_pose(&mut self, pose: Pose) {
        self.robot_pose = pose;
    }
}

impl ProxSource for SimProx {
    fn distance_to_cone_ellipse(
        &self,
        heading_rad: f64,
        lookout_rad: f64,
        major_axis_mm: f64,
        minor_axis_mm: f64,
    ) -> ConeDistance {
        let mut dist = ConeDistance::clear();
        let mut seen = false;

        for (centre_mm, radius_mm) in self.obstacles_mm.iter() {
            let body_mm = self.robot_pose.to_body(centre_mm);

            // Angle of the obstacle off the cone's axis
            let phi = get_ang_dist(heading_rad, body_mm[1].atan2(body_mm[0]));
            if phi.abs() > lookout_rad {
                continue;
            }

            // Radius of the ellipse in the obstacle's direction
            let (s, c) = phi.sin_cos();
            let ellipse_r_mm = major_axis_mm * minor_axis_mm
                / ((minor_axis_mm * c).powi(2) + (major_axis_mm * s).powi(2)).sqrt();

            let d_mm = body_mm.norm() - radius_mm - ellipse_r_mm;

            if seen {
                dist.min_mm = dist.min_mm.min(d_mm);
                dist.max_mm = dist.max_mm.max(d_mm);
            } else {
                dist = ConeDistance { min_mm: d_mm, max_mm: d_mm };
                seen = true;
            }
        }

        dist
    }
}
