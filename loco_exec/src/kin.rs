//! # Kinematic types
//!
//! Velocities, velocity envelopes and the robot's kinematic limits, plus the
//! small ramp helpers every controller uses to stay inside them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use comms_if::eqpt::mot::SpeedCmd;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A body frame velocity.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Longitudinal speed, positive forwards.
    ///
    /// Units: millimeters/second
    pub vx_mms: f64,

    /// Lateral speed. The chassis is non-holonomic so this is always zeroed
    /// before actuation.
    ///
    /// Units: millimeters/second
    pub vy_mms: f64,

    /// Yaw rate, positive anticlockwise.
    ///
    /// Units: radians/second
    pub vtheta_rads: f64
}

/// Inclusive bounds a commanded velocity is clamped into.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityEnvelope {
    pub min_vx_mms: f64,
    pub max_vx_mms: f64,
    pub min_vy_mms: f64,
    pub max_vy_mms: f64,
    pub min_vtheta_rads: f64,
    pub max_vtheta_rads: f64
}

/// Kinematic capabilities of the robot and the tolerances goals are judged
/// against.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinLimits {
    /// Units: millimeters/second^2
    pub accel_max_mmss: f64,

    /// Units: millimeters/second
    pub linear_speed_max_mms: f64,

    /// Distance within which a position goal is considered reached.
    ///
    /// Units: millimeters
    pub admitted_position_error_mm: f64,

    /// Units: radians/second^2
    pub rotation_accel_max_radss: f64,

    /// Units: radians/second
    pub rotation_speed_max_rads: f64,

    /// Angle within which a heading goal is considered reached.
    ///
    /// Units: radians
    pub admitted_angle_error_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Velocity {
    pub fn new(vx_mms: f64, vy_mms: f64, vtheta_rads: f64) -> Self {
        Self { vx_mms, vy_mms, vtheta_rads }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.vx_mms == 0.0 && self.vy_mms == 0.0 && self.vtheta_rads == 0.0
    }
}

impl From<Velocity> for SpeedCmd {
    fn from(v: Velocity) -> Self {
        SpeedCmd {
            vx_mms: v.vx_mms,
            vy_mms: v.vy_mms,
            vtheta_rads: v.vtheta_rads
        }
    }
}

impl VelocityEnvelope {
    /// The widest envelope the robot is capable of.
    ///
    /// Lateral motion is never allowed.
    pub fn from_limits(limits: &KinLimits) -> Self {
        Self {
            min_vx_mms: -limits.linear_speed_max_mms,
            max_vx_mms: limits.linear_speed_max_mms,
            min_vy_mms: 0.0,
            max_vy_mms: 0.0,
            min_vtheta_rads: -limits.rotation_speed_max_rads,
            max_vtheta_rads: limits.rotation_speed_max_rads
        }
    }

    /// Return the envelope allowing only velocities inside both `self` and
    /// `other`.
    pub fn intersect(&self, other: &VelocityEnvelope) -> Self {
        Self {
            min_vx_mms: self.min_vx_mms.max(other.min_vx_mms),
            max_vx_mms: self.max_vx_mms.min(other.max_vx_mms),
            min_vy_mms: self.min_vy_mms.max(other.min_vy_mms),
            max_vy_mms: self.max_vy_mms.min(other.max_vy_mms),
            min_vtheta_rads: self.min_vtheta_rads.max(other.min_vtheta_rads),
            max_vtheta_rads: self.max_vtheta_rads.min(other.max_vtheta_rads)
        }
    }

    /// Clamp the velocity into the envelope, returning the clamped velocity
    /// and whether any component had to be changed.
    pub fn clamp(&self, vel: &Velocity) -> (Velocity, bool) {
        let out = Velocity {
            vx_mms: clamp(vel.vx_mms, self.min_vx_mms, self.max_vx_mms),
            vy_mms: clamp(vel.vy_mms, self.min_vy_mms, self.max_vy_mms),
            vtheta_rads: clamp(
                vel.vtheta_rads, self.min_vtheta_rads, self.max_vtheta_rads
            )
        };

        (out, out != *vel)
    }
}

impl Default for KinLimits {
    fn default() -> Self {
        Self {
            accel_max_mmss: 300.0,
            linear_speed_max_mms: 350.0,
            admitted_position_error_mm: 10.0,
            rotation_accel_max_radss: 3.0,
            rotation_speed_max_rads: 1.5,
            admitted_angle_error_rad: 0.05
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Move `current` towards `target` by at most `max_step`.
pub fn ramp_toward(current: f64, target: f64, max_step: f64) -> f64 {
    current + clamp(target - current, -max_step, max_step)
}

/// The signed rate that can still be brought to zero over the signed
/// `remaining` distance at the given deceleration.
///
/// `braking_factor` scales the braking distance to account for actuation lag,
/// a factor of 2 reaches zero having covered only half of `remaining`.
pub fn braking_rate(
    remaining: f64,
    decel: f64,
    braking_factor: f64,
    max_rate: f64
) -> f64 {
    let rate = (2.0 * decel * remaining.abs() / braking_factor).sqrt();
    rate.min(max_rate).max(0.0) * remaining.signum()
}
