//! Velocity saturation calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use crate::kin::{Velocity, VelocityEnvelope};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocoCtrl {

    /// Bring the demand inside the envelope and the acceleration limits.
    ///
    /// The demand is first clamped into the envelope, then limited to within
    /// one cycle's worth of acceleration of the velocity sent last cycle. The
    /// acceleration limit wins if the two disagree, so a sudden narrowing of
    /// the envelope is followed by a ramp rather than a jump. Lateral speed is
    /// always zero.
    pub(crate) fn enforce_limits(
        &mut self,
        demand: &Velocity,
        envelope: &VelocityEnvelope,
        dt_s: f64
    ) -> Velocity {
        if dt_s <= 0.0 {
            return Velocity::zero()
        }

        let (clamped, env_limited) = envelope.clamp(demand);

        let lin_step = self.params.limits.accel_max_mmss * dt_s;
        let rot_step = self.params.limits.rotation_accel_max_radss * dt_s;
        let prev = self.velocity;

        let out = Velocity::new(
            clamp(clamped.vx_mms, prev.vx_mms - lin_step, prev.vx_mms + lin_step),
            0.0,
            clamp(
                clamped.vtheta_rads,
                prev.vtheta_rads - rot_step,
                prev.vtheta_rads + rot_step
            )
        );

        self.report.envelope_limited = env_limited;
        self.report.accel_limited = out.vx_mms != clamped.vx_mms
            || out.vtheta_rads != clamped.vtheta_rads;

        out
    }
}
