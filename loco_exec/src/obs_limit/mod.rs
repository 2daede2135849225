//! # Obstacle speed limiter
//!
//! Narrows the longitudinal speed bounds when obstacles come close along the
//! robot's forward or reverse heading. Two ellipses are checked in each
//! direction: once an obstacle is inside the far one the allowed speed scales
//! with its distance to the close one, and reaches zero inside the close one.
//!
//! Turning is never limited.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// Internal
use crate::kin::VelocityEnvelope;
use comms_if::eqpt::prox::ProxSource;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Obstacle zone geometry.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Units: millimeters
    pub far_major_axis_mm: f64,

    /// Units: millimeters
    pub far_minor_axis_mm: f64,

    /// Units: millimeters
    pub close_major_axis_mm: f64,

    /// Units: millimeters
    pub close_minor_axis_mm: f64,

    /// Half-angle of the cone obstacles are looked for in.
    ///
    /// Units: radians
    pub lookout_rad: f64
}

pub struct ObsLimiter {
    params: Params
}

/// What the limiter saw this cycle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct ObsReport {
    /// Fraction of the base forward speed allowed, 1 when clear.
    pub forward_factor: f64,

    /// Fraction of the base reverse speed allowed, 1 when clear.
    pub reverse_factor: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            far_major_axis_mm: 550.0,
            far_minor_axis_mm: 490.0,
            close_major_axis_mm: 490.0,
            close_minor_axis_mm: 490.0,
            lookout_rad: 1.4
        }
    }
}

impl ObsReport {
    pub fn is_limited(&self) -> bool {
        self.forward_factor < 1.0 || self.reverse_factor < 1.0
    }
}

impl ObsLimiter {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Narrow `base` according to the obstacles seen by `prox`.
    pub fn envelope(
        &self,
        prox: &dyn ProxSource,
        base: &VelocityEnvelope
    ) -> (VelocityEnvelope, ObsReport) {
        let report = ObsReport {
            forward_factor: self.speed_factor(prox, 0.0),
            reverse_factor: self.speed_factor(prox, -PI)
        };

        let mut env = *base;
        env.max_vx_mms = base.max_vx_mms * report.forward_factor;
        env.min_vx_mms = base.min_vx_mms * report.reverse_factor;

        if report.is_limited() {
            trace!(
                "Obstacle limits: forward x{:.2}, reverse x{:.2}",
                report.forward_factor, report.reverse_factor
            );
        }

        (env, report)
    }

    /// Fraction of full speed allowed along `heading_rad`.
    fn speed_factor(&self, prox: &dyn ProxSource, heading_rad: f64) -> f64 {
        let p = &self.params;

        let far = prox.distance_to_cone_ellipse(
            heading_rad, p.lookout_rad, p.far_major_axis_mm, p.far_minor_axis_mm);
        if far.min_mm >= 0.0 {
            return 1.0
        }

        let close = prox.distance_to_cone_ellipse(
            heading_rad, p.lookout_rad, p.close_major_axis_mm, p.close_minor_axis_mm);
        if close.min_mm < 0.0 {
            return 0.0
        }

        // Width of the band between the two ellipses
        let band_mm = p.far_major_axis_mm - p.close_major_axis_mm;
        if band_mm <= 0.0 {
            return 1.0
        }

        clamp(close.min_mm / band_mm, 0.0, 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin::KinLimits;
    use comms_if::eqpt::prox::ConeDistance;

    /// Reports fixed distances to the close and far ellipses, per direction.
    struct FixedProx {
        forward: (f64, f64),
        reverse: (f64, f64)
    }

    impl ProxSource for FixedProx {
        fn distance_to_cone_ellipse(
            &self,
            heading_rad: f64,
            _lookout_rad: f64,
            major_axis_mm: f64,
            _minor_axis_mm: f64
        ) -> ConeDistance {
            let (close, far) = match heading_rad == 0.0 {
                true => self.forward,
                false => self.reverse
            };
            let d = match major_axis_mm > 500.0 {
                true => far,
                false => close
            };
            ConeDistance { min_mm: d, max_mm: d + 100.0 }
        }
    }

    fn base() -> VelocityEnvelope {
        VelocityEnvelope::from_limits(&KinLimits::default())
    }

    #[test]
    fn test_clear() {
        let lim = ObsLimiter::new(Params::default());
        let prox = FixedProx { forward: (100.0, 40.0), reverse: (100.0, 40.0) };

        let (env, report) = lim.envelope(&prox, &base());
        assert_eq!(env, base());
        assert!(!report.is_limited());
    }

    #[test]
    fn test_inside_close_ellipse() {
        let lim = ObsLimiter::new(Params::default());
        let prox = FixedProx { forward: (-5.0, -65.0), reverse: (100.0, 40.0) };

        let (env, report) = lim.envelope(&prox, &base());
        assert_eq!(env.max_vx_mms, 0.0);
        assert_eq!(env.min_vx_mms, -350.0);
        assert_eq!(env.min_vtheta_rads, -1.5);
        assert!(report.is_limited());
    }

    #[test]
    fn test_scaled_in_band() {
        let lim = ObsLimiter::new(Params::default());
        let prox = FixedProx { forward: (100.0, 40.0), reverse: (30.0, -30.0) };

        let (env, report) = lim.envelope(&prox, &base());
        assert_eq!(env.max_vx_mms, 350.0);
        assert!((report.reverse_factor - 0.5).abs() < 1e-9);
        assert!((env.min_vx_mms + 175.0).abs() < 1e-9);
    }
}
