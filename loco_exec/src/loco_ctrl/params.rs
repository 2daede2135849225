//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::kin::KinLimits;
use crate::{obs_limit, traj_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
///
/// Sections missing from a parameter file take their default values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Kinematic capabilities and goal tolerances.
    pub limits: KinLimits,

    pub traj_ctrl: traj_ctrl::Params,

    pub obs_limit: obs_limit::Params,

    pub reposition: RepositionParams
}

/// Parameters of the repositioning manoeuvre.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositionParams {
    /// Forward speed while looking for the hard stop.
    ///
    /// Units: millimeters/second
    pub speed_mms: f64,

    /// Yaw rate applied while only one drive side is slipping.
    ///
    /// Units: radians/second
    pub yaw_bias_rads: f64,

    /// Give up if both sides have not slipped after this long. Unbounded if
    /// not set.
    ///
    /// Units: seconds
    pub timeout_s: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RepositionParams {
    fn default() -> Self {
        Self {
            speed_mms: 50.0,
            yaw_bias_rads: 0.3,
            timeout_s: None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file() {
        let p: Params = util::params::from_str(r#"
            [reposition]
            speed_mms = 80.0
            yaw_bias_rads = 0.2
            timeout_s = 5.0
        "#).unwrap();

        assert_eq!(p.reposition.timeout_s, Some(5.0));
        assert_eq!(p.limits, KinLimits::default());
        assert_eq!(p.traj_ctrl.lookahead_mm, 150.0);
    }

    #[test]
    fn test_default_profile_file() {
        let p: Params = util::params::from_str(
            include_str!("../../../params/loco_ctrl.toml")
        ).unwrap();

        assert_eq!(p, Params::default());
    }
}
