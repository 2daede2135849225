//! # Proximity Sensing Interface
//!
//! Obstacle proximity is queried against an elliptical zone attached to the robot, restricted to a
//! cone around a given heading.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Signed distances from the obstacles seen in a cone to the boundary of an ellipse.
///
/// Negative distances mean an obstacle is inside the ellipse.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ConeDistance {
    pub min_mm: f64,
    pub max_mm: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Synchronous source of obstacle proximity.
pub trait ProxSource {
    /// Distance from the obstacles to an ellipse centred on the robot.
    ///
    /// - `heading_rad`: direction of the cone's axis in the robot body frame (0 forwards).
    /// - `lookout_rad`: half-angle of the cone.
    /// - `major_axis_mm`/`minor_axis_mm`: ellipse axes, major along the cone's axis.
    fn distance_to_cone_ellipse(
        &self,
        heading_rad: f64,
        lookout_rad: f64,
        major_axis_mm: f64,
        minor_axis_mm: f64,
    ) -> ConeDistance;
}

impl ConeDistance {
    /// The distance reported when nothing is in sight.
    pub fn clear() -> Self {
        Self {
            min_mm: std::f64::INFINITY,
            max_mm: std::f64::INFINITY,
        }
    }
}
