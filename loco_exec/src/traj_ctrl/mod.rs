//! # Trajectory control module
//!
//! Trajectory control keeps the robot on the current trajectory, an ordered
//! list of waypoints each carrying the speed the robot should have as it
//! reaches it (zero for a stopping point).
//!
//! Steering uses pure pursuit. The robot's position is projected onto the
//! polyline joining the remaining waypoints, and a goal point is placed a
//! fixed arc length (the lookahead) further along it. The curvature needed to
//! reach that goal gives the yaw rate.
//!
//! Longitudinal speed is ramped towards a ceiling which shrinks as the heading
//! error to the next waypoint grows, and a braking check projects where the
//! robot would stop if it began decelerating now. If that stop point lands on
//! (or past) the waypoint the robot decelerates instead.
//!
//! Stopping points must also be reached at their goal heading. Once the robot
//! is on such a point it turns on the spot until the heading is within
//! tolerance.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod path;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use path::*;
pub use params::Params;
pub use state::*;
