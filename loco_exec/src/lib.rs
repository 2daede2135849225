//! # Locomotion library.
//!
//! This library holds the locomotion control core, allowing the executable, benchmarks and other
//! crates in the workspace to drive it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematic types - velocities, envelopes and limits shared by the controllers
pub mod kin;

/// Localisation module - the robot's pose and the motor board report mailbox
pub mod loc;

/// Locomotion control module - the mode supervisor, runs the other controllers every cycle
pub mod loco_ctrl;

/// Navigation - the path planner interface
pub mod nav;

/// Obstacle speed limiter - slows the robot as obstacles get close
pub mod obs_limit;

/// Relative motion control module - drives straight or turns by a given amount
pub mod rel_ctrl;

/// Simulation client - simulated motor board and proximity sensor
pub mod sim_client;

/// Trajectory control module - keeps the robot on the given path
pub mod traj_ctrl;
