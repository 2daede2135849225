//! # Communications interface crate.
//!
//! Provides the interfaces between the locomotion core and the collaborators
//! around it: telecommands coming down from the behaviour layer, and the
//! equipment (motor board, proximity sensing) it drives and listens to.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and report definitions for equipment (like the motor board)
pub mod eqpt;
