//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the equipment the locomotion core
//! talks to.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod mot;
pub mod prox;
