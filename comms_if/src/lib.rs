//! # Communications interface crate.
//!
//! Provides the interface to the remotely commanded aircraft: the state and command types exchanged
//! with the remote controller, and the client used to exchange them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// State and command definitions for equipment (the aircraft)
pub mod eqpt;

/// Network module
pub mod net;
