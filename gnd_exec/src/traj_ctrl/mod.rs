//! # Trajectory control module
//!
//! Trajectory control is responsible for flying the aircraft through the waypoints of the
//! trajectory. Each cycle it:
//!
//! 1. Computes the error to the active waypoint in the aircraft's body frame (`frames`).
//! 1. Passes the error through a PD controller per channel (`controllers`).
//! 1. Saturates the resulting stick command into the control envelope (`sat`).
//! 1. Checks whether the waypoint has been reached (`sequencer`).
//!
//! When a waypoint is reached the owner of the module holds the aircraft with a neutral command
//! and advances to the next waypoint. The trajectory repeats forever.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod frames;
pub mod params;
pub mod sat;
pub mod sequencer;
pub mod state;
pub mod waypoint;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use frames::{calc_error, ErrorVector};
pub use params::Params;
pub use sat::saturate;
pub use sequencer::*;
pub use state::*;
pub use waypoint::*;
