//! # Ground executable library.
//!
//! This library allows other crates in the workspace, and the integration tests, to access items
//! defined inside the ground crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Interrupt handling - neutral command and exit on termination signals
pub mod interrupt;

/// Executable parameters - network and control loop settings
pub mod params;

/// Control loop scheduler - polls the aircraft, runs trajectory control and transmits commands
pub mod scheduler;

/// Trajectory control module - steers the aircraft through the waypoints of the trajectory
pub mod traj_ctrl;
