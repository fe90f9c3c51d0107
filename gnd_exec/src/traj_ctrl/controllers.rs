//! # Trajectory controllers module
//!
//! This module provides the proportional-derivative (PD) control law used by TrajCtrl.
//!
//! Each of the four controlled channels (heading, altitude, body X, body Y) produces
//!
//! ```text
//! cmd = k_p * error + k_d * delta
//! ```
//!
//! where `delta` is the raw difference to the previous cycle's error. The difference is not
//! divided by the elapsed time: the loop runs as fast as the network allows, so the derivative
//! term is only a true derivative if the round trip time is constant. The tuned gains depend on
//! this, so it is kept as is.
//!
//! For the heading channel the difference is taken the other way around, `previous - error`,
//! while the other channels use `error - previous`. This matches the tuned heading gains.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::ErrorVector;
use comms_if::eqpt::StickCmd;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a single PD channel.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdGains {
    /// Proportional gain
    pub k_p: f64,

    /// Derivative gain, applied to the undivided one-cycle error difference
    pub k_d: f64,
}

/// Gains of all four channels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGains {
    /// Lateral (body X) channel, drives the right stick X axis
    pub body_x: PdGains,

    /// Longitudinal (body Y) channel, drives the right stick Y axis
    pub body_y: PdGains,

    /// Altitude channel, drives the left stick Y axis
    pub altitude: PdGains,

    /// Heading channel, drives the left stick X axis
    pub heading: PdGains,
}

/// The errors of the previous cycle, carried between cycles to form the derivative term.
///
/// Starts at zero.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct ControllerMemory {
    pub body_x_m: f64,
    pub body_y_m: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PdGains {
    pub fn new(k_p: f64, k_d: f64) -> Self {
        Self { k_p, k_d }
    }

    /// Output of the channel for the given error and difference.
    pub fn get(&self, error: f64, delta: f64) -> f64 {
        self.k_p * error + self.k_d * delta
    }
}

impl Default for ChannelGains {
    fn default() -> Self {
        Self {
            body_x: PdGains::new(0.05, 0.1),
            body_y: PdGains::new(0.05, 0.1),
            altitude: PdGains::new(0.05, 0.07),
            heading: PdGains::new(1.0 / 200.0, 1.0 / 200.0),
        }
    }
}

impl ControllerMemory {
    /// Capture the controlled channels of an error vector.
    pub fn from_error(error: &ErrorVector) -> Self {
        Self {
            body_x_m: error.body_x_m,
            body_y_m: error.body_y_m,
            altitude_m: error.altitude_m,
            heading_deg: error.heading_deg,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the raw (unsaturated) stick command for the current error.
///
/// Returns the command and the memory to use on the next cycle, which is always the current
/// error.
///
/// Channel mapping: left X is heading, left Y is altitude, right X is body X and right Y is body
/// Y.
pub fn calc_command(
    error: &ErrorVector,
    prev: &ControllerMemory,
    gains: &ChannelGains
) -> (StickCmd, ControllerMemory) {

    let d_body_x = error.body_x_m - prev.body_x_m;
    let d_body_y = error.body_y_m - prev.body_y_m;
    let d_alt = error.altitude_m - prev.altitude_m;
    let d_head = prev.heading_deg - error.heading_deg;

    let cmd = StickCmd {
        left_x: gains.heading.get(error.heading_deg, d_head),
        left_y: gains.altitude.get(error.altitude_m, d_alt),
        right_x: gains.body_x.get(error.body_x_m, d_body_x),
        right_y: gains.body_y.get(error.body_y_m, d_body_y),
    };

    (cmd, ControllerMemory::from_error(error))
}
