//! # Ground Executable Parameters
//!
//! This module provide parameters for the ground executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use comms_if::net::NetParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct GndExecParams {

    /// Parameters of the link to the remote controller
    pub net: NetParams,

    /// Parameters of the control loop
    pub sched: SchedParams,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SchedParams {

    /// Number of consecutive cycles with a comms failure (state fetch or command send) tolerated
    /// before the loop stops. Zero stops on the first failure.
    pub max_consec_comms_errors: u64,

    /// If true the operator must confirm on stdin before the trajectory starts
    pub confirm_start: bool,

    /// If true each cycle is archived to `cycles.csv` in the session archive directory
    pub archive_cycles: bool,

    /// Stop after this many cycles. `None` runs until interrupted.
    pub max_cycles: Option<u64>,
}

impl Default for SchedParams {
    fn default() -> Self {
        Self {
            max_consec_comms_errors: 5,
            confirm_start: true,
            archive_cycles: true,
            max_cycles: None,
        }
    }
}
