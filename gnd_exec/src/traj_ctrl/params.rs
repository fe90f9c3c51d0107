//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{ChannelGains, ConvergenceThresholds};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {

    /// PD gains for each channel
    pub gains: ChannelGains,

    /// Thresholds under which a waypoint is considered reached
    pub thresholds: ConvergenceThresholds,

    /// Symmetric limit applied to each stick channel. Must be no greater than the legal stick
    /// range of the remote controller.
    pub sat_limit: f64,

    /// If true the controller memory is zeroed when moving to a new waypoint, so that the first
    /// derivative term towards the new waypoint is taken from rest. If false the step in error
    /// between waypoints enters the derivative term.
    pub reset_memory_on_advance: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            gains: ChannelGains::default(),
            thresholds: ConvergenceThresholds::default(),
            sat_limit: 0.3,
            reset_memory_on_advance: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_from_toml() {
        let src = r#"
            sat_limit = 0.25

            [gains.body_x]
            k_p = 0.03
            k_d = 0.1

            [gains.body_y]
            k_p = 0.03
            k_d = 0.1

            [gains.altitude]
            k_p = 0.1
            k_d = 0.07

            [gains.heading]
            k_p = 0.005
            k_d = 0.005
        "#;

        let params: Params = toml::from_str(src).unwrap();

        assert_eq!(params.sat_limit, 0.25);
        assert_eq!(params.gains.body_x.k_p, 0.03);
        assert_eq!(params.gains.altitude.k_p, 0.1);
        assert_eq!(params.thresholds, ConvergenceThresholds::default());
        assert!(!params.reset_memory_on_advance);
    }
}
