//! # Network Module
//!
//! This module provides the client side of the link to the aircraft's remote controller. The
//! remote controller exposes a small HTTP API: state getters under `/aircraft/` and a stick setter
//! under `/send/`.
//!
//! Consumers should depend on the [`RemoteStateClient`] trait rather than on the HTTP client
//! itself, so that the control loop can be driven by other transports or by scripted clients in
//! tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod http;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::{AircraftState, StickCmd};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use http::HttpStateClient;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Base endpoint, answers with a short description of the remote controller.
pub const EP_BASE: &str = "/";

/// Aircraft speed getter
pub const EP_SPEED: &str = "/aircraft/speed";

/// Aircraft heading getter
pub const EP_HEADING: &str = "/aircraft/heading";

/// Aircraft attitude getter
pub const EP_ATTITUDE: &str = "/aircraft/attitude";

/// Aircraft location getter
pub const EP_LOCATION: &str = "/aircraft/location";

/// Gimbal attitude getter
pub const EP_GIMBAL_ATTITUDE: &str = "/aircraft/gimbalAttitude";

/// Getter for all states in one response
pub const EP_ALL_STATES: &str = "/aircraft/allStates";

/// Stick setter, expects a body formatted as `"<leftX>,<leftY>,<rightX>,<rightY>"`
pub const EP_STICK: &str = "/send/stick";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing how to reach the remote controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetParams {
    /// URL scheme used when the address given does not include one
    pub scheme: String,

    /// Port used when the address given does not include one
    pub port: u16,

    /// Timeout applied to each request, in seconds. `None` means requests may block forever.
    pub request_timeout_s: Option<f64>,

    /// Timeout of the neutral command sent on an interrupt, in seconds
    pub stop_timeout_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while talking to the remote controller.
#[derive(thiserror::Error, Debug)]
pub enum StateClientError {
    /// The request could not be completed, the remote is unreachable or answered with an error
    /// status.
    #[error("Transport error on {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The remote answered but the state could not be read from the response.
    #[error("Malformed state received: {0}")]
    MalformedState(String),

    /// The command cannot be sent, for example because it contains non-finite channels.
    #[error("Invalid stick command {0:?}")]
    InvalidCommand(StickCmd),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A client able to fetch the aircraft's state and transmit stick commands.
pub trait RemoteStateClient {
    /// Fetch the latest estimated state of the aircraft.
    fn fetch_state(&mut self) -> Result<AircraftState, StateClientError>;

    /// Transmit a stick command to the aircraft.
    fn send_stick(&mut self, cmd: &StickCmd) -> Result<(), StateClientError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NetParams {
    fn default() -> Self {
        Self {
            scheme: String::from("http"),
            port: 8080,
            request_timeout_s: None,
            stop_timeout_s: 1.0,
        }
    }
}

impl NetParams {
    /// Build the base URL of the remote controller's API from an address.
    ///
    /// The address may be a bare host (`192.168.1.10`), a host and port (`192.168.1.10:8081`) or a
    /// full URL (`http://rc.local:8080`). Missing parts are taken from the parameters.
    pub fn base_url(&self, address: &str) -> String {
        let address = address.trim().trim_end_matches('/');

        if address.contains("://") {
            address.to_string()
        } else if address.contains(':') {
            format!("{}://{}", self.scheme, address)
        } else {
            format!("{}://{}:{}", self.scheme, address, self.port)
        }
    }

    /// Parameters for the client sending the neutral command on an interrupt, which must never
    /// block for longer than `stop_timeout_s`.
    pub fn for_stop(&self) -> Self {
        Self {
            request_timeout_s: Some(self.stop_timeout_s),
            ..self.clone()
        }
    }
}

impl StateClientError {
    /// True if the error is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_base_url() {
        let params = NetParams::default();

        assert_eq!(params.base_url("192.168.1.10"), "http://192.168.1.10:8080");
        assert_eq!(params.base_url("192.168.1.10:9000"), "http://192.168.1.10:9000");
        assert_eq!(params.base_url("https://rc.local:8443/"), "https://rc.local:8443");

        let params = NetParams {
            port: 8081,
            ..Default::default()
        };
        assert_eq!(params.base_url(" rc.local "), "http://rc.local:8081");
    }

    #[test]
    fn test_net_params_partial() {
        let params: NetParams = serde_json::from_str(r#"{"request_timeout_s": 2.5}"#).unwrap();

        assert_eq!(params.port, 8080);
        assert_eq!(params.scheme, "http");
        assert_eq!(params.request_timeout_s, Some(2.5));
        assert_eq!(params.stop_timeout_s, 1.0);
    }

    #[test]
    fn test_stop_params_always_bounded() {
        let params = NetParams::default();
        let stop = params.for_stop();

        assert_eq!(params.request_timeout_s, None);
        assert_eq!(stop.request_timeout_s, Some(1.0));
        assert_eq!(stop.base_url("rc.local"), params.base_url("rc.local"));
    }
}
