//! # HTTP Remote Controller Client
//!
//! Blocking client for the remote controller's HTTP API.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use log::trace;
use ureq::Agent;

use super::{NetParams, RemoteStateClient, StateClientError, EP_ALL_STATES, EP_BASE, EP_STICK};
use crate::eqpt::{AircraftState, StickCmd};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for the remote controller's HTTP API.
pub struct HttpStateClient {
    agent: Agent,

    base_url: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HttpStateClient {
    /// Create a new client for the remote controller at the given address.
    ///
    /// No request is made here, use [`HttpStateClient::ping`] to check the link.
    pub fn new(address: &str, params: &NetParams) -> Self {
        let timeout = params
            .request_timeout_s
            .filter(|t| t.is_finite() && *t > 0.0)
            .map(Duration::from_secs_f64);

        let config = Agent::config_builder()
            .timeout_global(timeout)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: params.base_url(address),
        }
    }

    /// The base URL all endpoints are relative to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request the base endpoint, returning the response body.
    pub fn ping(&self) -> Result<String, StateClientError> {
        self.get(EP_BASE)
    }

    /// Make a GET request to the endpoint, returning the response body.
    pub fn get(&self, endpoint: &str) -> Result<String, StateClientError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let body = self
            .agent
            .get(&url)
            .call()
            .and_then(|r| r.into_body().read_to_string())
            .map_err(|e| transport_error(endpoint, e))?;

        trace!("EP : {}\t{}", endpoint, body);

        Ok(body)
    }

    /// Make a POST request to the endpoint with the given body, returning the response body.
    pub fn post(&self, endpoint: &str, data: &str) -> Result<String, StateClientError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let body = self
            .agent
            .post(&url)
            .send(data.as_bytes())
            .and_then(|r| r.into_body().read_to_string())
            .map_err(|e| transport_error(endpoint, e))?;

        trace!("EP : {}\t{}", endpoint, body);

        Ok(body)
    }
}

impl RemoteStateClient for HttpStateClient {
    fn fetch_state(&mut self) -> Result<AircraftState, StateClientError> {
        let body = self.get(EP_ALL_STATES)?;

        AircraftState::from_body(&body)
            .map_err(|e| StateClientError::MalformedState(e.to_string()))
    }

    fn send_stick(&mut self, cmd: &StickCmd) -> Result<(), StateClientError> {
        if !cmd.is_finite() {
            return Err(StateClientError::InvalidCommand(*cmd));
        }

        self.post(EP_STICK, &cmd.to_body()).map(|_| ())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn transport_error(endpoint: &str, e: ureq::Error) -> StateClientError {
    StateClientError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalid_command_not_sent() {
        // Nothing listens on this port, but the command must be refused before any request
        let mut client = HttpStateClient::new("127.0.0.1:9", &NetParams::default());

        let result = client.send_stick(&StickCmd::new(f64::INFINITY, 0.0, 0.0, 0.0));

        assert!(matches!(result, Err(StateClientError::InvalidCommand(_))));
    }

    #[test]
    fn test_unreachable_is_transport_error() {
        let params = NetParams {
            request_timeout_s: Some(0.5),
            ..Default::default()
        };
        let mut client = HttpStateClient::new("127.0.0.1:9", &params);

        let err = client.fetch_state().unwrap_err();

        assert!(err.is_transport());
    }
}
