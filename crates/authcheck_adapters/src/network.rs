//! Shared HTTP client configuration for network operations.
//!
//! Provides factory functions for creating HTTP clients with the timeouts and
//! user agent each check needs.

use std::time::Duration;

use authcheck_core::config::ApiSettings;
use authcheck_core::Error;
use reqwest::Client;

/// Upper bound on connect time for probe clients (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const USER_AGENT: &str = concat!("authcheck/", env!("CARGO_PKG_VERSION"));

/// Build a configured HTTP client for API calls.
///
/// This client is configured with:
/// - Cookie store disabled (the session travels in the Authorization header)
/// - Request and connect timeouts from settings
pub fn build_api_client(settings: &ApiSettings) -> Result<Client, Error> {
    Client::builder()
        .cookie_store(false)
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()
        .map_err(|e| Error::Network(format!("failed to create API HTTP client: {}", e)))
}

/// Build a client for the reachability probe. `timeout` bounds the whole
/// request, connect included.
pub fn build_probe_client(timeout: Duration) -> Result<Client, Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(DEFAULT_CONNECT_TIMEOUT))
        .build()
        .map_err(|e| Error::Network(format!("failed to create probe HTTP client: {}", e)))
}

/// Map a transport error, keeping timeouts distinguishable.
pub(crate) fn map_request_error(context: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{}: {}", context, e))
    } else {
        Error::Network(format!("{}: {}", context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_api_client() {
        let client = build_api_client(&ApiSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_probe_client() {
        let client = build_probe_client(Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_timeout_constants() {
        assert_eq!(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs(10));
    }

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("authcheck/"));
    }
}
