use std::time::Duration;

use async_trait::async_trait;
use authcheck_core::config::ReachabilitySettings;
use authcheck_core::entities::Reachability;
use authcheck_core::ports::ReachabilityProbe;
use authcheck_core::Error;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::network::build_probe_client;

/// Single bounded GET against the API host.
///
/// Any HTTP answer counts as reachable, error statuses included.
pub struct HttpReachabilityProbe {
    client: Client,
    url: String,
}

impl HttpReachabilityProbe {
    pub fn new(settings: &ReachabilitySettings) -> Result<Self, Error> {
        Self::with_timeout(&settings.url, Duration::from_secs(settings.timeout_secs))
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: build_probe_client(timeout)?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn probe(&self) -> Reachability {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(status, "endpoint answered");
                Reachability::Reachable { status }
            }
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "reachability probe timed out");
                Reachability::Timeout
            }
            Err(e) if e.is_connect() => {
                warn!(error = %e, "could not connect");
                Reachability::ConnectionFailed {
                    message: e.to_string(),
                }
            }
            Err(e) => {
                warn!(error = %e, "reachability probe failed");
                Reachability::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
