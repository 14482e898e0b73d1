use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{
    CheckOutcome, Credentials, DiagnosticReport, Reachability, StoredToken, TokenSummary,
};
use crate::error::Error;

// ============================================================================
// Collaborator Ports
// ============================================================================

/// Read access to the token persisted by the setup tool (keyring)
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored token, `None` when nothing is stored
    async fn load_token(&self) -> Result<Option<StoredToken>, Error>;
}

/// Client for the finance API, either token-authenticated or fresh
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Exchange credentials for a session token held by this client
    async fn login(&mut self, credentials: &Credentials) -> Result<(), Error>;

    /// Fetch the account list; the payload is returned untouched
    async fn get_accounts(&self) -> Result<Value, Error>;
}

/// Builds API clients
pub trait ApiConnector: Send + Sync {
    type Client: AccountsApi;

    /// Client authenticated with a previously stored token
    fn with_token(&self, token: &StoredToken) -> Result<Self::Client, Error>;

    /// Client with no session, ready for `login`
    fn unauthenticated(&self) -> Result<Self::Client, Error>;
}

/// Bounded GET against the API host
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> Reachability;
}

// ============================================================================
// Presentation Ports
// ============================================================================

/// Interactive credential entry
pub trait CredentialPrompt {
    /// Ask for an email; `None` means the user chose to skip
    fn email(&self) -> Result<Option<String>, Error>;

    fn password(&self) -> Result<String, Error>;
}

/// Receives each step of a diagnostic run as it happens
pub trait DiagnosticSink {
    fn started(&mut self) -> Result<(), Error>;

    fn token_found(&mut self, token: &TokenSummary) -> Result<(), Error>;

    /// `load_error` is set when the store itself failed
    fn token_missing(&mut self, load_error: Option<&Error>) -> Result<(), Error>;

    fn fresh_login_started(&mut self) -> Result<(), Error>;

    fn fresh_login_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error>;

    fn fresh_login_skipped(&mut self) -> Result<(), Error>;

    fn token_check_started(&mut self) -> Result<(), Error>;

    fn token_check_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error>;

    fn reachability_started(&mut self) -> Result<(), Error>;

    fn reachability_finished(&mut self, reachability: &Reachability) -> Result<(), Error>;

    fn finished(&mut self, report: &DiagnosticReport) -> Result<(), Error>;
}
