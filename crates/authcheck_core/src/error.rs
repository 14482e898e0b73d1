use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {reason}")]
    Api { status: u16, reason: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("multi-factor verification required")]
    MfaRequired,

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("credential storage error: {0}")]
    CredentialStorage(String),

    #[error("invalid response from server: {0}")]
    InvalidServerResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Variant name, reported next to unclassified failures.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network",
            Self::Timeout(_) => "Timeout",
            Self::Api { .. } => "Api",
            Self::Authentication(_) => "Authentication",
            Self::MfaRequired => "MfaRequired",
            Self::GraphQl(_) => "GraphQl",
            Self::CredentialStorage(_) => "CredentialStorage",
            Self::InvalidServerResponse(_) => "InvalidServerResponse",
            Self::Configuration(_) => "Configuration",
            Self::Io(_) => "Io",
            Self::Other(_) => "Other",
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
