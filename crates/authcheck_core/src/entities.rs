use std::fmt;

use serde_json::Value;

use crate::recommendation::Recommendation;

/// Characters shown from the start of a token in previews
const PREVIEW_HEAD: usize = 20;
/// Characters shown from the end of a token in previews
const PREVIEW_TAIL: usize = 10;

/// Opaque API token as persisted by the setup tool
#[derive(Clone, PartialEq, Eq)]
pub struct StoredToken(String);

impl StoredToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First 20 and last 10 characters, joined by `...`.
    ///
    /// Tokens too short to elide anything are masked entirely.
    pub fn preview(&self) -> String {
        let len = self.len();
        if len <= PREVIEW_HEAD + PREVIEW_TAIL {
            return "***".to_string();
        }

        let head: String = self.0.chars().take(PREVIEW_HEAD).collect();
        let tail: String = self.0.chars().skip(len - PREVIEW_TAIL).collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoredToken").field(&self.preview()).finish()
    }
}

/// Login credentials entered at the prompt
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Ternary result of a token or login probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    /// Indeterminate: the server throttled us before answering
    RateLimited,
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Valid => write!(f, "VALID"),
            Validity::Invalid => write!(f, "INVALID"),
            Validity::RateLimited => write!(f, "RATE_LIMITED"),
        }
    }
}

/// Detailed outcome of one authenticated probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid { account_count: usize },
    /// The call succeeded but the payload was not a usable object
    UnexpectedFormat,
    Unauthorized { message: String },
    RateLimited { message: String },
    Failed { message: String, error_type: String },
}

impl CheckOutcome {
    /// Inspect a successful accounts response.
    ///
    /// Anything other than a non-empty JSON object is an unexpected format.
    pub fn from_accounts_response(response: &Value) -> Self {
        match response.as_object() {
            Some(map) if !map.is_empty() => {
                let account_count = map
                    .get("accounts")
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                CheckOutcome::Valid { account_count }
            }
            _ => CheckOutcome::UnexpectedFormat,
        }
    }

    pub fn validity(&self) -> Validity {
        match self {
            CheckOutcome::Valid { .. } => Validity::Valid,
            CheckOutcome::RateLimited { .. } => Validity::RateLimited,
            CheckOutcome::UnexpectedFormat
            | CheckOutcome::Unauthorized { .. }
            | CheckOutcome::Failed { .. } => Validity::Invalid,
        }
    }
}

/// Outcome of the unauthenticated connectivity probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    Reachable { status: u16 },
    Timeout,
    ConnectionFailed { message: String },
    Failed { message: String },
}

/// What the existence check found in the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSummary {
    pub length: usize,
    pub preview: String,
}

impl From<&StoredToken> for TokenSummary {
    fn from(token: &StoredToken) -> Self {
        Self {
            length: token.len(),
            preview: token.preview(),
        }
    }
}

/// Everything a single diagnostic run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub token: Option<TokenSummary>,
    pub token_check: Option<CheckOutcome>,
    /// `None` when no login was attempted (token present, or email skipped)
    pub fresh_login: Option<CheckOutcome>,
    pub reachability: Option<Reachability>,
    pub recommendation: Recommendation,
}

impl DiagnosticReport {
    pub fn token_validity(&self) -> Option<Validity> {
        self.token_check.as_ref().map(CheckOutcome::validity)
    }
}
