use async_trait::async_trait;
use authcheck_core::config::ApiSettings;
use authcheck_core::entities::{Credentials, StoredToken};
use authcheck_core::ports::{AccountsApi, ApiConnector};
use authcheck_core::Error;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::network::{build_api_client, map_request_error};

const LOGIN_PATH: &str = "/auth/login/";
const GRAPHQL_PATH: &str = "/graphql";
const CLIENT_PLATFORM_HEADER: &str = "Client-Platform";
const CLIENT_PLATFORM: &str = "web";

const GET_ACCOUNTS_QUERY: &str = r#"query GetAccounts {
  accounts {
    id
    displayName
    syncDisabled
    deactivatedAt
    isHidden
    isAsset
    mask
    displayBalance
    updatedAt
    type {
      name
      display
    }
    institution {
      id
      name
    }
  }
  householdPreferences {
    id
    accountGroupOrder
  }
}"#;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    trusted_device: bool,
    supports_mfa: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Builds Monarch Money API clients that share one connection pool
pub struct MonarchConnector {
    client: Client,
    base_url: String,
}

impl MonarchConnector {
    pub fn new(settings: &ApiSettings) -> Result<Self, Error> {
        let client = build_api_client(settings)?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn client(&self, token: Option<String>) -> MonarchClient {
        MonarchClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }
}

impl ApiConnector for MonarchConnector {
    type Client = MonarchClient;

    fn with_token(&self, token: &StoredToken) -> Result<MonarchClient, Error> {
        Ok(self.client(Some(token.as_str().to_string())))
    }

    fn unauthenticated(&self) -> Result<MonarchClient, Error> {
        Ok(self.client(None))
    }
}

/// Monarch Money API client holding at most one session token
pub struct MonarchClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl MonarchClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn has_session(&self) -> bool {
        self.token.is_some()
    }
}

#[async_trait]
impl AccountsApi for MonarchClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&mut self, credentials: &Credentials) -> Result<(), Error> {
        let body = LoginRequest {
            username: &credentials.email,
            password: &credentials.password,
            trusted_device: false,
            supports_mfa: true,
        };

        debug!("sending login request");

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .header(CLIENT_PLATFORM_HEADER, CLIENT_PLATFORM)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error("login request failed", e))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            warn!("login requires multi-factor verification");
            return Err(Error::MfaRequired);
        }
        if !status.is_success() {
            return Err(status_error(response).await);
        }

        let login: LoginResponse = response.json().await.map_err(|e| {
            Error::InvalidServerResponse(format!("failed to parse login response: {}", e))
        })?;

        let token = login.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            Error::InvalidServerResponse("login response has no token".to_string())
        })?;

        info!("login successful");
        self.token = Some(token);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_accounts(&self) -> Result<Value, Error> {
        let token = self.token.as_deref().ok_or_else(|| {
            Error::Authentication("no session token, log in first".to_string())
        })?;

        let body = json!({
            "operationName": "GetAccounts",
            "query": GET_ACCOUNTS_QUERY,
            "variables": {},
        });

        let response = self
            .client
            .post(self.url(GRAPHQL_PATH))
            .header(CLIENT_PLATFORM_HEADER, CLIENT_PLATFORM)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| map_request_error("accounts request failed", e))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let payload: GraphQlResponse = response.json().await.map_err(|e| {
            Error::InvalidServerResponse(format!("failed to parse accounts response: {}", e))
        })?;

        if !payload.errors.is_empty() {
            let messages: Vec<&str> = payload.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::GraphQl(messages.join("; ")));
        }

        payload.data.ok_or_else(|| {
            Error::InvalidServerResponse("accounts response has no data".to_string())
        })
    }
}

/// Turn a non-success response into `Error::Api`, appending the server's
/// `detail` message when the body carries one.
async fn status_error(response: Response) -> Error {
    let status = response.status();
    let reason = status
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string();

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail);

    let reason = match detail {
        Some(detail) if !detail.is_empty() => format!("{}: {}", reason, detail),
        _ => reason,
    };

    warn!(status = status.as_u16(), reason = %reason, "API returned an error status");

    Error::Api {
        status: status.as_u16(),
        reason,
    }
}
