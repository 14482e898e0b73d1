use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://api.monarchmoney.com";
pub const DEFAULT_KEYRING_SERVICE: &str = "com.mcp.monarch-mcp-server";
pub const DEFAULT_KEYRING_ENTRY: &str = "monarch-token";
pub const DEFAULT_SETUP_COMMAND: &str = "python login_setup.py";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api: ApiSettings,
    pub reachability: ReachabilitySettings,
    pub keyring: KeyringSettings,
    #[serde(default)]
    pub tls: TlsSettings,
    pub report: ReportSettings,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            reachability: ReachabilitySettings::default(),
            keyring: KeyringSettings::default(),
            tls: TlsSettings::default(),
            report: ReportSettings::default(),
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReachabilitySettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ReachabilitySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct KeyringSettings {
    pub service: String,
    pub entry: String,
}

impl Default for KeyringSettings {
    fn default() -> Self {
        Self {
            service: DEFAULT_KEYRING_SERVICE.to_string(),
            entry: DEFAULT_KEYRING_ENTRY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct TlsSettings {
    /// PEM bundle exported to child TLS stacks; system bundle when unset
    pub ca_bundle: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Command shown to the user whenever a fresh session must be saved
    pub setup_command: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            setup_command: DEFAULT_SETUP_COMMAND.to_string(),
        }
    }
}
