use std::path::PathBuf;

use authcheck_core::config::{
    Settings, DEFAULT_API_BASE_URL, DEFAULT_KEYRING_ENTRY, DEFAULT_KEYRING_SERVICE,
    DEFAULT_SETUP_COMMAND,
};
use config::{Config, Environment, File};
use directories::ProjectDirs;

pub const ENV_PREFIX: &str = "AUTHCHECK";

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = if let Some(path) = system_config_dir_path {
        path
    } else {
        ProjectDirs::from("com", "authcheck", "authcheck")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    };

    let settings = Config::builder()
        // API client
        .set_default("api.base_url", DEFAULT_API_BASE_URL)?
        .set_default("api.timeout_secs", 30)?
        .set_default("api.connect_timeout_secs", 10)?
        // Connectivity probe
        .set_default("reachability.url", DEFAULT_API_BASE_URL)?
        .set_default("reachability.timeout_secs", 5)?
        // Token location written by the setup tool
        .set_default("keyring.service", DEFAULT_KEYRING_SERVICE)?
        .set_default("keyring.entry", DEFAULT_KEYRING_ENTRY)?
        .set_default("report.setup_command", DEFAULT_SETUP_COMMAND)?
        .set_default("log_level", "warn")?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
