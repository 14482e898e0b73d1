use std::path::PathBuf;

use anyhow::Context;
use directories::ProjectDirs;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Directory holding the rolling log files
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "authcheck", "authcheck")
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber: console on stderr, daily file under
/// [`log_dir`]. Stdout stays reserved for the report.
///
/// The returned guard flushes the file writer on drop.
pub fn init_subscriber(name: &str, env_filter: &str) -> anyhow::Result<WorkerGuard> {
    LogTracer::init().context("failed to initialize log tracer bridge")?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let formatting_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .pretty();

    let file_appender = tracing_appender::rolling::daily(log_dir(), format!("{}.log", name));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .with(file_layer);

    set_global_default(subscriber).context("failed to set global tracing subscriber")?;

    Ok(guard)
}
