mod prompt;
mod report;

use std::sync::Arc;

use authcheck_adapters::{configuration, telemetry, trust_store};
use authcheck_adapters::{HttpReachabilityProbe, KeyringTokenStore, MonarchConnector};
use authcheck_core::config::Settings;
use authcheck_core::use_cases::DiagnoseUseCase;
use clap::Parser;
use tracing::{error, info};

use crate::prompt::TerminalPrompt;
use crate::report::ConsoleReport;

/// Check the health of the stored Monarch Money API token.
///
/// Reads the token saved by the setup tool, validates it against the API,
/// probes connectivity and prints a recommended action. When no token is
/// stored it offers to test a fresh login instead.
#[derive(Parser)]
#[command(author, version)]
struct Cli {}

fn main() {
    dotenvy::dotenv().ok();

    // Usage errors are printed like --help, without a failing exit status
    let _cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return;
        }
    };

    let (settings, config_error) = match configuration::get_configuration() {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let _guard = match telemetry::init_subscriber("authcheck", &settings.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {:#}", e);
            None
        }
    };

    if let Some(e) = config_error {
        error!(?e, "failed to load configuration, using defaults");
    }

    if let Some(bundle) = trust_store::export_trust_store(&settings.tls) {
        info!(bundle = %bundle.display(), "using CA bundle");
    }

    // Checks run one after another; a single-threaded runtime is all we need
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(?e, "failed to start async runtime");
            return;
        }
    };

    if let Err(e) = runtime.block_on(run(&settings)) {
        error!(?e, "diagnostic aborted");
    }
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    let token_store = KeyringTokenStore::new(&settings.keyring);
    let connector = MonarchConnector::new(&settings.api)?;
    let probe = HttpReachabilityProbe::new(&settings.reachability)?;

    let use_case = DiagnoseUseCase::new(
        Arc::new(token_store),
        Arc::new(connector),
        Arc::new(probe),
    );

    let mut report = ConsoleReport::new(std::io::stdout(), &settings.report.setup_command);
    let outcome = use_case.execute(&TerminalPrompt, &mut report).await?;

    info!(
        token_present = outcome.token.is_some(),
        recommendation = ?outcome.recommendation,
        "diagnostic finished"
    );

    Ok(())
}
