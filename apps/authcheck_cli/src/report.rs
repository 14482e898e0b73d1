use std::io::Write;

use authcheck_core::entities::{
    CheckOutcome, DiagnosticReport, Reachability, TokenSummary, Validity,
};
use authcheck_core::ports::DiagnosticSink;
use authcheck_core::recommendation::Recommendation;
use authcheck_core::Error;
use chrono::{DateTime, Local};

const RULE_WIDTH: usize = 80;

/// Plain-text report written as the checks progress
pub struct ConsoleReport<W: Write> {
    out: W,
    setup_command: String,
    started_at: DateTime<Local>,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W, setup_command: &str) -> Self {
        Self {
            out,
            setup_command: setup_command.to_string(),
            started_at: Local::now(),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn rule(&mut self) -> Result<(), Error> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    fn banner(&mut self, title: &str) -> Result<(), Error> {
        self.rule()?;
        writeln!(self.out, "{}", title)?;
        self.rule()
    }

    fn line(&mut self, text: &str) -> Result<(), Error> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn web_login_hints(&mut self, hints: &[&str]) -> Result<(), Error> {
        self.line("\n   Since web login works, this suggests:")?;
        for hint in hints {
            writeln!(self.out, "   * {}", hint)?;
        }
        Ok(())
    }

    fn conclusion(&mut self, validity: Validity) -> Result<(), Error> {
        match validity {
            Validity::Valid => {
                self.line("\nCONCLUSION: Token is valid and working!")?;
                self.line("   -> Authentication is working correctly")?;
                self.line("   -> Issue may be in how the calling scripts use the API")
            }
            Validity::Invalid => {
                self.line("\nCONCLUSION: Token is expired or invalid")?;
                self.line("   -> Need to re-authenticate")?;
                writeln!(self.out, "   -> Run: {}", self.setup_command)?;
                self.web_login_hints(&[
                    "Token may have expired (tokens typically last 30 days)",
                    "Token format may have changed",
                    "API may require re-authentication",
                ])
            }
            Validity::RateLimited => {
                self.line("\nCONCLUSION: Rate limited - cannot determine token validity")?;
                self.line("   -> Wait 30-60 minutes")?;
                writeln!(self.out, "   -> Then run: {}", self.setup_command)?;
                self.web_login_hints(&[
                    "Too many API attempts triggered rate limiting",
                    "Web interface may have different rate limits",
                    "API has stricter rate limiting than web",
                ])
            }
        }
    }

    fn key_findings(&mut self, report: &DiagnosticReport) -> Result<(), Error> {
        self.line("\nKey Findings:")?;
        let findings: &[&str] = match (report.token.is_some(), report.token_validity()) {
            (false, _) => &["No token stored - need initial authentication"][..],
            (true, Some(Validity::Valid)) => {
                &["Token exists and is valid", "Authentication should work"][..]
            }
            (true, Some(Validity::RateLimited)) => {
                &["Token exists but rate limited", "Wait before retrying"][..]
            }
            (true, _) => &["Token exists but is expired/invalid", "Need to re-authenticate"][..],
        };
        for finding in findings {
            writeln!(self.out, "  * {}", finding)?;
        }
        Ok(())
    }
}

/// Final remedial action for a recommendation
pub fn recommendation_text(recommendation: Recommendation, setup_command: &str) -> String {
    match recommendation {
        Recommendation::RunSetup => format!("-> Run: {}", setup_command),
        Recommendation::Reauthenticate => format!("-> Token expired - run: {}", setup_command),
        Recommendation::WaitThenRunSetup => format!(
            "-> Rate limited - wait 30-60 minutes, then run: {}",
            setup_command
        ),
        Recommendation::InspectCallers => {
            "-> Token is valid - check calling scripts for other issues".to_string()
        }
    }
}

impl<W: Write> DiagnosticSink for ConsoleReport<W> {
    fn started(&mut self) -> Result<(), Error> {
        self.banner("MONARCH AUTHENTICATION DIAGNOSTIC")?;
        writeln!(
            self.out,
            "Time: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        self.line("")?;
        self.banner("CHECK 1: Token Existence")
    }

    fn token_found(&mut self, token: &TokenSummary) -> Result<(), Error> {
        self.line("OK: Token exists in keyring")?;
        writeln!(self.out, "   Token length: {} characters", token.length)?;
        writeln!(self.out, "   Token preview: {}", token.preview)?;
        Ok(())
    }

    fn token_missing(&mut self, load_error: Option<&Error>) -> Result<(), Error> {
        self.line("FAILED: No token found in keyring")?;
        if let Some(e) = load_error {
            writeln!(self.out, "   Keyring error: {}", e)?;
        }
        writeln!(self.out, "   -> Need to run {}", self.setup_command)?;
        self.line("\nSince you can log in via web browser, let's test fresh login...")?;
        self.out.flush()?;
        Ok(())
    }

    fn fresh_login_started(&mut self) -> Result<(), Error> {
        self.line("\nTesting fresh login...")
    }

    fn fresh_login_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error> {
        match outcome {
            CheckOutcome::Valid { account_count } => {
                writeln!(
                    self.out,
                    "OK: Fresh login WORKS - found {} accounts",
                    account_count
                )?;
            }
            CheckOutcome::UnexpectedFormat => {
                self.line(
                    "WARNING: Fresh login succeeded but API returned unexpected format",
                )?;
            }
            CheckOutcome::RateLimited { message } => {
                writeln!(
                    self.out,
                    "FAILED: RATE LIMITED (429) during fresh login: {}",
                    message
                )?;
                self.line("   Wait 30-60 minutes before trying again")?;
            }
            CheckOutcome::Unauthorized { message } => {
                writeln!(self.out, "FAILED: Authentication failed: {}", message)?;
                self.line("   Check your credentials")?;
            }
            CheckOutcome::Failed {
                message,
                error_type,
            } => {
                writeln!(self.out, "FAILED: Fresh login failed: {}", message)?;
                writeln!(self.out, "   Error type: {}", error_type)?;
            }
        }

        match outcome.validity() {
            Validity::Valid => writeln!(
                self.out,
                "\nFresh login successful! Run {} to save the session.",
                self.setup_command
            )?,
            Validity::RateLimited => writeln!(
                self.out,
                "\nRate limited - wait 30-60 minutes, then run {}",
                self.setup_command
            )?,
            Validity::Invalid => self.line("\nFresh login failed - check credentials")?,
        }
        Ok(())
    }

    fn fresh_login_skipped(&mut self) -> Result<(), Error> {
        self.line("Fresh login skipped.")
    }

    fn token_check_started(&mut self) -> Result<(), Error> {
        self.line("")?;
        self.banner("CHECK 2: Token Validity")?;
        self.line("\nTesting token validity...")
    }

    fn token_check_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error> {
        match outcome {
            CheckOutcome::Valid { account_count } => {
                writeln!(
                    self.out,
                    "OK: Token is VALID - found {} accounts",
                    account_count
                )?;
            }
            CheckOutcome::UnexpectedFormat => {
                self.line("WARNING: Token exists but API returned unexpected format")?;
            }
            CheckOutcome::Unauthorized { message } => {
                writeln!(self.out, "FAILED: Token is EXPIRED or INVALID: {}", message)?;
            }
            CheckOutcome::RateLimited { message } => {
                writeln!(self.out, "WARNING: RATE LIMITED (429): {}", message)?;
                self.line("   This is a temporary issue - wait 30-60 minutes")?;
            }
            CheckOutcome::Failed {
                message,
                error_type,
            } => {
                writeln!(self.out, "FAILED: Token test failed with error: {}", message)?;
                writeln!(self.out, "   Error type: {}", error_type)?;
            }
        }

        self.conclusion(outcome.validity())
    }

    fn reachability_started(&mut self) -> Result<(), Error> {
        self.line("")?;
        self.banner("CHECK 3: API Connectivity")
    }

    fn reachability_finished(&mut self, reachability: &Reachability) -> Result<(), Error> {
        match reachability {
            Reachability::Reachable { status } => {
                writeln!(self.out, "OK: API endpoint reachable (Status: {})", status)?;
            }
            Reachability::Timeout => {
                self.line("WARNING: API endpoint timeout - network issue?")?;
            }
            Reachability::ConnectionFailed { message } => {
                self.line("FAILED: Cannot connect to API - network issue?")?;
                writeln!(self.out, "   {}", message)?;
            }
            Reachability::Failed { message } => {
                writeln!(self.out, "WARNING: API connectivity check failed: {}", message)?;
            }
        }
        Ok(())
    }

    fn finished(&mut self, report: &DiagnosticReport) -> Result<(), Error> {
        // The no-token path ends with the fresh login verdict
        if report.token.is_none() {
            self.out.flush()?;
            return Ok(());
        }

        self.line("")?;
        self.banner("DIAGNOSTIC SUMMARY")?;
        self.key_findings(report)?;

        self.line("\nSince web login works:")?;
        self.line("  * Credentials are correct")?;
        self.line("  * Account is not locked")?;
        self.line("  * Network connectivity is fine")?;

        self.line("\nPossible causes:")?;
        self.line("  1. Token expiration (most likely if token exists but invalid)")?;
        self.line("  2. Rate limiting from too many API attempts")?;
        self.line("  3. API vs Web authentication differences")?;
        self.line("  4. Token format changes in the API")?;

        self.line("")?;
        self.banner("RECOMMENDED ACTION")?;
        let action = recommendation_text(report.recommendation, &self.setup_command);
        self.line(&action)?;

        self.out.flush()?;
        Ok(())
    }
}
