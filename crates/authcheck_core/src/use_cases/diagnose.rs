use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::classify::classify_failure;
use crate::entities::{
    CheckOutcome, Credentials, DiagnosticReport, Reachability, StoredToken, TokenSummary,
};
use crate::error::Error;
use crate::ports::{
    AccountsApi, ApiConnector, CredentialPrompt, DiagnosticSink, ReachabilityProbe, TokenStore,
};
use crate::recommendation::Recommendation;

/// Runs the authentication diagnostic:
/// - Token existence in the credential store
/// - Token validity against the API (or a fresh login when nothing is stored)
/// - API reachability
/// - Recommendation
///
/// Every check is terminal to itself only; failures are classified and the
/// run moves on to the next check.
pub struct DiagnoseUseCase<S, C, R>
where
    S: TokenStore,
    C: ApiConnector,
    R: ReachabilityProbe,
{
    token_store: Arc<S>,
    connector: Arc<C>,
    probe: Arc<R>,
}

impl<S, C, R> DiagnoseUseCase<S, C, R>
where
    S: TokenStore,
    C: ApiConnector,
    R: ReachabilityProbe,
{
    pub fn new(token_store: Arc<S>, connector: Arc<C>, probe: Arc<R>) -> Self {
        Self {
            token_store,
            connector,
            probe,
        }
    }

    /// Run all checks, reporting each step to `sink` as it completes.
    ///
    /// Only errors raised by the sink itself are returned.
    pub async fn execute<P, K>(&self, prompt: &P, sink: &mut K) -> Result<DiagnosticReport, Error>
    where
        P: CredentialPrompt + ?Sized,
        K: DiagnosticSink + ?Sized,
    {
        sink.started()?;

        let token = match self.token_store.load_token().await {
            Ok(Some(token)) => Some(token),
            Ok(None) => {
                sink.token_missing(None)?;
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to read stored token");
                sink.token_missing(Some(&e))?;
                None
            }
        };

        let Some(token) = token else {
            let fresh_login = self.fresh_login_from_prompt(prompt, sink).await?;
            let report = DiagnosticReport {
                token: None,
                token_check: None,
                fresh_login,
                reachability: None,
                recommendation: Recommendation::select(false, None),
            };
            sink.finished(&report)?;
            return Ok(report);
        };

        let summary = TokenSummary::from(&token);
        sink.token_found(&summary)?;

        sink.token_check_started()?;
        let token_check = self.check_token_validity(&token).await;
        sink.token_check_finished(&token_check)?;

        sink.reachability_started()?;
        let reachability = self.check_reachability().await;
        sink.reachability_finished(&reachability)?;

        let report = DiagnosticReport {
            token: Some(summary),
            recommendation: Recommendation::select(true, Some(token_check.validity())),
            token_check: Some(token_check),
            fresh_login: None,
            reachability: Some(reachability),
        };
        sink.finished(&report)?;

        Ok(report)
    }

    /// Validate a stored token with one authenticated accounts call.
    #[instrument(skip(self, token))]
    pub async fn check_token_validity(&self, token: &StoredToken) -> CheckOutcome {
        let result = match self.connector.with_token(token) {
            Ok(client) => client.get_accounts().await,
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(response) => CheckOutcome::from_accounts_response(&response),
            Err(e) => classify_failure(&e),
        };

        info!(validity = %outcome.validity(), "token check finished");
        outcome
    }

    /// Log in without any stored session, then make one accounts call.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn test_fresh_login(&self, credentials: &Credentials) -> CheckOutcome {
        let result = match self.connector.unauthenticated() {
            Ok(mut client) => match client.login(credentials).await {
                Ok(()) => client.get_accounts().await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(response) => CheckOutcome::from_accounts_response(&response),
            Err(e) => classify_failure(&e),
        };

        info!(validity = %outcome.validity(), "fresh login finished");
        outcome
    }

    pub async fn check_reachability(&self) -> Reachability {
        let reachability = self.probe.probe().await;
        debug!(?reachability, "reachability probe finished");
        reachability
    }

    async fn fresh_login_from_prompt<P, K>(
        &self,
        prompt: &P,
        sink: &mut K,
    ) -> Result<Option<CheckOutcome>, Error>
    where
        P: CredentialPrompt + ?Sized,
        K: DiagnosticSink + ?Sized,
    {
        let email = match prompt.email() {
            Ok(Some(email)) if !email.trim().is_empty() => email.trim().to_string(),
            Ok(_) => {
                sink.fresh_login_skipped()?;
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "could not read email");
                sink.fresh_login_skipped()?;
                return Ok(None);
            }
        };

        let password = match prompt.password() {
            Ok(password) => password,
            Err(e) => {
                warn!(error = %e, "could not read password");
                sink.fresh_login_skipped()?;
                return Ok(None);
            }
        };

        sink.fresh_login_started()?;
        let outcome = self
            .test_fresh_login(&Credentials::new(email, password))
            .await;
        sink.fresh_login_finished(&outcome)?;

        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Validity;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockTokenStore {
        token: Result<Option<String>, String>,
    }

    #[async_trait]
    impl TokenStore for MockTokenStore {
        async fn load_token(&self) -> Result<Option<StoredToken>, Error> {
            match &self.token {
                Ok(token) => Ok(token.as_deref().map(StoredToken::new)),
                Err(msg) => Err(Error::CredentialStorage(msg.clone())),
            }
        }
    }

    struct MockClient {
        accounts: Result<Value, String>,
        login: Result<(), String>,
    }

    #[async_trait]
    impl AccountsApi for MockClient {
        async fn login(&mut self, _credentials: &Credentials) -> Result<(), Error> {
            self.login.clone().map_err(Error::Other)
        }

        async fn get_accounts(&self) -> Result<Value, Error> {
            self.accounts.clone().map_err(Error::Other)
        }
    }

    #[derive(Default)]
    struct Calls {
        with_token: AtomicUsize,
        unauthenticated: AtomicUsize,
        tokens: Mutex<Vec<String>>,
    }

    struct MockConnector {
        accounts: Result<Value, String>,
        login: Result<(), String>,
        calls: Calls,
    }

    impl MockConnector {
        fn new(accounts: Result<Value, String>) -> Self {
            Self {
                accounts,
                login: Ok(()),
                calls: Calls::default(),
            }
        }

        fn with_login(mut self, login: Result<(), String>) -> Self {
            self.login = login;
            self
        }

        fn client(&self) -> MockClient {
            MockClient {
                accounts: self.accounts.clone(),
                login: self.login.clone(),
            }
        }
    }

    impl ApiConnector for MockConnector {
        type Client = MockClient;

        fn with_token(&self, token: &StoredToken) -> Result<MockClient, Error> {
            self.calls.with_token.fetch_add(1, Ordering::SeqCst);
            self.calls
                .tokens
                .lock()
                .unwrap()
                .push(token.as_str().to_string());
            Ok(self.client())
        }

        fn unauthenticated(&self) -> Result<MockClient, Error> {
            self.calls.unauthenticated.fetch_add(1, Ordering::SeqCst);
            Ok(self.client())
        }
    }

    struct MockProbe {
        result: Reachability,
        calls: AtomicUsize,
    }

    impl MockProbe {
        fn new(result: Reachability) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReachabilityProbe for MockProbe {
        async fn probe(&self) -> Reachability {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    struct MockPrompt {
        email: Option<String>,
        asked: AtomicUsize,
    }

    impl MockPrompt {
        fn new(email: Option<&str>) -> Self {
            Self {
                email: email.map(str::to_string),
                asked: AtomicUsize::new(0),
            }
        }
    }

    impl CredentialPrompt for MockPrompt {
        fn email(&self) -> Result<Option<String>, Error> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            Ok(self.email.clone())
        }

        fn password(&self) -> Result<String, Error> {
            Ok("hunter2".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
    }

    impl DiagnosticSink for RecordingSink {
        fn started(&mut self) -> Result<(), Error> {
            self.events.push("started".into());
            Ok(())
        }

        fn token_found(&mut self, token: &TokenSummary) -> Result<(), Error> {
            self.events.push(format!("token_found:{}", token.length));
            Ok(())
        }

        fn token_missing(&mut self, load_error: Option<&Error>) -> Result<(), Error> {
            self.events
                .push(format!("token_missing:{}", load_error.is_some()));
            Ok(())
        }

        fn fresh_login_started(&mut self) -> Result<(), Error> {
            self.events.push("fresh_login_started".into());
            Ok(())
        }

        fn fresh_login_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error> {
            self.events
                .push(format!("fresh_login_finished:{}", outcome.validity()));
            Ok(())
        }

        fn fresh_login_skipped(&mut self) -> Result<(), Error> {
            self.events.push("fresh_login_skipped".into());
            Ok(())
        }

        fn token_check_started(&mut self) -> Result<(), Error> {
            self.events.push("token_check_started".into());
            Ok(())
        }

        fn token_check_finished(&mut self, outcome: &CheckOutcome) -> Result<(), Error> {
            self.events
                .push(format!("token_check_finished:{}", outcome.validity()));
            Ok(())
        }

        fn reachability_started(&mut self) -> Result<(), Error> {
            self.events.push("reachability_started".into());
            Ok(())
        }

        fn reachability_finished(&mut self, _reachability: &Reachability) -> Result<(), Error> {
            self.events.push("reachability_finished".into());
            Ok(())
        }

        fn finished(&mut self, _report: &DiagnosticReport) -> Result<(), Error> {
            self.events.push("finished".into());
            Ok(())
        }
    }

    fn use_case(
        token: Result<Option<String>, String>,
        connector: MockConnector,
    ) -> DiagnoseUseCase<MockTokenStore, MockConnector, MockProbe> {
        DiagnoseUseCase::new(
            Arc::new(MockTokenStore { token }),
            Arc::new(connector),
            Arc::new(MockProbe::new(Reachability::Reachable { status: 200 })),
        )
    }

    #[tokio::test]
    async fn test_valid_token_full_run() {
        let uc = use_case(
            Ok(Some("GOODTOKEN".into())),
            MockConnector::new(Ok(json!({"accounts": [1, 2, 3]}))),
        );
        let prompt = MockPrompt::new(None);
        let mut sink = RecordingSink::default();

        let report = uc.execute(&prompt, &mut sink).await.unwrap();

        assert_eq!(
            report.token_check,
            Some(CheckOutcome::Valid { account_count: 3 })
        );
        assert_eq!(report.recommendation, Recommendation::InspectCallers);
        assert_eq!(
            report.reachability,
            Some(Reachability::Reachable { status: 200 })
        );
        assert!(report.fresh_login.is_none());
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
        assert_eq!(
            *uc.connector.calls.tokens.lock().unwrap(),
            vec!["GOODTOKEN".to_string()]
        );
        assert_eq!(
            sink.events,
            vec![
                "started",
                "token_found:9",
                "token_check_started",
                "token_check_finished:VALID",
                "reachability_started",
                "reachability_finished",
                "finished",
            ]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_token() {
        let uc = use_case(
            Ok(Some("BADTOKEN".into())),
            MockConnector::new(Err("401 Unauthorized".into())),
        );
        let mut sink = RecordingSink::default();

        let report = uc
            .execute(&MockPrompt::new(None), &mut sink)
            .await
            .unwrap();

        assert_eq!(report.token_validity(), Some(Validity::Invalid));
        assert_eq!(report.recommendation, Recommendation::Reauthenticate);
        // Reachability still runs after a failed token check
        assert_eq!(uc.probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_token() {
        let uc = use_case(
            Ok(Some("SOMETOKEN".into())),
            MockConnector::new(Err("429 Too Many Requests".into())),
        );
        let mut sink = RecordingSink::default();

        let report = uc
            .execute(&MockPrompt::new(None), &mut sink)
            .await
            .unwrap();

        assert_eq!(report.token_validity(), Some(Validity::RateLimited));
        assert_eq!(report.recommendation, Recommendation::WaitThenRunSetup);
    }

    #[tokio::test]
    async fn test_unexpected_format_is_invalid() {
        let uc = use_case(
            Ok(Some("SOMETOKEN".into())),
            MockConnector::new(Ok(Value::Null)),
        );
        let outcome = uc
            .check_token_validity(&StoredToken::new("SOMETOKEN"))
            .await;
        assert_eq!(outcome, CheckOutcome::UnexpectedFormat);
    }

    #[tokio::test]
    async fn test_missing_token_goes_to_fresh_login_without_validity_check() {
        let uc = use_case(
            Ok(None),
            MockConnector::new(Ok(json!({"accounts": [1]}))),
        );
        let prompt = MockPrompt::new(Some("me@example.com"));
        let mut sink = RecordingSink::default();

        let report = uc.execute(&prompt, &mut sink).await.unwrap();

        assert_eq!(uc.connector.calls.with_token.load(Ordering::SeqCst), 0);
        assert_eq!(uc.connector.calls.unauthenticated.load(Ordering::SeqCst), 1);
        assert_eq!(uc.probe.calls.load(Ordering::SeqCst), 0);
        assert!(report.token.is_none());
        assert!(report.token_check.is_none());
        assert!(report.reachability.is_none());
        assert_eq!(
            report.fresh_login,
            Some(CheckOutcome::Valid { account_count: 1 })
        );
        assert_eq!(report.recommendation, Recommendation::RunSetup);
        assert_eq!(
            sink.events,
            vec![
                "started",
                "token_missing:false",
                "fresh_login_started",
                "fresh_login_finished:VALID",
                "finished",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_token_with_blank_email_skips_login() {
        let uc = use_case(Ok(None), MockConnector::new(Ok(json!({}))));
        let mut sink = RecordingSink::default();

        let report = uc
            .execute(&MockPrompt::new(Some("   ")), &mut sink)
            .await
            .unwrap();

        assert!(report.fresh_login.is_none());
        assert_eq!(uc.connector.calls.unauthenticated.load(Ordering::SeqCst), 0);
        assert!(sink.events.contains(&"fresh_login_skipped".to_string()));
    }

    #[tokio::test]
    async fn test_store_error_is_treated_as_missing() {
        let uc = use_case(
            Err("secret service unavailable".into()),
            MockConnector::new(Ok(json!({}))),
        );
        let mut sink = RecordingSink::default();

        let report = uc
            .execute(&MockPrompt::new(None), &mut sink)
            .await
            .unwrap();

        assert!(report.token.is_none());
        assert_eq!(report.recommendation, Recommendation::RunSetup);
        assert_eq!(sink.events[1], "token_missing:true");
    }

    #[tokio::test]
    async fn test_fresh_login_failures() {
        let uc = use_case(
            Ok(None),
            MockConnector::new(Ok(json!({"accounts": []})))
                .with_login(Err("HTTP 429: Too Many Requests".into())),
        );
        let outcome = uc
            .test_fresh_login(&Credentials::new("me@example.com", "pw"))
            .await;
        assert_eq!(outcome.validity(), Validity::RateLimited);

        let uc = use_case(
            Ok(None),
            MockConnector::new(Ok(json!({"accounts": []})))
                .with_login(Err("HTTP 401: Unauthorized".into())),
        );
        let outcome = uc
            .test_fresh_login(&Credentials::new("me@example.com", "pw"))
            .await;
        assert!(matches!(outcome, CheckOutcome::Unauthorized { .. }));
    }
}
