use crate::entities::Validity;

/// Remedial action printed at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Nothing stored yet: run the setup tool
    RunSetup,
    /// Stored token was rejected: run the setup tool again
    Reauthenticate,
    /// Throttled: wait, then run the setup tool
    WaitThenRunSetup,
    /// Token works; the problem is elsewhere
    InspectCallers,
}

impl Recommendation {
    /// Decision table over {token present?, validity}.
    ///
    /// A present token with no validity result (check never ran) falls into
    /// the re-authenticate bucket.
    pub fn select(token_present: bool, validity: Option<Validity>) -> Self {
        match (token_present, validity) {
            (false, _) => Recommendation::RunSetup,
            (true, Some(Validity::Valid)) => Recommendation::InspectCallers,
            (true, Some(Validity::RateLimited)) => Recommendation::WaitThenRunSetup,
            (true, Some(Validity::Invalid)) | (true, None) => Recommendation::Reauthenticate,
        }
    }
}
