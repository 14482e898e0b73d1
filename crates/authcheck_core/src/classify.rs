//! Failure classification for token and login probes.
//!
//! The upstream API does not give us structured errors, so failures are
//! bucketed by looking for well-known markers in the error text. This breaks
//! if the wording upstream changes; it is only meant for manual diagnosis.

use crate::entities::CheckOutcome;
use crate::error::Error;

const UNAUTHORIZED_MARKERS: &[&str] = &["401", "unauthorized", "authentication"];
const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate limit", "too many requests"];

/// Classify a failed probe by its error text.
pub fn classify_failure(error: &Error) -> CheckOutcome {
    classify_message(&error.to_string(), error.kind_name())
}

/// Classify a failure message. Unauthorized markers win over rate-limit
/// markers, so a message mentioning `401` is never reported as throttled.
pub fn classify_message(message: &str, error_type: &str) -> CheckOutcome {
    let lower = message.to_lowercase();

    if contains_any(&lower, UNAUTHORIZED_MARKERS) {
        CheckOutcome::Unauthorized {
            message: message.to_string(),
        }
    } else if contains_any(&lower, RATE_LIMIT_MARKERS) {
        CheckOutcome::RateLimited {
            message: message.to_string(),
        }
    } else {
        CheckOutcome::Failed {
            message: message.to_string(),
            error_type: error_type.to_string(),
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Validity;
    use rstest::rstest;

    #[rstest]
    #[case("401 Unauthorized")]
    #[case("HTTP 401: Unauthorized")]
    #[case("Request failed with status 401")]
    #[case("UNAUTHORIZED")]
    #[case("Authentication credentials were not provided")]
    #[case("401 and also 429 Too Many Requests")]
    fn test_unauthorized_messages_are_invalid(#[case] message: &str) {
        let outcome = classify_message(message, "Other");
        assert!(matches!(outcome, CheckOutcome::Unauthorized { .. }));
        assert_eq!(outcome.validity(), Validity::Invalid);
    }

    #[rstest]
    #[case("429")]
    #[case("HTTP 429: Too Many Requests")]
    #[case("Rate limit exceeded, slow down")]
    #[case("too many requests")]
    fn test_rate_limited_messages(#[case] message: &str) {
        let outcome = classify_message(message, "Other");
        assert!(matches!(outcome, CheckOutcome::RateLimited { .. }));
        assert_eq!(outcome.validity(), Validity::RateLimited);
    }

    #[rstest]
    #[case("connection reset by peer")]
    #[case("HTTP 500: Internal Server Error")]
    #[case("")]
    fn test_other_failures_are_invalid(#[case] message: &str) {
        let outcome = classify_message(message, "Network");
        assert_eq!(
            outcome,
            CheckOutcome::Failed {
                message: message.to_string(),
                error_type: "Network".to_string()
            }
        );
        assert_eq!(outcome.validity(), Validity::Invalid);
    }

    #[test]
    fn test_classify_failure_uses_display_text() {
        let err = Error::Api {
            status: 401,
            reason: "Unauthorized".to_string(),
        };
        assert_eq!(
            classify_failure(&err),
            CheckOutcome::Unauthorized {
                message: "HTTP 401: Unauthorized".to_string()
            }
        );

        let err = Error::Api {
            status: 429,
            reason: "Too Many Requests".to_string(),
        };
        assert_eq!(classify_failure(&err).validity(), Validity::RateLimited);
    }

    #[test]
    fn test_classify_failure_reports_kind() {
        let err = Error::Network("dns lookup failed".to_string());
        assert_eq!(
            classify_failure(&err),
            CheckOutcome::Failed {
                message: "network error: dns lookup failed".to_string(),
                error_type: "Network".to_string()
            }
        );
    }

    #[test]
    fn test_mfa_is_not_reported_as_bad_credentials() {
        let outcome = classify_failure(&Error::MfaRequired);
        assert_eq!(
            outcome,
            CheckOutcome::Failed {
                message: "multi-factor verification required".to_string(),
                error_type: "MfaRequired".to_string()
            }
        );
        assert_eq!(outcome.validity(), Validity::Invalid);
    }

    #[test]
    fn test_401_is_never_valid_or_rate_limited() {
        let noise = ["", "429 ", "rate limit ", "too many requests ", "ok "];
        for prefix in noise {
            for suffix in noise {
                let message = format!("{}401{}", prefix, suffix);
                assert_eq!(
                    classify_message(&message, "Other").validity(),
                    Validity::Invalid,
                    "{message}"
                );
            }
        }
    }
}
