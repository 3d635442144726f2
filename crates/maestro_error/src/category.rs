//! User-facing error classification.

use crate::{ClientErrorKind, MaestroError, MaestroErrorKind};

/// User-facing failure category for a vendor call.
///
/// Classified by status code first, substring heuristics as fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorCategory {
    /// Credential rejected (401/403)
    #[display("auth")]
    Auth,
    /// Rate limited (429)
    #[display("rate_limit")]
    RateLimit,
    /// Vendor-side failure (5xx)
    #[display("server")]
    Server,
    /// Connection-level failure
    #[display("network")]
    Network,
    /// The call timed out
    #[display("timeout")]
    Timeout,
    /// Anything else
    #[display("unknown")]
    Unknown,
}

impl ErrorCategory {
    /// Classify a status code and detail text into a category.
    pub fn classify(status: Option<u16>, detail: &str) -> Self {
        if let Some(status) = status {
            match status {
                401 | 403 => return Self::Auth,
                429 => return Self::RateLimit,
                500..=599 => return Self::Server,
                408 => return Self::Timeout,
                _ => {}
            }
        }

        let detail = detail.to_lowercase();
        if detail.contains("auth") || detail.contains("api key") || detail.contains("credential") {
            Self::Auth
        } else if detail.contains("rate limit") || detail.contains("quota") {
            Self::RateLimit
        } else if detail.contains("timeout") || detail.contains("timed out") {
            Self::Timeout
        } else if detail.contains("network")
            || detail.contains("connection")
            || detail.contains("dns")
        {
            Self::Network
        } else {
            Self::Unknown
        }
    }

    /// Classify a maestro error for user-facing display.
    ///
    /// Cancellation outcomes are not failures and classify as `Unknown`;
    /// callers are expected to filter them out before surfacing anything.
    pub fn from_error(error: &MaestroError) -> Self {
        match error.kind() {
            MaestroErrorKind::Client(e) => match &e.kind {
                ClientErrorKind::Api { status, body } => Self::classify(Some(*status), body),
                ClientErrorKind::Http(msg) => Self::classify(None, msg),
                ClientErrorKind::Aborted(_) => Self::Unknown,
                ClientErrorKind::MalformedResponse(msg) | ClientErrorKind::Stream(msg) => {
                    Self::classify(None, msg)
                }
            },
            MaestroErrorKind::Http(e) => Self::classify(None, &e.message),
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_takes_priority_over_substrings() {
        // Body mentions "rate limit" but the status says auth.
        assert_eq!(
            ErrorCategory::classify(Some(401), "rate limit exceeded"),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorCategory::classify(Some(429), "whatever"),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorCategory::classify(Some(503), "overloaded"),
            ErrorCategory::Server
        );
    }

    #[test]
    fn substring_fallback_without_status() {
        assert_eq!(
            ErrorCategory::classify(None, "connection refused"),
            ErrorCategory::Network
        );
        assert_eq!(
            ErrorCategory::classify(None, "request timed out"),
            ErrorCategory::Timeout
        );
        assert_eq!(
            ErrorCategory::classify(None, "invalid api key"),
            ErrorCategory::Auth
        );
        assert_eq!(ErrorCategory::classify(None, "???"), ErrorCategory::Unknown);
    }
}
