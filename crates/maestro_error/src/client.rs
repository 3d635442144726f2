//! Vendor client errors.

/// Why an in-flight generation was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AbortReason {
    /// A newer round cancelled this call before it resolved.
    #[display("superseded by a newer round")]
    Superseded,
    /// The per-call ceiling timeout elapsed.
    #[display("ceiling timeout elapsed")]
    DeadlineElapsed,
}

/// Vendor client error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ClientErrorKind {
    /// Transport-level failure before a status code was available
    #[display("Request failed: {}", _0)]
    Http(String),

    /// Non-success HTTP status, carrying status and response body
    #[display("API error {}: {}", status, body)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Success status but the response is missing an expected field
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),

    /// The call was cancelled; an expected outcome, not a user-facing failure
    #[display("Aborted: {}", _0)]
    Aborted(AbortReason),

    /// Streaming decode failure
    #[display("Stream error: {}", _0)]
    Stream(String),
}

/// Vendor client error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Client Error: {} at line {} in {}", kind, line, file)]
pub struct ClientError {
    /// The specific error kind
    pub kind: ClientErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ClientError {
    /// Create a new client error.
    #[track_caller]
    pub fn new(kind: ClientErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// True when this error is a cancellation outcome rather than a failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self.kind, ClientErrorKind::Aborted(_))
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
