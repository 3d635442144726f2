//! Top-level error wrapper types.

use crate::{BuilderError, ClientError, ConfigError, DirectorError, HttpError, JsonError};

/// This is the foundation error enum. Each maestro crate contributes the
/// variant covering its own concern.
///
/// # Examples
///
/// ```
/// use maestro_error::{MaestroError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: MaestroError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MaestroErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Vendor client error
    #[from(ClientError)]
    Client(ClientError),
    /// Director engine error
    #[from(DirectorError)]
    Director(DirectorError),
}

/// Maestro error with kind discrimination.
///
/// # Examples
///
/// ```
/// use maestro_error::{MaestroResult, ConfigError};
///
/// fn might_fail() -> MaestroResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Maestro Error: {}", _0)]
pub struct MaestroError(Box<MaestroErrorKind>);

impl MaestroError {
    /// Create a new error from a kind.
    pub fn new(kind: MaestroErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MaestroErrorKind {
        &self.0
    }

    /// True when this error is a cancellation outcome rather than a failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self.kind(), MaestroErrorKind::Client(e) if e.is_aborted())
    }
}

// Generic From implementation for any type that converts to MaestroErrorKind
impl<T> From<T> for MaestroError
where
    T: Into<MaestroErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Maestro operations.
///
/// # Examples
///
/// ```
/// use maestro_error::{MaestroResult, HttpError};
///
/// fn fetch_data() -> MaestroResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type MaestroResult<T> = std::result::Result<T, MaestroError>;
