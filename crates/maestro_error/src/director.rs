//! Director engine error types.

/// Specific error conditions for director operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DirectorErrorKind {
    /// Failed to read a preset file
    #[display("Failed to read preset file: {}", _0)]
    FileRead(String),
    /// Failed to parse TOML content
    #[display("Failed to parse TOML: {}", _0)]
    TomlParse(String),
    /// Preset system prompt is empty or whitespace-only
    #[display("Preset '{}' has an empty system prompt", _0)]
    EmptySystemPrompt(String),
    /// The selected preset does not exist in the library
    #[display("Preset '{}' not found", _0)]
    UnknownPreset(String),
    /// Settings could not be loaded
    #[display("Failed to load settings: {}", _0)]
    SettingsLoad(String),
    /// Settings could not be saved
    #[display("Failed to save settings: {}", _0)]
    SettingsSave(String),
    /// The turn-injection collaborator failed
    #[display("Turn injection failed: {}", _0)]
    Injection(String),
    /// The review collaborator failed
    #[display("Review failed: {}", _0)]
    Review(String),
}

/// Error type for director operations.
///
/// # Examples
///
/// ```
/// use maestro_error::{DirectorError, DirectorErrorKind};
///
/// let err = DirectorError::new(DirectorErrorKind::UnknownPreset("noir".to_string()));
/// assert!(format!("{}", err).contains("noir"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Director Error: {} at line {} in {}", kind, line, file)]
pub struct DirectorError {
    /// The specific error condition
    pub kind: DirectorErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl DirectorError {
    /// Create a new DirectorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DirectorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
