//! Structured error handling with codes, context and recovery suggestions
//!
//! Errors here cover the surfaces *around* resolution: reading fragment
//! files, parsing schemas, interpreting CLI overrides. Resolution itself never
//! fails; its findings are [`Diagnostic`](crate::config::Diagnostic)s.

use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // IO errors (2xxx)
    /// Generic I/O failure
    IoError = 2000,
    /// A fragment or schema file does not exist
    FileNotFound = 2001,
    /// A file exists but cannot be read
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// A fragment or schema file is not valid TOML/JSON
    ConfigParseError = 3002,
    /// Resolution reported error diagnostics
    ConfigValidationError = 3003,
    /// A fragment value cannot be represented as a scalar
    InvalidConfigValue = 3004,
    /// A schema is internally inconsistent
    SchemaError = 3005,

    // Input errors (6xxx)
    /// Malformed command-line input
    InvalidInput = 6001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            2 => "IO",
            3 => "Configuration",
            6 => "Input",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Exit code a CLI should use when this error aborts it
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::ConfigValidationError => exit_codes::VALIDATION_ERROR,
            ErrorCode::InvalidInput => exit_codes::USAGE_ERROR,
            code if code.category() == "Configuration" => exit_codes::CONFIG_ERROR,
            _ => exit_codes::FAILURE,
        }
    }

    // Convenience constructors

    /// Missing fragment or schema file
    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    /// Unparseable file, naming the path
    pub fn config_parse(path: impl AsRef<std::path::Path>, message: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConfigParseError,
            format!(
                "Failed to parse config file {}: {}",
                path.as_ref().display(),
                message
            ),
        )
    }

    /// Value of an unsupported shape (float, array, null, ...)
    pub fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Invalid value for '{}': {}", key, message.into()),
        )
        .with_suggestion("Only strings, integers and booleans are supported as values")
    }

    /// Two spellings in one document that flatten to the same key
    pub fn duplicate_key(key: &str) -> Self {
        Self::new(
            ErrorCode::InvalidConfigValue,
            format!("Key '{}' is defined twice", key),
        )
        .with_suggestion("Use either a quoted dotted key or a nested table, not both")
    }

    /// Inconsistent schema
    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaError, message)
    }

    /// Resolution finished with error diagnostics
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    /// Malformed command-line input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Command completed
    pub const SUCCESS: i32 = 0;
    /// Any failure without a more specific code
    pub const FAILURE: i32 = 1;
    /// Resolution reported error diagnostics
    pub const VALIDATION_ERROR: i32 = 2;
    /// A fragment or schema could not be loaded
    pub const CONFIG_ERROR: i32 = 3;
    /// Malformed command-line input (`EX_USAGE`)
    pub const USAGE_ERROR: i32 = 64;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("JSON parse error: {}", err))
            .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::new(ErrorCode::SchemaError, format!("Regex error: {}", err)).with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error, if any
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::ConfigValidationError.to_string(), "E3003");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::SchemaError.category(), "Configuration");
        assert_eq!(ErrorCode::InvalidInput.category(), "Input");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/build.toml")
            .with_context("While loading fragment 'release'");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_exit_codes_follow_category() {
        assert_eq!(Error::validation("x").exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(Error::schema("x").exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(Error::duplicate_key("a.b").exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(Error::invalid_input("x").exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(
            Error::new(ErrorCode::IoError, "disk full").exit_code(),
            exit_codes::FAILURE
        );
    }

    #[test]
    fn test_display_includes_context_and_suggestion() {
        let err = Error::duplicate_key("defaultConfig.minSdk").with_context("In base.toml");
        let text = err.to_string();

        assert!(text.starts_with("[E3004] Key 'defaultConfig.minSdk' is defined twice"));
        assert!(text.contains("Context: In base.toml"));
        assert!(text.contains("Suggestion: "));
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(Error::schema("empty range"));
        let err = result.context("Validating schema android.toml").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("Validating schema android.toml"));
    }
}
