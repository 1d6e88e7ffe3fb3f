//! Error types for `Interview Sensei`
//!
//! The sequencer itself never fails: malformed scripted input is clamped
//! rather than rejected. Everything around it (script loading, the CLI,
//! the async session runtime) reports typed errors that map onto process
//! exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `sensei` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Session runtime error (invalid speed, broken command channel)
    pub const SESSION_ERROR: i32 = 5;

    /// Usage error (invalid arguments, unknown built-in script)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `Interview Sensei` operations.
///
/// Aggregates the domain errors and maps each one to an exit code.
#[derive(Debug, Error)]
pub enum SenseiError {
    /// Script loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session runtime error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SenseiError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::UnknownScript { .. }) | Self::Usage(_) => {
                ExitCode::USAGE_ERROR
            }
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Script loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the script file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Script validation failed
    #[error("validation failed for {path}: {}", summarize(.errors))]
    ValidationError {
        /// Path (or origin label) of the script
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced script file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in the script is not set
    #[error("environment variable '{var}' not set ({location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied with `${VAR:?message}`
        location: String,
    },

    /// No built-in script with the requested name
    #[error("unknown built-in script '{name}'{}", .suggestion.as_ref().map_or_else(String::new, |s| format!(" (did you mean '{s}'?)")))]
    UnknownScript {
        /// Requested name
        name: String,
        /// Closest registered name, if any is near enough
        suggestion: Option<String>,
    },
}

fn summarize(errors: &[ValidationIssue]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during script validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "turns[2].question")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the script from being used
    Error,
    /// Worth reporting, but the script still loads
    Warning,
}

// ============================================================================
// Session Errors
// ============================================================================

/// Errors raised by the async session runtime and its CLI front-end.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Playback speed must be a finite, positive multiplier
    #[error("invalid playback speed {0}: expected a positive number")]
    InvalidSpeed(f64),

    /// The session was started after it had already been ended
    #[error("session already ended")]
    AlreadyEnded,

    /// An input line did not parse as a session command
    #[error("unknown command '{0}' (type 'help' for the list)")]
    UnknownCommand(String),

    /// A background task (renderer, stdin reader) failed to join
    #[error("session task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `Interview Sensei` operations.
pub type Result<T> = std::result::Result<T, SenseiError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SESSION_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_session_error_exit_code() {
        let err: SenseiError = SessionError::InvalidSpeed(0.0).into();
        assert_eq!(err.exit_code(), ExitCode::SESSION_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: SenseiError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_unknown_script_is_usage_error() {
        let err: SenseiError = ConfigError::UnknownScript {
            name: "aws-migraton".to_string(),
            suggestion: Some("aws-migration".to_string()),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
        assert!(err.to_string().contains("did you mean 'aws-migration'"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: SenseiError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "turns[0].question".to_string(),
            message: "question is empty".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(issue.to_string(), "error: question is empty at turns[0].question");
    }

    #[test]
    fn test_validation_error_summarizes_first_issue() {
        let issue = |path: &str| ValidationIssue {
            path: path.to_string(),
            message: "too long".to_string(),
            severity: Severity::Error,
        };
        let err = ConfigError::ValidationError {
            path: "script.yaml".to_string(),
            errors: vec![issue("turns[0].answer"), issue("turns[1].answer")],
        };
        let text = err.to_string();
        assert!(text.contains("turns[0].answer"));
        assert!(text.contains("and 1 more"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("script.yaml"),
            line: Some(42),
            message: "unexpected token".to_string(),
        };
        assert!(err.to_string().contains("script.yaml"));
        assert!(err.to_string().contains("unexpected token"));
    }
}
