//! Error types for keyprobe.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are categorized into five main categories:
//! - **Network**: Connection, timeout, DNS, or TLS issues
//! - **Configuration**: Config file parsing, validation, or missing values
//! - **Provider**: Non-2xx responses or unparseable provider payloads
//! - **Input**: Empty or unusable credential input
//! - **Internal**: Unexpected errors, bugs, or unclassified issues
//!
//! Each error has a stable error code (e.g., `KP-N001`) for programmatic handling.
//!
//! Per-credential verification failures are *not* errors at this level: a
//! verifier always resolves to a [`VerificationResult`](crate::core::models::VerificationResult)
//! and failures are reported inline on the task. `KeyprobeError` covers the
//! command-level failures around a run (bad config, unreadable input, a model
//! listing that could not be fetched).

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network issues (timeout, DNS, TLS, connection refused).
    Network,
    /// Configuration issues (parse errors, invalid values, missing files).
    Configuration,
    /// Provider-specific issues (HTTP errors, unexpected payloads).
    Provider,
    /// Input issues (no credentials supplied, unreadable input file).
    Input,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Provider => "Provider error",
            Self::Input => "Input error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Provider => "P",
            Self::Input => "I",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Parse/config errors, unsupported provider, missing input
    ParseError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for keyprobe operations.
#[derive(Error, Debug)]
pub enum KeyprobeError {
    // ==========================================================================
    // Network errors (Category: Network)
    // ==========================================================================
    /// Request timed out.
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Generic transport error.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Error parsing configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown provider identifier.
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    /// Provider does not support the requested operation.
    #[error("provider {provider} does not support {operation}")]
    Unsupported { provider: String, operation: String },

    // ==========================================================================
    // Provider errors (Category: Provider)
    // ==========================================================================
    /// Provider API returned a non-2xx response.
    #[error("{provider} API error: {message}")]
    ProviderApi {
        provider: String,
        status_code: Option<u16>,
        message: String,
    },

    /// Failed to parse provider response.
    #[error("failed to parse response: {0}")]
    ParseResponse(String),

    // ==========================================================================
    // Input errors (Category: Input)
    // ==========================================================================
    /// No credentials found in the supplied input.
    #[error("no credentials supplied")]
    EmptyInput,

    /// Input could not be interpreted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeyprobeError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::Config(_)
            | Self::InvalidProvider(_)
            | Self::Unsupported { .. }
            | Self::ParseResponse(_)
            | Self::EmptyInput
            | Self::InvalidInput(_) => ExitCode::ParseError,

            Self::Timeout(_) => ExitCode::Timeout,

            Self::Connection(_)
            | Self::Network(_)
            | Self::ProviderApi { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout(_) | Self::Connection(_) | Self::Network(_) => ErrorCategory::Network,

            Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::Config(_)
            | Self::InvalidProvider(_)
            | Self::Unsupported { .. } => ErrorCategory::Configuration,

            Self::ProviderApi { .. } | Self::ParseResponse(_) => ErrorCategory::Provider,

            Self::EmptyInput | Self::InvalidInput(_) => ErrorCategory::Input,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `KP-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "KP-N001",
            Self::Connection(_) => "KP-N002",
            Self::Network(_) => "KP-N099",

            Self::ConfigParse { .. } => "KP-C001",
            Self::ConfigInvalid { .. } => "KP-C002",
            Self::Config(_) => "KP-C003",
            Self::InvalidProvider(_) => "KP-C010",
            Self::Unsupported { .. } => "KP-C011",

            Self::ProviderApi { .. } => "KP-P001",
            Self::ParseResponse(_) => "KP-P020",

            Self::EmptyInput => "KP-I001",
            Self::InvalidInput(_) => "KP-I002",

            Self::Io(_) => "KP-X001",
            Self::Json(_) => "KP-X002",
            Self::Other(_) => "KP-X099",
        }
    }

    /// Returns whether the error is potentially recoverable by retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) | Self::Network(_) => true,
            Self::ProviderApi {
                status_code: Some(code),
                ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// A one-line hint shown under the error in human output.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Timeout(secs) => Some(format!(
                "Raise the timeout with --timeout or KEYPROBE_TIMEOUT (currently {secs}s)."
            )),
            Self::InvalidProvider(_) => Some(format!(
                "Valid providers: auto, {}",
                crate::core::provider::Provider::ALL
                    .iter()
                    .map(|p| p.cli_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Self::ConfigParse { path, .. } => Some(format!("Check the TOML syntax in {path}.")),
            Self::EmptyInput => {
                Some("Pass --file PATH or pipe credentials on stdin, one per line.".to_string())
            }
            Self::Connection(_) | Self::Network(_) => {
                Some("Check your network connection or the endpoint URL.".to_string())
            }
            _ => None,
        }
    }
}

/// Result type alias for keyprobe operations.
pub type Result<T> = std::result::Result<T, KeyprobeError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_category_code_prefix() {
        assert_eq!(ErrorCategory::Network.code_prefix(), "N");
        assert_eq!(ErrorCategory::Configuration.code_prefix(), "C");
        assert_eq!(ErrorCategory::Provider.code_prefix(), "P");
        assert_eq!(ErrorCategory::Input.code_prefix(), "I");
        assert_eq!(ErrorCategory::Internal.code_prefix(), "X");
    }

    #[test]
    fn error_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Network), "Network error");
        assert_eq!(format!("{}", ErrorCategory::Input), "Input error");
    }

    #[test]
    fn error_code_prefix_matches_category() {
        let errors = vec![
            KeyprobeError::Timeout(30),
            KeyprobeError::Network("reset".to_string()),
            KeyprobeError::Config("bad".to_string()),
            KeyprobeError::InvalidProvider("nope".to_string()),
            KeyprobeError::ProviderApi {
                provider: "OpenAI".to_string(),
                status_code: Some(401),
                message: "invalid key".to_string(),
            },
            KeyprobeError::EmptyInput,
            KeyprobeError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            let code = err.error_code();
            let expected = format!("KP-{}", err.category().code_prefix());
            assert!(
                code.starts_with(&expected),
                "{code} should start with {expected}"
            );
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(KeyprobeError::Timeout(5).exit_code(), ExitCode::Timeout);
        assert_eq!(KeyprobeError::EmptyInput.exit_code(), ExitCode::ParseError);
        assert_eq!(
            KeyprobeError::Config("x".to_string()).exit_code(),
            ExitCode::ParseError
        );
        assert_eq!(
            KeyprobeError::Network("x".to_string()).exit_code(),
            ExitCode::GeneralError
        );
        assert_eq!(i32::from(ExitCode::Timeout), 4);
    }

    #[test]
    fn retryable_errors() {
        assert!(KeyprobeError::Timeout(5).is_retryable());
        assert!(
            KeyprobeError::ProviderApi {
                provider: "Groq".to_string(),
                status_code: Some(503),
                message: String::new(),
            }
            .is_retryable()
        );
        assert!(
            !KeyprobeError::ProviderApi {
                provider: "Groq".to_string(),
                status_code: Some(401),
                message: String::new(),
            }
            .is_retryable()
        );
        assert!(!KeyprobeError::EmptyInput.is_retryable());
    }

    #[test]
    fn invalid_provider_hint_lists_providers() {
        let hint = KeyprobeError::InvalidProvider("foo".to_string())
            .hint()
            .unwrap();
        assert!(hint.contains("deepseek"));
        assert!(hint.contains("custom"));
    }
}
