use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Documentation directory not found: {}", path.display())]
    MissingDocsDirError { path: PathBuf },

    #[error("Sandbox error: {message}")]
    SandboxError { message: String },

    #[error("Verifier error: {message}")]
    VerifierError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Sandbox,
    Verification,
}

impl CheckError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn sandbox(message: impl Into<String>) -> Self {
        Self::SandboxError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::MissingDocsDirError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::SandboxError { .. } => ErrorCategory::Sandbox,
            Self::VerifierError { .. } => ErrorCategory::Verification,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingDocsDirError { path } => {
                format!("Cannot find tutorials at {}", path.display())
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check --docs-dir and the tutorial-check.toml settings"
            }
            ErrorCategory::Io => "Check file permissions and available disk space",
            ErrorCategory::Sandbox => "Make sure the temp directory is writable",
            ErrorCategory::Verification => "Make sure cargo is installed and on PATH",
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
