use crate::domain::model::Platform;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("{platform} user '{username}' not found")]
    NotFound { platform: Platform, username: String },

    #[error("{platform} credential missing or rejected: {message}")]
    Auth { platform: Platform, message: String },

    #[error("{platform} {operation} failed: {message}")]
    Upstream {
        platform: Platform,
        operation: &'static str,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Auth,
    Upstream,
    Configuration,
    Validation,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StatsError {
    pub fn upstream(
        platform: Platform,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            platform,
            operation,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Auth { .. } => ErrorCategory::Auth,
            Self::Upstream { .. } | Self::Http(_) => ErrorCategory::Upstream,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::NotFound => ErrorSeverity::Low,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Auth => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether another attempt at the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.category(), ErrorCategory::Upstream)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::NotFound { platform, .. } => {
                format!("Check that the {platform} username is spelled correctly")
            }
            Self::Auth { .. } => {
                "Set GITHUB_TOKEN (or github.token in the config file) to a valid access token"
                    .to_string()
            }
            Self::Upstream { .. } | Self::Http(_) => {
                "The upstream service may be unavailable; try again later".to_string()
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the configuration file and environment variables".to_string()
            }
            Self::ValidationError { .. } => "Check the supplied usernames".to_string(),
            Self::IoError(_) => "Check file paths and permissions".to_string(),
            Self::SerializationError(_) => "Report this as a bug".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Auth { .. } => "Statistics service is not configured".to_string(),
            Self::NotFound { platform, username } => {
                format!("No {platform} account named '{username}'")
            }
            Self::Upstream { platform, .. } => format!("{platform} is currently unreachable"),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
