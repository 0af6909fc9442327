//! Unified error handling for the agent core.
//!
//! Each [`KestrelError`] variant corresponds to one of the error kinds in the
//! system design: Storage, Parse, Llm, File, Command, Conflict, Validation,
//! and Timeout. Every variant carries a human-readable message and an
//! optional remediation suggestion so the UI layer can render type, message,
//! and a Retry/Skip/Abort choice without inspecting the variant further.

use std::fmt;

pub type KestrelResult<T> = Result<T, KestrelError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum KestrelError {
    #[error("storage error: {message}")]
    Storage {
        message: String,
        suggestion: Option<String>,
    },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        suggestion: Option<String>,
    },

    #[error("model error: {message}")]
    Llm {
        message: String,
        suggestion: Option<String>,
    },

    #[error("file error: {message}")]
    File {
        message: String,
        suggestion: Option<String>,
    },

    #[error("command error: {message}")]
    Command {
        message: String,
        suggestion: Option<String>,
    },

    #[error("conflict: {message}")]
    Conflict {
        message: String,
        suggestion: Option<String>,
    },

    #[error("validation error: {message}")]
    Validation {
        message: String,
        suggestion: Option<String>,
    },

    #[error("timeout: {message}")]
    Timeout {
        message: String,
        suggestion: Option<String>,
    },
}

impl KestrelError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::File {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        let slot = match &mut self {
            Self::Storage { suggestion, .. }
            | Self::Parse { suggestion, .. }
            | Self::Llm { suggestion, .. }
            | Self::File { suggestion, .. }
            | Self::Command { suggestion, .. }
            | Self::Conflict { suggestion, .. }
            | Self::Validation { suggestion, .. }
            | Self::Timeout { suggestion, .. } => suggestion,
        };
        *slot = Some(suggestion.into());
        self
    }

    /// Whether the UI should offer Retry/Skip, or only Abort.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Storage { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Storage { message, .. }
            | Self::Parse { message, .. }
            | Self::Llm { message, .. }
            | Self::File { message, .. }
            | Self::Command { message, .. }
            | Self::Conflict { message, .. }
            | Self::Validation { message, .. }
            | Self::Timeout { message, .. } => message,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Storage { suggestion, .. }
            | Self::Parse { suggestion, .. }
            | Self::Llm { suggestion, .. }
            | Self::File { suggestion, .. }
            | Self::Command { suggestion, .. }
            | Self::Conflict { suggestion, .. }
            | Self::Validation { suggestion, .. }
            | Self::Timeout { suggestion, .. } => suggestion.as_deref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "Storage",
            Self::Parse { .. } => "Parse",
            Self::Llm { .. } => "Llm",
            Self::File { .. } => "File",
            Self::Command { .. } => "Command",
            Self::Conflict { .. } => "Conflict",
            Self::Validation { .. } => "Validation",
            Self::Timeout { .. } => "Timeout",
        }
    }
}

/// What the UI offers the user in response to a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChoice {
    Retry,
    Skip,
    Abort,
}

impl fmt::Display for ErrorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_not_recoverable() {
        let err = KestrelError::storage("backend unreachable");
        assert!(!err.is_recoverable());
        assert_eq!(err.kind_name(), "Storage");
    }

    #[test]
    fn other_kinds_are_recoverable() {
        for err in [
            KestrelError::parse("bad syntax"),
            KestrelError::llm("transport failed"),
            KestrelError::file("not found"),
            KestrelError::command("blocked"),
            KestrelError::conflict("hash mismatch"),
            KestrelError::validation("bad param"),
            KestrelError::timeout("exceeded budget"),
        ] {
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn suggestion_round_trips() {
        let err = KestrelError::file("missing").with_suggestion("create it first");
        assert_eq!(err.suggestion(), Some("create it first"));
        assert_eq!(err.message(), "missing");
    }
}
