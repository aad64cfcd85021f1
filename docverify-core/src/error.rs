use crate::types::{Category, Finding};
use std::path::PathBuf;
use thiserror::Error;

/// Missing or malformed terminology/document-type configuration.
///
/// Fatal: raised before any checker runs, never turned into findings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("terminology config is missing required key '{key}'")]
    MissingKey { key: String },

    #[error("terminology config key '{key}' is malformed: expected {expected}")]
    Malformed { key: String, expected: String },

    #[error("terminology config key '{key}' has an invalid value: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("terminology config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to serialize terminology config: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to read terminology config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist terminology config to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        ConfigError::MissingKey { key: key.into() }
    }

    pub fn malformed(key: impl Into<String>, expected: impl Into<String>) -> Self {
        ConfigError::Malformed {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

/// A single checker failed (returned an error or panicked).
///
/// Recovered at the per-checker boundary and reported as one ERROR finding.
#[derive(Debug, Error)]
#[error("Checker '{checker}' failed: {reason}")]
pub struct CheckerExecutionError {
    pub checker: String,
    pub category: Category,
    pub reason: String,
}

impl CheckerExecutionError {
    pub fn into_finding(self) -> Finding {
        let message = self.to_string();
        Finding::error(self.category, message).with_suggestion(
            "This check could not complete. Other checks ran normally; report this failure to the rulebook maintainers.",
        )
    }
}

/// Drift between the checker implementations and the registry.
///
/// Produced only by an explicit registry validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("check '{category}.{check}' is implemented but not registered")]
    Unregistered { category: Category, check: String },

    #[error("check '{category}.{check}' is registered but has no implementation")]
    Orphaned { category: Category, check: String },

    #[error("check '{check}' is registered under both '{first}' and '{second}'")]
    CategoryConflict {
        check: String,
        first: Category,
        second: Category,
    },
}
