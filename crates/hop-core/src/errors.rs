//! Structured error types shared across the HOP crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`HopError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (line numbers, sizes, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Records the offending line of a text record (1-based number and raw contents).
    pub fn with_line(self, number: usize, line: &str) -> Self {
        self.with_context("line", number)
            .with_context("text", line.trim_end())
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the density-of-states engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum HopError {
    /// Malformed or degenerate input (pattern sets, states, temperatures, modes).
    #[error("invalid input: {0}")]
    InvalidInput(ErrorInfo),
    /// A checkpoint record is missing columns or carries non-numeric tokens.
    #[error("malformed checkpoint: {0}")]
    MalformedCheckpoint(ErrorInfo),
    /// A recomputation was requested before any energy was observed.
    #[error("degenerate statistics: {0}")]
    DegenerateStatistics(ErrorInfo),
    /// File system failures at the checkpoint and manifest boundary.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Configuration and manifest (de)serialization failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl HopError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            HopError::InvalidInput(info)
            | HopError::MalformedCheckpoint(info)
            | HopError::DegenerateStatistics(info)
            | HopError::Io(info)
            | HopError::Serde(info) => info,
        }
    }

    /// Stable family label, matching the serialized `family` tag.
    pub fn family(&self) -> &'static str {
        match self {
            HopError::InvalidInput(_) => "InvalidInput",
            HopError::MalformedCheckpoint(_) => "MalformedCheckpoint",
            HopError::DegenerateStatistics(_) => "DegenerateStatistics",
            HopError::Io(_) => "Io",
            HopError::Serde(_) => "Serde",
        }
    }
}
