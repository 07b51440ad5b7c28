//! Error types for metric collection.
//!
//! Every section of the report turns a `CollectError` into an "unavailable"
//! placeholder. None of these errors abort a report cycle.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("cannot read {}: {source}", path.display())]
    MissingSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("{tool} not found")]
    ToolUnavailable { tool: &'static str },

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: &'static str, status: String },

    #[error("unexpected {tool} output: {reason}")]
    ToolOutput { tool: &'static str, reason: String },

    #[error("interface {name} not present in /proc/net/dev")]
    NoSuchInterface { name: String },
}

impl CollectError {
    pub(crate) fn missing(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CollectError::MissingSource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CollectError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors coming from an optional external tool.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            CollectError::ToolUnavailable { .. }
                | CollectError::ToolFailed { .. }
                | CollectError::ToolOutput { .. }
        )
    }
}
