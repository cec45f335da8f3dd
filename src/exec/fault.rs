//! Failure normalization for the worker/coordinator boundary. Native error
//! values are not guaranteed to survive the process boundary, so every failure
//! is flattened into [`SerializableError`] before it crosses.

use serde::{Deserialize, Serialize};
use std::fmt;

const ERROR_KIND: &str = "Error";

/// Failure raised by the resolution or execution layers.
///
/// Sandboxed test code can surface anything: a bare message string, or a
/// structured fault carrying a stack trace and an optional error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    RawMessage(String),
    StructuredFault {
        message: String,
        stack: Option<String>,
        code: Option<String>,
    },
}

impl RunFailure {
    pub fn message(text: impl Into<String>) -> Self {
        RunFailure::RawMessage(text.into())
    }

    pub fn fault(message: impl Into<String>) -> Self {
        RunFailure::StructuredFault {
            message: message.into(),
            stack: None,
            code: None,
        }
    }

    pub fn with_stack(self, stack: impl Into<String>) -> Self {
        match self {
            RunFailure::RawMessage(message) => RunFailure::StructuredFault {
                message,
                stack: Some(stack.into()),
                code: None,
            },
            RunFailure::StructuredFault { message, code, .. } => RunFailure::StructuredFault {
                message,
                stack: Some(stack.into()),
                code,
            },
        }
    }

    pub fn with_code(self, code: impl Into<String>) -> Self {
        match self {
            RunFailure::RawMessage(message) => RunFailure::StructuredFault {
                message,
                stack: None,
                code: Some(code.into()),
            },
            RunFailure::StructuredFault { message, stack, .. } => RunFailure::StructuredFault {
                message,
                stack,
                code: Some(code.into()),
            },
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::RawMessage(message) => f.write_str(message),
            RunFailure::StructuredFault { message, .. } => f.write_str(message),
        }
    }
}

impl std::error::Error for RunFailure {}

impl From<anyhow::Error> for RunFailure {
    fn from(error: anyhow::Error) -> Self {
        RunFailure::StructuredFault {
            message: error.to_string(),
            stack: Some(format!("{error:?}")),
            code: None,
        }
    }
}

/// The fixed-shape error record that crosses the process boundary.
///
/// `type` is always `"Error"`: downstream consumers only need a tagged,
/// transportable record, not the original exception's runtime class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl SerializableError {
    /// Normalizes any failure into the transportable shape. Total: never fails,
    /// whatever the input looks like.
    ///
    /// A raw message string is split into a leading message line and the
    /// remaining stack body (possibly empty). A structured fault keeps its
    /// fields verbatim; `code` is omitted when absent rather than filled with
    /// a placeholder.
    pub fn normalize(failure: RunFailure) -> Self {
        match failure {
            RunFailure::RawMessage(raw) => {
                let (message, stack) = split_message_from_stack(&raw);
                Self {
                    message,
                    stack: Some(stack),
                    kind: ERROR_KIND.to_owned(),
                    code: None,
                }
            }
            RunFailure::StructuredFault {
                message,
                stack,
                code,
            } => Self {
                message,
                stack,
                kind: ERROR_KIND.to_owned(),
                code,
            },
        }
    }
}

impl fmt::Display for SerializableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{code}]", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for SerializableError {}

/// Splits a raw error string into its first line (the message) and the
/// remainder (the stack body). The remainder is empty for single-line input.
pub fn split_message_from_stack(raw: &str) -> (String, String) {
    match raw.split_once('\n') {
        Some((message, stack)) => (message.to_owned(), stack.to_owned()),
        None => (raw.to_owned(), String::new()),
    }
}
