//! Error taxonomy for actions. Every variant is converted into a failed [`crate::dispatch::ActionResult`]
//! at the dispatcher boundary; none of them escape to the caller as a fault.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Missing or malformed parameter. Raised before any side effect.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Backing file could not be read, parsed, or written.
    #[error("{0}")]
    Storage(String),
    /// No command mapping for this platform/action pair.
    #[error("{0}")]
    UnsupportedPlatform(String),
    /// External command failed to launch or exited non-zero.
    #[error("{0}")]
    Execution(String),
}

/// Machine-readable kind carried in the `error` field of a failed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFoundError,
    StorageError,
    UnsupportedPlatformError,
    ExecutionError,
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Validation(_) => ErrorKind::ValidationError,
            ActionError::NotFound(_) => ErrorKind::NotFoundError,
            ActionError::Storage(_) => ErrorKind::StorageError,
            ActionError::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatformError,
            ActionError::Execution(_) => ErrorKind::ExecutionError,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ActionError::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        let kind = ActionError::UnsupportedPlatform("x".into()).kind();
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::json!("unsupported_platform_error")
        );
    }

    #[test]
    fn display_is_the_message() {
        let e = ActionError::NotFound("contact 'a' not found".into());
        assert_eq!(e.to_string(), "contact 'a' not found");
    }
}
