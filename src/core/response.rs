use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// Uniform result of a mutating engine operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    pub needs_restart: bool,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            needs_restart: false,
        }
    }

    pub fn with_restart(mut self, needs_restart: bool) -> Self {
        self.needs_restart = needs_restart;
        self
    }

    /// Fold an operation result into a response, using `message` on success
    pub fn from_result<T>(result: Result<T>, message: impl FnOnce(T) -> String) -> Self {
        match result {
            Ok(value) => Self::ok(message(value)),
            Err(e) => {
                log::warn!("{}", e);
                Self {
                    success: false,
                    message: e.to_string(),
                    error: Some(e.kind()),
                    needs_restart: false,
                }
            }
        }
    }
}
