use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ToolchainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }

    /// Classifies a toolchain failure, carrying its reason code and hint.
    #[must_use]
    pub fn from_toolchain_error(err: &ToolchainError) -> Self {
        let root = err.root();
        let mut details = json!({
            "reason": root.reason(),
        });
        if let Some(hint) = err.hint().or_else(|| root.hint()) {
            details["hint"] = json!(hint);
        }
        if let ToolchainError::SpecMismatch { metadata, .. } = root {
            details["found"] = json!(metadata.display_name());
        }
        if err.is_user_error() {
            Self::user_error(err.to_string(), details)
        } else {
            Self::failure(err.to_string(), details)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}
