//! Status reported by the remote service for an asynchronous operation.

use serde::{Deserialize, Serialize};

/// The only documented success code.
pub const SUCCESS_CODE: i32 = 200;

/// Processing status of a tracked operation.
///
/// Whether a status is terminal is not a property of the status alone: the
/// caller's classifier decides, since the code vocabulary differs between
/// operation types. After tracking, [`Tracked::terminal_status`] yields the
/// status only when it was classified terminal.
///
/// [`Tracked::terminal_status`]: crate::Tracked::terminal_status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    /// Status code, e.g. 100 (in progress), 200 (success), 440 (duplicate).
    pub code: i32,
    /// Human-readable description from the service.
    pub description: String,
    /// Additional detail lines, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl OperationStatus {
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Shorthand for a success status.
    pub fn success() -> Self {
        Self::new(SUCCESS_CODE, "Success")
    }

    /// Shorthand for an in-progress status.
    pub fn in_progress() -> Self {
        Self::new(100, "Processing")
    }

    /// Add a detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// True when the code is the success code.
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// The description followed by any detail lines.
    pub fn message(&self) -> String {
        if self.details.is_empty() {
            self.description.clone()
        } else {
            format!("{} ({})", self.description, self.details.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        assert!(OperationStatus::success().is_success());
        assert!(!OperationStatus::in_progress().is_success());
        assert!(!OperationStatus::new(500, "error").is_success());
    }

    #[test]
    fn test_message_joins_details() {
        let status = OperationStatus::new(450, "Invalid document")
            .with_detail("schema violation")
            .with_detail("line 12");
        assert_eq!(status.message(), "Invalid document (schema violation; line 12)");
        assert_eq!(OperationStatus::success().message(), "Success");
    }

    #[test]
    fn test_details_default_when_absent() {
        let status: OperationStatus =
            serde_json::from_str(r#"{"code":100,"description":"Processing"}"#).unwrap();
        assert_eq!(status, OperationStatus::in_progress());
    }
}
