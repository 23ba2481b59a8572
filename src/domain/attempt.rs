//! Attempt records and raw actor outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::ParamSet;

/// Verbatim result of one actor invocation.
///
/// The payload is opaque to everything except a `Verifier`. By convention its
/// first line is a status line ("File content:", "Error reading file: ...")
/// and anything after it is the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOutcome {
    /// What the executor itself reported
    pub success: bool,
    /// Status line followed by an optional body
    pub payload: String,
    /// Resource or path the operation touched, when known
    pub resource: Option<String>,
}

impl RawOutcome {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
            resource: None,
        }
    }

    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: payload.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// First non-empty line of the payload
    pub fn status_line(&self) -> &str {
        self.payload
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }

    /// Everything after the status line
    pub fn body(&self) -> &str {
        let trimmed = self.payload.trim_start();
        match trimmed.find('\n') {
            Some(idx) => &trimmed[idx + 1..],
            None => "",
        }
    }
}

/// One actor invocation within a loop run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Sequence index, starting at 0
    pub index: u32,
    /// Parameters the actor was called with
    pub params: ParamSet,
    pub outcome: RawOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_and_body() {
        let outcome = RawOutcome::ok("File content:\nline one\nline two");
        assert_eq!(outcome.status_line(), "File content:");
        assert_eq!(outcome.body(), "line one\nline two");
    }

    #[test]
    fn test_status_line_skips_leading_blank_lines() {
        let outcome = RawOutcome::error("\n\n  Failed to open application  \n");
        assert_eq!(outcome.status_line(), "Failed to open application");
    }

    #[test]
    fn test_single_line_has_empty_body() {
        let outcome = RawOutcome::ok("Application opened successfully");
        assert_eq!(outcome.body(), "");
    }

    #[test]
    fn test_with_resource() {
        let outcome = RawOutcome::error("Error reading file: not found").with_resource("C:\\notes.txt");
        assert!(!outcome.success);
        assert_eq!(outcome.resource.as_deref(), Some("C:\\notes.txt"));
    }
}
