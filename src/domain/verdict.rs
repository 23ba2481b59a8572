//! Verdicts and failure details.
//!
//! The failure taxonomy is data, not error types: a failed attempt is a normal
//! input to the controller's next transition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Resource or application does not exist at the given identifier
    NotFound,
    /// The resource exists but the operation was refused
    PermissionDenied,
    /// Bad path or name format
    MalformedInput,
    /// Anything not otherwise classified
    Unknown,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::NotFound => "not_found",
            FailureCategory::PermissionDenied => "permission_denied",
            FailureCategory::MalformedInput => "malformed_input",
            FailureCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What went wrong in a failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub category: FailureCategory,
    /// Human-readable description of the error condition
    pub message: String,
    /// Resource or path involved, if known
    pub resource: Option<String>,
}

impl FailureDetail {
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{}: {} [{}]", self.category, self.message, resource),
            None => write!(f, "{}: {}", self.category, self.message),
        }
    }
}

/// Classification of one attempt. Strictly binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure(FailureDetail),
}

impl Verdict {
    pub fn failure(detail: FailureDetail) -> Self {
        Verdict::Failure(detail)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    pub fn failure_detail(&self) -> Option<&FailureDetail> {
        match self {
            Verdict::Success => None,
            Verdict::Failure(detail) => Some(detail),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "SUCCESS"),
            Verdict::Failure(detail) => write!(f, "FAILURE: {}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(FailureCategory::NotFound.to_string(), "not_found");
        assert_eq!(FailureCategory::PermissionDenied.to_string(), "permission_denied");
        assert_eq!(FailureCategory::MalformedInput.to_string(), "malformed_input");
        assert_eq!(FailureCategory::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_failure_detail_display() {
        let detail = FailureDetail::new(FailureCategory::NotFound, "application not found").with_resource("calcultor");
        assert_eq!(detail.to_string(), "not_found: application not found [calcultor]");
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Success.to_string(), "SUCCESS");
        let v = Verdict::failure(FailureDetail::new(FailureCategory::Unknown, "boom"));
        assert_eq!(v.to_string(), "FAILURE: unknown: boom");
    }

    #[test]
    fn test_verdict_accessors() {
        assert!(Verdict::Success.is_success());
        assert!(Verdict::Success.failure_detail().is_none());

        let v = Verdict::failure(FailureDetail::new(FailureCategory::MalformedInput, "bad drive"));
        assert!(!v.is_success());
        assert_eq!(v.failure_detail().unwrap().category, FailureCategory::MalformedInput);
    }

    #[test]
    fn test_verdict_serialization_shape() {
        let v = Verdict::failure(FailureDetail::new(FailureCategory::NotFound, "missing"));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["verdict"], "failure");
        assert_eq!(json["category"], "not_found");
    }
}
