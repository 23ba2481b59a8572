//! Verifier: turns a raw outcome into a binary verdict.
//!
//! Only the head of the status line (text before the first `:`) decides
//! success, so paths and file content cannot flip a verdict. The full status
//! line and the first body line feed the failure category.

use async_trait::async_trait;

use crate::domain::{FailureCategory, FailureDetail, RawOutcome, Verdict};

/// Trait for classifying actor outcomes
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Classify the most recent outcome
    async fn verify(&self, outcome: &RawOutcome) -> Verdict;

    /// Get a description of what this verifier checks
    fn description(&self) -> &str {
        "verifier"
    }
}

const SUCCESS_MARKERS: &[&str] = &["successfully", "file content", "directory listing"];

const ERROR_MARKERS: &[&str] = &[
    "error",
    "fail",
    "exception",
    "unsuccessful",
    "not found",
    "denied",
    "invalid",
    "cannot",
    "unable",
    "missing",
];

const NOT_FOUND_HINTS: &[&str] = &[
    "not found",
    "no such file",
    "does not exist",
    "doesn't exist",
    "cannot find",
    "could not find",
    "not recognized",
];

const PERMISSION_HINTS: &[&str] = &[
    "access denied",
    "access is denied",
    "permission denied",
    "not permitted",
    "unauthorized",
    "operation not allowed",
];

const MALFORMED_HINTS: &[&str] = &[
    "invalid path",
    "invalid drive",
    "invalid application name",
    "illegal characters",
    "malformed",
    "syntax is incorrect",
    "reserved character",
    "format is not supported",
    "missing file_path",
    "missing directory_path",
];

/// Verifier driven by keyword markers
pub struct MarkerVerifier {
    success_markers: Vec<String>,
    error_markers: Vec<String>,
}

impl MarkerVerifier {
    pub fn new() -> Self {
        Self {
            success_markers: SUCCESS_MARKERS.iter().map(|s| s.to_string()).collect(),
            error_markers: ERROR_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add a positive-completion marker (matched case-insensitively)
    pub fn with_success_marker(mut self, marker: impl Into<String>) -> Self {
        self.success_markers.push(marker.into().to_lowercase());
        self
    }

    /// Add an error indicator (matched case-insensitively)
    pub fn with_error_marker(mut self, marker: impl Into<String>) -> Self {
        self.error_markers.push(marker.into().to_lowercase());
        self
    }

    /// Synchronous classification; `verify` delegates here
    pub fn classify(&self, outcome: &RawOutcome) -> Verdict {
        let status = outcome.status_line();
        let head = status_head(status).to_lowercase();

        let positive = self.success_markers.iter().any(|m| head.contains(m.as_str()));
        let negative = self.error_markers.iter().any(|m| head.contains(m.as_str()));

        if outcome.success && positive && !negative {
            return Verdict::Success;
        }

        let mut message = if status.is_empty() {
            "operation returned no output".to_string()
        } else {
            status.to_string()
        };
        if !outcome.success {
            if let Some(first) = outcome.body().lines().map(str::trim).find(|l| !l.is_empty()) {
                message.push_str(" / ");
                message.push_str(first);
            }
        }
        if outcome.success && !positive {
            message = format!("no completion marker in response: {}", message);
        }

        let mut detail = FailureDetail::new(categorize(&message), message);
        if let Some(resource) = &outcome.resource {
            detail = detail.with_resource(resource.clone());
        }
        Verdict::failure(detail)
    }
}

impl Default for MarkerVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Verifier for MarkerVerifier {
    async fn verify(&self, outcome: &RawOutcome) -> Verdict {
        self.classify(outcome)
    }

    fn description(&self) -> &str {
        "status-line marker verifier"
    }
}

/// Assign a failure category from error text
pub fn categorize(text: &str) -> FailureCategory {
    let lower = text.to_lowercase();
    let has = |hints: &[&str]| hints.iter().any(|h| lower.contains(h));

    // Order matters: "invalid path ... not found" is a format problem first.
    if has(MALFORMED_HINTS) {
        FailureCategory::MalformedInput
    } else if has(PERMISSION_HINTS) {
        FailureCategory::PermissionDenied
    } else if has(NOT_FOUND_HINTS) {
        FailureCategory::NotFound
    } else {
        FailureCategory::Unknown
    }
}

fn status_head(status: &str) -> &str {
    status.split(':').next().unwrap_or(status)
}
