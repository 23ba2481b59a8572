//! Operation executors
//!
//! An executor performs one named operation and reports what happened. It has
//! no retry logic of its own. `LocalExecutor` runs operations on this host;
//! `ScriptedExecutor` answers from canned responses.

pub mod local;
pub mod scripted;

pub use local::{LocalExecutor, LocalExecutorConfig, check_path_format};
pub use scripted::ScriptedExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Operation, ParamSet};
use crate::error::Result;

/// Status line prefix of a successful directory listing
pub const LISTING_HEADER: &str = "Directory listing:";

/// A named-operation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: Operation,
    pub parameters: ParamSet,
}

impl OperationRequest {
    pub fn new(operation: Operation, parameters: ParamSet) -> Self {
        Self { operation, parameters }
    }

    /// Value of the operation's target parameter
    pub fn target(&self) -> Option<&str> {
        self.parameters.get(self.operation.target_param())
    }
}

/// What an executor reports back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub success: bool,
    pub detail_or_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
}

impl OperationResponse {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail_or_content: detail.into(),
            resource_path: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail_or_content: detail.into(),
            resource_path: None,
        }
    }

    pub fn with_resource(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }
}

/// Trait for anything that can carry out a named operation
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Perform exactly one operation.
    ///
    /// `Err` means the executor itself could not be reached; failures of the
    /// operation are reported in the response.
    async fn execute(&self, request: &OperationRequest) -> Result<OperationResponse>;

    /// Short name for logs
    fn name(&self) -> &str {
        "executor"
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Render a listing body: one entry per line, directories with a trailing `/`
pub fn format_listing(path: &str, entries: &[ListingEntry]) -> String {
    let mut out = format!("{} {}", LISTING_HEADER, path);
    for entry in entries {
        out.push('\n');
        out.push_str(&entry.name);
        if entry.is_dir {
            out.push('/');
        }
    }
    out
}

/// Parse a listing produced by `format_listing`; `None` if it is not one
pub fn parse_listing(text: &str) -> Option<Vec<ListingEntry>> {
    let mut lines = text.lines();
    let header = lines.next()?;
    if !header.trim_start().starts_with(LISTING_HEADER) {
        return None;
    }
    Some(
        lines
            .map(str::trim_end)
            .filter(|l| !l.is_empty() && *l != "(empty directory)")
            .map(|l| match l.strip_suffix('/') {
                Some(name) => ListingEntry {
                    name: name.to_string(),
                    is_dir: true,
                },
                None => ListingEntry {
                    name: l.to_string(),
                    is_dir: false,
                },
            })
            .collect(),
    )
}
