//! Executor that answers from canned responses.
//!
//! Used for dry runs and tests. Responses are keyed by operation and target
//! value; anything unscripted gets the fallback response.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{OperationExecutor, OperationRequest, OperationResponse};
use crate::domain::Operation;
use crate::error::{DeskloopError, Result};

pub struct ScriptedExecutor {
    responses: HashMap<(Operation, String), OperationResponse>,
    fallback: OperationResponse,
    requests: Mutex<Vec<OperationRequest>>,
}

impl ScriptedExecutor {
    /// Create an executor that answers everything with `fallback`
    pub fn new(fallback: OperationResponse) -> Self {
        Self {
            responses: HashMap::new(),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Executor that reports success for every operation
    pub fn always_ok() -> Self {
        Self::new(OperationResponse::ok("Operation completed successfully (dry run)"))
    }

    /// Script the response for one operation on one target
    pub fn respond(mut self, operation: Operation, target: impl Into<String>, response: OperationResponse) -> Self {
        self.responses.insert((operation, target.into()), response);
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl OperationExecutor for ScriptedExecutor {
    async fn execute(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.requests
            .lock()
            .map_err(|e| DeskloopError::Executor(e.to_string()))?
            .push(request.clone());

        let target = request.target().unwrap_or("").to_string();
        let response = self
            .responses
            .get(&(request.operation, target.clone()))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        Ok(match response.resource_path {
            Some(_) => response,
            None => response.with_resource(target),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamSet;

    fn open(name: &str) -> OperationRequest {
        OperationRequest::new(Operation::OpenApplication, ParamSet::new().with("name", name))
    }

    #[tokio::test]
    async fn test_scripted_response() {
        let exec = ScriptedExecutor::new(OperationResponse::error("Failed to open application")).respond(
            Operation::OpenApplication,
            "calculator",
            OperationResponse::ok("Application opened successfully"),
        );

        let hit = exec.execute(&open("calculator")).await.unwrap();
        assert!(hit.success);
        assert_eq!(hit.resource_path.as_deref(), Some("calculator"));

        let miss = exec.execute(&open("calcultor")).await.unwrap();
        assert!(!miss.success);
        assert_eq!(miss.detail_or_content, "Failed to open application");
    }

    #[tokio::test]
    async fn test_records_requests() {
        let exec = ScriptedExecutor::always_ok();
        exec.execute(&open("a")).await.unwrap();
        exec.execute(&open("b")).await.unwrap();

        assert_eq!(exec.request_count(), 2);
        let targets: Vec<String> = exec
            .requests()
            .iter()
            .filter_map(|r| r.target().map(String::from))
            .collect();
        assert_eq!(targets, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_keeps_scripted_resource() {
        let exec = ScriptedExecutor::new(OperationResponse::error("nope").with_resource("C:\\Windows\\calc.exe"));
        let resp = exec.execute(&open("calc")).await.unwrap();
        assert_eq!(resp.resource_path.as_deref(), Some("C:\\Windows\\calc.exe"));
    }
}
