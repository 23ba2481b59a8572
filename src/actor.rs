//! Actor: performs one delegated operation per invocation.
//!
//! The actor never judges its own result. Executor failures, including an
//! unreachable executor, come back as error payloads for the verifier.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ParamSet, RawOutcome, Task};
use crate::executor::{OperationExecutor, OperationRequest};

/// Trait for the component that carries out a task's operation
#[async_trait]
pub trait Actor: Send + Sync {
    /// Perform the task's operation once with the given parameters
    async fn act(&self, task: &Task, params: &ParamSet) -> RawOutcome;
}

/// Actor that forwards to an operation executor
pub struct ExecutorActor {
    executor: Arc<dyn OperationExecutor>,
}

impl ExecutorActor {
    pub fn new(executor: Arc<dyn OperationExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Actor for ExecutorActor {
    async fn act(&self, task: &Task, params: &ParamSet) -> RawOutcome {
        let request = OperationRequest::new(task.operation(), params.clone());
        let target = request.target().map(String::from);

        let outcome = match self.executor.execute(&request).await {
            Ok(response) => RawOutcome {
                success: response.success,
                payload: response.detail_or_content,
                resource: response.resource_path,
            },
            Err(e) => {
                log::warn!("{} executor unreachable for {}: {}", self.executor.name(), task.operation(), e);
                RawOutcome::error(format!("Failed to run {}: {}", task.operation(), e))
            }
        };

        match (&outcome.resource, target) {
            (None, Some(target)) => outcome.with_resource(target),
            _ => outcome,
        }
    }
}
