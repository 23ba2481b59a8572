//! Refinement strategies: choosing what to try after a failed attempt.
//!
//! A strategy sees the failure and every parameter set tried so far and
//! returns either a new parameter set or a give-up signal. It must never
//! return a set that was already tried; the controller checks this anyway.

pub mod heuristic;
pub mod variants;

pub use heuristic::{HeuristicRefiner, RefinerConfig};

use async_trait::async_trait;

use crate::domain::{FailureDetail, ParamSet, Task};

/// Input to a refinement decision
#[derive(Debug, Clone, Copy)]
pub struct RefineRequest<'a> {
    pub task: &'a Task,
    /// Detail of the failure that triggered refinement
    pub failure: &'a FailureDetail,
    /// Parameter sets already tried, oldest first; the last one just failed
    pub history: &'a [ParamSet],
}

impl<'a> RefineRequest<'a> {
    /// Parameters of the attempt that just failed
    pub fn current(&self) -> &'a ParamSet {
        self.history.last().unwrap_or(self.task.params())
    }

    /// True if this exact parameter set was tried before
    pub fn was_tried(&self, params: &ParamSet) -> bool {
        self.history.contains(params)
    }

    /// The current parameters with the target replaced, if not tried before
    pub fn untried_with_target(&self, value: &str) -> Option<ParamSet> {
        let key = self.task.operation().target_param();
        let candidate = self.current().clone().with(key, value);
        (!self.was_tried(&candidate)).then_some(candidate)
    }
}

/// Result of a refinement decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// Try again with these parameters
    Retry {
        params: ParamSet,
        /// Sub-resources visited while deciding (e.g. directories listed)
        explored: Vec<String>,
        /// Short human-readable reason for the change
        note: String,
    },
    /// Nothing sensible left to try
    GiveUp { reason: String, explored: Vec<String> },
}

impl Refinement {
    pub fn retry(params: ParamSet, note: impl Into<String>) -> Self {
        Refinement::Retry {
            params,
            explored: Vec::new(),
            note: note.into(),
        }
    }

    pub fn give_up(reason: impl Into<String>) -> Self {
        Refinement::GiveUp {
            reason: reason.into(),
            explored: Vec::new(),
        }
    }
}

/// Trait for retry strategies
#[async_trait]
pub trait RefinementStrategy: Send + Sync {
    async fn refine(&self, request: &RefineRequest<'_>) -> Refinement;
}

/// Strategy backed by a plain function, for injecting custom policies
pub struct FnRefiner<F> {
    f: F,
}

impl<F> FnRefiner<F>
where
    F: Fn(&RefineRequest<'_>) -> Refinement + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> RefinementStrategy for FnRefiner<F>
where
    F: Fn(&RefineRequest<'_>) -> Refinement + Send + Sync,
{
    async fn refine(&self, request: &RefineRequest<'_>) -> Refinement {
        (self.f)(request)
    }
}

/// Strategy that never retries
pub struct NoRetry;

#[async_trait]
impl RefinementStrategy for NoRetry {
    async fn refine(&self, request: &RefineRequest<'_>) -> Refinement {
        Refinement::give_up(format!("retries disabled ({})", request.failure.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureCategory, Operation};

    fn task() -> Task {
        Task::new("open notepad", Operation::OpenApplication, ParamSet::new().with("name", "notepd")).unwrap()
    }

    #[test]
    fn test_request_current_and_untried() {
        let task = task();
        let failure = FailureDetail::new(FailureCategory::NotFound, "not found");
        let history = vec![task.params().clone()];
        let req = RefineRequest {
            task: &task,
            failure: &failure,
            history: &history,
        };

        assert_eq!(req.current().get("name"), Some("notepd"));
        assert!(req.untried_with_target("notepd").is_none());
        assert_eq!(req.untried_with_target("notepad").unwrap().get("name"), Some("notepad"));
    }

    #[test]
    fn test_request_current_falls_back_to_task() {
        let task = task();
        let failure = FailureDetail::new(FailureCategory::Unknown, "?");
        let req = RefineRequest {
            task: &task,
            failure: &failure,
            history: &[],
        };
        assert_eq!(req.current(), task.params());
    }

    #[tokio::test]
    async fn test_fn_refiner() {
        let refiner = FnRefiner::new(|req: &RefineRequest<'_>| match req.untried_with_target("notepad") {
            Some(params) => Refinement::retry(params, "fixed spelling"),
            None => Refinement::give_up("out of ideas"),
        });
        let task = task();
        let failure = FailureDetail::new(FailureCategory::NotFound, "not found");
        let history = vec![task.params().clone()];
        let req = RefineRequest {
            task: &task,
            failure: &failure,
            history: &history,
        };

        match refiner.refine(&req).await {
            Refinement::Retry { params, note, .. } => {
                assert_eq!(params.get("name"), Some("notepad"));
                assert_eq!(note, "fixed spelling");
            }
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_retry() {
        let task = task();
        let failure = FailureDetail::new(FailureCategory::NotFound, "not found");
        let req = RefineRequest {
            task: &task,
            failure: &failure,
            history: &[],
        };
        assert!(matches!(NoRetry.refine(&req).await, Refinement::GiveUp { .. }));
    }
}
