//! Controller: drives one task through the attempt/verify/refine loop.
//!
//! Each iteration:
//! 1. The actor performs the operation with the current parameters
//! 2. The verifier classifies the outcome
//! 3. On success the loop ends; on failure with budget left the refiner
//!    proposes new parameters; at the ceiling the loop is exhausted

pub mod config;
pub mod state;

pub use config::{DomainConfig, DomainOverride, DomainsConfig};
pub use state::{LoopPhase, LoopState, Transition, next_transition};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;

use crate::actor::Actor;
use crate::assistant::TaskRunner;
use crate::domain::{
    Attempt, DomainTag, FailureCategory, FailureDetail, LoopOutcome, LoopReport, ParamSet, StopReason, Task, Verdict,
};
use crate::error::{DeskloopError, Result};
use crate::observer::{LogObserver, LoopObserver};
use crate::refine::{RefineRequest, Refinement, RefinementStrategy};
use crate::verifier::Verifier;

/// Retry-loop controller for a single domain
pub struct Controller<A, V, R>
where
    A: Actor + ?Sized,
    V: Verifier + ?Sized,
    R: RefinementStrategy + ?Sized,
{
    config: DomainConfig,
    actor: Arc<A>,
    verifier: Arc<V>,
    refiner: Arc<R>,
    observer: Arc<dyn LoopObserver>,
}

impl<A, V, R> Controller<A, V, R>
where
    A: Actor + ?Sized,
    V: Verifier + ?Sized,
    R: RefinementStrategy + ?Sized,
{
    pub fn new(config: DomainConfig, actor: Arc<A>, verifier: Arc<V>, refiner: Arc<R>) -> Self {
        Self {
            config,
            actor,
            verifier,
            refiner,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &DomainConfig {
        &self.config
    }

    /// Run a task to a terminal state and report how it went.
    ///
    /// `Err` is returned only for tasks that never enter the loop (invalid
    /// or routed to the wrong domain). Operation failures end up in the
    /// report.
    pub async fn run(&self, task: &Task) -> Result<LoopReport> {
        if task.domain() != self.config.domain {
            return Err(DeskloopError::InvalidTask(format!(
                "{} is a {} operation; this controller handles {}",
                task.operation(),
                task.domain(),
                self.config.domain
            )));
        }
        task.validate()?;

        let mut state = LoopState::new(self.config.max_attempts)?;
        let mut params = task.params().clone();
        let mut history: Vec<ParamSet> = Vec::new();
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut verdicts: Vec<Verdict> = Vec::new();
        let mut explored: Vec<String> = Vec::new();

        self.observer.on_start(task, self.config.max_attempts);

        let outcome = loop {
            let started_at = Utc::now();
            let clock = Instant::now();
            let raw = self.actor.act(task, &params).await;
            let index = state.record_outcome()? - 1;

            let attempt = Attempt {
                index,
                params: params.clone(),
                outcome: raw,
                started_at,
                duration_ms: clock.elapsed().as_millis() as u64,
            };
            self.observer.on_attempt(task, &attempt);

            let verdict = self.verifier.verify(&attempt.outcome).await;
            self.observer.on_verdict(task, &attempt, &verdict);

            let transition = state.on_verdict(&verdict)?;
            history.push(params.clone());
            attempts.push(attempt);
            verdicts.push(verdict.clone());

            match transition {
                Transition::Succeed => {
                    let last = &attempts[attempts.len() - 1].outcome;
                    break LoopOutcome::Succeeded {
                        payload: last.payload.clone(),
                        resource: last.resource.clone(),
                    };
                }
                Transition::Exhaust => {
                    break LoopOutcome::Exhausted {
                        last_failure: failure_of(&verdict),
                        reason: StopReason::BudgetSpent,
                    };
                }
                Transition::Retry => {
                    let failure = failure_of(&verdict);

                    if failure.category == FailureCategory::PermissionDenied && !self.config.retry_permission_denied {
                        state.give_up()?;
                        break LoopOutcome::Exhausted {
                            last_failure: failure,
                            reason: StopReason::GaveUp("permission denied; not retrying".into()),
                        };
                    }

                    let request = RefineRequest {
                        task,
                        failure: &failure,
                        history: &history,
                    };
                    match self.refiner.refine(&request).await {
                        Refinement::Retry {
                            params: next,
                            explored: seen,
                            note,
                        } => {
                            merge_explored(&mut explored, seen);
                            if let Some(reason) = reject_refinement(task, &history, &next) {
                                log::warn!("Task {}: {}", task.id(), reason);
                                state.give_up()?;
                                break LoopOutcome::Exhausted {
                                    last_failure: failure,
                                    reason: StopReason::GaveUp(reason),
                                };
                            }
                            self.observer.on_refined(task, &next, &note);
                            params = next;
                        }
                        Refinement::GiveUp { reason, explored: seen } => {
                            merge_explored(&mut explored, seen);
                            state.give_up()?;
                            break LoopOutcome::Exhausted {
                                last_failure: failure,
                                reason: StopReason::GaveUp(reason),
                            };
                        }
                    }
                }
            }
        };

        let report = LoopReport::new(
            task.clone(),
            self.config.max_attempts,
            attempts,
            verdicts,
            explored,
            outcome,
        );
        self.observer.on_finish(&report);
        Ok(report)
    }
}

#[async_trait]
impl<A, V, R> TaskRunner for Controller<A, V, R>
where
    A: Actor + ?Sized,
    V: Verifier + ?Sized,
    R: RefinementStrategy + ?Sized,
{
    fn domain(&self) -> DomainTag {
        self.config.domain
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    async fn run(&self, task: &Task) -> Result<LoopReport> {
        Controller::run(self, task).await
    }
}

fn failure_of(verdict: &Verdict) -> FailureDetail {
    verdict
        .failure_detail()
        .cloned()
        .unwrap_or_else(|| FailureDetail::new(FailureCategory::Unknown, "verification failed"))
}

/// Reason a proposed parameter set cannot be used, if any
fn reject_refinement(task: &Task, history: &[ParamSet], next: &ParamSet) -> Option<String> {
    if history.contains(next) {
        return Some(format!("refiner proposed an already tried parameter set [{}]", next));
    }
    let operation = task.operation();
    if let Some(missing) = operation.required_params().iter().find(|p| !next.contains(p)) {
        return Some(format!("refiner dropped required parameter '{}'", missing));
    }
    if next.get(operation.target_param()).is_some_and(|t| t.trim().is_empty()) {
        return Some("refiner proposed an empty target".into());
    }
    None
}

fn merge_explored(explored: &mut Vec<String>, seen: Vec<String>) {
    for dir in seen {
        if !explored.contains(&dir) {
            explored.push(dir);
        }
    }
}
