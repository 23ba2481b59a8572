//! Front door: validates, rate-limits and routes tasks to per-domain loops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::actor::ExecutorActor;
use crate::controller::{Controller, DomainsConfig};
use crate::domain::{DomainTag, LoopReport, Task};
use crate::error::{DeskloopError, Result};
use crate::executor::OperationExecutor;
use crate::journal::JsonlJournal;
use crate::observer::LoopObserver;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::refine::{HeuristicRefiner, RefinerConfig};
use crate::verifier::MarkerVerifier;

/// Anything that can take a task of one domain to a final report
#[async_trait]
pub trait TaskRunner: Send + Sync {
    fn domain(&self) -> DomainTag;

    fn max_attempts(&self) -> u32;

    async fn run(&self, task: &Task) -> Result<LoopReport>;
}

pub struct Assistant {
    runners: HashMap<DomainTag, Arc<dyn TaskRunner>>,
    limiter: Mutex<RateLimiter>,
    journal: Option<JsonlJournal>,
}

impl Assistant {
    pub fn new(rate_limit: RateLimitConfig) -> Self {
        Self {
            runners: HashMap::new(),
            limiter: Mutex::new(RateLimiter::new(rate_limit)),
            journal: None,
        }
    }

    /// Assistant with the three built-in domains wired to one executor
    pub fn standard(
        executor: Arc<dyn OperationExecutor>,
        domains: &DomainsConfig,
        refiner: RefinerConfig,
        rate_limit: RateLimitConfig,
        observer: Arc<dyn LoopObserver>,
    ) -> Result<Self> {
        let actor = Arc::new(ExecutorActor::new(executor.clone()));
        let verifier = Arc::new(MarkerVerifier::new());
        let refiner = Arc::new(HeuristicRefiner::new(refiner).with_executor(executor));

        let mut assistant = Self::new(rate_limit);
        for config in domains.all()? {
            let controller = Controller::new(config, actor.clone(), verifier.clone(), refiner.clone())
                .with_observer(observer.clone());
            assistant = assistant.with_runner(Arc::new(controller));
        }
        Ok(assistant)
    }

    /// Register (or replace) the runner for its domain
    pub fn with_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runners.insert(runner.domain(), runner);
        self
    }

    pub fn with_journal(mut self, journal: JsonlJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn journal(&self) -> Option<&JsonlJournal> {
        self.journal.as_ref()
    }

    /// Registered domains and their ceilings, in a stable order
    pub fn domains(&self) -> Vec<(DomainTag, u32)> {
        let mut domains: Vec<(DomainTag, u32)> = self
            .runners
            .values()
            .map(|r| (r.domain(), r.max_attempts()))
            .collect();
        domains.sort();
        domains
    }

    /// Run one task through its domain's loop.
    ///
    /// Invalid input, rate-limit refusals and unroutable domains are returned
    /// as errors before any attempt is made.
    pub async fn submit(&self, task: &Task) -> Result<LoopReport> {
        task.validate()?;
        self.admit()?;

        let runner = self
            .runners
            .get(&task.domain())
            .ok_or_else(|| DeskloopError::UnknownDomain(task.domain().to_string()))?;

        let report = runner.run(task).await?;
        self.settle(&report)?;

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(&report) {
                log::warn!("Failed to journal task {}: {}", task.id(), e);
            }
        }
        Ok(report)
    }

    fn limiter(&self) -> Result<MutexGuard<'_, RateLimiter>> {
        self.limiter
            .lock()
            .map_err(|e| DeskloopError::InvalidState(format!("rate limiter poisoned: {}", e)))
    }

    /// Check the limiter and count the request
    fn admit(&self) -> Result<()> {
        let mut limiter = self.limiter()?;
        if !limiter.can_make_request() {
            let wait = limiter.wait_time();
            log::warn!("Rejecting task: rate limit reached, retry in {:.1}s", wait.as_secs_f64());
            return Err(DeskloopError::RateLimited(wait));
        }
        limiter.record_request();
        Ok(())
    }

    /// Back off when the executor's upstream throttled the last attempt
    fn settle(&self, report: &LoopReport) -> Result<()> {
        let mut limiter = self.limiter()?;
        if upstream_rate_limited(report) {
            log::warn!("Task {} was throttled upstream, backing off", report.task.id());
            limiter.record_rate_limit(Duration::ZERO);
        } else {
            limiter.record_success();
        }
        Ok(())
    }
}

/// Markers of an upstream "too many requests" reply in a status line
const THROTTLE_MARKERS: &[&str] = &["429", "rate limit", "too many requests"];

/// True when the final attempt failed because the upstream was throttling
pub fn upstream_rate_limited(report: &LoopReport) -> bool {
    report
        .attempts
        .last()
        .filter(|attempt| !attempt.outcome.success)
        .is_some_and(|attempt| {
            // The touched path is not part of the reply.
            let mut status = attempt.outcome.status_line().to_string();
            if let Some(resource) = &attempt.outcome.resource {
                status = status.replace(resource.as_str(), "");
            }
            let status = status.to_lowercase();
            THROTTLE_MARKERS.iter().any(|m| status.contains(m))
        })
}
