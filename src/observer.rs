//! Hooks for watching a loop run.

use crate::domain::{Attempt, LoopReport, ParamSet, Task, Verdict};

/// Receives loop lifecycle events. Every hook defaults to a no-op.
pub trait LoopObserver: Send + Sync {
    fn on_start(&self, _task: &Task, _max_attempts: u32) {}

    fn on_attempt(&self, _task: &Task, _attempt: &Attempt) {}

    fn on_verdict(&self, _task: &Task, _attempt: &Attempt, _verdict: &Verdict) {}

    fn on_refined(&self, _task: &Task, _next: &ParamSet, _note: &str) {}

    fn on_finish(&self, _report: &LoopReport) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl LoopObserver for NoopObserver {}

/// Observer that writes through the `log` facade
pub struct LogObserver;

impl LoopObserver for LogObserver {
    fn on_start(&self, task: &Task, max_attempts: u32) {
        log::info!(
            "Task {} started: {} [{}] (max {} attempts)",
            task.id(),
            task.operation(),
            task.params(),
            max_attempts
        );
    }

    fn on_attempt(&self, task: &Task, attempt: &Attempt) {
        log::debug!(
            "Task {} attempt {} [{}] took {}ms: {}",
            task.id(),
            attempt.index + 1,
            attempt.params,
            attempt.duration_ms,
            attempt.outcome.status_line()
        );
    }

    fn on_verdict(&self, task: &Task, attempt: &Attempt, verdict: &Verdict) {
        match verdict {
            Verdict::Success => log::debug!("Task {} attempt {} verified", task.id(), attempt.index + 1),
            Verdict::Failure(detail) => {
                log::info!("Task {} attempt {} failed: {}", task.id(), attempt.index + 1, detail)
            }
        }
    }

    fn on_refined(&self, task: &Task, next: &ParamSet, note: &str) {
        log::info!("Task {} retrying with [{}]: {}", task.id(), next, note);
    }

    fn on_finish(&self, report: &LoopReport) {
        if report.succeeded() {
            log::info!(
                "Task {} succeeded after {} attempt(s)",
                report.task.id(),
                report.attempt_count()
            );
        } else {
            log::warn!(
                "Task {} exhausted after {} attempt(s)",
                report.task.id(),
                report.attempt_count()
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Observer that records event names, for asserting call order
    #[derive(Default)]
    pub struct RecordingObserver {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl LoopObserver for RecordingObserver {
        fn on_start(&self, _task: &Task, max_attempts: u32) {
            self.push(format!("start:{}", max_attempts));
        }

        fn on_attempt(&self, _task: &Task, attempt: &Attempt) {
            self.push(format!("attempt:{}", attempt.index));
        }

        fn on_verdict(&self, _task: &Task, _attempt: &Attempt, verdict: &Verdict) {
            self.push(format!("verdict:{}", verdict.is_success()));
        }

        fn on_refined(&self, _task: &Task, _next: &ParamSet, _note: &str) {
            self.push("refined".into());
        }

        fn on_finish(&self, report: &LoopReport) {
            self.push(format!("finish:{}", report.succeeded()));
        }
    }
}
