//! Loop execution outcome and the final report handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attempt::Attempt;
use super::task::{ParamSet, Task};
use super::verdict::{FailureDetail, Verdict};

/// Sentinel closing a chunked report
pub const DONE_MARKER: &str = "[DONE]";

/// Why a loop ended without success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Every attempt in the budget was used
    BudgetSpent,
    /// The loop stopped before the ceiling (non-retryable failure or no new
    /// parameters left to try)
    GaveUp(String),
}

/// Terminal result of a loop run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoopOutcome {
    Succeeded {
        /// Payload of the successful attempt
        payload: String,
        resource: Option<String>,
    },
    Exhausted {
        last_failure: FailureDetail,
        reason: StopReason,
    },
}

impl LoopOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoopOutcome::Succeeded { .. })
    }
}

/// Everything a finished loop run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    pub task: Task,
    pub max_attempts: u32,
    pub attempts: Vec<Attempt>,
    /// One verdict per attempt, same order
    pub verdicts: Vec<Verdict>,
    /// Sub-resources visited while refining (e.g. directories searched)
    pub explored: Vec<String>,
    pub outcome: LoopOutcome,
    pub narrative: String,
    pub finished_at: DateTime<Utc>,
}

impl LoopReport {
    /// Assemble a report and write its narrative
    pub fn new(
        task: Task,
        max_attempts: u32,
        attempts: Vec<Attempt>,
        verdicts: Vec<Verdict>,
        explored: Vec<String>,
        outcome: LoopOutcome,
    ) -> Self {
        let mut report = Self {
            task,
            max_attempts,
            attempts,
            verdicts,
            explored,
            outcome,
            narrative: String::new(),
            finished_at: Utc::now(),
        };
        report.narrative = report.narrate();
        report
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Parameter sets in the order they were tried
    pub fn tried_params(&self) -> Vec<&ParamSet> {
        self.attempts.iter().map(|a| &a.params).collect()
    }

    /// Split the narrative into presentation chunks closed by `[DONE]`
    pub fn chunks(&self) -> Vec<String> {
        let mut chunks: Vec<String> = self
            .narrative
            .split("\n\n")
            .filter(|c| !c.trim().is_empty())
            .map(|c| format!("{}\n\n", c))
            .collect();
        chunks.push(format!("{}\n\n", DONE_MARKER));
        chunks
    }

    fn narrate(&self) -> String {
        let mut out = String::new();
        let n = self.attempts.len();
        let plural = if n == 1 { "attempt" } else { "attempts" };

        match &self.outcome {
            LoopOutcome::Succeeded { payload, resource } => {
                out.push_str(&format!(
                    "Done: {} ({}) succeeded after {} {}.",
                    self.task.description(),
                    self.task.operation(),
                    n,
                    plural
                ));
                if let Some(resource) = resource {
                    out.push_str(&format!(" Resource: {}.", resource));
                }
                if n > 1 {
                    let first = self.attempts.first().map(|a| a.params.to_string()).unwrap_or_default();
                    let last = self.attempts.last().map(|a| a.params.to_string()).unwrap_or_default();
                    out.push_str(&format!(" The request was adjusted from [{}] to [{}].", first, last));
                }
                if !self.explored.is_empty() {
                    out.push_str("\n\nSearched:\n");
                    out.push_str(
                        &self
                            .explored
                            .iter()
                            .map(|d| format!("- {}", d))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
                out.push_str("\n\n");
                out.push_str(payload.trim_end());
            }
            LoopOutcome::Exhausted { last_failure, reason } => {
                let why = match reason {
                    StopReason::BudgetSpent => format!("all {} allowed attempts failed", self.max_attempts),
                    StopReason::GaveUp(why) => format!("stopped after {} {}: {}", n, plural, why),
                };
                out.push_str(&format!(
                    "Could not complete: {} ({}); {}.",
                    self.task.description(),
                    self.task.operation(),
                    why
                ));
                out.push_str(&format!("\n\nLast failure: {}", last_failure));
                out.push_str("\n\nTried:\n");
                out.push_str(
                    &self
                        .attempts
                        .iter()
                        .map(|a| format!("{}. {}", a.index + 1, a.params))
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
                if !self.explored.is_empty() {
                    out.push_str("\n\nSearched:\n");
                    out.push_str(
                        &self
                            .explored
                            .iter()
                            .map(|d| format!("- {}", d))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
            }
        }
        out
    }
}
