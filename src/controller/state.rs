//! Retry-loop state machine.
//!
//! `LoopState` owns the phase and the attempt count; every transition goes
//! through a method that checks the current phase, so the controller cannot
//! skip verification or attempt past the ceiling.

use serde::{Deserialize, Serialize};

use crate::domain::Verdict;
use crate::error::{DeskloopError, Result};

/// Phase of a loop run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Attempting,
    Verifying,
    Succeeded,
    Exhausted,
}

impl LoopPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopPhase::Succeeded | LoopPhase::Exhausted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopPhase::Attempting => "attempting",
            LoopPhase::Verifying => "verifying",
            LoopPhase::Succeeded => "succeeded",
            LoopPhase::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the controller must do after a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Refine the parameters and attempt again
    Retry,
    /// The last attempt succeeded
    Succeed,
    /// The ceiling is reached
    Exhaust,
}

#[derive(Debug, Clone)]
pub struct LoopState {
    phase: LoopPhase,
    attempts: u32,
    max_attempts: u32,
}

impl LoopState {
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(DeskloopError::Config("max attempts must be at least 1".into()));
        }
        Ok(Self {
            phase: LoopPhase::Attempting,
            attempts: 0,
            max_attempts,
        })
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Completed attempts so far
    pub fn attempt_count(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.attempts
    }

    /// The actor returned an outcome: Attempting -> Verifying
    pub fn record_outcome(&mut self) -> Result<u32> {
        self.require_phase(LoopPhase::Attempting, "record an outcome")?;
        self.attempts += 1;
        self.phase = LoopPhase::Verifying;
        Ok(self.attempts)
    }

    /// Apply a verdict: Verifying -> Succeeded | Attempting | Exhausted
    pub fn on_verdict(&mut self, verdict: &Verdict) -> Result<Transition> {
        self.require_phase(LoopPhase::Verifying, "apply a verdict")?;
        let transition = next_transition(verdict, self.attempts, self.max_attempts);
        self.phase = match transition {
            Transition::Succeed => LoopPhase::Succeeded,
            Transition::Retry => LoopPhase::Attempting,
            Transition::Exhaust => LoopPhase::Exhausted,
        };
        Ok(transition)
    }

    /// Stop before the ceiling because nothing new can be tried
    pub fn give_up(&mut self) -> Result<()> {
        self.require_phase(LoopPhase::Attempting, "give up")?;
        self.phase = LoopPhase::Exhausted;
        Ok(())
    }

    fn require_phase(&self, phase: LoopPhase, action: &str) -> Result<()> {
        if self.phase != phase {
            return Err(DeskloopError::InvalidState(format!(
                "cannot {} while {} (expected {})",
                action, self.phase, phase
            )));
        }
        Ok(())
    }
}

/// Pure transition function
pub fn next_transition(verdict: &Verdict, attempts: u32, max_attempts: u32) -> Transition {
    match verdict {
        Verdict::Success => Transition::Succeed,
        Verdict::Failure(_) if attempts < max_attempts => Transition::Retry,
        Verdict::Failure(_) => Transition::Exhaust,
    }
}
