//! Domain types for deskloop
//!
//! - Task: one automation intent (domain, operation, parameters)
//! - Attempt / RawOutcome: one actor invocation and what it reported
//! - Verdict / FailureDetail: classification of an attempt
//! - LoopOutcome / LoopReport: how a loop run ended

pub mod attempt;
pub mod outcome;
pub mod task;
pub mod verdict;

pub use attempt::{Attempt, RawOutcome};
pub use outcome::{DONE_MARKER, LoopOutcome, LoopReport, StopReason};
pub use task::{DomainTag, Operation, ParamSet, Task};
pub use verdict::{FailureCategory, FailureDetail, Verdict};
