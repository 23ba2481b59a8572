//! Deskloop - bounded verify-and-retry loops for desktop automation
//!
//! Every task runs through an actor, a verifier and a refinement strategy
//! until it succeeds or its domain's attempt ceiling is reached.

pub mod actor;
pub mod assistant;
pub mod controller;
pub mod domain;
pub mod error;
pub mod executor;
pub mod id;
pub mod journal;
pub mod observer;
pub mod rate_limit;
pub mod refine;
pub mod verifier;

pub use error::{DeskloopError, Result};
