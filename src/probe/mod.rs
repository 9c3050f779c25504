//! Probe module.
//!
//! This module provides the HTTP probing engine:
//! - Outcome classification of failed requests
//! - A timed single-request prober
//! - A bounded-concurrency phase runner
//! - Core result types

pub mod classify;
pub mod prober;
pub mod runner;
pub mod types;

pub use prober::{HttpProber, Probe};
pub use runner::PhaseRunner;
pub use types::*;
