//! Test-coordination service module.
//!
//! This module talks to the remote service that starts a test, assigns
//! the subdomains to probe, and reports the DNS servers it observed.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{ResultsResponse, StartTestResponse};
