//! Analysis module.
//!
//! This module turns collected probe results and reported DNS servers into
//! verdicts:
//! - DNS leak detection by provider diversity
//! - DNS rebinding heuristics over probe outcomes and timings

pub mod leak;
pub mod rebinding;
pub mod types;

pub use leak::{average_success_duration, evaluate_leak, LeakStatus, LeakVerdict};
pub use rebinding::{evaluate_rebinding, RebindingStatus, RebindingVerdict};
pub use types::{ClientIdentity, DnsServerRecord, NetworkDetails};
