//! leakcheck - DNS leak and DNS rebinding assessment.
//!
//! This crate provides both a library API and a CLI tool for:
//! - Probing server-assigned subdomains over HTTP with bounded concurrency
//! - Detecting DNS leaks from the diversity of DNS providers that resolved them
//! - Judging exposure to DNS rebinding from probe timings and failure patterns
//!
//! # Library Usage
//!
//! ```ignore
//! use leakcheck::{evaluate_leak, evaluate_rebinding, HttpProber, Phase, PhaseRunner};
//!
//! let runner = PhaseRunner::new(HttpProber::new("https", Duration::from_secs(5))?);
//! let phase1 = runner.run_phase(&subdomains, Phase::Initial).await;
//! let phase2 = runner.run_phase(&subdomains, Phase::Liveness).await;
//!
//! let rebinding = evaluate_rebinding(&phase1, &phase2);
//! let leak = evaluate_leak(Some(&dns_servers), None);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Full test: leak + rebinding (about 70 seconds)
//! leakcheck
//!
//! # Short test: leak only
//! leakcheck run --short
//!
//! # JSON report
//! leakcheck --format json
//!
//! # Show effective settings
//! leakcheck config
//! ```

pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod probe;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use analysis::{
    evaluate_leak, evaluate_rebinding, ClientIdentity, DnsServerRecord, LeakStatus, LeakVerdict,
    RebindingStatus, RebindingVerdict,
};
pub use api::ApiClient;
pub use cli::{Cli, Commands, OutputFormat};
pub use config::{Settings, SettingsLoader};
pub use error::{Error, Result};
pub use probe::{HttpProber, Phase, PhaseRunner, Probe, ProbeStatus, RequestResult};
pub use session::{TestMode, TestReport, TestSession};
