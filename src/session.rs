//! Test session orchestration.
//!
//! Drives one complete run: start the test, probe the subdomains in phase 1,
//! keep probing during the phase-2 window, fetch the DNS servers the service
//! observed, and evaluate both verdicts.

#![allow(clippy::missing_errors_doc)]

use crate::analysis::{
    average_success_duration, evaluate_leak, evaluate_rebinding, ClientIdentity, DnsServerRecord,
    LeakVerdict, RebindingVerdict,
};
use crate::api::ApiClient;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::probe::{HttpProber, Phase, PhaseRunner, Probe, RequestResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Which test to run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Leak and rebinding test with the phase-2 window
    #[default]
    Full,
    /// Leak test only
    Short,
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Everything collected and concluded during one run.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Test that was run
    pub mode: TestMode,
    /// Identifier assigned by the service
    pub test_id: String,
    /// The caller's identity, if the service provided it
    pub client: Option<ClientIdentity>,
    /// Phase-1 results
    pub phase1: Vec<RequestResult>,
    /// Phase-2 results, all batches
    pub phase2: Vec<RequestResult>,
    /// DNS servers reported by the service, if the fetch succeeded
    pub dns_servers: Option<Vec<DnsServerRecord>>,
    /// Leak verdict
    pub leak: LeakVerdict,
    /// Mean duration of successful probes
    #[serde(rename = "average_success_ms", serialize_with = "serialize_opt_millis")]
    pub average_success: Option<Duration>,
    /// Rebinding verdict (full test only)
    pub rebinding: Option<RebindingVerdict>,
}

impl TestReport {
    /// Number of HTTP probes issued.
    #[must_use]
    pub fn total_requests(&self) -> usize {
        self.phase1.len() + self.phase2.len()
    }
}

fn serialize_opt_millis<S: serde::Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(d) => serializer.serialize_some(&(d.as_nanos() as f64 / 1_000_000.0)),
        None => serializer.serialize_none(),
    }
}

/// One run of the leak/rebinding test.
pub struct TestSession<P> {
    api: ApiClient,
    runner: PhaseRunner<P>,
    settings: Settings,
}

impl TestSession<HttpProber> {
    /// Create a session probing over HTTP with the given settings.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let api = ApiClient::from_settings(&settings)?;
        let prober = HttpProber::from_settings(&settings)?;
        let runner = PhaseRunner::with_concurrency(prober, settings.concurrency);
        Ok(Self::new(api, runner, settings))
    }
}

impl<P: Probe> TestSession<P> {
    /// Assemble a session from its parts.
    pub fn new(api: ApiClient, runner: PhaseRunner<P>, settings: Settings) -> Self {
        Self {
            api,
            runner,
            settings,
        }
    }

    /// Run the test end to end.
    ///
    /// Fails only if the test cannot be started or comes without subdomains.
    pub async fn run(&self, mode: TestMode) -> Result<TestReport> {
        let started_at = Utc::now();
        tracing::info!("Starting {mode} DNS leak test");

        tracing::info!("Requesting client IP data...");
        let client = match self.api.fetch_client_identity().await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("Unable to obtain client data: {e} (not critical, continuing)");
                None
            }
        };

        let test = self.api.start_test(mode).await?;
        tracing::info!(
            "Received test_id={}, {} subdomain(s)",
            test.test_id,
            test.subdomains.len()
        );
        if test.subdomains.is_empty() {
            return Err(Error::api("no subdomains received from the service"));
        }

        tracing::info!("Phase 1: initial requests to subdomains...");
        let phase1 = self.runner.run_phase(&test.subdomains, Phase::Initial).await;

        let phase2 = match mode {
            TestMode::Full => self.run_liveness_window(&test.subdomains).await,
            TestMode::Short => {
                tracing::info!("Short test: skipping phase 2");
                tokio::time::sleep(self.settings.short_settle()).await;
                Vec::new()
            }
        };

        tracing::info!("Fetching test results...");
        let dns_servers = match self.api.fetch_results(&test.test_id).await {
            Ok(results) => Some(results.dns_servers),
            Err(e) => {
                tracing::warn!("{e}; DNS leaks cannot be assessed");
                None
            }
        };

        let leak = evaluate_leak(dns_servers.as_deref(), client.as_ref());
        let average_success = average_success_duration(&phase1, &phase2);
        let rebinding = match mode {
            TestMode::Full => Some(evaluate_rebinding(&phase1, &phase2)),
            TestMode::Short => None,
        };

        Ok(TestReport {
            started_at,
            mode,
            test_id: test.test_id,
            client,
            phase1,
            phase2,
            dns_servers,
            leak,
            average_success,
            rebinding,
        })
    }

    /// Repeat phase-2 batches until the window closes.
    async fn run_liveness_window(&self, subdomains: &[String]) -> Vec<RequestResult> {
        let window = self.settings.phase2_window();
        let interval = self.settings.phase2_interval();
        tracing::info!(
            "Waiting {} seconds, probing /probe every {} seconds...",
            window.as_secs(),
            interval.as_secs()
        );

        let deadline = Instant::now() + window;
        let mut results = Vec::new();
        let mut iteration = 0;

        while Instant::now() < deadline {
            iteration += 1;
            tracing::info!("Iteration {iteration} (phase 2)...");
            let batch = self.runner.run_phase(subdomains, Phase::Liveness).await;
            results.extend(batch);

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(interval.min(remaining)).await;
        }

        tracing::info!(
            "Phase 2 complete: {} intermediate request(s)",
            results.len()
        );
        results
    }
}
