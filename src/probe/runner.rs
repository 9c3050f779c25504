//! Bounded-concurrency phase runner.
//!
//! Fans a subdomain list out to a [`Probe`] with at most `concurrency`
//! probes in flight, and waits for every one of them before returning.

use crate::probe::prober::Probe;
use crate::probe::types::{Phase, ProbeStatus, RequestResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Default number of probes allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Runs one test phase over a list of subdomains.
///
/// # Example
///
/// ```ignore
/// let runner = PhaseRunner::new(HttpProber::new("https", Duration::from_secs(5))?);
/// let results = runner.run_phase(&subdomains, Phase::Initial).await;
/// assert_eq!(results.len(), subdomains.len());
/// ```
pub struct PhaseRunner<P> {
    prober: Arc<P>,
    concurrency: usize,
}

impl<P: Probe> PhaseRunner<P> {
    /// Create a runner with the default concurrency limit.
    pub fn new(prober: P) -> Self {
        Self::with_concurrency(prober, DEFAULT_CONCURRENCY)
    }

    /// Create a runner with a custom concurrency limit (at least 1).
    pub fn with_concurrency(prober: P, concurrency: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            concurrency: concurrency.max(1),
        }
    }

    /// Maximum number of probes in flight.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The prober driven by this runner.
    #[must_use]
    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Probe every subdomain once and collect the results.
    ///
    /// Returns exactly one result per input subdomain, in no particular order.
    pub async fn run_phase(&self, subdomains: &[String], phase: Phase) -> Vec<RequestResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(subdomains.len());

        for subdomain in subdomains {
            let semaphore = semaphore.clone();
            let prober = self.prober.clone();
            let tx = tx.clone();
            let subdomain = subdomain.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await.ok();
                let result = prober.probe(&subdomain, phase).await;
                let _ = tx.send(result);
            });
            handles.push(handle);
        }
        drop(tx);

        let outcomes = futures::future::join_all(handles).await;

        let mut results = Vec::with_capacity(subdomains.len());
        while let Some(result) = rx.recv().await {
            results.push(result);
        }

        // A task that died never sent its result; stand in for it.
        for (subdomain, outcome) in subdomains.iter().zip(outcomes) {
            if let Err(e) = outcome {
                tracing::warn!("Probe task for {subdomain} failed: {e}");
                results.push(RequestResult::failure(
                    subdomain.as_str(),
                    phase,
                    ProbeStatus::Error,
                    format!("probe task failed: {e}"),
                    Duration::ZERO,
                ));
            }
        }

        tracing::info!(
            "Phase {} complete: {} request(s) finished",
            phase,
            results.len()
        );
        results
    }
}
