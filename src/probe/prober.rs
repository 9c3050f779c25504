//! HTTP prober.
//!
//! Issues one timed GET request against a subdomain and turns whatever happens
//! into a [`RequestResult`]. Failures never escape as errors.

#![allow(clippy::missing_errors_doc)]

use crate::config::Settings;
use crate::error::Result;
use crate::probe::classify::{classify, describe};
use crate::probe::types::{Phase, ProbeStatus, RequestResult};
use std::error::Error as StdError;
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Default timeout for each probe in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Last cache-busting nonce handed out.
static LAST_NONCE: AtomicI64 = AtomicI64::new(0);

/// Something that can probe a subdomain for a given phase.
///
/// The phase runner only talks to this trait, so tests can plug in an
/// instrumented stub instead of the network.
pub trait Probe: Send + Sync + 'static {
    /// Probe `subdomain` once and report the outcome.
    fn probe(&self, subdomain: &str, phase: Phase) -> impl Future<Output = RequestResult> + Send;
}

/// Prober issuing real HTTP requests.
///
/// Connections are never kept alive between probes, so every probe makes the
/// system resolver look the subdomain up again.
///
/// # Example
///
/// ```ignore
/// let prober = HttpProber::new("https", Duration::from_secs(5))?;
/// let result = prober.probe("abc123.bigdig.energy", Phase::Initial).await;
/// println!("{} -> {}", result.subdomain, result.status);
/// ```
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    scheme: String,
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober for `scheme` with a per-probe `timeout`.
    pub fn new(scheme: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self::with_client(client, scheme, timeout))
    }

    /// Create a prober from the loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.probe_scheme.clone(), settings.probe_timeout())
    }

    /// Create a prober around an existing client.
    ///
    /// The client's own pooling applies; [`HttpProber::new`] disables it.
    pub fn with_client(
        client: reqwest::Client,
        scheme: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            scheme: scheme.into(),
            timeout,
        }
    }

    /// Build the cache-busted target URL for a subdomain.
    pub fn target_url(&self, subdomain: &str, phase: Phase) -> Result<reqwest::Url> {
        let raw = format!(
            "{}://{}{}?cb={}",
            self.scheme,
            subdomain,
            phase.path(),
            next_nonce()
        );
        reqwest::Url::parse(&raw)
            .map_err(|e| crate::error::Error::parse(format!("invalid probe URL {raw}: {e}")))
    }
}

impl Probe for HttpProber {
    async fn probe(&self, subdomain: &str, phase: Phase) -> RequestResult {
        let url = match self.target_url(subdomain, phase) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping {subdomain}: {e}");
                return RequestResult::failure(
                    subdomain,
                    phase,
                    ProbeStatus::Error,
                    e.to_string(),
                    Duration::ZERO,
                );
            }
        };

        let start = Instant::now();
        let outcome = timeout(self.timeout, self.client.get(url).send()).await;
        let elapsed = start.elapsed();

        // The response body is never read.
        let error: Option<Box<dyn StdError + Send + Sync>> = match outcome {
            Ok(Ok(_response)) => None,
            Ok(Err(e)) => Some(Box::new(e)),
            Err(e) => Some(Box::new(e)),
        };
        let error = error
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static));

        let result = match error {
            None => RequestResult::success(subdomain, phase, elapsed),
            Some(e) => {
                RequestResult::failure(subdomain, phase, classify(error), describe(e), elapsed)
            }
        };

        tracing::debug!(
            "Probe {} phase {}: {} in {:?}",
            result.subdomain,
            phase,
            result.status,
            elapsed
        );
        result
    }
}

/// Nanosecond timestamp, bumped so that no two calls return the same value.
fn next_nonce() -> i64 {
    let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let prev = LAST_NONCE
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1)
}
