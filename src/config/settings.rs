//! Runtime settings.

use crate::error::{Error, Result};
use crate::probe::prober::DEFAULT_PROBE_TIMEOUT_SECS;
use crate::probe::runner::DEFAULT_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL of the test-coordination service.
pub const DEFAULT_API_BASE_URL: &str = "https://bigdig.energy";

/// Tunable parameters of a test run.
///
/// Every field has a default, so a configuration file only needs to list
/// the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Test-coordination service base URL
    pub api_base_url: String,
    /// Scheme used for subdomain probes
    pub probe_scheme: String,
    /// Per-probe timeout in seconds
    pub probe_timeout_secs: u64,
    /// Probes in flight at once
    pub concurrency: usize,
    /// Per-call timeout for the service API in seconds
    pub api_timeout_secs: u64,
    /// Length of the phase-2 window in seconds
    pub phase2_window_secs: u64,
    /// Pause between phase-2 batches in seconds
    pub phase2_interval_secs: u64,
    /// Attempts at fetching the final results
    pub results_attempts: usize,
    /// Pause between result fetch attempts in seconds
    pub results_retry_delay_secs: u64,
    /// Pause before fetching results in the short test, in seconds
    pub short_settle_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            probe_scheme: "https".to_string(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            api_timeout_secs: 10,
            phase2_window_secs: 69,
            phase2_interval_secs: 13,
            results_attempts: 3,
            results_retry_delay_secs: 2,
            short_settle_secs: 1,
        }
    }
}

impl Settings {
    /// Per-probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Per-call API timeout.
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Phase-2 window.
    #[must_use]
    pub fn phase2_window(&self) -> Duration {
        Duration::from_secs(self.phase2_window_secs)
    }

    /// Pause between phase-2 batches.
    #[must_use]
    pub fn phase2_interval(&self) -> Duration {
        Duration::from_secs(self.phase2_interval_secs)
    }

    /// Pause between result fetch attempts.
    #[must_use]
    pub fn results_retry_delay(&self) -> Duration {
        Duration::from_secs(self.results_retry_delay_secs)
    }

    /// Pause before fetching results in the short test.
    #[must_use]
    pub fn short_settle(&self) -> Duration {
        Duration::from_secs(self.short_settle_secs)
    }

    /// Check that the settings describe a runnable test.
    ///
    /// # Errors
    ///
    /// Returns a config error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_base_url)
            .map_err(|e| Error::config(format!("Invalid api_base_url {}: {e}", self.api_base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if !matches!(self.probe_scheme.as_str(), "http" | "https") {
            return Err(Error::config(format!(
                "probe_scheme must be http or https, got {}",
                self.probe_scheme
            )));
        }
        if self.probe_timeout_secs == 0 {
            return Err(Error::config("probe_timeout_secs must be greater than 0"));
        }
        if self.api_timeout_secs == 0 {
            return Err(Error::config("api_timeout_secs must be greater than 0"));
        }
        if self.results_attempts == 0 {
            return Err(Error::config("results_attempts must be greater than 0"));
        }
        Ok(())
    }
}
