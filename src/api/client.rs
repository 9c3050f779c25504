//! Client for the test-coordination service.
//!
//! The service hands out the subdomains to probe, reports the caller's own
//! address, and after the probes returns the DNS servers it saw.

#![allow(clippy::missing_errors_doc)]

use crate::analysis::types::ClientIdentity;
use crate::api::types::{ResultsResponse, StartTestResponse};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::session::TestMode;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

/// Test-coordination service client.
///
/// # Example
///
/// ```ignore
/// let api = ApiClient::from_settings(&Settings::default())?;
/// let test = api.start_test(TestMode::Full).await?;
/// println!("{} subdomains", test.subdomains.len());
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    results_attempts: usize,
    results_retry_delay: Duration,
}

impl ApiClient {
    /// Create a client from the loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let base_url = Url::parse(&settings.api_base_url).map_err(|e| {
            Error::config(format!("Invalid api_base_url {}: {e}", settings.api_base_url))
        })?;

        Ok(Self {
            http,
            base_url,
            timeout: settings.api_timeout(),
            results_attempts: settings.results_attempts.max(1),
            results_retry_delay: settings.results_retry_delay(),
        })
    }

    /// Fetch the caller's network identity.
    pub async fn fetch_client_identity(&self) -> Result<ClientIdentity> {
        let url = self.endpoint(&["get_data"])?;
        self.send_json(self.http.get(url)).await
    }

    /// Start a new test and receive its subdomains.
    ///
    /// The full test asks the service not to fail subdomains early, so they
    /// stay resolvable for the whole phase-2 window.
    pub async fn start_test(&self, mode: TestMode) -> Result<StartTestResponse> {
        let mut url = self.endpoint(&["start_test"])?;
        let no_fail = match mode {
            TestMode::Full => "1",
            TestMode::Short => "0",
        };
        url.query_pairs_mut().append_pair("no_fail", no_fail);

        let resp: StartTestResponse = self.send_json(self.http.post(url)).await?;
        if resp.test_id.is_empty() {
            return Err(Error::api("empty test_id in response"));
        }
        tracing::debug!(
            "Started test {} with {} subdomain(s)",
            resp.test_id,
            resp.subdomains.len()
        );
        Ok(resp)
    }

    /// Fetch the DNS servers seen during a test.
    ///
    /// Retried with a fixed pause; fails after the configured number of
    /// attempts.
    pub async fn fetch_results(&self, test_id: &str) -> Result<ResultsResponse> {
        let url = self.endpoint(&["get_results", test_id])?;
        let strategy =
            FixedInterval::new(self.results_retry_delay).take(self.results_attempts - 1);

        let mut attempt = 0;
        Retry::start(strategy, || {
            attempt += 1;
            tracing::debug!("Fetching results for {test_id} (attempt {attempt})");
            self.send_json::<ResultsResponse>(self.http.get(url.clone()))
        })
        .await
        .map_err(|e| Error::api(format!("failed to fetch results for test {test_id}: {e}")))
    }

    /// Base URL with `segments` appended; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::from_settings(&Settings {
            api_base_url: base.to_string(),
            ..Settings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let api = client("https://bigdig.energy");
        assert_eq!(
            api.endpoint(&["get_data"]).unwrap().as_str(),
            "https://bigdig.energy/get_data"
        );

        let api = client("http://127.0.0.1:8080/api/");
        assert_eq!(
            api.endpoint(&["get_results", "t1"]).unwrap().as_str(),
            "http://127.0.0.1:8080/api/get_results/t1"
        );
    }

    #[test]
    fn test_test_id_is_escaped() {
        let api = client("https://bigdig.energy");
        let url = api.endpoint(&["get_results", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/get_results/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::from_settings(&Settings {
            api_base_url: "::nope".into(),
            ..Settings::default()
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
