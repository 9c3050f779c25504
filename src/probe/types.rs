//! Probe types and data structures.
//!
//! This module provides the core types used to describe a single HTTP probe
//! outcome and the phase of the test it belongs to.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Outcome category of a single probe.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The transport-level exchange completed
    Success,
    /// The bounded wait expired
    Timeout,
    /// TLS handshake or certificate validation failed
    TlsError,
    /// Any other failure
    Error,
}

impl ProbeStatus {
    /// All statuses, in reporting order.
    pub const ALL: [Self; 4] = [Self::Success, Self::Timeout, Self::TlsError, Self::Error];

    /// Tag used in reports and JSON output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::TlsError => "tls_error",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test phase a probe was issued in.
///
/// Phase 1 hits the information-lookup path once per subdomain. Phase 2 is
/// repeated during the wait window and hits the lightweight liveness path.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(into = "u8")]
pub enum Phase {
    /// First pass, before the resolver is expected to rebind
    Initial,
    /// Periodic passes during the wait window
    Liveness,
}

impl Phase {
    /// Phase number as reported by the test (1 or 2).
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Initial => 1,
            Self::Liveness => 2,
        }
    }

    /// Request path probed on each subdomain during this phase.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Initial => "/get_data",
            Self::Liveness => "/probe",
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase.number()
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Initial),
            2 => Ok(Self::Liveness),
            other => Err(format!("Unknown phase: {other}. Valid phases are 1 and 2")),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Result of probing one subdomain.
///
/// Created once by a prober and never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RequestResult {
    /// Target host
    pub subdomain: String,
    /// Outcome category
    pub status: ProbeStatus,
    /// Phase the probe was issued in
    pub phase: Phase,
    /// Error text, present iff the status is not `success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed wall time of the attempt, measured on failure too
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl RequestResult {
    /// Create a successful result.
    pub fn success(subdomain: impl Into<String>, phase: Phase, duration: Duration) -> Self {
        Self {
            subdomain: subdomain.into(),
            status: ProbeStatus::Success,
            phase,
            error: None,
            duration,
        }
    }

    /// Create a failed result.
    pub fn failure(
        subdomain: impl Into<String>,
        phase: Phase,
        status: ProbeStatus,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            subdomain: subdomain.into(),
            status,
            phase,
            error: Some(error.into()),
            duration,
        }
    }

    /// Check if the probe completed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }

    /// Elapsed time in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_millis() as f64
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

/// Status counts for one set of probe results.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Number of results
    pub total: usize,
    /// Successful probes
    pub success: usize,
    /// Timed-out probes
    pub timeout: usize,
    /// TLS/certificate failures
    pub tls_error: usize,
    /// Other failures
    pub error: usize,
}

impl PhaseSummary {
    /// Summarize a result set.
    #[must_use]
    pub fn from_results(results: &[RequestResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.add_result(result);
        }
        summary
    }

    /// Add a probe result to the summary.
    pub fn add_result(&mut self, result: &RequestResult) {
        self.total += 1;
        match result.status {
            ProbeStatus::Success => self.success += 1,
            ProbeStatus::Timeout => self.timeout += 1,
            ProbeStatus::TlsError => self.tls_error += 1,
            ProbeStatus::Error => self.error += 1,
        }
    }

    /// Count for one status.
    #[must_use]
    pub fn count(&self, status: ProbeStatus) -> usize {
        match status {
            ProbeStatus::Success => self.success,
            ProbeStatus::Timeout => self.timeout,
            ProbeStatus::TlsError => self.tls_error,
            ProbeStatus::Error => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_paths() {
        assert_eq!(Phase::Initial.path(), "/get_data");
        assert_eq!(Phase::Liveness.path(), "/probe");
        assert_eq!(Phase::Initial.number(), 1);
        assert_eq!(Phase::Liveness.number(), 2);
    }

    #[test]
    fn test_phase_try_from() {
        assert_eq!(Phase::try_from(1u8), Ok(Phase::Initial));
        assert_eq!(Phase::try_from(2u8), Ok(Phase::Liveness));
        assert!(Phase::try_from(0u8).is_err());
        assert!(Phase::try_from(3u8).is_err());
    }

    #[test]
    fn test_request_result_constructors() {
        let ok = RequestResult::success("a.example", Phase::Initial, Duration::from_millis(42));
        assert!(ok.is_success());
        assert!(ok.error.is_none());
        assert_eq!(ok.duration_ms(), 42.0);

        let failed = RequestResult::failure(
            "b.example",
            Phase::Liveness,
            ProbeStatus::Timeout,
            "deadline has elapsed",
            Duration::from_micros(5_000_900),
        );
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("deadline has elapsed"));
        // truncated to whole milliseconds
        assert_eq!(failed.duration_ms(), 5000.0);
    }

    #[test]
    fn test_request_result_json() {
        let result = RequestResult::failure(
            "c.example",
            Phase::Liveness,
            ProbeStatus::TlsError,
            "invalid peer certificate",
            Duration::from_millis(12),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "tls_error");
        assert_eq!(json["phase"], 2);
        assert_eq!(json["duration_ms"], 12.0);
        assert_eq!(json["error"], "invalid peer certificate");

        let ok = RequestResult::success("d.example", Phase::Initial, Duration::ZERO);
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_phase_summary() {
        let results = vec![
            RequestResult::success("a", Phase::Liveness, Duration::from_millis(10)),
            RequestResult::success("b", Phase::Liveness, Duration::from_millis(20)),
            RequestResult::failure("c", Phase::Liveness, ProbeStatus::Timeout, "t", Duration::ZERO),
            RequestResult::failure("d", Phase::Liveness, ProbeStatus::Error, "e", Duration::ZERO),
        ];
        let summary = PhaseSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.count(ProbeStatus::Success), 2);
        assert_eq!(summary.count(ProbeStatus::Timeout), 1);
        assert_eq!(summary.count(ProbeStatus::TlsError), 0);
        assert_eq!(summary.count(ProbeStatus::Error), 1);
    }
}
