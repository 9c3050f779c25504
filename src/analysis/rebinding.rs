//! DNS rebinding verdict.
//!
//! Heuristic rules run in a fixed order over the probe results. Each rule sees
//! the reasons collected by the rules before it, and the last rule can throw
//! them all away again when the only evidence is the probe's own timeout
//! firing uniformly.

use crate::probe::types::{ProbeStatus, RequestResult};
use serde::Serialize;
use std::fmt;

/// Response-time spread (ms) in phase 2 that counts as suspicious.
const SPREAD_THRESHOLD_MS: f64 = 3000.0;

/// Slowest/fastest ratio in phase 2 that counts as suspicious.
const RATIO_THRESHOLD: f64 = 30.0;

/// Timeout spread (ms) below which timeouts are considered uniform.
const UNIFORM_SPREAD_MS: f64 = 100.0;

/// Window (ms) around the probe's own timeout.
const PROBE_TIMEOUT_WINDOW_MS: (f64, f64) = (4900.0, 6100.0);

const VULNERABLE_PREAMBLE: &str =
    "The DNS resolver appears vulnerable to DNS rebinding attacks. ";

const HEURISTIC_DISCLAIMER: &str =
    "Please note: the conclusion is based on heuristics and is not a formal guarantee.";

const PROTECTED_MESSAGE: &str = "No obvious signs of successful DNS rebinding were found. \
This does not provide a 100% guarantee, but based on the metrics collected, \
the resolver appears to be secure.";

/// Outcome of the rebinding assessment.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RebindingStatus {
    /// At least one heuristic points at rebinding
    Vulnerable,
    /// No heuristic survived
    Protected,
}

impl fmt::Display for RebindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vulnerable => write!(f, "vulnerable"),
            Self::Protected => write!(f, "protected"),
        }
    }
}

/// Which rule produced a reason.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    /// Phase-2 requests timed out
    Phase2Timeout,
    /// TLS or certificate failures in either phase
    TlsError,
    /// Large absolute spread of phase-2 response times
    TimingSpread,
    /// Large relative spread of phase-2 response times
    TimingRatio,
}

/// One piece of evidence for rebinding.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reason {
    /// Rule that fired
    pub kind: ReasonKind,
    /// Human-readable explanation
    pub text: String,
}

/// Rebinding verdict.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RebindingVerdict {
    /// Verdict tag
    pub status: RebindingStatus,
    /// Surviving evidence, in rule order
    pub reasons: Vec<Reason>,
    /// Human-readable justification
    pub message: String,
}

/// Results the rules look at.
struct RuleInput<'a> {
    phase1: &'a [RequestResult],
    phase2: &'a [RequestResult],
}

/// A heuristic: takes the reasons so far, returns the updated list.
type Rule = fn(&RuleInput<'_>, Vec<Reason>) -> Vec<Reason>;

const RULES: [Rule; 4] = [
    phase2_timeout_rule,
    tls_error_rule,
    timing_spread_rule,
    uniform_timeout_suppression,
];

/// Evaluate the resolver's exposure to DNS rebinding.
///
/// Pure function of its inputs; order of results within a phase is irrelevant.
#[must_use]
pub fn evaluate_rebinding(phase1: &[RequestResult], phase2: &[RequestResult]) -> RebindingVerdict {
    let input = RuleInput { phase1, phase2 };
    let reasons = RULES
        .iter()
        .fold(Vec::new(), |reasons, rule| rule(&input, reasons));

    if reasons.is_empty() {
        return RebindingVerdict {
            status: RebindingStatus::Protected,
            reasons,
            message: PROTECTED_MESSAGE.to_string(),
        };
    }

    let joined = reasons
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(". ");
    RebindingVerdict {
        status: RebindingStatus::Vulnerable,
        message: format!("{VULNERABLE_PREAMBLE}{joined}. {HEURISTIC_DISCLAIMER}"),
        reasons,
    }
}

fn phase2_timeout_rule(input: &RuleInput<'_>, mut reasons: Vec<Reason>) -> Vec<Reason> {
    let timeouts = input
        .phase2
        .iter()
        .filter(|r| r.status == ProbeStatus::Timeout)
        .count();
    if timeouts > 0 {
        reasons.push(Reason {
            kind: ReasonKind::Phase2Timeout,
            text: format!(
                "{timeouts} request(s) in the second phase timed out, possibly hitting unavailable internal addresses"
            ),
        });
    }
    reasons
}

fn tls_error_rule(input: &RuleInput<'_>, mut reasons: Vec<Reason>) -> Vec<Reason> {
    let tls_errors = input
        .phase1
        .iter()
        .chain(input.phase2)
        .filter(|r| {
            r.status == ProbeStatus::TlsError
                || r.error
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains("certificate"))
        })
        .count();
    if tls_errors > 0 {
        reasons.push(Reason {
            kind: ReasonKind::TlsError,
            text: format!(
                "{tls_errors} request(s) resulted in TLS/certificate errors, internal HTTPS services with invalid certificates may be accessible"
            ),
        });
    }
    reasons
}

fn timing_spread_rule(input: &RuleInput<'_>, mut reasons: Vec<Reason>) -> Vec<Reason> {
    // Every timed phase-2 result counts, failures included.
    let timings: Vec<f64> = input
        .phase2
        .iter()
        .map(RequestResult::duration_ms)
        .filter(|ms| *ms > 0.0)
        .collect();

    let Some((fastest, slowest)) = spread(&timings) else {
        return reasons;
    };
    let diff = slowest - fastest;
    let ratio = if fastest > 0.0 { slowest / fastest } else { 0.0 };

    if diff > SPREAD_THRESHOLD_MS {
        reasons.push(Reason {
            kind: ReasonKind::TimingSpread,
            text: format!(
                "large variation in response times in the second phase ({fastest:.2}-{slowest:.2} ms, difference {diff:.2} ms)"
            ),
        });
    } else if ratio > RATIO_THRESHOLD {
        reasons.push(Reason {
            kind: ReasonKind::TimingRatio,
            text: format!(
                "significant difference in response times in the second phase ({ratio:.2} times)"
            ),
        });
    }
    reasons
}

fn uniform_timeout_suppression(input: &RuleInput<'_>, reasons: Vec<Reason>) -> Vec<Reason> {
    let only_timeouts = matches!(
        reasons.as_slice(),
        [Reason { kind: ReasonKind::Phase2Timeout, .. }]
    );
    if !only_timeouts {
        return reasons;
    }

    let timings: Vec<f64> = input
        .phase2
        .iter()
        .filter(|r| r.status == ProbeStatus::Timeout && !r.duration.is_zero())
        .map(RequestResult::duration_ms)
        .collect();

    let Some((fastest, slowest)) = spread(&timings) else {
        return reasons;
    };
    let (low, high) = PROBE_TIMEOUT_WINDOW_MS;
    let near_probe_timeout = timings.iter().all(|t| (low..=high).contains(t));

    if slowest - fastest < UNIFORM_SPREAD_MS || near_probe_timeout {
        tracing::debug!("Phase-2 timeouts are uniform; discarding timeout evidence");
        Vec::new()
    } else {
        reasons
    }
}

/// Fastest and slowest of at least two timings.
fn spread(timings: &[f64]) -> Option<(f64, f64)> {
    if timings.len() < 2 {
        return None;
    }
    let fastest = timings.iter().copied().fold(f64::INFINITY, f64::min);
    let slowest = timings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((fastest, slowest))
}
