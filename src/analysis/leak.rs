//! DNS leak verdict.
//!
//! A leak is declared when the DNS servers that resolved the test subdomains
//! belong to more than one provider.

use crate::analysis::types::{ClientIdentity, DnsServerRecord};
use crate::probe::types::RequestResult;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::Duration;

/// ISP string reported for the test infrastructure's own resolver hosts.
const HOSTING_ALIAS: &str = "NetActuate";

/// Provider the hosting alias stands for.
const CANONICAL_PROVIDER: &str = "CONTROLD";

/// Outcome of the leak assessment.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeakStatus {
    /// No DNS server data; nothing can be concluded
    Undetermined,
    /// All DNS servers belong to one provider
    NoLeak,
    /// DNS servers from several providers were seen
    LeakDetected,
}

impl fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undetermined => write!(f, "undetermined"),
            Self::NoLeak => write!(f, "no leak"),
            Self::LeakDetected => write!(f, "leak detected"),
        }
    }
}

/// Leak verdict with the data it was derived from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeakVerdict {
    /// Verdict tag
    pub status: LeakStatus,
    /// DNS servers after deduplication by address, in first-seen order
    pub unique_servers: Vec<DnsServerRecord>,
    /// Distinct normalized providers, sorted
    pub providers: Vec<String>,
    /// Human-readable justification
    pub message: String,
}

impl LeakVerdict {
    /// Number of distinct providers.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

/// Evaluate whether DNS resolution leaks to more than one provider.
///
/// `client` only changes the wording of the message.
#[must_use]
pub fn evaluate_leak(
    dns_servers: Option<&[DnsServerRecord]>,
    client: Option<&ClientIdentity>,
) -> LeakVerdict {
    let unique_servers = dedup_servers(dns_servers.unwrap_or_default());
    if unique_servers.is_empty() {
        return LeakVerdict {
            status: LeakStatus::Undetermined,
            unique_servers,
            providers: Vec::new(),
            message: "The server did not return a list of DNS servers. DNS leaks cannot be assessed."
                .to_string(),
        };
    }

    let providers: Vec<String> = unique_servers
        .iter()
        .filter_map(|s| normalize_provider(s.details.isp.as_deref()?))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let behind_vpn = client.is_some_and(|c| c.is_vpn);

    let (status, mut message) = if providers.len() > 1 {
        (
            LeakStatus::LeakDetected,
            format!(
                "LEAKS DETECTED ({} different DNS providers involved).",
                providers.len()
            ),
        )
    } else {
        (
            LeakStatus::NoLeak,
            "NO LEAKS DETECTED (all DNS servers belong to the same provider).".to_string(),
        )
    };

    if behind_vpn {
        message.push(' ');
        message.push_str(match status {
            LeakStatus::LeakDetected => {
                "It seems that some DNS requests bypass the VPN (or the system is configured in a non-standard way)."
            }
            _ => "The VPN appears to be routing DNS requests correctly.",
        });
    }

    LeakVerdict {
        status,
        unique_servers,
        providers,
        message,
    }
}

/// Keep the first record for every address; records without one are dropped.
#[must_use]
pub fn dedup_servers(servers: &[DnsServerRecord]) -> Vec<DnsServerRecord> {
    let mut seen = HashSet::new();
    servers
        .iter()
        .filter(|s| !s.ip.is_empty() && seen.insert(s.ip.as_str()))
        .cloned()
        .collect()
}

/// Provider identity for an ISP string, or `None` if it is blank.
#[must_use]
pub fn normalize_provider(isp: &str) -> Option<String> {
    match isp.trim() {
        "" => None,
        HOSTING_ALIAS => Some(CANONICAL_PROVIDER.to_string()),
        other => Some(other.to_string()),
    }
}

/// Mean duration of successful probes across both phases.
///
/// Results without a positive duration are ignored.
#[must_use]
pub fn average_success_duration(
    phase1: &[RequestResult],
    phase2: &[RequestResult],
) -> Option<Duration> {
    let timings: Vec<Duration> = phase1
        .iter()
        .chain(phase2)
        .filter(|r| r.is_success() && !r.duration.is_zero())
        .map(|r| r.duration)
        .collect();

    if timings.is_empty() {
        return None;
    }
    let total: Duration = timings.iter().sum();
    Some(total / timings.len() as u32)
}
