//! Wire types of the test-coordination service.

use crate::analysis::types::DnsServerRecord;
use serde::{Deserialize, Serialize};

/// Response to starting a test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartTestResponse {
    /// Identifier used to fetch the results later
    #[serde(default)]
    pub test_id: String,
    /// Subdomains assigned to this test
    #[serde(default)]
    pub subdomains: Vec<String>,
}

/// Final results of a test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ResultsResponse {
    /// DNS servers seen resolving the test subdomains
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dns_servers: Vec<DnsServerRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<DnsServerRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<DnsServerRecord>>::deserialize(deserializer)?.unwrap_or_default())
}
