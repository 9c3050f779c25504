//! Network identity records reported by the test-coordination service.

use serde::{Deserialize, Deserializer, Serialize};

/// Geolocation and ownership details shared by DNS servers and the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NetworkDetails {
    /// Country name or code
    #[serde(default, deserialize_with = "empty_as_none")]
    pub country: Option<String>,
    /// City name
    #[serde(default, deserialize_with = "empty_as_none")]
    pub city: Option<String>,
    /// Internet service provider / operator
    #[serde(default, deserialize_with = "empty_as_none")]
    pub isp: Option<String>,
    /// Autonomous system
    #[serde(default, deserialize_with = "empty_as_none")]
    pub asn: Option<String>,
    /// Latitude
    #[serde(default)]
    pub gps_lat: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub gps_long: Option<f64>,
}

impl NetworkDetails {
    /// Coordinates, only when both halves are known.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.gps_lat.zip(self.gps_long)
    }

    /// "City, Country" (or whichever part is known).
    #[must_use]
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// A DNS server seen resolving the test subdomains.
///
/// Identity is the `ip`; when deduplicating, the first record wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DnsServerRecord {
    /// Server address
    #[serde(default)]
    pub ip: String,
    /// Whether the address belongs to a VPN or proxy
    #[serde(default)]
    pub is_vpn: bool,
    /// Location and operator
    #[serde(flatten)]
    pub details: NetworkDetails,
}

impl DnsServerRecord {
    /// Create a record with only an address and an ISP.
    pub fn new(ip: impl Into<String>, isp: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            is_vpn: false,
            details: NetworkDetails {
                isp: Some(isp.into()),
                ..NetworkDetails::default()
            },
        }
    }
}

/// The caller's own network identity as observed by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientIdentity {
    /// Public address
    #[serde(default)]
    pub ip: String,
    /// Whether the address belongs to a VPN or proxy
    #[serde(default)]
    pub is_vpn: bool,
    /// Location and operator
    #[serde(flatten)]
    pub details: NetworkDetails,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
