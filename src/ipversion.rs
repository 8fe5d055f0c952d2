//! IP version preference attached to each provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Address family a provider's record tracks.
///
/// This is a scheduling preference only: it tells the caller which public IP
/// to detect and hand to [`update`](crate::providers::Provider::update). The
/// request a provider builds is always shaped by the actual address value it
/// receives, not by this preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    #[default]
    Ipv4,
    Ipv6,
}

impl IpVersion {
    /// Whether the given address belongs to this family.
    pub fn matches(&self, ip: IpAddr) -> bool {
        match self {
            IpVersion::Ipv4 => ip.is_ipv4(),
            IpVersion::Ipv6 => ip.is_ipv6(),
        }
    }

    /// The family of the given address.
    pub fn of(ip: IpAddr) -> Self {
        if ip.is_ipv4() {
            IpVersion::Ipv4
        } else {
            IpVersion::Ipv6
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::Ipv4 => write!(f, "ipv4"),
            IpVersion::Ipv6 => write!(f, "ipv6"),
        }
    }
}

impl FromStr for IpVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(IpVersion::Ipv4),
            "ipv6" => Ok(IpVersion::Ipv6),
            other => Err(format!("unknown IP version: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_family() {
        let v4: IpAddr = "203.0.113.5".parse().unwrap();
        let v6: IpAddr = "2001:db8::2".parse().unwrap();
        assert!(IpVersion::Ipv4.matches(v4));
        assert!(!IpVersion::Ipv4.matches(v6));
        assert!(IpVersion::Ipv6.matches(v6));
        assert_eq!(IpVersion::of(v4), IpVersion::Ipv4);
        assert_eq!(IpVersion::of(v6), IpVersion::Ipv6);
    }

    #[test]
    fn test_round_trip_str() {
        assert_eq!("ipv4".parse::<IpVersion>().unwrap(), IpVersion::Ipv4);
        assert_eq!(IpVersion::Ipv6.to_string(), "ipv6");
        assert!("both".parse::<IpVersion>().is_err());
    }
}
