//! Public IP detection.

use crate::error::{DdnsError, Result};
use crate::ipversion::IpVersion;
use std::net::IpAddr;
use std::time::Duration;

const IPV6_SERVICES: [&str; 3] = [
    "https://api6.ipify.org",
    "https://v6.ident.me",
    "https://ipv6.icanhazip.com",
];

/// IP detector with multiple fallback services.
pub struct IpDetector {
    client: reqwest::Client,
    ipv4_services: Vec<String>,
}

impl IpDetector {
    /// Create a new IP detector with default services.
    pub fn new() -> Self {
        Self::with_services(vec![
            "https://api.ipify.org".to_string(),
            "https://icanhazip.com".to_string(),
            "https://ifconfig.me/ip".to_string(),
            "https://ipecho.net/plain".to_string(),
        ])
    }

    /// Create a new IP detector with custom IPv4 services.
    pub fn with_services(ipv4_services: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            ipv4_services,
        }
    }

    /// Detect the public IP for the given address family.
    pub async fn detect(&self, version: IpVersion) -> Result<IpAddr> {
        let services: Vec<&str> = match version {
            IpVersion::Ipv4 => self.ipv4_services.iter().map(String::as_str).collect(),
            IpVersion::Ipv6 => IPV6_SERVICES.to_vec(),
        };

        for service in services {
            match self.try_service(service).await {
                Ok(ip) if version.matches(ip) => {
                    tracing::debug!("Detected {} {} from {}", version, ip, service);
                    return Ok(ip);
                }
                Ok(ip) => {
                    tracing::warn!("Service {} returned wrong-family address {}", service, ip);
                }
                Err(e) => {
                    tracing::warn!("Service {} failed: {}", service, e);
                }
            }
        }

        Err(DdnsError::IpDetection(format!(
            "All {version} detection services failed"
        )))
    }

    /// Try a single IP detection service.
    async fn try_service(&self, url: &str) -> Result<IpAddr> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DdnsError::IpDetection(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let text = response.text().await?;
        let ip_str = text.trim();

        ip_str
            .parse()
            .map_err(|_| DdnsError::IpDetection(format!("Invalid IP response: {ip_str}")))
    }
}

impl Default for IpDetector {
    fn default() -> Self {
        Self::new()
    }
}
