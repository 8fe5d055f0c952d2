//! Configuration management for ddns-sync.

use crate::error::{DdnsError, Result};
use crate::ipversion::IpVersion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Check interval in seconds (default: 300 = 5 minutes).
    #[serde(default = "default_interval")]
    pub check_interval_secs: u64,

    /// IPv4 detection services to use.
    #[serde(default = "default_ip_services")]
    pub ip_services: Vec<String>,

    /// Configured DNS providers.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

fn default_interval() -> u64 {
    300
}

fn default_ip_services() -> Vec<String> {
    vec![
        "https://api.ipify.org".to_string(),
        "https://icanhazip.com".to_string(),
        "https://ifconfig.me/ip".to_string(),
        "https://ipecho.net/plain".to_string(),
    ]
}

fn default_host() -> String {
    // "@" denotes the bare domain (zone apex).
    "@".to_string()
}

/// Provider configuration.
///
/// Each variant carries the credential bundle its API needs. Values may
/// reference environment variables by prefixing with `$`. The `host` field is
/// the record label within the domain and defaults to the `"@"` apex sentinel
/// when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "dondominio")]
    DonDominio {
        /// Domain name.
        domain: String,
        /// Host (record label, @ for the bare domain).
        #[serde(default = "default_host")]
        host: String,
        /// Address family to keep updated (default: ipv4).
        #[serde(default)]
        ip_version: IpVersion,
        /// API username.
        username: String,
        /// API password.
        password: String,
        /// Glue record name.
        name: String,
    },

    #[serde(rename = "aliyun")]
    Aliyun {
        /// Domain name.
        domain: String,
        /// Host (record label, @ for the bare domain).
        #[serde(default = "default_host")]
        host: String,
        /// Address family to keep updated (default: ipv4).
        #[serde(default)]
        ip_version: IpVersion,
        /// Access key ID.
        access_key_id: String,
        /// Access key secret.
        access_secret: String,
        /// API region (default: cn-hangzhou).
        #[serde(default)]
        region: Option<String>,
    },
}

impl ProviderConfig {
    /// The registry identity of this configuration.
    pub fn kind(&self) -> crate::providers::ProviderKind {
        match self {
            ProviderConfig::DonDominio { .. } => crate::providers::ProviderKind::DonDominio,
            ProviderConfig::Aliyun { .. } => crate::providers::ProviderKind::Aliyun,
        }
    }

    /// Fully qualified record name this configuration targets.
    pub fn record_name(&self) -> String {
        match self {
            ProviderConfig::DonDominio { domain, host, .. }
            | ProviderConfig::Aliyun { domain, host, .. } => {
                crate::providers::build_record_name(host, domain)
            }
        }
    }

    /// Address family this configuration keeps updated.
    pub fn ip_version(&self) -> IpVersion {
        match self {
            ProviderConfig::DonDominio { ip_version, .. }
            | ProviderConfig::Aliyun { ip_version, .. } => *ip_version,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            ip_services: default_ip_services(),
            providers: Vec::new(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("ddns-sync").join("config.toml"))
    }

    /// Load configuration from file.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Generate example configuration.
    pub fn example() -> Self {
        Self {
            check_interval_secs: 300,
            ip_services: default_ip_services(),
            providers: vec![
                ProviderConfig::DonDominio {
                    domain: "example.com".to_string(),
                    host: "@".to_string(),
                    ip_version: IpVersion::Ipv4,
                    username: "$DONDOMINIO_USER".to_string(),
                    password: "$DONDOMINIO_PASSWORD".to_string(),
                    name: "ns1".to_string(),
                },
                ProviderConfig::Aliyun {
                    domain: "example.org".to_string(),
                    host: "vpn".to_string(),
                    ip_version: IpVersion::Ipv4,
                    access_key_id: "$ALIYUN_ACCESS_KEY_ID".to_string(),
                    access_secret: "$ALIYUN_ACCESS_SECRET".to_string(),
                    region: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.check_interval_secs, 300);
        assert!(!config.ip_services.is_empty());
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_example_config() {
        let config = Config::example();
        assert_eq!(config.providers.len(), 2);
    }

    #[test]
    fn test_absent_host_defaults_to_apex() {
        let toml_str = r#"
            [[providers]]
            type = "dondominio"
            domain = "example.com"
            username = "u"
            password = "p"
            name = "n"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        match &config.providers[0] {
            ProviderConfig::DonDominio {
                host, ip_version, ..
            } => {
                assert_eq!(host, "@");
                assert_eq!(*ip_version, IpVersion::Ipv4);
            }
            other => panic!("unexpected provider: {other:?}"),
        }
    }

    #[test]
    fn test_parse_aliyun_with_region() {
        let toml_str = r#"
            [[providers]]
            type = "aliyun"
            domain = "example.org"
            host = "vpn"
            ip_version = "ipv6"
            access_key_id = "id"
            access_secret = "secret"
            region = "cn-shanghai"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        match &config.providers[0] {
            ProviderConfig::Aliyun {
                ip_version, region, ..
            } => {
                assert_eq!(*ip_version, IpVersion::Ipv6);
                assert_eq!(region.as_deref(), Some("cn-shanghai"));
            }
            other => panic!("unexpected provider: {other:?}"),
        }
    }
}
