//! DNS provider implementations and the shared update contract.

mod aliyun;
mod dondominio;

pub use aliyun::AliyunProvider;
pub use dondominio::DonDominioProvider;

use crate::config::ProviderConfig;
use crate::error::{UpdateError, ValidationError};
use crate::ipversion::IpVersion;
use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Maximum length of a response body excerpt embedded in an error.
const BODY_EXCERPT_MAX: usize = 300;

/// The uniform update contract every provider implements.
///
/// A provider is constructed once from validated configuration and reused for
/// every update cycle. `update` is stateless with respect to other providers,
/// so concurrent calls across distinct instances need no locking. Providers
/// that look up a record identifier before updating are not reentrancy-safe
/// for the same record; callers serialize per instance.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// The registry identity of this provider.
    fn kind(&self) -> ProviderKind;

    /// Domain the record lives in.
    fn domain(&self) -> &str;

    /// Record label within the domain ("@" for the bare domain).
    fn host(&self) -> &str;

    /// Address family this provider keeps updated.
    fn ip_version(&self) -> IpVersion;

    /// Fully qualified record name.
    fn record_name(&self) -> String {
        build_record_name(self.host(), self.domain())
    }

    /// Set the record to `ip` and confirm the provider converged on it.
    ///
    /// Returns the confirmed IP, which is guaranteed equal to `ip`; anything
    /// else is one of the [`UpdateError`] kinds. The call performs no retries
    /// and respects cancellation: dropping the returned future aborts the
    /// in-flight transport call.
    async fn update(&self, client: &reqwest::Client, ip: IpAddr) -> Result<IpAddr, UpdateError>;
}

/// Registry of known provider identifiers with display metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    DonDominio,
    Aliyun,
}

impl ProviderKind {
    /// Every provider kind, in registry order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::DonDominio, ProviderKind::Aliyun];

    /// The configuration identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DonDominio => "dondominio",
            ProviderKind::Aliyun => "aliyun",
        }
    }

    /// Human-readable provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::DonDominio => "DonDominio",
            ProviderKind::Aliyun => "Aliyun",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown provider: {s:?}"))
    }
}

/// Create a provider from configuration.
///
/// Validation happens here, eagerly: a configuration that fails its
/// provider's checks never yields a `Provider`, so it can never be scheduled.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>, ValidationError> {
    match config {
        ProviderConfig::DonDominio {
            domain,
            host,
            ip_version,
            username,
            password,
            name,
        } => Ok(Box::new(DonDominioProvider::new(
            domain.clone(),
            host.clone(),
            *ip_version,
            resolve_env(username),
            resolve_env(password),
            name.clone(),
        )?)),
        ProviderConfig::Aliyun {
            domain,
            host,
            ip_version,
            access_key_id,
            access_secret,
            region,
        } => Ok(Box::new(AliyunProvider::new(
            domain.clone(),
            host.clone(),
            *ip_version,
            resolve_env(access_key_id),
            resolve_env(access_secret),
            region.clone(),
        )?)),
    }
}

/// Build the fully qualified record name from host and domain.
pub fn build_record_name(host: &str, domain: &str) -> String {
    if host == "@" {
        domain.to_string()
    } else {
        format!("{host}.{domain}")
    }
}

/// Confirm that the IP a provider reported back matches the one requested.
///
/// Comparison is between parsed values, not strings. A well-formed but
/// different IP is a hard failure: a provider claiming success with the wrong
/// value must not pass for convergence.
pub(crate) fn verify_reported_ip(requested: IpAddr, reported: &str) -> Result<IpAddr, UpdateError> {
    let received: IpAddr = reported
        .trim()
        .parse()
        .map_err(|_| UpdateError::MalformedIp(reported.to_string()))?;

    if received != requested {
        return Err(UpdateError::IpMismatch {
            requested,
            received,
        });
    }

    Ok(received)
}

/// Collapse a response body to one bounded line for error diagnostics.
pub(crate) fn single_line_excerpt(body: &str) -> String {
    let mut line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.len() > BODY_EXCERPT_MAX {
        let mut cut = BODY_EXCERPT_MAX;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
        line.push_str("...");
    }
    line
}

/// Resolve environment variable references (values starting with $).
pub(crate) fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}
