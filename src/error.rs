//! Error types for ddns-sync.

use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for ddns-sync.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// Crate-level errors: configuration handling and IP detection.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider configuration rejected at construction.
    #[error("Invalid provider settings: {0}")]
    Validation(#[from] ValidationError),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// IP detection error.
    #[error("IP detection failed: {0}")]
    IpDetection(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        DdnsError::Network(e.to_string())
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

/// Provider settings rejected at construction time.
///
/// A provider that fails one of these checks is never built, so it can never
/// be handed to the scheduler. Checks run in field declaration order and the
/// first violation wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username is empty")]
    EmptyUsername,

    #[error("password is empty")]
    EmptyPassword,

    #[error("name is empty")]
    EmptyName,

    #[error("access key ID is empty")]
    EmptyAccessKeyId,

    #[error("access key secret is empty")]
    EmptyAccessKeySecret,

    /// The provider's API only updates the zone apex.
    #[error("{provider} can only update the bare domain, host must be \"@\" (got {host:?})")]
    HostOnlyApex { provider: &'static str, host: String },
}

/// Failures of a single update attempt.
///
/// Every provider maps its own failure modes onto this closed set, so callers
/// react uniformly without knowing provider schemas. None of these are fatal
/// to the process; each is scoped to one attempt against one provider.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The transport call could not be completed (connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status. Carries a single-line body excerpt, never the raw body.
    #[error("bad HTTP status {status}: {body}")]
    BadHttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not match the provider's declared schema.
    #[error("unparseable response: {0}")]
    UnparseableResponse(String),

    /// The provider explicitly reported an application-level failure.
    #[error("unsuccessful response: {message} (error code {code})")]
    Unsuccessful { code: String, message: String },

    /// A lookup-before-update step found no record matching the host.
    #[error("record not found")]
    RecordNotFound,

    /// The IP value the provider reported back could not be parsed.
    #[error("malformed IP received: {0:?}")]
    MalformedIp(String),

    /// The provider reported a well-formed IP that differs from the one
    /// requested. The record did not converge; this is a hard failure.
    #[error("IP mismatch: requested {requested}, received {received}")]
    IpMismatch { requested: IpAddr, received: IpAddr },
}

impl From<serde_json::Error> for UpdateError {
    fn from(e: serde_json::Error) -> Self {
        UpdateError::UnparseableResponse(e.to_string())
    }
}
