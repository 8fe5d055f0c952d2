//! DonDominio provider.
//!
//! Form-encoded POST to the simple API. The response reports the glue record
//! values after the update, which lets the new IP be confirmed directly.

use super::{single_line_excerpt, verify_reported_ip, Provider, ProviderKind};
use crate::error::{UpdateError, ValidationError};
use crate::ipversion::IpVersion;
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;

const DEFAULT_BASE_URL: &str = "https://simple-api.dondominio.net";

/// DonDominio provider.
#[derive(Debug)]
pub struct DonDominioProvider {
    domain: String,
    host: String,
    ip_version: IpVersion,
    username: String,
    password: String,
    name: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "errorCode", default)]
    error_code: i64,
    #[serde(rename = "errorCodeMsg", default)]
    error_code_msg: String,
    #[serde(rename = "responseData", default)]
    response_data: ResponseData,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseData {
    #[serde(rename = "gluerecords", default)]
    glue_records: Vec<GlueRecord>,
}

#[derive(Debug, Deserialize)]
struct GlueRecord {
    #[serde(default)]
    ipv4: String,
    #[serde(default)]
    ipv6: String,
}

impl DonDominioProvider {
    /// Create a new DonDominio provider, validating its settings.
    pub fn new(
        domain: String,
        host: String,
        ip_version: IpVersion,
        username: String,
        password: String,
        name: String,
    ) -> Result<Self, ValidationError> {
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        // The simple API only writes glue records on the bare domain.
        if host != "@" {
            return Err(ValidationError::HostOnlyApex {
                provider: "dondominio",
                host,
            });
        }

        Ok(Self {
            domain,
            host,
            ip_version,
            username,
            password,
            name,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API endpoint (for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl Provider for DonDominioProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DonDominio
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn ip_version(&self) -> IpVersion {
        self.ip_version
    }

    async fn update(&self, client: &reqwest::Client, ip: IpAddr) -> Result<IpAddr, UpdateError> {
        let ip_value = ip.to_string();
        let ip_param = if ip.is_ipv4() { "ipv4" } else { "ipv6" };
        let params = [
            ("apiuser", self.username.as_str()),
            ("apipasswd", self.password.as_str()),
            ("domain", self.domain.as_str()),
            ("name", self.name.as_str()),
            (ip_param, ip_value.as_str()),
        ];

        let response = client
            .post(&self.base_url)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpdateError::BadHttpStatus {
                status,
                body: single_line_excerpt(&body),
            });
        }

        let parsed: ApiResponse = serde_json::from_str(&body)?;

        if !parsed.success {
            return Err(UpdateError::Unsuccessful {
                code: parsed.error_code.to_string(),
                message: parsed.error_code_msg,
            });
        }

        let glue = parsed
            .response_data
            .glue_records
            .first()
            .ok_or_else(|| {
                UpdateError::UnparseableResponse("response contains no glue records".to_string())
            })?;

        let reported = if ip.is_ipv4() { &glue.ipv4 } else { &glue.ipv6 };
        verify_reported_ip(ip, reported)
    }
}
