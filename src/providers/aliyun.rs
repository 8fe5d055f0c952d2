//! Aliyun (alidns) provider.
//!
//! Speaks the signed RPC protocol of the alidns endpoint: every call carries
//! an HMAC-SHA1 signature over the canonicalized query. Updating is a two
//! step sequence, list the domain records keyed by host, then update the
//! matched record by its identifier.

use super::{single_line_excerpt, Provider, ProviderKind};
use crate::error::{UpdateError, ValidationError};
use crate::ipversion::IpVersion;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::Sha1;
use std::collections::BTreeMap;
use std::net::IpAddr;

type HmacSha1 = Hmac<Sha1>;

const DEFAULT_REGION: &str = "cn-hangzhou";
const API_VERSION: &str = "2015-01-09";

/// Aliyun provider.
#[derive(Debug)]
pub struct AliyunProvider {
    domain: String,
    host: String,
    ip_version: IpVersion,
    access_key_id: String,
    access_secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordListResponse {
    #[serde(default)]
    domain_records: DomainRecords,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainRecords {
    #[serde(default)]
    record: Vec<DomainRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainRecord {
    record_id: String,
    #[serde(rename = "RR")]
    rr: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateRecordResponse {
    #[serde(default)]
    record_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl AliyunProvider {
    /// Create a new Aliyun provider, validating its settings.
    pub fn new(
        domain: String,
        host: String,
        ip_version: IpVersion,
        access_key_id: String,
        access_secret: String,
        region: Option<String>,
    ) -> Result<Self, ValidationError> {
        if access_key_id.is_empty() {
            return Err(ValidationError::EmptyAccessKeyId);
        }
        if access_secret.is_empty() {
            return Err(ValidationError::EmptyAccessKeySecret);
        }

        let region = region.unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            domain,
            host,
            ip_version,
            access_key_id,
            access_secret,
            base_url: format!("https://alidns.{region}.aliyuncs.com"),
        })
    }

    /// Override the API endpoint (for testing).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Perform one signed RPC call and decode its JSON response.
    async fn call<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        action: &str,
        action_params: &[(&str, &str)],
    ) -> Result<T, UpdateError> {
        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("AccessKeyId".to_string(), self.access_key_id.clone());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert(
            "SignatureNonce".to_string(),
            rand::random::<u64>().to_string(),
        );
        params.insert(
            "Timestamp".to_string(),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        for (key, value) in action_params {
            params.insert((*key).to_string(), (*value).to_string());
        }

        let signature = sign(&self.access_secret, &string_to_sign("GET", &params));
        params.insert("Signature".to_string(), signature);

        let response = client.get(&self.base_url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                if !api_error.code.is_empty() {
                    return Err(UpdateError::Unsuccessful {
                        code: api_error.code,
                        message: api_error.message,
                    });
                }
            }
            return Err(UpdateError::BadHttpStatus {
                status,
                body: single_line_excerpt(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Provider for AliyunProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Aliyun
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
        let record_type = if ip.is_ipv4() { "A" } else { "AAAA" };

        let list: RecordListResponse = self
            .call(
                client,
                "DescribeDomainRecords",
                &[
                    ("DomainName", self.domain.as_str()),
                    ("RRKeyWord", self.host.as_str()),
                ],
            )
            .await?;

        // RR casing is not consistent across the API, match case-insensitively.
        let record = list
            .domain_records
            .record
            .iter()
            .find(|record| record.rr.eq_ignore_ascii_case(&self.host))
            .ok_or(UpdateError::RecordNotFound)?;

        // Same-value updates are rejected as duplicates, so a record that
        // already holds the requested IP is confirmed as-is.
        if record
            .value
            .trim()
            .parse::<IpAddr>()
            .is_ok_and(|current| current == ip)
        {
            return Ok(ip);
        }

        let ip_value = ip.to_string();
        let updated: UpdateRecordResponse = self
            .call(
                client,
                "UpdateDomainRecord",
                &[
                    ("RecordId", record.record_id.as_str()),
                    ("RR", self.host.as_str()),
                    ("Type", record_type),
                    ("Value", ip_value.as_str()),
                ],
            )
            .await?;
        tracing::debug!("updated record {} to {}", updated.record_id, ip);

        Ok(ip)
    }
}

/// Percent-encode per the RPC signature rules (RFC 3986 unreserved set).
fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Canonicalize sorted parameters into the string covered by the signature.
fn string_to_sign(method: &str, params: &BTreeMap<String, String>) -> String {
    let canonical = params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method, percent_encode("/"), percent_encode(&canonical))
}

/// HMAC-SHA1 over the canonical string, keyed by the secret plus "&".
fn sign(access_secret: &str, string_to_sign: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(format!("{access_secret}&").as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}
