// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DNS provider contract (spec §1: "Cloudflare/GCloud API clients —
//! consumed via the narrow interfaces in §6"). The Tunnel Manager (C9)
//! creates/removes CNAME records and checks zone membership through this
//! trait; it never talks to a provider API directly.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("unknown zone: {0}")]
    UnknownZone(String),
    #[error("record not found: {0}")]
    RecordNotFound(String),
    #[error("provider request failed: {0}")]
    ProviderFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub record_id: String,
    pub hostname: String,
    pub target: String,
    pub proxied: bool,
}

#[async_trait]
pub trait DnsClient: Clone + Send + Sync + 'static {
    /// True if `domain` is a zone this provider account manages (spec
    /// §4.8 step 3).
    async fn is_known_zone(&self, domain: &str) -> Result<bool, DnsError>;

    /// True if a CNAME already exists for the fully-qualified hostname
    /// (spec §4.8 step 2).
    async fn hostname_taken(&self, hostname: &str) -> Result<bool, DnsError>;

    /// Create a proxied CNAME record pointing at the tunnel's stable
    /// hostname, TTL auto (spec §4.8 step 5).
    async fn create_cname(&self, hostname: &str, target: &str) -> Result<DnsRecord, DnsError>;

    /// Delete a previously created record (spec §4.8 rollback / deletion).
    async fn delete_cname(&self, record_id: &str) -> Result<(), DnsError>;
}

/// Cloudflare API-backed DNS client. Grounded on the pack's precedent for
/// talking to an HTTP JSON API from a Rust service (`reqwest` + a bearer
/// token read from the secrets vault) rather than a hand-rolled HTTP client.
#[derive(Clone)]
pub struct CloudflareDnsClient {
    http: reqwest::Client,
    api_token: String,
    zone_id: String,
}

impl CloudflareDnsClient {
    pub fn new(api_token: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), api_token: api_token.into(), zone_id: zone_id.into() }
    }

    fn base_url(&self) -> String {
        format!("https://api.cloudflare.com/client/v4/zones/{}/dns_records", self.zone_id)
    }
}

#[derive(serde::Deserialize)]
struct CfRecord {
    id: String,
    name: String,
    content: String,
    proxied: bool,
}

#[derive(serde::Deserialize)]
struct CfListResponse {
    result: Vec<CfRecord>,
}

#[async_trait]
impl DnsClient for CloudflareDnsClient {
    async fn is_known_zone(&self, domain: &str) -> Result<bool, DnsError> {
        let resp = self
            .http
            .get("https://api.cloudflare.com/client/v4/zones")
            .bearer_auth(&self.api_token)
            .query(&[("name", domain)])
            .send()
            .await
            .map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        let body: serde_json::Value =
            resp.json().await.map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        Ok(body["result"].as_array().is_some_and(|r| !r.is_empty()))
    }

    async fn hostname_taken(&self, hostname: &str) -> Result<bool, DnsError> {
        let resp = self
            .http
            .get(self.base_url())
            .bearer_auth(&self.api_token)
            .query(&[("type", "CNAME"), ("name", hostname)])
            .send()
            .await
            .map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        let body: CfListResponse =
            resp.json().await.map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        Ok(!body.result.is_empty())
    }

    async fn create_cname(&self, hostname: &str, target: &str) -> Result<DnsRecord, DnsError> {
        let resp = self
            .http
            .post(self.base_url())
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "type": "CNAME",
                "name": hostname,
                "content": target,
                "proxied": true,
                "ttl": 1,
            }))
            .send()
            .await
            .map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        let body: serde_json::Value =
            resp.json().await.map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        let record: CfRecord = serde_json::from_value(body["result"].clone())
            .map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        Ok(DnsRecord {
            record_id: record.id,
            hostname: record.name,
            target: record.content,
            proxied: record.proxied,
        })
    }

    async fn delete_cname(&self, record_id: &str) -> Result<(), DnsError> {
        let url = format!("{}/{}", self.base_url(), record_id);
        let resp = self
            .http
            .delete(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| DnsError::ProviderFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(DnsError::RecordNotFound(record_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod tests;
