// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CNAME / ingress domain types for the Tunnel Manager.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a CNAME row.
    pub struct CnameId("cn--");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Localhost,
    Container,
    External,
}

crate::simple_display! {
    TargetType {
        Localhost => "localhost",
        Container => "container",
        External => "external",
    }
}

/// A DNS alias from a fully-qualified hostname to the tunnel's stable
/// hostname, with one corresponding ingress rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnameRecord {
    pub id: CnameId,
    pub subdomain: String,
    pub domain: String,
    pub target_service: String,
    pub target_type: TargetType,
    pub project: String,
    pub dns_record_id: String,
}

impl CnameRecord {
    pub fn hostname(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }
}

/// A single `hostname -> service URL` entry in the tunnel daemon's ordered
/// ingress rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub hostname: String,
    pub service: String,
}

/// The tunnel daemon's config file shape (spec §6: three top-level keys;
/// `ingress` is ordered and always ends in a catch-all).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressConfig {
    pub tunnel: String,
    #[serde(rename = "credentials-file")]
    pub credentials_file: String,
    pub ingress: Vec<IngressConfigEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngressConfigEntry {
    Rule { hostname: String, service: String },
    CatchAll { service: CatchAllService },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchAllService {
    pub http_status: u16,
}

impl IngressConfig {
    /// Build a fresh config with only the catch-all entry.
    pub fn empty(tunnel: impl Into<String>, credentials_file: impl Into<String>) -> Self {
        Self {
            tunnel: tunnel.into(),
            credentials_file: credentials_file.into(),
            ingress: vec![IngressConfigEntry::CatchAll { service: CatchAllService { http_status: 404 } }],
        }
    }

    /// Insert or replace the rule for `hostname`, preserving catch-all-last.
    pub fn upsert_rule(&mut self, hostname: &str, service: &str) {
        let existing = self.ingress.iter_mut().find(|e| matches!(e, IngressConfigEntry::Rule { hostname: h, .. } if h == hostname));
        if let Some(IngressConfigEntry::Rule { service: s, .. }) = existing {
            *s = service.to_string();
            return;
        }
        let insert_at = self.ingress.len().saturating_sub(1);
        self.ingress.insert(insert_at, IngressConfigEntry::Rule { hostname: hostname.to_string(), service: service.to_string() });
    }

    /// Remove the rule for `hostname`, if present.
    pub fn remove_rule(&mut self, hostname: &str) {
        self.ingress.retain(|e| !matches!(e, IngressConfigEntry::Rule { hostname: h, .. } if h == hostname));
    }

    /// True if exactly one rule exists for `hostname` and the catch-all is last.
    pub fn is_well_formed_for(&self, hostname: &str) -> bool {
        let count = self
            .ingress
            .iter()
            .filter(|e| matches!(e, IngressConfigEntry::Rule { hostname: h, .. } if h == hostname))
            .count();
        let catch_all_last = matches!(self.ingress.last(), Some(IngressConfigEntry::CatchAll { .. }));
        count == 1 && catch_all_last
    }
}
