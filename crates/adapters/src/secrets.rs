// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets vault contract (spec §6: "consumed, not owned"). The core never
//! reads environment variables directly (spec §6 "Environment"); tokens for
//! DNS/tunnel operations are read through hierarchical paths such as
//! `meta/cloudflare/dns_edit_token`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("no secret at path {0}")]
    NotFound(String),
}

#[async_trait]
pub trait SecretsVault: Clone + Send + Sync + 'static {
    async fn get(&self, key_path: &str) -> Result<String, SecretsError>;
    async fn set(&self, key_path: &str, value: &str) -> Result<(), SecretsError>;
}

/// In-memory vault. A real deployment backs this with an external secrets
/// manager behind the same trait; single-host scope keeps the reference
/// implementation in-process.
#[derive(Clone, Default)]
pub struct SystemSecretsVault {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl SystemSecretsVault {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretsVault for SystemSecretsVault {
    async fn get(&self, key_path: &str) -> Result<String, SecretsError> {
        self.inner
            .lock()
            .get(key_path)
            .cloned()
            .ok_or_else(|| SecretsError::NotFound(key_path.to_string()))
    }

    async fn set(&self, key_path: &str, value: &str) -> Result<(), SecretsError> {
        self.inner.lock().insert(key_path.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
