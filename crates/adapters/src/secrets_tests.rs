// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn missing_secret_errors_not_found() {
    let vault = SystemSecretsVault::new();
    let err = vault.get("meta/cloudflare/dns_edit_token").await.unwrap_err();
    assert!(matches!(err, SecretsError::NotFound(_)));
}

#[tokio::test]
async fn set_then_get_roundtrips() {
    let vault = SystemSecretsVault::new();
    vault.set("meta/cloudflare/dns_edit_token", "tok-123").await.unwrap();
    assert_eq!(vault.get("meta/cloudflare/dns_edit_token").await.unwrap(), "tok-123");
}
