// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_client_rejects_unknown_zone() {
    use crate::fakes::FakeDnsClient;

    let dns = FakeDnsClient::new();
    dns.add_zone("example.com");
    assert!(dns.is_known_zone("example.com").await.unwrap());
    assert!(!dns.is_known_zone("other.com").await.unwrap());
}

#[tokio::test]
async fn fake_client_create_then_delete_leaves_no_record() {
    use crate::fakes::FakeDnsClient;

    let dns = FakeDnsClient::new();
    dns.add_zone("example.com");
    let record = dns.create_cname("demo.example.com", "tunnel-abc.cfargotunnel.com").await.unwrap();
    assert!(dns.hostname_taken("demo.example.com").await.unwrap());

    dns.delete_cname(&record.record_id).await.unwrap();
    assert!(!dns.hostname_taken("demo.example.com").await.unwrap());
}
