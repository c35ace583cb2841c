// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_core::TargetType;

fn record(subdomain: &str, project: &str) -> CnameRecord {
    CnameRecord {
        id: CnameId::new(),
        subdomain: subdomain.into(),
        domain: "tunnels.example.com".into(),
        target_service: "http://localhost:3105".into(),
        target_type: TargetType::Localhost,
        project: project.into(),
        dns_record_id: "dns-1".into(),
    }
}

#[test]
fn create_rejects_duplicate_hostname() {
    let mut store = CnameStore::default();
    store.create(record("consilio", "consilio")).unwrap();
    let err = store.create(record("consilio", "other")).unwrap_err();
    assert_eq!(err.kind, sv_core::ErrorKind::Conflict);
}

#[test]
fn get_by_hostname_finds_the_row() {
    let mut store = CnameStore::default();
    let row = record("consilio", "consilio");
    let hostname = row.hostname();
    store.create(row).unwrap();
    assert!(store.get_by_hostname(&hostname).is_some());
}

#[test]
fn delete_removes_the_row() {
    let mut store = CnameStore::default();
    let row = record("consilio", "consilio");
    let id = row.id.clone();
    store.create(row).unwrap();
    let deleted = store.delete(&id).unwrap();
    assert_eq!(deleted.subdomain, "consilio");
    assert!(store.get(&id).is_err());
}

#[test]
fn list_filters_by_project_and_orders_by_hostname() {
    let mut store = CnameStore::default();
    store.create(record("b-svc", "consilio")).unwrap();
    store.create(record("a-svc", "consilio")).unwrap();
    store.create(record("c-svc", "astrid")).unwrap();

    let consilio_rows = store.list(Some("consilio"));
    assert_eq!(consilio_rows.len(), 2);
    assert_eq!(consilio_rows[0].subdomain, "a-svc");

    assert_eq!(store.list(None).len(), 3);
}
