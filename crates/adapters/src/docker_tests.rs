// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_probe_reports_seeded_containers() {
    use crate::fakes::FakeDockerProbe;

    let probe = FakeDockerProbe::new();
    probe.seed(ContainerInfo {
        id: "c1".into(),
        name: "svc".into(),
        image: "svc:latest".into(),
        status: "running".into(),
        networks: vec!["net-a".into()],
        ports: vec![(8080, 8080)],
    });

    let containers = probe.list_containers().await.unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(probe.container_networks("svc").await.unwrap(), vec!["net-a".to_string()]);
}
