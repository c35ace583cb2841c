// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sv_adapters::fakes::{FakeDockerProbe, FakePortAllocator};

fn container(name: &str, networks: &[&str], ports: &[(u16, u16)]) -> ContainerInfo {
    ContainerInfo {
        id: format!("id-{name}"),
        name: name.to_string(),
        image: "img".to_string(),
        status: "running".to_string(),
        networks: networks.iter().map(|s| s.to_string()).collect(),
        ports: ports.to_vec(),
    }
}

#[tokio::test]
async fn prefers_a_container_sharing_a_network_with_the_daemon() {
    let probe = FakeDockerProbe::new();
    probe.seed(container("cloudflared", &["app-net"], &[]));
    probe.seed(container("consilio-web", &["app-net"], &[(3105, 3105)]));
    let topo = Topology::new(probe, "cloudflared".to_string());
    topo.poll(Utc::now()).await;

    let ports = FakePortAllocator::new();
    let target = topo.select_target(&ports, "consilio", 3105, "127.0.0.1").await;
    assert_eq!(target, SelectedTarget::Container { name: "consilio-web".to_string(), port: 3105 });
    assert_eq!(target.url(), Some("http://consilio-web:3105".to_string()));
}

#[tokio::test]
async fn falls_back_to_localhost_when_no_shared_network_but_port_is_live() {
    let probe = FakeDockerProbe::new();
    probe.seed(container("cloudflared", &["app-net"], &[]));
    probe.seed(container("consilio-web", &["other-net"], &[(3105, 3105)]));
    let topo = Topology::new(probe, "cloudflared".to_string());
    topo.poll(Utc::now()).await;

    let ports = FakePortAllocator::new();
    ports.set_live(3105, true);
    let target = topo.select_target(&ports, "consilio", 3105, "127.0.0.1").await;
    assert_eq!(target, SelectedTarget::Localhost { port: 3105 });
    assert_eq!(target.url(), Some("http://localhost:3105".to_string()));
}

#[tokio::test]
async fn reports_unreachable_with_a_diagnostic_when_nothing_matches() {
    let probe = FakeDockerProbe::new();
    probe.seed(container("cloudflared", &["app-net"], &[]));
    let topo = Topology::new(probe, "cloudflared".to_string());
    topo.poll(Utc::now()).await;

    let ports = FakePortAllocator::new();
    let target = topo.select_target(&ports, "consilio", 3105, "127.0.0.1").await;
    match target {
        SelectedTarget::Unreachable { daemon_networks, recommendation, .. } => {
            assert_eq!(daemon_networks, vec!["app-net".to_string()]);
            assert!(recommendation.contains("app-net"));
        }
        other => panic!("expected Unreachable, got {other:?}"),
    }
    assert!(matches!(target.target_type(), sv_core::TargetType::External));
}

#[tokio::test]
async fn poll_prunes_entries_older_than_stale_threshold() {
    let probe = FakeDockerProbe::new();
    probe.seed(container("stale-one", &["app-net"], &[(3105, 3105)]));
    let topo = Topology::new(probe.clone(), "cloudflared".to_string());

    let t0 = Utc::now();
    topo.poll(t0).await;
    probe.clear();
    let later = t0 + chrono::Duration::seconds(STALE_AFTER_SECS + 1);
    topo.poll(later).await;

    let ports = FakePortAllocator::new();
    let target = topo.select_target(&ports, "stale-one", 3105, "127.0.0.1").await;
    assert!(matches!(target, SelectedTarget::Unreachable { .. }), "stale container must have been pruned");
}
