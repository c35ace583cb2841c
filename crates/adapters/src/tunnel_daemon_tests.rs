// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_control_reports_configured_activity() {
    use crate::fakes::FakeTunnelDaemonControl;

    let control = FakeTunnelDaemonControl::new();
    assert!(control.is_active().await.unwrap());

    control.set_fail_next_reload(true);
    let err = control.reload().await.unwrap_err();
    assert!(matches!(err, TunnelDaemonError::NotActive));
}
