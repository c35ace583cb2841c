// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor Daemon (svd)
//!
//! Background process that owns the `Store` and the Tool Dispatcher
//! (C11), the sole synchronous entry point spec §2 describes. Accepts
//! connections on a Unix socket framed per `sv_wire`, routes every
//! decoded request through `dispatch::handle`, and runs the named
//! background workers spec §5 requires.
//!
//! The daemon is normally started by the `sv` CLI the first time it
//! can't reach the socket and should not be invoked directly.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use parking_lot::Mutex;
use sv_daemon::config::{self, Config};
use sv_daemon::dispatch::{self, DispatchCtx};
use sv_daemon::lifecycle::{self, LifecycleError, StartupResult};
use sv_daemon::workers;
use sv_adapters::{
    CloudflareDnsClient, ContainerTunnelControl, DeploymentTunnelControl, SystemDockerProbe,
    SystemGitProbe, SystemPortAllocator, SystemProcessProbe, SystemSecretsVault,
    SystemTmuxChannel, SystemdTunnelControl,
};
use sv_engine::{HandoffOrchestrator, RestartManager, SystemHandoffEnvironment, Topology, TunnelManager};
use sv_wire::Response;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// Project tag used for infra-level health checks that aren't scoped to
/// any one supervised project (e.g. the tunnel Restart Manager).
const META_PROJECT: &str = "meta";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("svd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("svd {}", env!("CARGO_PKG_VERSION"));
                println!("Supervisor daemon - owns session/event/checkpoint state and the");
                println!("tool dispatch surface for the multi-tenant PS runtime.");
                println!();
                println!("The daemon is typically started by the `sv` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: svd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let cfg = Config::load()?;
    std::fs::create_dir_all(&cfg.state_dir)?;
    let _log_guard = setup_logging(&cfg)?;

    info!("starting supervisor daemon");

    let StartupResult { daemon, listener } = match lifecycle::startup(&cfg).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&cfg.lock_path).unwrap_or_default();
            eprintln!("svd is already running (pid: {})", pid.trim());
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            return Err(e.into());
        }
    };

    let ctx = Arc::new(build_dispatch_ctx(&cfg, daemon.store.clone()));
    let workers = workers::start(
        daemon.store.clone(),
        SystemTmuxChannel::new(),
        SystemProcessProbe::new(),
        Arc::clone(&ctx.topology),
        Arc::clone(&ctx.restart),
        config::health_sweep_interval(),
    );

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %cfg.socket_path.display(), "daemon ready");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(stream, ctx).await {
                                warn!(error = %err, "connection closed with error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                }
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    workers.shutdown().await;
    daemon.shutdown().await?;
    info!("daemon stopped");
    Ok(())
}

type Ctx = DispatchCtx<
    SystemPortAllocator,
    CloudflareDnsClient,
    DeploymentTunnelControl,
    SystemDockerProbe,
    SystemSecretsVault,
    SystemTmuxChannel,
    SystemHandoffEnvironment,
>;

/// Wire every adapter the dispatcher needs. Deployment topology (systemd
/// vs. container tunnel control) is a one-time decision made here from
/// `sv-daemon::config`, never re-derived per call (spec §4.8 step 7).
fn build_dispatch_ctx(cfg: &Config, store: Arc<Mutex<sv_storage::Store>>) -> Ctx {
    let (port_start, port_end) = config::port_range();
    let ports = SystemPortAllocator::new(port_start, port_end);
    let dns = CloudflareDnsClient::new(config::cloudflare_api_token(), config::cloudflare_zone_id());
    let tunnel_daemon = match config::tunnel_daemon_unit() {
        Some(unit) => DeploymentTunnelControl::Systemd(SystemdTunnelControl::new(unit)),
        None => DeploymentTunnelControl::Container(ContainerTunnelControl::new(config::tunnel_daemon_container())),
    };
    let tunnel = TunnelManager::new(
        ports.clone(),
        dns.clone(),
        tunnel_daemon.clone(),
        cfg.ingress_path.clone(),
        config::tunnel_hostname(),
        config::tunnel_id(),
        config::tunnel_credentials_file(),
    );
    let topology = Arc::new(Topology::new(SystemDockerProbe::new(), config::tunnel_daemon_container()));
    let restart = Arc::new(RestartManager::new(tunnel_daemon.clone(), META_PROJECT));
    let handoff = Arc::new(HandoffOrchestrator::new(
        SystemTmuxChannel::new(),
        SystemHandoffEnvironment { handoffs_dir: cfg.state_dir.join(".bmad/handoffs") },
        "clear",
    ));

    DispatchCtx {
        store,
        ports,
        tunnel_daemon,
        tunnel,
        topology,
        restart,
        secrets: SystemSecretsVault::new(),
        git: SystemGitProbe::new(),
        handoff,
        health_check_interval_secs: config::health_sweep_interval().as_secs() as i64,
    }
}

/// Read length-prefixed `sv_wire::Request`s off one connection until it
/// closes, dispatching each and writing back the matching `Response`
/// (spec §7: "never propagated `Err`" — only framing/IO failures end the
/// loop early).
async fn serve_connection(
    mut stream: impl AsyncRead + AsyncWrite + Unpin,
    ctx: Arc<Ctx>,
) -> Result<(), sv_wire::ProtocolError> {
    loop {
        let request = match sv_wire::read_request(&mut stream).await {
            Ok(r) => r,
            Err(sv_wire::ProtocolError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let response: Response = dispatch::handle(&ctx, request).await;
        sv_wire::write_response(&mut stream, &response).await?;
    }
}

fn setup_logging(
    cfg: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = cfg.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        cfg.log_path.parent().ok_or("daemon log path has no parent directory")?,
        cfg.log_path.file_name().ok_or("daemon log path has no file name")?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
