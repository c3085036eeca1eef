// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Result};
use clap::Parser;
use edp_cd_pipeline_operator::{
    cluster::KubeClusterClient,
    config::Cli,
    constants::TOKIO_WORKER_THREADS,
    context::Context,
    controller::{run_cdpipeline_controller, run_stage_controller},
    health::{metrics_router, probe_router, serve, HealthState},
    leader::{leader_identity, Leadership},
    platform::{parse_bool, OperatorEnv, DEBUG_MODE_ENV},
};
use kube::Client;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error, info};

/// Output format of the process logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Development mode logs text, production mode logs JSON; `RUST_LOG_FORMAT` wins.
fn log_format(debug_mode: bool, format_override: Option<&str>) -> LogFormat {
    match format_override.map(str::to_lowercase).as_deref() {
        Some("json") => LogFormat::Json,
        Some("text") => LogFormat::Text,
        _ if debug_mode => LogFormat::Text,
        _ => LogFormat::Json,
    }
}

fn default_log_level(debug_mode: bool) -> &'static str {
    if debug_mode {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(debug_mode: bool) {
    // RUST_LOG overrides the level picked by DEBUG_MODE
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_level(debug_mode)));

    let format_override = std::env::var("RUST_LOG_FORMAT").ok();
    match log_format(debug_mode, format_override.as_deref()) {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("cd-pipeline-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let debug_mode = std::env::var(DEBUG_MODE_ENV)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false);
    init_logging(debug_mode);

    let env = OperatorEnv::from_env()?;
    let namespace = env.watch_namespace.clone();
    info!(
        namespace = %namespace,
        platform = %env.platform.platform,
        kiosk_enabled = env.platform.kiosk_enabled,
        leader_elect = cli.leader_elect,
        "Starting EDP CD pipeline operator"
    );

    let metrics_addr = cli.metrics_addr()?;
    let probe_addr = cli.health_probe_addr()?;

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    let health = HealthState::new();
    let metrics_server = tokio::spawn(serve("metrics", metrics_addr, metrics_router()));
    let probe_server = tokio::spawn(serve(
        "health probe",
        probe_addr,
        probe_router(health.clone()),
    ));

    let mut leadership = if cli.leader_elect {
        let identity = leader_identity(|key| std::env::var(key).ok());
        Some(Leadership::acquire(client.clone(), &namespace, identity).await?)
    } else {
        None
    };

    let ctx = Arc::new(Context::new(
        Arc::new(KubeClusterClient::new(client.clone())),
        env.platform,
    ));

    info!("Starting all controllers");
    health.set_ready(true);

    let result = tokio::select! {
        () = run_stage_controller(client.clone(), &namespace, ctx.clone()) => {
            error!("CRITICAL: Stage controller exited unexpectedly");
            Err(anyhow!("Stage controller exited unexpectedly"))
        }
        () = run_cdpipeline_controller(client.clone(), &namespace, ctx.clone()) => {
            error!("CRITICAL: CDPipeline controller exited unexpectedly");
            Err(anyhow!("CDPipeline controller exited unexpectedly"))
        }
        () = leadership_lost(&mut leadership) => {
            Err(anyhow!("leader election lease lost"))
        }
        result = metrics_server => server_exit("metrics", result),
        result = probe_server => server_exit("health probe", result),
        result = shutdown_signal() => result,
    };

    health.set_ready(false);
    info!("Stopping all controllers and releasing leader election lease...");
    if let Some(leadership) = leadership {
        leadership.release().await;
    }
    if result.is_ok() {
        info!("Graceful shutdown completed successfully");
    }
    result
}

async fn leadership_lost(leadership: &mut Option<Leadership>) {
    match leadership {
        Some(leadership) => leadership.lost().await,
        None => std::future::pending().await,
    }
}

fn server_exit(name: &str, result: Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Err(anyhow!("{name} server exited unexpectedly")),
        Ok(Err(e)) => Err(e.context(format!("{name} server failed"))),
        Err(e) => Err(anyhow!("{name} server task failed: {e}")),
    }
}

/// Wait for SIGTERM (pod termination) or SIGINT.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating graceful shutdown...");
    }
    Ok(())
}
