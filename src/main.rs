// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use ibdns::constants::{DEFAULT_METRICS_BIND_ADDRESS, METRICS_PATH, TOKIO_WORKER_THREADS};
use ibdns::context::Context;
use ibdns::metrics::gather_metrics;
use ibdns::record_controller::run_controller;
use kube::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Kubernetes operator converging `DNSRecord` resources into Infoblox.
#[derive(Debug, Parser)]
#[command(name = "ibdns", version, about)]
struct Args {
    /// Address the Prometheus metrics endpoint listens on
    #[arg(long, default_value = DEFAULT_METRICS_BIND_ADDRESS)]
    metrics_bind_address: SocketAddr,

    /// Only watch `DNSRecord` resources in this namespace (all namespaces when omitted)
    #[arg(long)]
    namespace: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("ibdns-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
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

async fn async_main(args: Args) -> Result<()> {
    init_logging();
    info!("Starting Infoblox DNSRecord controller");
    debug!(?args, "Parsed command line");

    let client = Client::try_default()
        .await
        .context("failed to initialize Kubernetes client")?;

    let cancel = CancellationToken::new();
    let ctx = Arc::new(Context::new(client, cancel.clone()));

    tokio::spawn(cancel_on_shutdown_signal(cancel.clone()));

    tokio::try_join!(
        run_controller(ctx, args.namespace),
        run_metrics_server(args.metrics_bind_address, cancel.clone()),
    )?;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel `cancel` on SIGINT or SIGTERM.
async fn cancel_on_shutdown_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                info!("Received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down");
    }

    cancel.cancel();
}

/// Serve the Prometheus registry until `cancel` fires.
async fn run_metrics_server(addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
    let app = Router::new().route(METRICS_PATH, get(metrics_handler));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics endpoint on {addr}"))?;
    info!("Serving metrics on http://{addr}{METRICS_PATH}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("metrics server failed")
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
