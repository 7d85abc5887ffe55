// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP service bootstrap

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use expensa_core::application::{create_repositories, ExpensaServices, ServiceSettings};
use expensa_core::domain::service_config::ServiceConfig;
use expensa_core::infrastructure::nlu::{create_provider, SessionRegistry};
use expensa_core::infrastructure::EventBus;
use expensa_core::presentation::{app, AppState};

pub async fn run(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ServiceConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;
    if let Some(host) = host {
        config.spec.server.bind_address = host;
    }
    if let Some(port) = port {
        config.spec.server.port = port;
    }
    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Configuration loaded: {}", config.metadata.name);

    install_metrics_exporter(&config)?;

    // Initialize services
    let backend = config.storage_backend()?;
    let repositories = create_repositories(&backend)
        .await
        .context("Failed to initialize storage")?;
    let event_bus = EventBus::new(config.spec.push.capacity);
    let nlu = create_provider(&config.spec.nlu).context("Failed to initialize NLU provider")?;
    if let Err(e) = nlu.health_check().await {
        warn!("NLU provider health check failed: {}", e);
    }

    let sessions = Arc::new(SessionRegistry::new(Duration::from_secs(
        config.spec.sessions.idle_timeout_seconds,
    )));
    let sweeper = sessions.spawn_sweeper(Duration::from_secs(
        config.spec.sessions.sweep_interval_seconds,
    ));

    let services = ExpensaServices::build(
        repositories,
        Arc::new(event_bus.clone()),
        nlu,
        sessions,
        &ServiceSettings::from_config(&config),
    );
    let router = app(Arc::new(AppState::new(services, event_bus)));

    // Start HTTP server
    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Expensa listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    sweeper.abort();
    info!("Expensa shutting down");

    Ok(())
}

fn install_metrics_exporter(config: &ServiceConfig) -> Result<()> {
    let metrics = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.clone())
        .unwrap_or_default();
    if !metrics.enabled {
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", config.spec.server.bind_address, metrics.port)
        .parse()
        .with_context(|| format!("Invalid metrics address for port {}", metrics.port))?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
