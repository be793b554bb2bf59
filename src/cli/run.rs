//! Run command implementation

use crate::cli::RunArgs;
use crate::config::{DiscoveryMode, RudderConfig};
use crate::control::{ControlLoop, CycleLog, CyclePhase};
use crate::converge::ConvergenceEngine;
use crate::fleet::Fleet;
use crate::ops::AppState;
use crate::probe::{HttpProber, Probe, ProbeScheduler};
use crate::providers::{HttpDiscovery, HttpRouter, StaticDiscovery, WorkerDiscovery};
use anyhow::Context;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &RunArgs) -> anyhow::Result<RudderConfig> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        RudderConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        RudderConfig::default()
    };

    // Apply environment variable overrides
    config = config.with_env_overrides();

    // Apply CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(interval) = args.interval {
        config.probe.interval_seconds = interval;
    }

    Ok(config)
}

/// Build the discovery collaborator from configuration.
pub fn build_discovery(config: &RudderConfig) -> Arc<dyn WorkerDiscovery> {
    match config.discovery.mode {
        DiscoveryMode::Static => Arc::new(StaticDiscovery::from_groups(&config.groups)),
        DiscoveryMode::Http => {
            let url = config
                .discovery
                .inventory_url
                .clone()
                .expect("validated: inventory_url present in http mode");
            Arc::new(HttpDiscovery::new(&config.discovery, url))
        }
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
}

/// Main run command handler
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    // 1. Load and merge configuration; invalid configuration is fatal here
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing and metrics
    crate::logging::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;
    let prometheus = crate::metrics::install_recorder()
        .context("failed to install metrics recorder")?;

    tracing::info!("Starting Rudder");
    tracing::debug!(?config, "Loaded configuration");

    if config.groups.is_empty() {
        tracing::warn!("No worker groups configured; the control loop will idle");
    }

    // 3. Assemble the steering pipeline
    let fleet = Arc::new(Fleet::new());
    let cycle_log = Arc::new(CycleLog::default());
    let phase = Arc::new(RwLock::new(CyclePhase::Idle));

    let discovery = build_discovery(&config);
    let prober: Arc<dyn Probe> = Arc::new(HttpProber::new(config.probe.clone()));
    let scheduler = ProbeScheduler::new(prober, config.probe.clone());
    let router = Arc::new(HttpRouter::new(&config.routing));
    let engine = ConvergenceEngine::new(router, config.converge);

    let control = ControlLoop::new(
        Arc::clone(&fleet),
        discovery,
        scheduler,
        engine,
        config.groups.clone(),
        Duration::from_secs(config.probe.interval_seconds),
        Arc::clone(&cycle_log),
        Arc::clone(&phase),
    );

    // 4. Start the control loop
    let cancel_token = CancellationToken::new();
    let control_handle = control.start(cancel_token.clone());

    // 5. Serve the operational API
    let state = Arc::new(AppState {
        fleet,
        cycle_log,
        phase,
        started_at: Instant::now(),
        prometheus,
    });
    let app = crate::ops::router(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "Operational API listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 6. Cleanup
    tracing::info!("Waiting for control loop to stop");
    control_handle.await?;

    tracing::info!("Rudder stopped");
    Ok(())
}
