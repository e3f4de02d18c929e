//! # knxhubd: knxhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`knxhub.toml` plus environment overrides)
//! - Initialise logging
//! - Load the device, webhook and sensor catalogs and the auth code
//! - Open the configured history backend
//! - Start the connection supervisor, the startup resync and the
//!   environmental bridge
//! - Build the axum router over the bridge service, bind and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod auth;
mod config;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use knxhub_adapter_catalog_json::CatalogLoader;
use knxhub_adapter_http_axum::router;
use knxhub_adapter_http_axum::state::AppState;
use knxhub_adapter_virtual_bus::VirtualBus;
use knxhub_adapter_web_reqwest::{HttpClient, HttpClientConfig};
use knxhub_app::bus_handle::BusHandle;
use knxhub_app::dispatcher::Dispatcher;
use knxhub_app::env_bridge::EnvironmentalBridge;
use knxhub_app::notification::NotificationTrigger;
use knxhub_app::ports::BusConnection;
use knxhub_app::resolver::RoleResolver;
use knxhub_app::resync::ResyncDriver;
use knxhub_app::services::bridge_service::BridgeService;
use knxhub_app::state_store::StateStore;
use knxhub_app::supervisor::ConnectionSupervisor;
use knxhub_domain::connection::ConnectionState;

use crate::config::Config;
use crate::storage::HistorySink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    std::fs::create_dir_all(&config.data.dir)
        .with_context(|| format!("creating data directory {}", config.data.dir.display()))?;
    let catalog = CatalogLoader::new(&config.data.dir).load();
    let devices = Arc::new(catalog.devices);
    let auth_code = auth::load_or_create(&config.data.dir);

    // State
    let sink = HistorySink::open(&config)
        .await
        .context("opening history backend")?;
    let store = Arc::new(StateStore::new(sink));

    // Dispatch
    let webhooks = HttpClient::new(HttpClientConfig {
        request_timeout: Duration::from_millis(config.webhooks.request_timeout_ms),
        ..HttpClientConfig::default()
    })?;
    let resolver = RoleResolver::new(&devices);
    if resolver.is_empty() {
        tracing::warn!("no group address indexed, inbound telegrams will be ignored");
    }
    tracing::info!(
        addresses = resolver.len(),
        collisions = resolver.collisions(),
        "group address index built"
    );
    let dispatcher = Dispatcher::new(
        Arc::new(resolver),
        Arc::clone(&store),
        Arc::new(NotificationTrigger::new(webhooks, catalog.webhooks)),
    );

    // Bus
    let bus = BusHandle::new();
    let gateway = VirtualBus::from_catalog(&devices);
    let supervisor = ConnectionSupervisor::new(gateway, bus.clone(), dispatcher, config.supervisor());
    let connection = supervisor.subscribe();
    let mut tasks = vec![supervisor.start()];

    let resync = ResyncDriver::new(Arc::clone(&devices), bus.clone(), config.resync());
    if config.resync.on_startup {
        tasks.push(tokio::spawn(resync_once_connected(resync.clone(), connection)));
    }

    if config.bridge.enabled && !catalog.sensors.is_empty() {
        let sensors = HttpClient::new(HttpClientConfig {
            request_timeout: Duration::from_millis(config.bridge.request_timeout_ms),
            ..HttpClientConfig::default()
        })?;
        let bridge = EnvironmentalBridge::new(
            sensors,
            catalog.sensors,
            bus.clone(),
            Duration::from_secs(config.bridge.period_secs),
        );
        tasks.push(bridge.start());
    }

    // HTTP
    let service = Arc::new(BridgeService::new(devices, store, bus, resync));
    let app = router::build(AppState::new(service, auth_code));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "knxhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for task in tasks {
        task.abort();
    }
    tracing::info!("knxhubd stopped");
    Ok(())
}

/// Run the startup resync as soon as the supervisor reports a connection.
async fn resync_once_connected<C>(resync: ResyncDriver<C>, mut connection: watch::Receiver<ConnectionState>)
where
    C: BusConnection + 'static,
{
    if connection.wait_for(|state| state.is_connected()).await.is_err() {
        return;
    }
    if let Some(run) = resync.start()
        && let Err(err) = run.await
    {
        tracing::error!(error = ?err, "startup resync task failed");
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = ?err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
