use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zoneguard_api::config::ServerConfig;
use zoneguard_api::router::build_app_router;
use zoneguard_api::state::AppState;
use zoneguard_core::store::{MappingStore, SuppressionLedger};
use zoneguard_events::{EventBus, EventPersistence};
use zoneguard_provider::{BlacklistClient, ProviderConfig, ReportingClient, ReportingConfig};
use zoneguard_suppression::{
    InMemoryLedger, InMemoryMappingStore, SuppressionSettings, Suppressor,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "zoneguard_api=debug,zoneguard_suppression=debug,zoneguard_provider=debug,tower_http=debug"
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let events_cancel = CancellationToken::new();

    // --- Storage ---
    let (ledger, mappings, persistence_handle) = connect_storage(&event_bus, &events_cancel).await;

    // --- Provider and reporting clients ---
    let provider_config = ProviderConfig::from_env();
    if provider_config.is_configured() {
        tracing::info!(
            provider = %provider_config.name,
            timeout_ms = provider_config.timeout.as_millis() as u64,
            "Provider gateway configured",
        );
    } else {
        tracing::warn!(
            missing = ?provider_config.missing(),
            "Provider gateway not configured; sync, verify and revert will report configured=false",
        );
    }
    let gateway =
        BlacklistClient::new(provider_config).expect("Failed to build provider HTTP client");

    let reporting_config = ReportingConfig::from_env();
    if !reporting_config.is_configured() {
        tracing::warn!("REPORTING_BASE_URL not set; callers must supply campaigns and snapshots");
    }
    let reporting =
        ReportingClient::new(reporting_config).expect("Failed to build reporting HTTP client");

    let settings = SuppressionSettings::from_env();
    tracing::info!(
        concurrency = settings.concurrency,
        call_timeout_ms = settings.call_timeout.as_millis() as u64,
        "Suppression settings loaded",
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        suppressor: Suppressor {
            ledger,
            mappings,
            gateway: Arc::new(gateway),
            reporting: Arc::new(reporting),
            events: Arc::clone(&event_bus),
            settings,
        },
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    events_cancel.cancel();
    if let Some(handle) = persistence_handle {
        let drain = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(drain, handle).await.is_err() {
            tracing::warn!("Event persistence did not drain before the shutdown timeout");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Postgres stores and the audit writer when `DATABASE_URL` is set,
/// in-memory stores otherwise.
async fn connect_storage(
    event_bus: &EventBus,
    events_cancel: &CancellationToken,
) -> (
    Arc<dyn SuppressionLedger>,
    Arc<dyn MappingStore>,
    Option<JoinHandle<()>>,
) {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set; using in-memory storage, state is lost on restart");
        return (
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryMappingStore::new()),
            None,
        );
    };

    let pool = zoneguard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    zoneguard_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    zoneguard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let persistence_handle = tokio::spawn(EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
        events_cancel.clone(),
    ));
    tracing::info!("Event persistence started");

    (
        Arc::new(zoneguard_db::PgSuppressionLedger::new(pool.clone())),
        Arc::new(zoneguard_db::PgMappingStore::new(pool)),
        Some(persistence_handle),
    )
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
