//! verbena-core server entry point.
//!
//! Starts the Axum HTTP server, the expiry sweep, the notifier, and the
//! write-behind persistence tasks.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use verbena_core::api;
use verbena_core::app_state::AppState;
use verbena_core::config::CoreConfig;
use verbena_core::domain::{
    DisputeRegistry, EventBus, ExperienceCatalog, MatchRegistry, UserRegistry,
};
use verbena_core::ledger::LedgerStore;
use verbena_core::persistence::{PostgresPersistence, WriterContext, writer};
use verbena_core::service::{DisputeService, MatchService, WalletService, notifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = CoreConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting verbena-core");

    // Build domain layer
    let ledger = Arc::new(LedgerStore::new());
    let matches = Arc::new(MatchRegistry::new());
    let disputes = Arc::new(DisputeRegistry::new());
    let users = Arc::new(UserRegistry::new());
    let catalog = Arc::new(ExperienceCatalog::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let wallet_service = WalletService::new(
        Arc::clone(&ledger),
        event_bus.clone(),
        config.min_top_up,
        config.platform_fee,
    );
    let match_service = Arc::new(MatchService::new(
        Arc::clone(&matches),
        Arc::clone(&users),
        Arc::clone(&catalog),
        wallet_service.clone(),
        event_bus.clone(),
        (&config).into(),
    ));
    let dispute_service = Arc::new(DisputeService::new(
        Arc::clone(&disputes),
        Arc::clone(&matches),
        Arc::clone(&users),
        wallet_service.clone(),
        event_bus.clone(),
        config.dispute_window_days,
    ));

    // Fire-and-forget notification boundary
    let _notifier = notifier::spawn(&event_bus);

    // Write-behind persistence
    if config.persistence_enabled {
        match sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                let persistence = PostgresPersistence::new(pool);
                let _writer = writer::spawn(
                    &event_bus,
                    WriterContext {
                        persistence: persistence.clone(),
                        matches: Arc::clone(&matches),
                        disputes: Arc::clone(&disputes),
                        ledger: Arc::clone(&ledger),
                        event_log_enabled: config.event_log_enabled,
                    },
                );
                if config.cleanup_after_days > 0 {
                    let days = config.cleanup_after_days;
                    tokio::spawn(async move {
                        let mut tick = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
                        loop {
                            tick.tick().await;
                            match persistence.delete_old_events(days).await {
                                Ok(deleted) if deleted > 0 => {
                                    tracing::info!(deleted, "old event rows cleaned up");
                                }
                                Ok(_) => {}
                                Err(err) => tracing::warn!(error = %err, "event cleanup failed"),
                            }
                        }
                    });
                }
                tracing::info!("persistence writer started");
            }
            Err(err) => {
                // The in-memory state stays authoritative; run degraded
                // rather than refuse to serve bookings.
                tracing::warn!(error = %err, "database unavailable; persistence disabled");
            }
        }
    }

    // 48 h auto-expire sweep
    {
        let match_service = Arc::clone(&match_service);
        let interval = Duration::from_secs(config.sweep_interval_secs);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tick.tick().await;
                match_service.expire_pending().await;
            }
        });
    }

    // Build application state
    let app_state = AppState {
        match_service,
        wallet_service: Arc::new(wallet_service),
        dispute_service,
        users,
        catalog,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", <api::ApiDoc as utoipa::OpenApi>::openapi()),
    );

    let app = app.with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
