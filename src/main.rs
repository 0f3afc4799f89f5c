use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotelbook::api::{self, AppState};
use hotelbook::auth::JwtSessionVerifier;
use hotelbook::config::Config;
use hotelbook::engine::Engine;
use hotelbook::notify::{LogMailer, NotifyHub, spawn_mailer};
use hotelbook::payment::InMemoryPaymentGateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    hotelbook::observability::init(config.metrics_port)?;
    if config.uses_default_secret() {
        tracing::warn!("HOTELBOOK_JWT_SECRET not set, using the development secret");
    }

    // Ensure data directory exists
    std::fs::create_dir_all(&config.data_dir)?;

    let notify = Arc::new(NotifyHub::new());
    let payments = Arc::new(InMemoryPaymentGateway::new(config.payments_auto_confirm));
    let engine = Arc::new(
        Engine::new(config.wal_path(), payments, notify.clone())?.with_currency(&config.currency),
    );

    let mailer = spawn_mailer(&notify, Arc::new(LogMailer));
    let compactor = tokio::spawn(hotelbook::compactor::run_compactor(
        engine.clone(),
        config.compact_threshold,
    ));

    let app = api::router(AppState {
        engine,
        verifier: Arc::new(JwtSessionVerifier::new(&config.jwt_secret)),
    });

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("hotelbook listening on {addr}");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  compact_threshold: {}", config.compact_threshold);
    info!("  payments: {}", if config.payments_auto_confirm { "auto-confirm" } else { "manual" });
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    compactor.abort();
    mailer.abort();
    info!("hotelbook stopped");
    Ok(())
}

/// Resolves on SIGTERM or ctrl-c.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c.await;
    info!("shutdown signal received, draining requests");
}
