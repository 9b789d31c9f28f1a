use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lightdesk_bot::config::BotConfig;
use lightdesk_bot::dispatcher::Dispatcher;
use lightdesk_bot::docx::DocxRenderer;
use lightdesk_bot::poller::{self, BackoffConfig};
use lightdesk_bot::routes;
use lightdesk_bot::state::BotState;
use lightdesk_bot::telegram::TelegramApi;
use lightdesk_bot::tokens::DownloadTokens;
use lightdesk_db::PgStore;
use lightdesk_vault::YandexDiskApi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lightdesk_bot=debug,lightdesk_db=info,tower_http=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = BotConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        admins = config.admin_ids.len(),
        root = %config.folders.root,
        health_addr = %config.health_addr,
        "Loaded bot configuration",
    );

    // --- Database ---
    let pool = lightdesk_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    lightdesk_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    lightdesk_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let telegram = TelegramApi::new(&config.bot_token, Duration::from_secs(config.poll_timeout_secs))
        .context("Failed to build Telegram client")?;
    let vault = YandexDiskApi::new(&config.yandex_token).context("Failed to build Yandex Disk client")?;

    let state = BotState {
        messenger: Arc::new(telegram.clone()),
        store: Arc::new(PgStore::new(pool.clone())),
        vault: Arc::new(vault),
        renderer: Arc::new(DocxRenderer),
        folders: Arc::new(config.folders.clone()),
        admins: Arc::new(config.admin_ids.clone()),
        tokens: Arc::new(DownloadTokens::default()),
    };

    let cancel = CancellationToken::new();

    // --- Health endpoint ---
    let app = Router::new()
        .merge(routes::health::router(pool.clone()))
        .layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.health_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.health_addr))?;
    tracing::info!("Health endpoint listening on {}", config.health_addr);

    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Health server failed");
        }
    });

    // --- Signals ---
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        signal_cancel.cancel();
    });

    // --- Polling ---
    let mut dispatcher = Dispatcher::new(state);
    poller::run(
        &telegram,
        &mut dispatcher,
        config.poll_timeout_secs,
        &BackoffConfig::default(),
        &cancel,
    )
    .await;

    // --- Post-shutdown cleanup ---
    tracing::info!(chats = dispatcher.active_chats(), "Draining chat workers");
    dispatcher.shutdown().await;

    let _ = tokio::time::timeout(Duration::from_secs(5), server_handle).await;
    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
