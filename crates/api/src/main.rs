use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crm_api::config::ServerConfig;
use crm_api::router::build_app_router;
use crm_api::state::AppState;
use crm_api::telemetry;
use crm_db::migrate::{Runner, SqlFileSet};
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("crm_api=debug,crm_db=info,tower_http=debug")?;

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    // --- Database ---
    let pool = crm_db::create_pool(&config.database.pool_settings())
        .await
        .context("Failed to connect to database")?;
    crm_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool ready"
    );

    if config.run_migrations {
        let files = SqlFileSet::from_dir(&config.database.migrations_dir)?;
        let report = Runner::migrations().run(&pool, &files).await?;
        tracing::info!(applied = report.applied.len(), "Database migrations applied");
    }

    // --- Router ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address {:?}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);

    let state = AppState::new(pool, config);
    let app = build_app_router(state.clone());

    // --- Serve ---
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "Starting server");

    let signalled = Arc::new(Notify::new());
    let serve = axum::serve(listener, app).with_graceful_shutdown({
        let signalled = Arc::clone(&signalled);
        async move {
            shutdown_signal().await;
            signalled.notify_one();
        }
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        result = &mut server => result??,
        () = signalled.notified() => {
            match tokio::time::timeout(drain, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!(
                        drain_secs = drain.as_secs(),
                        "In-flight requests did not drain in time, aborting",
                    );
                    server.abort();
                }
            }
        }
    }

    // --- Post-shutdown cleanup ---
    state.teardown().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
