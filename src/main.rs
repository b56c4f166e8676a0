use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley::config::{AppConfig, AppMode};
use parley::infra::mailer::{Mailer, SmtpMailer};
use parley::infra::{cache::RedisCache, db::Db, queue::QueueClient, storage::ObjectStorage};
use parley::{http, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let queue = QueueClient::new(&config).await?;
    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(&config)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    match config.app_mode {
        AppMode::Api => {
            let db = Db::connect(&config).await?;
            let cache = RedisCache::connect(&config.redis_url).await?;
            let storage = ObjectStorage::new(&config).await?;
            storage.ensure_bucket().await?;

            let state = AppState {
                db: db.clone(),
                cache,
                storage,
                queue: queue.clone(),
                session_ttl_hours: config.session_ttl_hours,
                auth_token_ttl_hours: config.auth_token_ttl_hours,
                upload_max_bytes: config.upload_max_bytes,
                upload_folder: config.s3_upload_folder.clone(),
                cookie_secure: config.cookie_secure,
            };

            let consumer = tokio::spawn(jobs::verify_email::run(
                queue,
                mailer,
                config.app_base_url.clone(),
                shutdown_rx,
            ));

            let app: Router = http::router(state);
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            let app = app.into_make_service_with_connect_info::<SocketAddr>();

            // Once the signal arrives, in-flight requests get a bounded grace
            // period before the server future is abandoned.
            let (signalled_tx, mut signalled_rx) = watch::channel(false);
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(true);
            });
            let server = tokio::spawn(async move { server.await });

            let grace = Duration::from_secs(config.shutdown_grace_seconds);
            let drained = async {
                let _ = signalled_rx.wait_for(|signalled| *signalled).await;
                tokio::time::sleep(grace).await;
            };

            tokio::select! {
                result = server => {
                    result??;
                }
                _ = drained => {
                    tracing::warn!(grace_seconds = config.shutdown_grace_seconds, "grace period elapsed, dropping open connections");
                }
            }

            let _ = shutdown_tx.send(true);
            match consumer.await {
                Ok(Err(err)) => tracing::error!(error = ?err, "verify email consumer failed"),
                Err(err) => tracing::error!(error = ?err, "verify email consumer panicked"),
                Ok(Ok(())) => {}
            }
            db.close().await;
        }
        AppMode::Worker => {
            tracing::info!("starting worker mode");
            let consumer = tokio::spawn(jobs::verify_email::run(
                queue,
                mailer,
                config.app_base_url.clone(),
                shutdown_rx,
            ));
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
            consumer.await??;
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
