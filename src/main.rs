use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threadstore::config::{AppConfig, StorageBackend};
use threadstore::http;
use threadstore::infra::db::Db;
use threadstore::store::{CommentStore, MemoryStore, PgStore};
use threadstore::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn CommentStore> = match (config.storage_backend, &config.db) {
        (StorageBackend::Postgres, Some(db_config)) => {
            let db = Db::connect(db_config).await?;
            db.ping().await?;
            tracing::info!("postgres storage active");
            Arc::new(PgStore::new(db))
        }
        (StorageBackend::Postgres, None) => {
            return Err(anyhow::anyhow!("postgres backend selected without database config"));
        }
        (StorageBackend::Memory, _) => {
            tracing::info!("in-memory storage active");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        store,
        default_page_size: config.default_page_size,
        max_page_size: config.max_page_size,
    };

    let app: Router = http::router(state).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

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
