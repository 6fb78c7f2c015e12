use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use taskhub_api::config::ServerConfig;
use taskhub_api::router::build_app_router;
use taskhub_api::state::AppState;
use taskhub_api::storage::LocalBlobStore;
use taskhub_api::ws::{self, RoomRegistry};
use taskhub_db::{MemoryStore, PgStore, Store};

const DEFAULT_LOG_FILTER: &str = "taskhub_api=debug,taskhub_db=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, uploads = %config.upload_dir.display(), "Configuration loaded");

    let store = open_store(&config).await;

    let rooms = Arc::new(RoomRegistry::new());
    let heartbeat = ws::start_heartbeat(Arc::clone(&rooms));

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        rooms: Arc::clone(&rooms),
        blobs: Arc::new(LocalBlobStore::new(config.upload_dir.clone())),
    };
    let app = build_app_router(state, &config);

    let ip = config
        .host
        .parse()
        .unwrap_or_else(|_| panic!("HOST is not an IP address: {}", config.host));
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot bind {addr}: {e}"));
    tracing::info!(%addr, "Taskhub API listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server terminated with an error");
    }

    // Sockets outlive the HTTP listener; close them explicitly.
    let open = rooms.connection_count().await;
    tracing::info!(open, "Closing realtime connections");
    rooms.shutdown_all().await;
    heartbeat.abort();

    tracing::info!("Shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Postgres when `DATABASE_URL` is set, otherwise a process-local store.
async fn open_store(config: &ServerConfig) -> Arc<dyn Store> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; documents live in memory and vanish on restart");
        return Arc::new(MemoryStore::new());
    };

    let pool = taskhub_db::create_pool(url)
        .await
        .expect("database connection failed");
    taskhub_db::run_migrations(&pool)
        .await
        .expect("database migrations failed");
    tracing::info!("Postgres store ready");

    Arc::new(PgStore::new(pool))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl-C received, draining"),
        () = terminate => tracing::info!("SIGTERM received, draining"),
    }
}
