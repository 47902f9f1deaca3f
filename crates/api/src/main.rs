use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use quire_api::bootstrap;
use quire_api::config::{ServerConfig, StorageBackend};
use quire_api::router::build_app_router;
use quire_api::state::AppState;
use quire_core::store::memory::MemoryStore;
use quire_core::store::WikiStore;
use quire_core::workflow::WikiService;
use quire_db::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    let store = open_store(&config.storage).await?;
    bootstrap::load_initial_data(&*store, &config).await?;
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap::ensure_admin(&*store, admin).await?;
    }

    let wiki = Arc::new(WikiService::new(store, config.default_section.clone()));
    let addr = SocketAddr::new(
        config
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", config.host))?,
        config.port,
    );

    let state = AppState {
        wiki,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quire_api=debug,quire_db=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(backend: &StorageBackend) -> anyhow::Result<Arc<dyn WikiStore>> {
    match backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres { database_url } => {
            let pool = quire_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            quire_db::health_check(&pool)
                .await
                .context("Database health check failed")?;

            quire_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
