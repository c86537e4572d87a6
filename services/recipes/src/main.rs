use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod repositories;
mod routes;
mod state;
mod submission;
mod upload;
mod validation;

use common::database::{DatabaseConfig, init_pool};

use crate::{
    config::{AppConfig, StorageBackend},
    repositories::{InMemoryRecipeRepository, PgRecipeRepository, RecipeRepository},
    state::AppState,
    upload::ImageStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str())),
        )
        .init();

    info!("Starting recipe service");

    let config = AppConfig::from_env()?;

    let repository: Arc<dyn RecipeRepository> = match config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage; recipes are lost on restart");
            Arc::new(InMemoryRecipeRepository::new())
        }
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if common::database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let repository = PgRecipeRepository::new(pool);
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
    };

    let images = ImageStore::new(&config.upload_dir, config.max_upload_bytes);
    images.init().await?;

    let app = routes::create_router(AppState::new(repository, images));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Recipe service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Recipe service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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
