use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::application::routes::app_router;
use crate::application::state::AppState;
use crate::domain::external::ExternalCatalog;
use crate::infrastructure::database::Database;
use crate::infrastructure::openlibrary::OpenLibraryClient;

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub openlibrary_url: String,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let database = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    #[allow(clippy::expect_used)]
    let http_client = reqwest::ClientBuilder::new()
        .user_agent(concat!("bookscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client");

    let catalog: Arc<dyn ExternalCatalog> = Arc::new(
        OpenLibraryClient::new(http_client, &config.openlibrary_url)
            .context("invalid Open Library base URL")?,
    );

    let state = AppState::from_database(&database, catalog);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    let app = app_router(state);

    info!(
        address = %config.bind_address,
        database = %config.database_url,
        "starting HTTP server"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server terminated unexpectedly")?;

    info!("server shutdown complete");

    Ok(())
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if signal handlers fail
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
