use std::net::SocketAddr;

use anyhow::Result;
use bookscout::application::{ServerConfig, serve};
use bookscout::infrastructure::openlibrary::OPENLIBRARY_URL;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "bookscout", about = "Book discovery API server", version)]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(
        long,
        env = "BOOKSCOUT_BIND_ADDRESS",
        default_value = "0.0.0.0:8000"
    )]
    bind_address: SocketAddr,

    /// SQLite database URL.
    #[arg(
        long,
        env = "BOOKSCOUT_DATABASE_URL",
        default_value = "sqlite://bookscout.db"
    )]
    database_url: String,

    /// Base URL of the Open Library API.
    #[arg(long, env = "BOOKSCOUT_OPENLIBRARY_URL", default_value = OPENLIBRARY_URL)]
    openlibrary_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    serve(ServerConfig {
        bind_address: cli.bind_address,
        database_url: cli.database_url,
        openlibrary_url: cli.openlibrary_url,
    })
    .await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}
