//! npdash server - NodePass dashboard backend
//!
//! Serves the dashboard REST API and relays tunnel control actions to the
//! NodePass agents that own the tunnel processes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use npdash_api::{ApiServer, ApiServerConfig, NodePassClient};

/// npdash - NodePass dashboard backend
#[derive(Parser, Debug)]
#[command(name = "npdash")]
#[command(about = "npdash - NodePass dashboard backend")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run migrations and serve the dashboard API
    #[command(long_about = r#"
Start the dashboard API server. Pending database migrations are applied
before the server begins accepting requests.

EXAMPLES:
  # Serve against a local SQLite file
  npdash serve --database-url "sqlite://npdash.db?mode=rwc"

  # Serve against PostgreSQL on all interfaces
  npdash serve --bind 0.0.0.0:8080 \
    --database-url "postgres://npdash:secret@db/npdash"

ENVIRONMENT VARIABLES:
  NPDASH_BIND          Address to bind the API server
  NPDASH_DATABASE_URL  Database connection URL
    "#)]
    Serve {
        /// Address to bind the API server (e.g. 127.0.0.1:8080)
        #[arg(long, env = "NPDASH_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        /// Database connection URL
        #[arg(
            long,
            env = "NPDASH_DATABASE_URL",
            default_value = "sqlite://npdash.db?mode=rwc"
        )]
        database_url: String,

        /// Disable the development CORS layer
        #[arg(long)]
        no_cors: bool,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Database connection URL
        #[arg(
            long,
            env = "NPDASH_DATABASE_URL",
            default_value = "sqlite://npdash.db?mode=rwc"
        )]
        database_url: String,
    },
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            bind,
            database_url,
            no_cors,
        } => {
            info!("npdash {} starting...", env!("CARGO_PKG_VERSION"));

            let db = npdash_db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            npdash_db::migrate(&db)
                .await
                .context("Failed to run migrations")?;

            let nodepass = NodePassClient::new().context("Failed to build NodePass client")?;

            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: !no_cors,
            };

            let server = ApiServer::new(config, db, nodepass);

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, shutting down...");
                    Ok(())
                }
                result = server.start() => result,
            }
        }

        Commands::Migrate { database_url } => {
            let db = npdash_db::connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            npdash_db::migrate(&db)
                .await
                .context("Failed to run migrations")?;

            info!("Migrations applied");
            Ok(())
        }
    }
}
