//! Process Usage Server
//!
//! Accepts per-process resource usage samples over http and stores them in
//! postgres, or in memory for local runs.
//!
//! Env variables:
//!  - `PROCESS_USAGE_LISTEN_ENDPOINT` : address the http server binds to
//!  - `PROCESS_USAGE_SQL_CONNECTION_STRING` : postgres connection string
//!  - `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_HOST`, `POSTGRES_DB` :
//!    used to build the connection string when none is given
//!  - `RUST_LOG` : log filter, `info` by default

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use process_usage::handlers::SharedProcessStore;
use process_usage::store::{MemoryProcessStore, PgProcessStore, connect_to_process_db};
use process_usage::web_service::make_router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Process Usage Server")]
#[command(about = "Process Usage Server", version, author)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[arg(
        long,
        default_value = "0.0.0.0:8000",
        env = "PROCESS_USAGE_LISTEN_ENDPOINT"
    )]
    listen_endpoint_http: SocketAddr,

    #[command(subcommand)]
    store: StoreSpec,
}

#[derive(Subcommand, Debug)]
enum StoreSpec {
    /// Keep processes in memory, they are lost on exit
    Memory,
    /// Keep processes in a postgres database
    Postgres {
        #[arg(long, env = "PROCESS_USAGE_SQL_CONNECTION_STRING")]
        db_uri: Option<String>,

        #[arg(long, default_value = "10", env = "PROCESS_USAGE_DB_MAX_CONNECTIONS")]
        max_connections: u32,

        #[arg(
            long,
            default_value = "5",
            env = "PROCESS_USAGE_DB_ACQUIRE_TIMEOUT_SECONDS"
        )]
        acquire_timeout_seconds: u64,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn make_store(spec: StoreSpec) -> Result<SharedProcessStore> {
    match spec {
        StoreSpec::Memory => {
            warn!("processes are kept in memory and will be lost on exit");
            Ok(Arc::new(MemoryProcessStore::new()))
        }
        StoreSpec::Postgres {
            db_uri,
            max_connections,
            acquire_timeout_seconds,
        } => {
            let db_uri = match db_uri {
                Some(db_uri) => db_uri,
                None => config::connection_string_from_env()?,
            };
            let pool = connect_to_process_db(
                &db_uri,
                max_connections,
                Duration::from_secs(acquire_timeout_seconds),
            )
            .await?;
            Ok(Arc::new(PgProcessStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Error waiting for ctrl-c: {e}");
    }
    info!("shutting down");
}

async fn serve_http(listen_endpoint: SocketAddr, store: SharedProcessStore) -> Result<()> {
    let app = make_router(store);
    let listener = tokio::net::TcpListener::bind(listen_endpoint)
        .await
        .with_context(|| format!("binding {listen_endpoint}"))?;
    info!("Server running on {listen_endpoint}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "serving http")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Cli::parse();
    let store = make_store(args.store).await?;
    serve_http(args.listen_endpoint_http, store).await
}
