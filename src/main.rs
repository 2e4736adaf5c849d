use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use geeknews::config::{DispatchConfig, ServerConfig};
use geeknews::mail::SandboxMailer;
use geeknews::server::{AppState, create_router};
use geeknews::store::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, SqliteStore, Store, seed_default_admin,
};

#[derive(Parser)]
#[command(name = "geeknews")]
#[command(about = "A news portal server with favorites and newsletter campaigns", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// Data directory for the database and uploaded images
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Maximum concurrent sends during a campaign dispatch
        #[arg(long, default_value = "16")]
        send_concurrency: usize,

        /// Per-recipient send timeout in seconds
        #[arg(long, default_value = "10")]
        send_timeout_secs: u64,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and seed the admin account)
    Init {
        /// Data directory for the database and uploaded images
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;
    fs::create_dir_all(config.uploads_dir())?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    Ok(store)
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };

    let store = open_store(&config)?;
    let seeded = seed_default_admin(&store)?;

    println!();
    println!("========================================");
    println!("Database ready at: {}", config.db_path().display());
    match seeded {
        Some(_) => {
            println!();
            println!("Seeded admin account:");
            println!();
            println!("  {DEFAULT_ADMIN_EMAIL} / {DEFAULT_ADMIN_PASSWORD}");
            println!();
            println!("Rotate this password before exposing the server.");
        }
        None => println!("Admin account already present."),
    }
    println!("========================================");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("geeknews=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => {
                run_init(data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            send_concurrency,
            send_timeout_secs,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
            };

            let store = open_store(&config)?;
            seed_default_admin(&store)?;

            let dispatch = DispatchConfig {
                max_in_flight: send_concurrency.max(1),
                send_timeout: Duration::from_secs(send_timeout_secs),
            };

            let state = Arc::new(AppState::new(
                Arc::new(store),
                Arc::new(SandboxMailer::new()),
                config.data_dir.clone(),
                dispatch,
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
