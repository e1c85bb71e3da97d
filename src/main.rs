use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use studiodesk::commands::{
    AuditCommand, BookingCommand, ClientCommand, ConfigCommand, DataCommand, ReportCommand,
    ServiceCommand, SyncCommand,
};
use studiodesk::config::Config;
use studiodesk::remote::{Disconnected, HttpRemoteStore, RemoteStore};
use studiodesk::store::{init_db, LocalStore};
use studiodesk::sync::SyncEngine;

#[derive(Parser)]
#[command(name = "studiodesk")]
#[command(version)]
#[command(about = "Business management for a home recording studio", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clients
    Client(ClientCommand),

    /// Manage studio bookings
    Booking(BookingCommand),

    /// Manage the service catalog
    Service(ServiceCommand),

    /// Inspect the audit trail
    Audit(AuditCommand),

    /// Financial and hours reports
    Report(ReportCommand),

    /// Synchronize with the remote server
    Sync(SyncCommand),

    /// Export and import backups
    Data(DataCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "studiodesk=warn".into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    // config-only commands don't need the database
    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let pool = init_db(config.database_path.clone()).await?;
    let store = LocalStore::new(pool);
    let remote: Arc<dyn RemoteStore> = match (&config.sync.server_url, &config.sync.api_key) {
        (Some(url), Some(key)) => Arc::new(HttpRemoteStore::new(url.clone(), key.clone())),
        _ => Arc::new(Disconnected),
    };
    let engine = Arc::new(SyncEngine::new(store, remote));

    match command {
        Commands::Client(cmd) => cmd.run(&engine, &config).await,
        Commands::Booking(cmd) => cmd.run(&engine, &config).await,
        Commands::Service(cmd) => cmd.run(&engine, &config).await,
        Commands::Audit(cmd) => cmd.run(&engine).await,
        Commands::Report(cmd) => cmd.run(&engine).await,
        Commands::Sync(cmd) => cmd.run(engine.clone(), &config).await,
        Commands::Data(cmd) => cmd.run(&engine).await,
        Commands::Config(_) => unreachable!(),
    }
}
