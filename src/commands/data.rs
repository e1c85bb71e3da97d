use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::confirm;
use crate::models::{AuditLogEntry, Booking, Client, Service};
use crate::store::Collection;
use crate::sync::{SyncEngine, SyncError};

/// Full local data set as one portable JSON document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Backup {
    #[serde(default)]
    clients: Vec<Client>,
    #[serde(default)]
    bookings: Vec<Booking>,
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    audit_log: Vec<AuditLogEntry>,
}

#[derive(Args)]
pub struct DataCommand {
    #[command(subcommand)]
    pub command: DataSubcommand,
}

#[derive(Subcommand)]
pub enum DataSubcommand {
    /// Export all local data to a JSON file (or stdout)
    Export {
        /// Output file; stdout when omitted
        output: Option<PathBuf>,
    },

    /// Replace all local data from a JSON backup
    Import {
        /// Backup file produced by `data export`
        input: PathBuf,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl DataCommand {
    pub async fn run(&self, engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DataSubcommand::Export { output } => {
                let backup = Backup {
                    clients: engine.store().read(Collection::Clients).await?,
                    bookings: engine.store().read(Collection::Bookings).await?,
                    services: engine.store().read(Collection::Services).await?,
                    audit_log: engine.store().read(Collection::AuditLog).await?,
                };
                let json = serde_json::to_string_pretty(&backup)?;

                match output {
                    Some(path) => {
                        std::fs::write(path, json)?;
                        println!(
                            "Exported {} client(s), {} booking(s), {} service(s) to {}",
                            backup.clients.len(),
                            backup.bookings.len(),
                            backup.services.len(),
                            path.display()
                        );
                    }
                    None => println!("{}", json),
                }
                Ok(())
            }

            DataSubcommand::Import { input, force } => {
                let contents = std::fs::read_to_string(input)?;
                let backup: Backup = serde_json::from_str(&contents)?;

                if !confirm(
                    &format!(
                        "Replace all local data with {} client(s), {} booking(s), {} service(s)?",
                        backup.clients.len(),
                        backup.bookings.len(),
                        backup.services.len()
                    ),
                    *force,
                ) {
                    println!("Aborted");
                    return Ok(());
                }

                let store = engine.store();
                store.replace(Collection::Clients, &backup.clients).await?;
                store.replace(Collection::Bookings, &backup.bookings).await?;
                store.replace(Collection::Services, &backup.services).await?;
                store.replace(Collection::AuditLog, &backup.audit_log).await?;
                println!("Imported backup");

                // push the imported data; staying offline is fine
                for (collection, result) in engine.reconcile_all().await {
                    if let Err(SyncError::RemoteUnavailable(_)) = result {
                        println!(
                            "{} not pushed (offline); will sync later",
                            collection.remote_name()
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
