use clap::{Args, Subcommand};
use serde_json::json;

use super::{confirm, OutputFormat};
use crate::config::Config;
use crate::dedup::DuplicateDetector;
use crate::models::{
    AuditAction, AuditEntity, AuditLogEntry, Booking, Client, DocumentKind,
};
use crate::store::Collection;
use crate::sync::SyncEngine;

#[derive(Args)]
pub struct ClientCommand {
    #[command(subcommand)]
    pub command: ClientSubcommand,
}

#[derive(Subcommand)]
pub enum ClientSubcommand {
    /// Register a new client
    Add {
        /// Document kind
        #[arg(long, value_enum, default_value = "cpf")]
        kind: DocumentKind,

        /// CPF or CNPJ
        #[arg(long)]
        document: String,

        /// Legal name
        #[arg(long)]
        full_name: String,

        /// Artistic name (shown everywhere)
        #[arg(long)]
        artistic_name: String,

        /// Contact phone
        #[arg(long)]
        phone: String,

        /// Contact email
        #[arg(long)]
        email: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Register even when possible duplicates are found
        #[arg(long, short)]
        force: bool,
    },

    /// List all clients
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a client's details
    Show {
        /// Client ID
        id: String,
    },

    /// Update an existing client
    Update {
        /// Client ID
        id: String,

        /// New document
        #[arg(long)]
        document: Option<String>,

        /// New legal name
        #[arg(long)]
        full_name: Option<String>,

        /// New artistic name
        #[arg(long)]
        artistic_name: Option<String>,

        /// New phone
        #[arg(long)]
        phone: Option<String>,

        /// New email
        #[arg(long)]
        email: Option<String>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,

        /// Apply even when possible duplicates are found
        #[arg(long, short)]
        force: bool,
    },

    /// Delete a client
    Delete {
        /// Client ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn print_matches(matches: &crate::dedup::MatchSet) {
    println!("Possible duplicates found:");
    for m in matches.sorted_matches() {
        println!(
            "  [{}] {:.0}%  {} ({})",
            m.kind.label(),
            m.confidence * 100.0,
            m.client.display_name(),
            m.client.kind.format(&m.client.document),
        );
    }
}

impl ClientCommand {
    pub async fn run(
        &self,
        engine: &SyncEngine,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ClientSubcommand::Add {
                kind,
                document,
                full_name,
                artistic_name,
                phone,
                email,
                notes,
                force,
            } => {
                if full_name.trim().is_empty() || artistic_name.trim().is_empty() {
                    return Err("Client name cannot be empty".into());
                }
                if !kind.validates(document) {
                    return Err(format!("Invalid {}: {}", kind, document).into());
                }

                let mut client = Client::new(
                    *kind,
                    document.trim(),
                    full_name.trim(),
                    artistic_name.trim(),
                    phone.trim(),
                );
                if let Some(email) = email {
                    client = client.with_email(email.trim());
                }
                if let Some(notes) = notes {
                    client = client.with_notes(notes.trim());
                }

                let roster: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let matches = DuplicateDetector::find_matches(&client, &roster, None);
                if !matches.is_empty() {
                    print_matches(&matches);
                    if !force {
                        return Err(
                            "Refusing to register; pass --force to register anyway".into()
                        );
                    }
                }

                engine.save_client(client.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Create,
                        AuditEntity::Client,
                        &client.id,
                        json!({ "artisticName": client.artistic_name }),
                        &config.user,
                    ))
                    .await?;

                println!("Registered client {} ({})", client.display_name(), client.id);
                Ok(())
            }

            ClientSubcommand::List { format } => {
                let mut clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                if clients.is_empty() {
                    println!("No clients found");
                    return Ok(());
                }
                clients.sort_by(|a, b| a.artistic_name.cmp(&b.artistic_name));

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&clients)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<24}  {:<20}  {:>6}  {:>8}",
                            "ID", "NAME", "DOCUMENT", "HOURS", "SESSIONS"
                        );
                        println!("{}", "-".repeat(100));
                        for client in &clients {
                            println!(
                                "{:<36}  {:<24}  {:<20}  {:>6}  {:>8}",
                                client.id,
                                client.display_name(),
                                client.kind.format(&client.document),
                                client.total_hours,
                                client.total_sessions,
                            );
                        }
                        println!("\nTotal: {} client(s)", clients.len());
                    }
                }
                Ok(())
            }

            ClientSubcommand::Show { id } => {
                let clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let client = clients
                    .iter()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| format!("Client not found: {}", id))?;

                println!("{}", serde_json::to_string_pretty(client)?);
                Ok(())
            }

            ClientSubcommand::Update {
                id,
                document,
                full_name,
                artistic_name,
                phone,
                email,
                notes,
                force,
            } => {
                let clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let mut client = clients
                    .iter()
                    .find(|c| &c.id == id)
                    .cloned()
                    .ok_or_else(|| format!("Client not found: {}", id))?;

                if let Some(document) = document {
                    if !client.kind.validates(document) {
                        return Err(format!("Invalid {}: {}", client.kind, document).into());
                    }
                    client.document = document.trim().to_string();
                }
                if let Some(full_name) = full_name {
                    client.full_name = full_name.trim().to_string();
                }
                if let Some(artistic_name) = artistic_name {
                    client.artistic_name = artistic_name.trim().to_string();
                }
                if let Some(phone) = phone {
                    client.phone = phone.trim().to_string();
                }
                if let Some(email) = email {
                    client.email = Some(email.trim().to_string());
                }
                if let Some(notes) = notes {
                    client.notes = Some(notes.trim().to_string());
                }

                let matches = DuplicateDetector::find_matches(&client, &clients, Some(id));
                if !matches.is_empty() {
                    print_matches(&matches);
                    if !force {
                        return Err("Refusing to update; pass --force to apply anyway".into());
                    }
                }

                client.touch();
                engine.save_client(client.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Update,
                        AuditEntity::Client,
                        &client.id,
                        json!({ "artisticName": client.artistic_name }),
                        &config.user,
                    ))
                    .await?;

                println!("Updated client {}", client.display_name());
                Ok(())
            }

            ClientSubcommand::Delete { id, force } => {
                let clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let client = clients
                    .iter()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| format!("Client not found: {}", id))?;

                let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                let today = chrono::Utc::now().date_naive();
                let upcoming = bookings
                    .iter()
                    .filter(|b| &b.client_id == id && b.date >= today)
                    .count();
                if upcoming > 0 {
                    return Err(format!(
                        "Client {} has {} upcoming booking(s); cancel them first",
                        client.display_name(),
                        upcoming
                    )
                    .into());
                }

                if !confirm(
                    &format!("Delete client {}?", client.display_name()),
                    *force,
                ) {
                    println!("Aborted");
                    return Ok(());
                }

                let name = client.display_name().to_string();
                engine.delete_client(id).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Delete,
                        AuditEntity::Client,
                        id,
                        json!({ "artisticName": name }),
                        &config.user,
                    ))
                    .await?;

                println!("Deleted client {}", name);
                Ok(())
            }
        }
    }
}
