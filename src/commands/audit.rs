use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{confirm, OutputFormat};
use crate::models::{AuditAction, AuditEntity, AuditLogEntry, LogFilter, LogStats};
use crate::store::Collection;
use crate::sync::SyncEngine;

#[derive(Args)]
pub struct AuditCommand {
    #[command(subcommand)]
    pub command: AuditSubcommand,
}

#[derive(Subcommand)]
pub enum AuditSubcommand {
    /// List audit log entries, newest first
    List {
        /// Only this entity type
        #[arg(long, value_enum)]
        entity: Option<AuditEntity>,

        /// Only this action
        #[arg(long, value_enum)]
        action: Option<AuditAction>,

        /// Only this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Show at most this many entries
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Summary counts by action and entity
    Stats,

    /// Wipe the local audit log
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl AuditCommand {
    pub async fn run(&self, engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AuditSubcommand::List {
                entity,
                action,
                date,
                limit,
                format,
            } => {
                let entries: Vec<AuditLogEntry> =
                    engine.store().read(Collection::AuditLog).await?;
                let filter = LogFilter {
                    entity: *entity,
                    action: *action,
                    day: *date,
                };
                let selected: Vec<&AuditLogEntry> =
                    entries.iter().filter(|e| filter.matches(e)).take(*limit).collect();

                if selected.is_empty() {
                    println!("No audit entries found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&selected)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<20}  {:<8}  {:<8}  {:<36}  USER",
                            "TIMESTAMP", "ACTION", "ENTITY", "ENTITY ID"
                        );
                        println!("{}", "-".repeat(100));
                        for entry in &selected {
                            println!(
                                "{:<20}  {:<8}  {:<8}  {:<36}  {}",
                                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                                entry.action,
                                entry.entity,
                                entry.entity_id,
                                entry.user,
                            );
                        }
                        println!("\nShowing {} of {} entr(ies)", selected.len(), entries.len());
                    }
                }
                Ok(())
            }

            AuditSubcommand::Stats => {
                let entries: Vec<AuditLogEntry> =
                    engine.store().read(Collection::AuditLog).await?;
                let stats = LogStats::collect(&entries);

                println!("Total entries: {}", stats.total);
                println!("\nBy action:");
                for (action, count) in &stats.by_action {
                    println!("  {:<10} {}", action, count);
                }
                println!("\nBy entity:");
                for (entity, count) in &stats.by_entity {
                    println!("  {:<10} {}", entity, count);
                }
                Ok(())
            }

            AuditSubcommand::Clear { force } => {
                if !confirm("Wipe the local audit log?", *force) {
                    println!("Aborted");
                    return Ok(());
                }
                engine.clear_audit_log().await?;
                println!("Audit log cleared (local only)");
                Ok(())
            }
        }
    }
}
