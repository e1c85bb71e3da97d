use clap::{Args, Subcommand};
use serde_json::json;

use super::{confirm, OutputFormat};
use crate::config::Config;
use crate::models::{AuditAction, AuditEntity, AuditLogEntry, Booking, Service};
use crate::store::Collection;
use crate::sync::SyncEngine;

#[derive(Args)]
pub struct ServiceCommand {
    #[command(subcommand)]
    pub command: ServiceSubcommand,
}

#[derive(Subcommand)]
pub enum ServiceSubcommand {
    /// Add a service to the catalog
    Add {
        /// Service name
        name: String,

        /// Price per hour
        #[arg(long)]
        price: f64,
    },

    /// List the service catalog
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update a service
    Update {
        /// Service ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New price per hour
        #[arg(long)]
        price: Option<f64>,
    },

    /// Enable or disable a service
    Toggle {
        /// Service ID
        id: String,
    },

    /// Remove a service from the catalog
    Delete {
        /// Service ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// Loads the catalog, seeding the default services on first use.
async fn load_catalog(engine: &SyncEngine) -> Result<Vec<Service>, Box<dyn std::error::Error>> {
    let catalog: Vec<Service> = engine.store().read(Collection::Services).await?;
    if !catalog.is_empty() {
        return Ok(catalog);
    }
    let defaults = Service::defaults();
    for service in &defaults {
        engine.save_service(service.clone()).await?;
    }
    println!("Seeded default service catalog");
    Ok(defaults)
}

impl ServiceCommand {
    pub async fn run(
        &self,
        engine: &SyncEngine,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ServiceSubcommand::Add { name, price } => {
                if name.trim().is_empty() {
                    return Err("Service name cannot be empty".into());
                }
                if *price <= 0.0 {
                    return Err("Price per hour must be positive".into());
                }

                let catalog = load_catalog(engine).await?;
                let service = Service::new(name.trim(), *price);
                if catalog
                    .iter()
                    .any(|s| s.normalized_name() == service.normalized_name())
                {
                    return Err(format!("A service named {} already exists", name.trim()).into());
                }

                engine.save_service(service.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Create,
                        AuditEntity::Service,
                        &service.id,
                        json!({ "name": service.name, "pricePerHour": service.price_per_hour }),
                        &config.user,
                    ))
                    .await?;

                println!("Added service {} at R$ {:.2}/h", service.name, service.price_per_hour);
                Ok(())
            }

            ServiceSubcommand::List { format } => {
                let mut catalog = load_catalog(engine).await?;
                catalog.sort_by(|a, b| a.name.cmp(&b.name));

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&catalog)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  {:<20}  {:>10}  STATUS", "ID", "NAME", "PRICE/H");
                        println!("{}", "-".repeat(80));
                        for service in &catalog {
                            println!(
                                "{:<36}  {:<20}  R$ {:>7.2}  {}",
                                service.id,
                                service.name,
                                service.price_per_hour,
                                if service.enabled { "enabled" } else { "disabled" },
                            );
                        }
                        println!("\nTotal: {} service(s)", catalog.len());
                    }
                }
                Ok(())
            }

            ServiceSubcommand::Update { id, name, price } => {
                let catalog: Vec<Service> = engine.store().read(Collection::Services).await?;
                let mut service = catalog
                    .iter()
                    .find(|s| &s.id == id)
                    .cloned()
                    .ok_or_else(|| format!("Service not found: {}", id))?;

                if let Some(name) = name {
                    let normalized = name.trim().to_lowercase();
                    if catalog
                        .iter()
                        .any(|s| s.id != service.id && s.normalized_name() == normalized)
                    {
                        return Err(format!("A service named {} already exists", name).into());
                    }
                    service.name = name.trim().to_string();
                }
                if let Some(price) = price {
                    if *price <= 0.0 {
                        return Err("Price per hour must be positive".into());
                    }
                    service.price_per_hour = *price;
                }

                service.touch();
                engine.save_service(service.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Update,
                        AuditEntity::Service,
                        &service.id,
                        json!({ "name": service.name, "pricePerHour": service.price_per_hour }),
                        &config.user,
                    ))
                    .await?;

                println!("Updated service {}", service.name);
                Ok(())
            }

            ServiceSubcommand::Toggle { id } => {
                let catalog: Vec<Service> = engine.store().read(Collection::Services).await?;
                let mut service = catalog
                    .iter()
                    .find(|s| &s.id == id)
                    .cloned()
                    .ok_or_else(|| format!("Service not found: {}", id))?;

                service.enabled = !service.enabled;
                service.touch();
                let state = if service.enabled { "enabled" } else { "disabled" };
                engine.save_service(service.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Update,
                        AuditEntity::Service,
                        &service.id,
                        json!({ "name": service.name, "enabled": service.enabled }),
                        &config.user,
                    ))
                    .await?;

                println!("Service {} is now {}", service.name, state);
                Ok(())
            }

            ServiceSubcommand::Delete { id, force } => {
                let catalog: Vec<Service> = engine.store().read(Collection::Services).await?;
                let service = catalog
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| format!("Service not found: {}", id))?;

                let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                let today = chrono::Utc::now().date_naive();
                let upcoming = bookings
                    .iter()
                    .filter(|b| {
                        b.date >= today && b.services.iter().any(|line| &line.service_id == id)
                    })
                    .count();
                if upcoming > 0 {
                    return Err(format!(
                        "Service {} is used by {} upcoming booking(s); disable it instead",
                        service.name, upcoming
                    )
                    .into());
                }

                if !confirm(&format!("Delete service {}?", service.name), *force) {
                    println!("Aborted");
                    return Ok(());
                }

                let name = service.name.clone();
                engine.delete_service(id).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Delete,
                        AuditEntity::Service,
                        id,
                        json!({ "name": name }),
                        &config.user,
                    ))
                    .await?;

                println!("Deleted service {}", name);
                Ok(())
            }
        }
    }
}
