use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand};
use serde_json::json;

use super::{confirm, OutputFormat};
use crate::config::Config;
use crate::models::{
    AuditAction, AuditEntity, AuditLogEntry, Booking, BookingService, Client, Service,
    CLOSING_HOUR, OPENING_HOUR,
};
use crate::store::Collection;
use crate::sync::SyncEngine;

#[derive(Args)]
pub struct BookingCommand {
    #[command(subcommand)]
    pub command: BookingSubcommand,
}

#[derive(Subcommand)]
pub enum BookingSubcommand {
    /// Book a studio session
    Add {
        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Start time on the hour grid (HH:MM)
        #[arg(long)]
        time: String,

        /// Duration in hours
        #[arg(long)]
        duration: i64,

        /// Client ID
        #[arg(long)]
        client: String,

        /// Service line as NAME or NAME=HOURS (can be repeated;
        /// hours default to the session duration)
        #[arg(long = "service", value_name = "SPEC")]
        services: Vec<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List bookings
    List {
        /// Only this date
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Only this client
        #[arg(long)]
        client: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a booking's details
    Show {
        /// Booking ID
        id: String,
    },

    /// Record the activities completed during a session
    Activities {
        /// Booking ID
        id: String,

        /// What was done
        text: String,
    },

    /// Cancel a booking
    Delete {
        /// Booking ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

/// Parses a `NAME` or `NAME=HOURS` service spec against the catalog.
fn resolve_service(
    spec: &str,
    catalog: &[Service],
    default_hours: i64,
) -> Result<BookingService, String> {
    let (name, hours) = match spec.split_once('=') {
        Some((name, hours)) => {
            let hours: i64 = hours
                .trim()
                .parse()
                .map_err(|_| format!("Invalid hours in service spec '{}'", spec))?;
            (name.trim(), hours)
        }
        None => (spec.trim(), default_hours),
    };
    if hours < 1 {
        return Err(format!("Service hours must be at least 1: '{}'", spec));
    }

    let wanted = name.to_lowercase();
    let service = catalog
        .iter()
        .find(|s| s.normalized_name() == wanted)
        .ok_or_else(|| format!("Unknown service: {}", name))?;
    if !service.enabled {
        return Err(format!("Service {} is disabled", service.name));
    }

    Ok(BookingService {
        service_id: service.id.clone(),
        service_name: service.name.clone(),
        price_per_hour: service.price_per_hour,
        hours,
    })
}

impl BookingCommand {
    pub async fn run(
        &self,
        engine: &SyncEngine,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            BookingSubcommand::Add {
                date,
                time,
                duration,
                client,
                services,
                notes,
            } => {
                if *duration < 1 {
                    return Err("Duration must be at least 1 hour".into());
                }
                let start_time = NaiveTime::parse_from_str(time, "%H:%M")
                    .map_err(|_| format!("Invalid time: {} (expected HH:MM)", time))?;

                let clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let owner = clients
                    .iter()
                    .find(|c| &c.id == client)
                    .ok_or_else(|| format!("Client not found: {}", client))?;

                let mut booking = Booking::new(
                    *date,
                    start_time,
                    *duration,
                    &owner.id,
                    owner.display_name(),
                    &owner.document,
                    &owner.phone,
                );
                if !booking.within_opening_hours() {
                    return Err(format!(
                        "Sessions run on the hour between {:02}:00 and {:02}:00",
                        OPENING_HOUR, CLOSING_HOUR
                    )
                    .into());
                }

                let existing: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                if let Some(taken) = existing.iter().find(|b| booking.conflicts_with(b)) {
                    return Err(format!(
                        "Time slot already booked by {} ({:02}:00-{:02}:00)",
                        taken.client_name,
                        taken.start_hour(),
                        taken.end_hour()
                    )
                    .into());
                }

                let catalog: Vec<Service> = engine.store().read(Collection::Services).await?;
                let mut lines = Vec::with_capacity(services.len());
                for spec in services {
                    lines.push(resolve_service(spec, &catalog, *duration)?);
                }
                booking = booking.with_services(lines);
                if let Some(notes) = notes {
                    booking = booking.with_notes(notes.trim());
                }

                engine.save_booking(booking.clone()).await?;

                // keep the client's lifetime counters current
                let mut owner = owner.clone();
                owner.total_hours += booking.duration;
                owner.total_sessions += 1;
                owner.touch();
                engine.save_client(owner).await?;

                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Create,
                        AuditEntity::Booking,
                        &booking.id,
                        json!({
                            "date": booking.date,
                            "client": booking.client_name,
                            "totalRevenue": booking.total_revenue,
                        }),
                        &config.user,
                    ))
                    .await?;

                println!(
                    "Booked {} on {} at {:02}:00 for {}h (R$ {:.2})",
                    booking.client_name,
                    booking.date,
                    booking.start_hour(),
                    booking.duration,
                    booking.total_revenue
                );
                Ok(())
            }

            BookingSubcommand::List {
                date,
                client,
                format,
            } => {
                let mut bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                if let Some(date) = date {
                    bookings.retain(|b| &b.date == date);
                }
                if let Some(client) = client {
                    bookings.retain(|b| &b.client_id == client);
                }
                if bookings.is_empty() {
                    println!("No bookings found");
                    return Ok(());
                }
                bookings.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&bookings)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<10}  {:<11}  {:<24}  {:>10}",
                            "ID", "DATE", "TIME", "CLIENT", "REVENUE"
                        );
                        println!("{}", "-".repeat(100));
                        for booking in &bookings {
                            println!(
                                "{:<36}  {}  {:02}:00-{:02}:00  {:<24}  R$ {:>7.2}",
                                booking.id,
                                booking.date,
                                booking.start_hour(),
                                booking.end_hour(),
                                booking.client_name,
                                booking.total_revenue,
                            );
                        }
                        println!("\nTotal: {} booking(s)", bookings.len());
                    }
                }
                Ok(())
            }

            BookingSubcommand::Show { id } => {
                let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                let booking = bookings
                    .iter()
                    .find(|b| &b.id == id)
                    .ok_or_else(|| format!("Booking not found: {}", id))?;
                println!("{}", serde_json::to_string_pretty(booking)?);
                Ok(())
            }

            BookingSubcommand::Activities { id, text } => {
                let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                let mut booking = bookings
                    .iter()
                    .find(|b| &b.id == id)
                    .cloned()
                    .ok_or_else(|| format!("Booking not found: {}", id))?;

                booking.activities_completed = Some(text.trim().to_string());
                booking.touch();
                engine.save_booking(booking.clone()).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Activity,
                        AuditEntity::Booking,
                        &booking.id,
                        json!({ "activities": text.trim() }),
                        &config.user,
                    ))
                    .await?;

                println!("Recorded activities for booking {}", booking.id);
                Ok(())
            }

            BookingSubcommand::Delete { id, force } => {
                let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;
                let booking = bookings
                    .iter()
                    .find(|b| &b.id == id)
                    .ok_or_else(|| format!("Booking not found: {}", id))?;

                if !confirm(
                    &format!(
                        "Cancel booking for {} on {}?",
                        booking.client_name, booking.date
                    ),
                    *force,
                ) {
                    println!("Aborted");
                    return Ok(());
                }

                let details = json!({
                    "date": booking.date,
                    "client": booking.client_name,
                });
                engine.delete_booking(id).await?;
                engine
                    .save_audit_log(AuditLogEntry::new(
                        AuditAction::Delete,
                        AuditEntity::Booking,
                        id,
                        details,
                        &config.user,
                    ))
                    .await?;

                println!("Cancelled booking {}", id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Service> {
        let mut services = Service::defaults();
        services[0].enabled = false; // Ensaio
        services
    }

    #[test]
    fn test_resolve_service_with_explicit_hours() {
        let line = resolve_service("Gravação=2", &catalog(), 4).unwrap();
        assert_eq!(line.service_name, "Gravação");
        assert_eq!(line.hours, 2);
        assert_eq!(line.price_per_hour, 150.0);
    }

    #[test]
    fn test_resolve_service_defaults_to_session_duration() {
        let line = resolve_service("mixagem", &catalog(), 3).unwrap();
        assert_eq!(line.hours, 3);
    }

    #[test]
    fn test_resolve_service_rejects_disabled_and_unknown() {
        assert!(resolve_service("Ensaio", &catalog(), 1).is_err());
        assert!(resolve_service("Karaokê", &catalog(), 1).is_err());
        assert!(resolve_service("Gravação=0", &catalog(), 1).is_err());
        assert!(resolve_service("Gravação=abc", &catalog(), 1).is_err());
    }
}
