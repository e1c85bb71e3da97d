use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::models::{Booking, Client};
use crate::reports::{hours_by_client, BookingFilter, FinancialStats};
use crate::store::Collection;
use crate::sync::SyncEngine;

#[derive(Args)]
pub struct ReportCommand {
    #[command(subcommand)]
    pub command: ReportSubcommand,
}

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Financial summary over a period
    Finance {
        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Only this client
        #[arg(long)]
        client: Option<String>,

        /// Only bookings containing this service
        #[arg(long)]
        service: Option<String>,
    },

    /// Hours and sessions per client
    Hours {
        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Full financial view of one client
    Client {
        /// Client ID
        id: String,
    },
}

fn print_financial(stats: &FinancialStats) {
    println!("Revenue:        R$ {:.2}", stats.total_revenue);
    println!("Bookings:       {}", stats.total_bookings);
    println!("Hours:          {}", stats.total_hours);
    println!("Unique clients: {}", stats.unique_clients);
    println!("Avg / booking:  R$ {:.2}", stats.avg_revenue_per_booking);
    println!("Avg / hour:     R$ {:.2}", stats.avg_revenue_per_hour);

    if !stats.service_revenue.is_empty() {
        println!("\nBy service:");
        for (name, revenue) in &stats.service_revenue {
            println!(
                "  {:<20} R$ {:>9.2}  {:>4}h  {:>3} session(s)",
                name, revenue.revenue, revenue.hours, revenue.sessions
            );
        }
    }

    if !stats.top_clients.is_empty() {
        println!("\nTop clients:");
        for client in &stats.top_clients {
            println!(
                "  {:<24} R$ {:>9.2}  {:>3} session(s)",
                client.name, client.revenue, client.sessions
            );
        }
    }
}

impl ReportCommand {
    pub async fn run(&self, engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
        let bookings: Vec<Booking> = engine.store().read(Collection::Bookings).await?;

        match &self.command {
            ReportSubcommand::Finance {
                start,
                end,
                client,
                service,
            } => {
                let filter = BookingFilter {
                    start: *start,
                    end: *end,
                    client_id: client.clone(),
                    service_id: service.clone(),
                };
                print_financial(&FinancialStats::collect(&bookings, &filter));
                Ok(())
            }

            ReportSubcommand::Hours { start, end, format } => {
                let filter = BookingFilter {
                    start: *start,
                    end: *end,
                    ..Default::default()
                };
                let report = hours_by_client(&bookings, &filter);
                if report.is_empty() {
                    println!("No bookings in the period");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        let rows: Vec<serde_json::Value> = report
                            .iter()
                            .map(|c| {
                                serde_json::json!({
                                    "clientId": c.client_id,
                                    "name": c.name,
                                    "hours": c.hours,
                                    "sessions": c.sessions,
                                })
                            })
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&rows)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<24}  {:>6}  {:>8}", "CLIENT", "HOURS", "SESSIONS");
                        println!("{}", "-".repeat(44));
                        for client in &report {
                            println!(
                                "{:<24}  {:>6}  {:>8}",
                                client.name, client.hours, client.sessions
                            );
                        }
                    }
                }
                Ok(())
            }

            ReportSubcommand::Client { id } => {
                let clients: Vec<Client> = engine.store().read(Collection::Clients).await?;
                let client = clients
                    .iter()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| format!("Client not found: {}", id))?;

                println!("Client: {}\n", client.display_name());
                let filter = BookingFilter {
                    client_id: Some(id.clone()),
                    ..Default::default()
                };
                print_financial(&FinancialStats::collect(&bookings, &filter));
                Ok(())
            }
        }
    }
}
