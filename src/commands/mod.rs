mod audit;
mod booking;
mod client;
mod config_cmd;
mod data;
mod report;
mod service;
mod sync_cmd;

pub use audit::AuditCommand;
pub use booking::BookingCommand;
pub use client::ClientCommand;
pub use config_cmd::ConfigCommand;
pub use data::DataCommand;
pub use report::ReportCommand;
pub use service::ServiceCommand;
pub use sync_cmd::SyncCommand;

use clap::ValueEnum;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Asks for confirmation on stdin; `force` skips the prompt.
pub(crate) fn confirm(prompt: &str, force: bool) -> bool {
    if force {
        return true;
    }
    use std::io::Write;
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
