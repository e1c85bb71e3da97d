use clap::{Args, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::remote::check_server;
use crate::sync::{spawn_monitor, SyncEngine, SyncError, SyncScheduler};

#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: Option<SyncSubcommand>,
}

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Reconcile every collection once (the default)
    Now,

    /// Show sync configuration and server reachability
    Status,

    /// Keep reconciling in the background until interrupted
    Watch,
}

async fn sync_now(engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
    let mut offline = false;
    for (collection, result) in engine.reconcile_all().await {
        match result {
            Ok(Some(report)) => println!(
                "{:<14} {} record(s), {} pushed{}",
                collection.remote_name(),
                report.merged,
                report.pushed,
                if report.failed_pushes > 0 {
                    format!(", {} push(es) failed", report.failed_pushes)
                } else {
                    String::new()
                },
            ),
            Ok(None) => println!("{:<14} skipped (already running)", collection.remote_name()),
            Err(SyncError::RemoteUnavailable(e)) => {
                println!("{:<14} offline ({})", collection.remote_name(), e);
                offline = true;
            }
            Err(e) => return Err(e.into()),
        }
    }
    if offline {
        println!("\nLocal data is intact; changes will sync when the server is reachable");
    }
    Ok(())
}

impl SyncCommand {
    pub async fn run(
        &self,
        engine: Arc<SyncEngine>,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match self.command.as_ref().unwrap_or(&SyncSubcommand::Now) {
            SyncSubcommand::Now => {
                if !config.sync.is_configured() {
                    return Err("Sync is not configured; set sync.server_url and sync.api_key".into());
                }
                sync_now(&engine).await
            }

            SyncSubcommand::Status => {
                match &config.sync.server_url {
                    Some(url) => {
                        println!("Server:    {}", url);
                        println!(
                            "API key:   {}",
                            if config.sync.api_key.is_some() { "set" } else { "not set" }
                        );
                        println!("Interval:  {}s", config.sync.interval_secs);
                        let reachable = check_server(url).await;
                        println!("Reachable: {}", if reachable { "yes" } else { "no" });
                    }
                    None => println!("Sync is not configured"),
                }
                Ok(())
            }

            SyncSubcommand::Watch => {
                let url = config
                    .sync
                    .server_url
                    .clone()
                    .ok_or("Sync is not configured; set sync.server_url and sync.api_key")?;
                if !config.sync.auto_sync {
                    return Err("auto_sync is disabled in the configuration".into());
                }

                let interval = Duration::from_secs(config.sync.interval_secs.max(1));
                let online = spawn_monitor(url, interval);
                let scheduler = SyncScheduler::new(engine, online, interval);

                println!("Watching for changes, Ctrl-C to stop");
                tokio::select! {
                    _ = scheduler.run() => {}
                    _ = tokio::signal::ctrl_c() => {
                        println!("\nStopped");
                    }
                }
                Ok(())
            }
        }
    }
}
