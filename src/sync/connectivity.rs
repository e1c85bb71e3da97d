use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::remote::check_server;

/// Spawns a background task that probes the server's health endpoint and
/// publishes connectivity over a watch channel. The receiver's current
/// value is always the latest known state; transitions wake any task
/// waiting on `changed()`.
pub fn spawn_monitor(base_url: String, interval: Duration) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let online = check_server(&base_url).await;
            let was_online = *tx.borrow();
            if online != was_online {
                if online {
                    info!("sync server reachable");
                } else {
                    info!("sync server unreachable, operating offline");
                }
            } else {
                debug!(online, "connectivity probe");
            }
            if tx.send(online).is_err() {
                // all receivers dropped, nobody cares anymore
                break;
            }
        }
    });

    rx
}
