//! Offline-first synchronization.
//!
//! Reconciliation merges full local and remote snapshots per collection:
//! last-write-wins on the primary id, with a secondary identity key to
//! collapse duplicates created while offline. Saves always land locally
//! first; the remote write is best-effort and retried by the next tick.

mod connectivity;
mod engine;
mod merge;
mod scheduler;

pub use connectivity::spawn_monitor;
pub use engine::{SyncEngine, SyncError, SyncReport};
pub use merge::{merge_records, MergeOutcome, Replicated};
pub use scheduler::SyncScheduler;
