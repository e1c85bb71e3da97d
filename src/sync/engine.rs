use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::merge::{merge_records, Replicated};
use crate::models::{AuditLogEntry, Booking, Client, Service};
use crate::remote::{RemoteError, RemoteStore};
use crate::store::{Collection, LocalStore, StoreError, AUDIT_LOG_CAP};

#[derive(Debug)]
pub enum SyncError {
    /// The remote could not be reached; local data was left untouched.
    RemoteUnavailable(RemoteError),
    Store(StoreError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::RemoteUnavailable(e) => write!(f, "sync server unavailable: {}", e),
            SyncError::Store(e) => write!(f, "local store error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}

/// Outcome of one collection reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub collection: Collection,
    pub merged: usize,
    pub pushed: usize,
    pub failed_pushes: usize,
}

/// Reconciles local collection snapshots with the remote document store.
///
/// All writes land locally first; remote pushes are best-effort and a
/// failed push is retried naturally on the next reconcile.
pub struct SyncEngine {
    store: LocalStore,
    remote: Arc<dyn RemoteStore>,
    in_flight: Mutex<HashSet<Collection>>,
}

impl SyncEngine {
    pub fn new(store: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            remote,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn try_begin(&self, collection: Collection) -> bool {
        self.in_flight
            .lock()
            .map(|mut set| set.insert(collection))
            .unwrap_or(false)
    }

    fn finish(&self, collection: Collection) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&collection);
        }
    }

    /// Reconciles one collection. Returns `Ok(None)` when another
    /// reconciliation of the same collection is already in flight; the
    /// overlapping trigger is dropped, not queued.
    pub async fn reconcile(
        &self,
        collection: Collection,
    ) -> Result<Option<SyncReport>, SyncError> {
        if !self.try_begin(collection) {
            debug!(%collection, "reconcile already in flight, skipping");
            return Ok(None);
        }
        let result = self.reconcile_inner(collection).await;
        self.finish(collection);
        result.map(Some)
    }

    async fn reconcile_inner(&self, collection: Collection) -> Result<SyncReport, SyncError> {
        match collection {
            Collection::Clients => self.reconcile_collection::<Client>().await,
            Collection::Bookings => self.reconcile_collection::<Booking>().await,
            Collection::Services => self.reconcile_collection::<Service>().await,
            Collection::AuditLog => self.reconcile_audit_log().await,
        }
    }

    async fn reconcile_collection<T: Replicated>(&self) -> Result<SyncReport, SyncError> {
        let remote_docs = self
            .remote
            .fetch_all(T::COLLECTION)
            .await
            .map_err(SyncError::RemoteUnavailable)?;
        let remote = decode_remote::<T>(T::COLLECTION, remote_docs);
        let local: Vec<T> = self.store.read(T::COLLECTION).await?;

        let outcome = merge_records(local, remote);
        self.store.replace(T::COLLECTION, &outcome.merged).await?;

        let mut report = SyncReport {
            collection: T::COLLECTION,
            merged: outcome.merged.len(),
            pushed: 0,
            failed_pushes: 0,
        };
        for record in &outcome.upserts {
            match self.push(T::COLLECTION, record.id(), record).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    warn!(collection = %T::COLLECTION, id = record.id(), error = %e,
                        "push failed, will retry next reconcile");
                    report.failed_pushes += 1;
                }
            }
        }
        info!(collection = %T::COLLECTION, merged = report.merged,
            pushed = report.pushed, "reconciled");
        Ok(report)
    }

    /// Audit entries merge by id only and the local list keeps just the
    /// newest [`AUDIT_LOG_CAP`] entries.
    async fn reconcile_audit_log(&self) -> Result<SyncReport, SyncError> {
        let remote_docs = self
            .remote
            .fetch_all(Collection::AuditLog)
            .await
            .map_err(SyncError::RemoteUnavailable)?;
        let remote = decode_remote::<AuditLogEntry>(Collection::AuditLog, remote_docs);
        let local: Vec<AuditLogEntry> = self.store.read(Collection::AuditLog).await?;

        let mut outcome = merge_records(local, remote);
        outcome
            .merged
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        outcome.merged.truncate(AUDIT_LOG_CAP);
        self.store
            .replace(Collection::AuditLog, &outcome.merged)
            .await?;

        let mut report = SyncReport {
            collection: Collection::AuditLog,
            merged: outcome.merged.len(),
            pushed: 0,
            failed_pushes: 0,
        };
        for entry in &outcome.upserts {
            match self.push(Collection::AuditLog, &entry.id, entry).await {
                Ok(()) => report.pushed += 1,
                Err(e) => {
                    warn!(id = %entry.id, error = %e, "audit push failed");
                    report.failed_pushes += 1;
                }
            }
        }
        Ok(report)
    }

    /// Reconciles every collection; one collection's failure does not
    /// block the others.
    pub async fn reconcile_all(&self) -> Vec<(Collection, Result<Option<SyncReport>, SyncError>)> {
        let mut results = Vec::with_capacity(Collection::ALL.len());
        for collection in Collection::ALL {
            results.push((collection, self.reconcile(collection).await));
        }
        results
    }

    async fn push<T: serde::Serialize>(
        &self,
        collection: Collection,
        id: &str,
        record: &T,
    ) -> Result<(), RemoteError> {
        let doc = serde_json::to_value(record)?;
        self.remote.upsert(collection, id, &doc).await
    }

    /// Writes a record into its local snapshot, then attempts one remote
    /// upsert. The local write is authoritative; a remote failure is
    /// logged and swallowed.
    async fn save_record<T: Replicated>(&self, record: T) -> Result<(), SyncError> {
        let mut records: Vec<T> = self.store.read(T::COLLECTION).await?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.store.replace(T::COLLECTION, &records).await?;

        if let Err(e) = self.push(T::COLLECTION, record.id(), &record).await {
            warn!(collection = %T::COLLECTION, id = record.id(), error = %e,
                "remote save failed, kept locally");
        }
        Ok(())
    }

    pub async fn save_client(&self, client: Client) -> Result<(), SyncError> {
        self.save_record(client).await
    }

    pub async fn save_booking(&self, booking: Booking) -> Result<(), SyncError> {
        self.save_record(booking).await
    }

    pub async fn save_service(&self, service: Service) -> Result<(), SyncError> {
        self.save_record(service).await
    }

    /// Prepends an audit entry (the log is newest-first) and enforces the
    /// local cap before the best-effort remote push.
    pub async fn save_audit_log(&self, entry: AuditLogEntry) -> Result<(), SyncError> {
        let mut entries: Vec<AuditLogEntry> = self.store.read(Collection::AuditLog).await?;
        entries.insert(0, entry.clone());
        entries.truncate(AUDIT_LOG_CAP);
        self.store.replace(Collection::AuditLog, &entries).await?;

        if let Err(e) = self.push(Collection::AuditLog, &entry.id, &entry).await {
            warn!(id = %entry.id, error = %e, "remote audit save failed, kept locally");
        }
        Ok(())
    }

    /// Removes a record locally, then attempts the remote delete.
    ///
    /// There are no tombstones: a record deleted while offline that still
    /// exists remotely will reappear on the next reconcile.
    async fn delete_record<T: Replicated>(&self, id: &str) -> Result<bool, SyncError> {
        let mut records: Vec<T> = self.store.read(T::COLLECTION).await?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.store.replace(T::COLLECTION, &records).await?;

        if let Err(e) = self.remote.delete(T::COLLECTION, id).await {
            warn!(collection = %T::COLLECTION, id, error = %e,
                "remote delete failed, removed locally");
        }
        Ok(true)
    }

    pub async fn delete_client(&self, id: &str) -> Result<bool, SyncError> {
        self.delete_record::<Client>(id).await
    }

    pub async fn delete_booking(&self, id: &str) -> Result<bool, SyncError> {
        self.delete_record::<Booking>(id).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<bool, SyncError> {
        self.delete_record::<Service>(id).await
    }

    /// Wipes the local audit log. The remote history is left alone.
    pub async fn clear_audit_log(&self) -> Result<(), SyncError> {
        self.store
            .replace::<AuditLogEntry>(Collection::AuditLog, &[])
            .await?;
        Ok(())
    }
}

/// Decodes remote documents, dropping any that don't fit the schema so
/// one malformed document can't wedge the whole collection.
fn decode_remote<T: Replicated>(collection: Collection, docs: Vec<Value>) -> Vec<T> {
    let mut records = Vec::with_capacity(docs.len());
    for doc in docs {
        match serde_json::from_value::<T>(doc) {
            Ok(record) => records.push(record),
            Err(e) => warn!(%collection, error = %e, "skipping malformed remote document"),
        }
    }
    records
}
