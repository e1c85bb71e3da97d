use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{AuditLogEntry, Booking, Client, Service};
use crate::store::Collection;

/// A record type that participates in snapshot reconciliation.
///
/// `identity_key` is the secondary match: records created independently
/// on two devices carry different ids but the same real-world identity,
/// and the key lets the merge collapse them onto the remote id.
pub trait Replicated: Clone + Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn adopt_id(&mut self, id: &str);
    fn modified_at(&self) -> DateTime<Utc>;
    fn identity_key(&self) -> Option<String> {
        None
    }
}

impl Replicated for Client {
    const COLLECTION: Collection = Collection::Clients;

    fn id(&self) -> &str {
        &self.id
    }

    fn adopt_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn identity_key(&self) -> Option<String> {
        let doc = self.normalized_document();
        if doc.is_empty() {
            None
        } else {
            Some(doc)
        }
    }
}

impl Replicated for Booking {
    const COLLECTION: Collection = Collection::Bookings;

    fn id(&self) -> &str {
        &self.id
    }

    fn adopt_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Replicated for Service {
    const COLLECTION: Collection = Collection::Services;

    fn id(&self) -> &str {
        &self.id
    }

    fn adopt_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn identity_key(&self) -> Option<String> {
        let name = self.normalized_name();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

impl Replicated for AuditLogEntry {
    const COLLECTION: Collection = Collection::AuditLog;

    fn id(&self) -> &str {
        &self.id
    }

    fn adopt_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Result of merging a local snapshot against a remote one.
#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    /// The reconciled snapshot that replaces the local one.
    pub merged: Vec<T>,
    /// Records to push remotely, already carrying their canonical ids.
    pub upserts: Vec<T>,
}

/// Merges a local record set against the full remote set.
///
/// The remote set is the base. Per local record:
/// 1. id match: the strictly newer side wins, remote wins ties;
/// 2. identity-key match with no id match: the remote id is kept, local
///    fields are substituted only when local is strictly newer;
/// 3. otherwise the record is novel and is appended and pushed.
///
/// Remote-only records are kept untouched. Upserts are only the records
/// judged newer than remote or absent from it.
pub fn merge_records<T: Replicated>(local: Vec<T>, remote: Vec<T>) -> MergeOutcome<T> {
    let mut merged = remote;
    let mut upserts = Vec::new();

    for mut record in local {
        if let Some(existing) = merged.iter_mut().find(|r| r.id() == record.id()) {
            if record.modified_at() > existing.modified_at() {
                *existing = record.clone();
                upserts.push(record);
            }
            continue;
        }

        let identity = record.identity_key();
        let identity_match = identity.as_ref().and_then(|key| {
            merged
                .iter_mut()
                .find(|r| r.identity_key().as_ref() == Some(key))
        });
        if let Some(existing) = identity_match {
            if record.modified_at() > existing.modified_at() {
                record.adopt_id(existing.id());
                *existing = record.clone();
                upserts.push(record);
            }
            continue;
        }

        merged.push(record.clone());
        upserts.push(record);
    }

    MergeOutcome { merged, upserts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;
    use chrono::{NaiveDateTime, TimeZone};

    fn client_at(id: &str, document: &str, name: &str, updated: &str) -> Client {
        let mut client = Client::new(DocumentKind::Cpf, document, name, name, "119");
        client.id = id.to_string();
        client.updated_at = NaiveDateTime::parse_from_str(updated, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        client.created_at = client.updated_at;
        client
    }

    #[test]
    fn test_newer_local_wins_on_id_match() {
        let local = vec![client_at("c1", "111", "Nova", "2024-03-02 10:00:00")];
        let remote = vec![client_at("c1", "111", "Velha", "2024-03-01 10:00:00")];
        let outcome = merge_records(local, remote);

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].full_name, "Nova");
        assert_eq!(outcome.upserts.len(), 1);
        assert_eq!(outcome.upserts[0].id, "c1");
    }

    #[test]
    fn test_remote_wins_ties_and_newer_remote() {
        let local = vec![
            client_at("c1", "111", "LocalTie", "2024-03-01 10:00:00"),
            client_at("c2", "222", "LocalOld", "2024-03-01 10:00:00"),
        ];
        let remote = vec![
            client_at("c1", "111", "RemoteTie", "2024-03-01 10:00:00"),
            client_at("c2", "222", "RemoteNew", "2024-03-02 10:00:00"),
        ];
        let outcome = merge_records(local, remote);

        let c1 = outcome.merged.iter().find(|c| c.id == "c1").unwrap();
        let c2 = outcome.merged.iter().find(|c| c.id == "c2").unwrap();
        assert_eq!(c1.full_name, "RemoteTie");
        assert_eq!(c2.full_name, "RemoteNew");
        assert!(outcome.upserts.is_empty());
    }

    #[test]
    fn test_identity_match_keeps_remote_id_with_newer_local_fields() {
        // same document, different ids; local edited later
        let local = vec![client_at("local-id", "529.982.247-25", "Editada", "2024-03-03 10:00:00")];
        let remote = vec![client_at("remote-id", "52998224725", "Original", "2024-03-01 10:00:00")];
        let outcome = merge_records(local, remote);

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].id, "remote-id");
        assert_eq!(outcome.merged[0].full_name, "Editada");
        assert_eq!(outcome.upserts.len(), 1);
        assert_eq!(outcome.upserts[0].id, "remote-id");
    }

    #[test]
    fn test_identity_match_older_local_is_dropped() {
        let local = vec![client_at("local-id", "52998224725", "Velha", "2024-03-01 10:00:00")];
        let remote = vec![client_at("remote-id", "52998224725", "Atual", "2024-03-02 10:00:00")];
        let outcome = merge_records(local, remote);

        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].id, "remote-id");
        assert_eq!(outcome.merged[0].full_name, "Atual");
        assert!(outcome.upserts.is_empty());
    }

    #[test]
    fn test_novel_local_records_are_pushed_and_remote_only_kept() {
        let local = vec![client_at("c-local", "111", "SoLocal", "2024-03-01 10:00:00")];
        let remote = vec![client_at("c-remote", "222", "SoRemota", "2024-03-01 10:00:00")];
        let outcome = merge_records(local, remote);

        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.upserts.len(), 1);
        assert_eq!(outcome.upserts[0].id, "c-local");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let local = vec![
            client_at("a", "111", "A", "2024-03-02 10:00:00"),
            client_at("b", "52998224725", "B", "2024-03-03 10:00:00"),
        ];
        let remote = vec![
            client_at("a", "111", "A-remote", "2024-03-01 10:00:00"),
            client_at("b-remote", "52998224725", "B-remote", "2024-03-01 10:00:00"),
        ];
        let first = merge_records(local, remote);
        let second = merge_records(first.merged.clone(), first.merged.clone());

        assert_eq!(second.merged.len(), first.merged.len());
        assert!(second.upserts.is_empty());
    }

    #[test]
    fn test_services_collapse_on_normalized_name() {
        let mut local = Service::new("  Gravação ", 160.0);
        local.id = "s-local".to_string();
        local.updated_at = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let mut remote = Service::new("gravação", 150.0);
        remote.id = "s-remote".to_string();
        remote.updated_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        let outcome = merge_records(vec![local], vec![remote]);
        assert_eq!(outcome.merged.len(), 1);
        assert_eq!(outcome.merged[0].id, "s-remote");
        assert_eq!(outcome.merged[0].price_per_hour, 160.0);
    }

    #[test]
    fn test_audit_entries_merge_by_id_only() {
        // two entries for the same entity at the same instant stay distinct
        let a = AuditLogEntry::new(
            crate::models::AuditAction::Create,
            crate::models::AuditEntity::Client,
            "c1",
            serde_json::json!({}),
            "user-a",
        );
        let mut b = a.clone();
        b.id = "other".to_string();
        b.timestamp = a.timestamp;

        let outcome = merge_records(vec![a], vec![b]);
        assert_eq!(outcome.merged.len(), 2);
    }
}
