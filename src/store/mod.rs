//! Local persistence: one JSON array snapshot per collection, stored in a
//! sqlite key/value table. Snapshot replacement is a single statement, so
//! each collection key is atomic and last-write-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Newest-first audit entries kept locally.
pub const AUDIT_LOG_CAP: usize = 1000;

/// The four synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Bookings,
    Services,
    AuditLog,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Clients,
        Collection::Bookings,
        Collection::Services,
        Collection::AuditLog,
    ];

    /// Local storage key, kept from the product's historical names.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Clients => "studio_clients",
            Collection::Bookings => "studio_bookings",
            Collection::Services => "studio_services",
            Collection::AuditLog => "studio_audit_log",
        }
    }

    /// Collection name on the remote document store.
    pub fn remote_name(&self) -> &'static str {
        match self {
            Collection::Clients => "clientes",
            Collection::Bookings => "agendamentos",
            Collection::Services => "servicos",
            Collection::AuditLog => "audit_logs",
        }
    }

    pub fn parse(name: &str) -> Option<Collection> {
        Collection::ALL
            .into_iter()
            .find(|c| c.remote_name() == name || c.key() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.remote_name())
    }
}

#[derive(Debug)]
pub enum StoreError {
    Sqlx(sqlx::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlx(e) => write!(f, "database error: {}", e),
            StoreError::Serde(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Sqlx(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e)
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_db(db_path: PathBuf) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            sqlx::Error::Io(std::io::Error::new(
                e.kind(),
                format!("creating {}: {}", parent.display(), e),
            ))
        })?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Typed access to the collection snapshots.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Reads a collection snapshot; an absent key is an empty list.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM collections WHERE key = ?")
                .bind(collection.key())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((json,)) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces a collection snapshot in one statement.
    pub async fn replace<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        sqlx::query(
            "INSERT INTO collections (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(collection.key())
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drops a collection snapshot entirely.
    pub async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM collections WHERE key = ?")
            .bind(collection.key())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, DocumentKind};
    use tempfile::tempdir;

    pub(crate) async fn test_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempdir().unwrap();
        let pool = init_db(dir.path().join("test.db")).await.unwrap();
        (dir, LocalStore::new(pool))
    }

    #[tokio::test]
    async fn test_absent_collection_reads_empty() {
        let (_dir, store) = test_store().await;
        let clients: Vec<Client> = store.read(Collection::Clients).await.unwrap();
        assert!(clients.is_empty());
    }

    #[tokio::test]
    async fn test_replace_then_read_round_trips() {
        let (_dir, store) = test_store().await;
        let client = Client::new(DocumentKind::Cpf, "52998224725", "Maria", "Mari", "119");
        store
            .replace(Collection::Clients, std::slice::from_ref(&client))
            .await
            .unwrap();

        let loaded: Vec<Client> = store.read(Collection::Clients).await.unwrap();
        assert_eq!(loaded, vec![client.clone()]);

        // a second replace overwrites, never appends
        store
            .replace::<Client>(Collection::Clients, &[])
            .await
            .unwrap();
        let loaded: Vec<Client> = store.read(Collection::Clients).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let (_dir, store) = test_store().await;
        let client = Client::new(DocumentKind::Cpf, "52998224725", "Maria", "Mari", "119");
        store
            .replace(Collection::Clients, &[client])
            .await
            .unwrap();
        let bookings: Vec<serde_json::Value> = store.read(Collection::Bookings).await.unwrap();
        assert!(bookings.is_empty());
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Clients.key(), "studio_clients");
        assert_eq!(Collection::Clients.remote_name(), "clientes");
        assert_eq!(Collection::parse("agendamentos"), Some(Collection::Bookings));
        assert_eq!(Collection::parse("studio_services"), Some(Collection::Services));
        assert_eq!(Collection::parse("nope"), None);
    }
}
