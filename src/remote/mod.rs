//! Remote document store access.
//!
//! The sync engine talks to an abstract [`RemoteStore`]; the HTTP
//! implementation targets the bundled server binary, and [`Disconnected`]
//! makes local-only operation first-class when sync is not configured.

mod http;
#[cfg(test)]
pub mod memory;

pub use http::{check_server, HttpRemoteStore};

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::store::Collection;

#[derive(Debug)]
pub enum RemoteError {
    /// No remote is configured; every call fails fast with this.
    NotConfigured,
    Http(String),
    Status(u16),
    Serde(serde_json::Error),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotConfigured => write!(f, "no sync server configured"),
            RemoteError::Http(e) => write!(f, "http error: {}", e),
            RemoteError::Status(code) => write!(f, "server returned status {}", code),
            RemoteError::Serde(e) => write!(f, "response decode error: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Serde(e)
    }
}

/// Document-level operations the sync engine needs from a remote.
///
/// `upsert` merges fields into any existing document rather than
/// replacing it, so partial saves never clobber absent fields.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_all(&self, collection: Collection) -> Result<Vec<Value>, RemoteError>;
    async fn upsert(
        &self,
        collection: Collection,
        id: &str,
        doc: &Value,
    ) -> Result<(), RemoteError>;
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;
}

/// Remote used when sync is not configured: every call fails fast and
/// the engine treats it as an ordinary offline remote.
pub struct Disconnected;

#[async_trait]
impl RemoteStore for Disconnected {
    async fn fetch_all(&self, _collection: Collection) -> Result<Vec<Value>, RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn upsert(
        &self,
        _collection: Collection,
        _id: &str,
        _doc: &Value,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }

    async fn delete(&self, _collection: Collection, _id: &str) -> Result<(), RemoteError> {
        Err(RemoteError::NotConfigured)
    }
}
