//! Server-side document storage.
//!
//! One JSON file per collection under the data directory:
//! ```text
//! <DATA_DIR>/
//!   clientes.json
//!   agendamentos.json
//!   servicos.json
//!   audit_logs.json
//! ```
//! Each file holds an id-to-document map. Writes go through a temp file
//! and rename so a crash never leaves a half-written collection.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::store::Collection;

#[derive(Debug)]
pub enum ServerStoreError {
    Io(PathBuf, io::Error),
    Serde(PathBuf, serde_json::Error),
}

impl std::fmt::Display for ServerStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStoreError::Io(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStoreError::Serde(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ServerStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStoreError::Io(_, e) => Some(e),
            ServerStoreError::Serde(_, e) => Some(e),
        }
    }
}

/// Shallow field merge: every top-level field of `update` overwrites the
/// matching field of `target`; fields absent from `update` are kept.
pub fn merge_fields(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target), Value::Object(update)) => {
            for (key, value) in update {
                target.insert(key.clone(), value.clone());
            }
        }
        (target, update) => *target = update.clone(),
    }
}

/// On-disk store for the four synchronized collections.
pub struct CollectionStore {
    data_dir: PathBuf,
}

impl CollectionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir
            .join(format!("{}.json", collection.remote_name()))
    }

    fn load(&self, collection: Collection) -> Result<BTreeMap<String, Value>, ServerStoreError> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents =
            fs::read_to_string(&path).map_err(|e| ServerStoreError::Io(path.clone(), e))?;
        serde_json::from_str(&contents).map_err(|e| ServerStoreError::Serde(path, e))
    }

    fn save(
        &self,
        collection: Collection,
        docs: &BTreeMap<String, Value>,
    ) -> Result<(), ServerStoreError> {
        let path = self.path(collection);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ServerStoreError::Io(parent.into(), e))?;
        }
        let json = serde_json::to_string_pretty(docs)
            .map_err(|e| ServerStoreError::Serde(path.clone(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        write_file(&temp_path, json.as_bytes())
            .map_err(|e| ServerStoreError::Io(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path).map_err(|e| ServerStoreError::Io(path, e))?;
        Ok(())
    }

    /// Lists documents; the audit collection comes back newest-first and
    /// capped to `limit` when one is given.
    pub fn list(
        &self,
        collection: Collection,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, ServerStoreError> {
        let docs = self.load(collection)?;
        let mut values: Vec<Value> = docs.into_values().collect();
        if collection == Collection::AuditLog {
            values.sort_by(|a, b| doc_timestamp(b).cmp(&doc_timestamp(a)));
            if let Some(limit) = limit {
                values.truncate(limit);
            }
        }
        Ok(values)
    }

    /// Merges `update` into the stored document, creating it when absent.
    /// The path id always wins over any `id` field in the body.
    pub fn upsert(
        &self,
        collection: Collection,
        id: &str,
        update: &Value,
    ) -> Result<Value, ServerStoreError> {
        let mut docs = self.load(collection)?;
        let doc = docs
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        merge_fields(doc, update);
        if let Value::Object(map) = doc {
            map.insert("id".to_string(), Value::String(id.to_string()));
        }
        let result = doc.clone();
        self.save(collection, &docs)?;
        Ok(result)
    }

    /// Removes a document; returns whether it existed.
    pub fn delete(&self, collection: Collection, id: &str) -> Result<bool, ServerStoreError> {
        let mut docs = self.load(collection)?;
        let existed = docs.remove(id).is_some();
        if existed {
            self.save(collection, &docs)?;
        }
        Ok(existed)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn doc_timestamp(doc: &Value) -> String {
    doc.get("timestamp")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}
