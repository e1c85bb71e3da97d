use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Activity,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
            AuditAction::Update => write!(f, "update"),
            AuditAction::Delete => write!(f, "delete"),
            AuditAction::Activity => write!(f, "activity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuditEntity {
    Client,
    Booking,
    Service,
}

impl fmt::Display for AuditEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEntity::Client => write!(f, "client"),
            AuditEntity::Booking => write!(f, "booking"),
            AuditEntity::Service => write!(f, "service"),
        }
    }
}

/// One immutable line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: String,
    #[serde(default)]
    pub details: serde_json::Value,
    pub user: String,
}

impl AuditLogEntry {
    pub fn new(
        action: AuditAction,
        entity: AuditEntity,
        entity_id: impl Into<String>,
        details: serde_json::Value,
        user: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            entity,
            entity_id: entity_id.into(),
            details,
            user: user.into(),
        }
    }
}

/// Filter over the audit trail; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub entity: Option<AuditEntity>,
    pub action: Option<AuditAction>,
    pub day: Option<NaiveDate>,
}

impl LogFilter {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(entity) = self.entity {
            if entry.entity != entity {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(day) = self.day {
            if entry.timestamp.date_naive() != day {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts over a set of log entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogStats {
    pub total: usize,
    pub by_action: BTreeMap<String, usize>,
    pub by_entity: BTreeMap<String, usize>,
}

impl LogStats {
    pub fn collect(entries: &[AuditLogEntry]) -> Self {
        let mut stats = LogStats {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            *stats.by_action.entry(entry.action.to_string()).or_insert(0) += 1;
            *stats.by_entity.entry(entry.entity.to_string()).or_insert(0) += 1;
        }
        stats
    }
}
