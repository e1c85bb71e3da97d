use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A billable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price_per_hour: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl Service {
    pub fn new(name: impl Into<String>, price_per_hour: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price_per_hour,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive trimmed name, the catalog's soft uniqueness key
    /// and the sync identity key for services.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// The catalog seeded on first run.
    pub fn defaults() -> Vec<Service> {
        vec![
            Service::new("Ensaio", 100.0),
            Service::new("Gravação", 150.0),
            Service::new("Mixagem", 120.0),
            Service::new("Masterização", 80.0),
            Service::new("Vídeo", 200.0),
        ]
    }
}
