use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::documents;

/// Tax document kind carried by a client record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl DocumentKind {
    /// Validates a document string against this kind's check digits.
    pub fn validates(&self, document: &str) -> bool {
        match self {
            DocumentKind::Cpf => documents::validate_cpf(document),
            DocumentKind::Cnpj => documents::validate_cnpj(document),
        }
    }

    /// Formats a document for display according to its kind.
    pub fn format(&self, document: &str) -> String {
        match self {
            DocumentKind::Cpf => documents::format_cpf(document),
            DocumentKind::Cnpj => documents::format_cnpj(document),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Cpf => write!(f, "CPF"),
            DocumentKind::Cnpj => write!(f, "CNPJ"),
        }
    }
}

/// Postal address, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub cep: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub complement: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.cep.is_none()
            && self.street.is_none()
            && self.number.is_none()
            && self.neighborhood.is_none()
            && self.complement.is_none()
            && self.city.is_none()
            && self.state.is_none()
    }
}

/// A studio client.
///
/// Document uniqueness is a soft constraint: the duplicate detector warns
/// about collisions and the sync engine collapses records that share a
/// normalized document, but two records may transiently coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub document: String,
    pub full_name: String,
    pub artistic_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_hours: i64,
    #[serde(default)]
    pub total_sessions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn new(
        kind: DocumentKind,
        document: impl Into<String>,
        full_name: impl Into<String>,
        artistic_name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            document: document.into(),
            full_name: full_name.into(),
            artistic_name: artistic_name.into(),
            phone: phone.into(),
            email: None,
            address: None,
            notes: None,
            total_hours: 0,
            total_sessions: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Name shown everywhere in the product; also the one the duplicate
    /// detector compares.
    pub fn display_name(&self) -> &str {
        &self.artistic_name
    }

    /// Normalized document used as the sync identity key.
    pub fn normalized_document(&self) -> String {
        documents::normalize_document(&self.document)
    }

    /// Bumps the modification timestamp; call after any field edit.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_has_fresh_timestamps_and_id() {
        let client = Client::new(
            DocumentKind::Cpf,
            "529.982.247-25",
            "Maria da Silva",
            "Mari",
            "(11) 98765-4321",
        );
        assert!(!client.id.is_empty());
        assert_eq!(client.created_at, client.updated_at);
        assert_eq!(client.total_hours, 0);
        assert_eq!(client.normalized_document(), "52998224725");
    }

    #[test]
    fn test_touch_advances_updated_at() {
        let mut client = Client::new(DocumentKind::Cpf, "123", "A", "A", "1");
        let before = client.updated_at;
        client.touch();
        assert!(client.updated_at >= before);
        assert_eq!(client.created_at, before);
    }

    #[test]
    fn test_serde_uses_product_field_names() {
        let client = Client::new(
            DocumentKind::Cnpj,
            "11.222.333/0001-81",
            "Banda XYZ Ltda",
            "Banda XYZ",
            "(11) 3333-4444",
        );
        let value = serde_json::to_value(&client).unwrap();
        assert_eq!(value["type"], "cnpj");
        assert!(value.get("fullName").is_some());
        assert!(value.get("artisticName").is_some());
        assert!(value.get("updatedAt").is_some());
        // optional fields are omitted, not serialized as null
        assert!(value.get("email").is_none());
    }

    #[test]
    fn test_deserialize_tolerates_missing_counters() {
        let raw = serde_json::json!({
            "id": "c1",
            "type": "cpf",
            "document": "529.982.247-25",
            "fullName": "Maria",
            "artisticName": "Mari",
            "phone": "11987654321",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-02T10:00:00Z"
        });
        let client: Client = serde_json::from_value(raw).unwrap();
        assert_eq!(client.total_hours, 0);
        assert_eq!(client.total_sessions, 0);
        assert!(client.address.is_none());
    }
}
