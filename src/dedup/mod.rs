//! Duplicate client detection.
//!
//! Purely advisory: the detector classifies a candidate against the
//! roster and never blocks a save. Missing fields simply don't match.

pub mod similarity;

use crate::documents::{normalize_document, normalize_phone};
use crate::models::Client;
use similarity::{hamming, name_similarity};

/// Threshold above which two names are reported as similar.
const NAME_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Match categories, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    ExactDocument,
    SamePhone,
    SimilarName,
    SimilarDocument,
}

impl MatchKind {
    /// Historical category labels, kept stable for display and export.
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::ExactDocument => "cpf_exato",
            MatchKind::SamePhone => "telefone_igual",
            MatchKind::SimilarName => "nome_similar",
            MatchKind::SimilarDocument => "cpf_similar",
        }
    }
}

/// One roster client flagged against the candidate.
#[derive(Debug, Clone)]
pub struct ClientMatch {
    pub client: Client,
    pub kind: MatchKind,
    pub confidence: f64,
}

/// All matches for a candidate, grouped by category.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    pub exact_documents: Vec<ClientMatch>,
    pub same_phones: Vec<ClientMatch>,
    pub similar_names: Vec<ClientMatch>,
    pub similar_documents: Vec<ClientMatch>,
    pub has_exact_match: bool,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.exact_documents.is_empty()
            && self.same_phones.is_empty()
            && self.similar_names.is_empty()
            && self.similar_documents.is_empty()
    }

    /// Every match ordered by descending confidence; equal confidences
    /// stay in discovery order.
    pub fn sorted_matches(&self) -> Vec<&ClientMatch> {
        let mut all: Vec<&ClientMatch> = self
            .exact_documents
            .iter()
            .chain(&self.same_phones)
            .chain(&self.similar_names)
            .chain(&self.similar_documents)
            .collect();
        all.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        all
    }
}

pub struct DuplicateDetector;

impl DuplicateDetector {
    /// Classifies `candidate` against `roster`.
    ///
    /// `exclude_id` skips the candidate's own record during edits. An
    /// exact document match is terminal for that pair; no weaker
    /// categories are computed against the same client.
    pub fn find_matches(
        candidate: &Client,
        roster: &[Client],
        exclude_id: Option<&str>,
    ) -> MatchSet {
        let mut matches = MatchSet::default();

        let doc = normalize_document(&candidate.document);
        let phone = normalize_phone(&candidate.phone);
        let name = candidate.display_name();

        for other in roster {
            if exclude_id.is_some_and(|id| id == other.id) {
                continue;
            }

            let other_doc = normalize_document(&other.document);
            if !doc.is_empty() && doc == other_doc {
                matches.has_exact_match = true;
                matches.exact_documents.push(ClientMatch {
                    client: other.clone(),
                    kind: MatchKind::ExactDocument,
                    confidence: 1.0,
                });
                continue;
            }

            let other_phone = normalize_phone(&other.phone);
            if !phone.is_empty() && phone == other_phone {
                matches.same_phones.push(ClientMatch {
                    client: other.clone(),
                    kind: MatchKind::SamePhone,
                    confidence: 0.9,
                });
            }

            let similarity = name_similarity(name, other.display_name());
            if similarity > NAME_SIMILARITY_THRESHOLD {
                matches.similar_names.push(ClientMatch {
                    client: other.clone(),
                    kind: MatchKind::SimilarName,
                    confidence: similarity,
                });
            }

            if !doc.is_empty() {
                if let Some(distance) = hamming(&doc, &other_doc) {
                    if (1..=2).contains(&distance) {
                        matches.similar_documents.push(ClientMatch {
                            client: other.clone(),
                            kind: MatchKind::SimilarDocument,
                            confidence: 1.0 - distance as f64 / doc.chars().count() as f64,
                        });
                    }
                }
            }
        }

        matches
    }
}
