//! Response data model shared by the orchestrator, the static generator
//! and the caches.

use crate::analyzer::QuestionAnalysis;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// Minimal external advisor shape supplied by the caller. Many advisors have
/// no curated persona in the catalog; this profile is all we know about them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub domain: String,
}

impl AdvisorProfile {
    pub fn new(id: &str, name: &str, role: &str, domain: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            background: String::new(),
            specialties: Vec::new(),
            domain: domain.to_string(),
        }
    }
}

/// How a response's content was actually produced. Must always be truthful:
/// a cached model answer is `Cached`, never `Model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Model,
    Static,
    Cached,
}

/// Error detail attached to degraded responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub fallback_used: bool,
}

/// Frozen copy of the persona identity at response time, so the record stays
/// self-contained if the catalog changes between releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaSnapshot {
    pub name: String,
    pub expertise: Vec<String>,
    pub tone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub source: ResponseSource,
    pub processing_ms: u64,
    pub confidence: f32,
    /// Model call attempts made before this response was settled (0 when the
    /// model was never tried, e.g. pure offline mode).
    pub attempts: u32,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// The unit returned to the caller: one advisor, one answer. Content is
/// never empty; `metadata.source` always reflects the real production path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorResponse {
    pub id: String,
    pub advisor_id: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub persona: PersonaSnapshot,
    pub metadata: ResponseMetadata,
}

impl AdvisorResponse {
    /// True when this response carries substantive content rather than the
    /// minimal apology floor.
    pub fn is_substantive(&self) -> bool {
        self.metadata.confidence > 0.1
    }
}

/// Aggregate for a multi-advisor request. `responses.len()` always equals
/// the advisor count of the request, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub responses: Vec<AdvisorResponse>,
    pub success_count: usize,
    pub error_count: usize,
    pub analysis: QuestionAnalysis,
    pub total_ms: u64,
    /// True when this result was served from the batch result cache.
    #[serde(default)]
    pub from_cache: bool,
}

impl BatchResult {
    /// Look up a response by advisor id, independent of completion order.
    pub fn for_advisor(&self, advisor_id: &str) -> Option<&AdvisorResponse> {
        self.responses.iter().find(|r| r.advisor_id == advisor_id)
    }
}
