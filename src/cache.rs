//! Fallback & Result Caches
//!
//! In-memory, advisory, lossy by design. The fallback cache keeps
//! last-known-good answers per (advisor, question); the result cache
//! short-circuits repeated identical batch requests. Both are TTL'd and
//! size-bounded, trimming oldest-first down to a watermark instead of
//! evicting one-at-a-time.

use crate::response::{AdvisorResponse, BatchResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Ordinary cached answers live half an hour.
const STANDARD_TTL_MINUTES: i64 = 30;
/// Emergency/simplified entries are meant to survive extended outages.
const EMERGENCY_TTL_HOURS: i64 = 24;

const FALLBACK_CEILING: usize = 1000;
const FALLBACK_WATERMARK: usize = 800;
const RESULT_CEILING: usize = 200;
const RESULT_WATERMARK: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    fn default_ttl(&self) -> ChronoDuration {
        match self {
            // Low-tier entries are the emergency/simplified class
            QualityTier::Low => ChronoDuration::hours(EMERGENCY_TTL_HOURS),
            _ => ChronoDuration::minutes(STANDARD_TTL_MINUTES),
        }
    }
}

#[derive(Debug, Clone)]
struct Stored<T> {
    value: T,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
    tier: QualityTier,
}

impl<T> Stored<T> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires
    }
}

fn stable_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Case-folded, whitespace-collapsed question text for keying.
fn normalize_question(question: &str) -> String {
    question
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn trim_oldest<T>(entries: &mut HashMap<String, Stored<T>>, ceiling: usize, watermark: usize) {
    if entries.len() <= ceiling {
        return;
    }
    let mut by_age: Vec<(String, DateTime<Utc>)> = entries
        .iter()
        .map(|(k, v)| (k.clone(), v.created))
        .collect();
    by_age.sort_by_key(|(_, created)| *created);
    let excess = entries.len().saturating_sub(watermark);
    for (key, _) in by_age.into_iter().take(excess) {
        entries.remove(&key);
    }
}

/// Last-known-good answers per (advisor id, normalized question).
pub struct FallbackCache {
    entries: Mutex<HashMap<String, Stored<AdvisorResponse>>>,
    ceiling: usize,
    watermark: usize,
}

impl Default for FallbackCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackCache {
    pub fn new() -> Self {
        Self::with_bounds(FALLBACK_CEILING, FALLBACK_WATERMARK)
    }

    pub fn with_bounds(ceiling: usize, watermark: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ceiling,
            watermark: watermark.min(ceiling),
        }
    }

    fn key(advisor_id: &str, question: &str) -> String {
        stable_key(&[advisor_id, &normalize_question(question)])
    }

    /// Fresh entries only. Never fails; any anomaly is a miss, signalling
    /// the caller to proceed to the next fallback tier.
    pub async fn try_get(&self, advisor_id: &str, question: &str) -> Option<AdvisorResponse> {
        let entries = self.entries.lock().await;
        let stored = entries.get(&Self::key(advisor_id, question))?;
        if stored.is_fresh(Utc::now()) {
            Some(stored.value.clone())
        } else {
            None
        }
    }

    /// Emergency source: also serves an *expired* high-quality entry.
    /// Callers must flag the result as degraded.
    pub async fn try_get_degraded(
        &self,
        advisor_id: &str,
        question: &str,
    ) -> Option<AdvisorResponse> {
        let entries = self.entries.lock().await;
        let stored = entries.get(&Self::key(advisor_id, question))?;
        if stored.is_fresh(Utc::now()) || stored.tier == QualityTier::High {
            Some(stored.value.clone())
        } else {
            None
        }
    }

    pub async fn put(
        &self,
        advisor_id: &str,
        question: &str,
        response: AdvisorResponse,
        tier: QualityTier,
    ) {
        self.put_with_ttl(advisor_id, question, response, tier, tier.default_ttl())
            .await;
    }

    pub async fn put_with_ttl(
        &self,
        advisor_id: &str,
        question: &str,
        response: AdvisorResponse,
        tier: QualityTier,
        ttl: ChronoDuration,
    ) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        entries.insert(
            Self::key(advisor_id, question),
            Stored {
                value: response,
                created: now,
                expires: now + ttl,
                tier,
            },
        );
        trim_oldest(&mut entries, self.ceiling, self.watermark);
    }

    /// Drop expired entries, keeping expired high-tier ones since those
    /// remain servable in degraded mode.
    pub async fn prune_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, stored| stored.is_fresh(now) || stored.tier == QualityTier::High);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Whole-batch result cache keyed on (question, sorted advisor-id set,
/// domain). Short TTL: freshness is deliberately traded for load.
pub struct ResultCache {
    entries: Mutex<HashMap<String, Stored<BatchResult>>>,
    ttl: ChronoDuration,
    ceiling: usize,
    watermark: usize,
}

impl ResultCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::minutes(5)),
            ceiling: RESULT_CEILING,
            watermark: RESULT_WATERMARK,
        }
    }

    fn key(question: &str, advisor_ids: &[String], domain: &str) -> String {
        let mut sorted: Vec<&str> = advisor_ids.iter().map(|s| s.as_str()).collect();
        sorted.sort_unstable();
        let ids = sorted.join(",");
        stable_key(&[&normalize_question(question), &ids, domain])
    }

    pub async fn get(
        &self,
        question: &str,
        advisor_ids: &[String],
        domain: &str,
    ) -> Option<BatchResult> {
        let entries = self.entries.lock().await;
        let stored = entries.get(&Self::key(question, advisor_ids, domain))?;
        if stored.is_fresh(Utc::now()) {
            Some(stored.value.clone())
        } else {
            None
        }
    }

    pub async fn put(
        &self,
        question: &str,
        advisor_ids: &[String],
        domain: &str,
        result: BatchResult,
    ) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        entries.insert(
            Self::key(question, advisor_ids, domain),
            Stored {
                value: result,
                created: now,
                expires: now + self.ttl,
                tier: QualityTier::Medium,
            },
        );
        trim_oldest(&mut entries, self.ceiling, self.watermark);
    }

    pub async fn prune_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, stored| stored.is_fresh(now));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Low-frequency maintenance sweep for both caches. Not a hot path; the
/// caches also prune opportunistically on insert.
pub fn spawn_sweeper(
    fallback: Arc<FallbackCache>,
    results: Arc<ResultCache>,
    every: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            fallback.prune_expired().await;
            results.prune_expired().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{PersonaSnapshot, ResponseMetadata, ResponseSource};

    fn response(advisor_id: &str, content: &str) -> AdvisorResponse {
        AdvisorResponse {
            id: uuid::Uuid::new_v4().to_string(),
            advisor_id: advisor_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            persona: PersonaSnapshot {
                name: "Test Advisor".to_string(),
                expertise: vec![],
                tone: "neutral".to_string(),
            },
            metadata: ResponseMetadata {
                source: ResponseSource::Static,
                processing_ms: 1,
                confidence: 0.7,
                attempts: 0,
                frameworks: vec![],
                model: None,
                error: None,
            },
        }
    }

    #[tokio::test]
    async fn test_hit_and_normalized_key() {
        let cache = FallbackCache::new();
        cache
            .put("a1", "  What IS  the plan? ", response("a1", "the plan"), QualityTier::High)
            .await;
        let hit = cache.try_get("a1", "what is the plan?").await;
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().content, "the plan");
    }

    #[tokio::test]
    async fn test_miss_on_other_advisor() {
        let cache = FallbackCache::new();
        cache.put("a1", "q", response("a1", "x"), QualityTier::High).await;
        assert!(cache.try_get("a2", "q").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_not_served_fresh() {
        let cache = FallbackCache::new();
        cache
            .put_with_ttl("a1", "q", response("a1", "x"), QualityTier::Medium, ChronoDuration::seconds(-1))
            .await;
        assert!(cache.try_get("a1", "q").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_high_tier_served_degraded_only() {
        let cache = FallbackCache::new();
        cache
            .put_with_ttl("a1", "q", response("a1", "old gold"), QualityTier::High, ChronoDuration::seconds(-1))
            .await;
        assert!(cache.try_get("a1", "q").await.is_none());
        let degraded = cache.try_get_degraded("a1", "q").await;
        assert_eq!(degraded.unwrap().content, "old gold");

        // Expired medium tier is gone even in degraded mode
        cache
            .put_with_ttl("a2", "q", response("a2", "stale"), QualityTier::Medium, ChronoDuration::seconds(-1))
            .await;
        assert!(cache.try_get_degraded("a2", "q").await.is_none());
    }

    #[tokio::test]
    async fn test_trim_to_watermark() {
        let cache = FallbackCache::with_bounds(10, 8);
        for i in 0..11 {
            cache
                .put(&format!("a{}", i), "q", response(&format!("a{}", i), "x"), QualityTier::Medium)
                .await;
        }
        // Ceiling crossed once; trimmed down to the watermark, not by one
        assert_eq!(cache.len().await, 8);
    }

    #[tokio::test]
    async fn test_prune_keeps_expired_high_tier() {
        let cache = FallbackCache::new();
        cache
            .put_with_ttl("a1", "q", response("a1", "keep"), QualityTier::High, ChronoDuration::seconds(-1))
            .await;
        cache
            .put_with_ttl("a2", "q", response("a2", "drop"), QualityTier::Low, ChronoDuration::seconds(-1))
            .await;
        cache.prune_expired().await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.try_get_degraded("a1", "q").await.is_some());
    }

    #[tokio::test]
    async fn test_result_cache_keying_ignores_advisor_order() {
        use crate::analyzer::QuestionAnalysis;
        let cache = ResultCache::new(std::time::Duration::from_secs(60));
        let batch = BatchResult {
            responses: vec![],
            success_count: 0,
            error_count: 0,
            analysis: QuestionAnalysis::fallback(None),
            total_ms: 0,
            from_cache: false,
        };
        let ids_a = vec!["b".to_string(), "a".to_string()];
        let ids_b = vec!["a".to_string(), "b".to_string()];
        cache.put("q", &ids_a, "wellness", batch).await;
        assert!(cache.get("q", &ids_b, "wellness").await.is_some());
        assert!(cache.get("q", &ids_b, "prodboard").await.is_none());
    }
}
