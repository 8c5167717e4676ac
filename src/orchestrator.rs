//! Response Orchestration
//!
//! The top-level coordinator: one question, a batch of advisors, bounded
//! concurrent model calls, and a recovery ladder that guarantees every
//! advisor comes back with exactly one response. Recoverable failures are
//! absorbed here; only configuration-class errors propagate.

use crate::analyzer::{QuestionAnalysis, QuestionAnalyzer};
use crate::cache::{FallbackCache, QualityTier, ResultCache};
use crate::client::{CallOptions, ModelClient};
use crate::config::BoardConfig;
use crate::error::{
    backoff_delay, BoardError, ErrorKind, RecoveryPolicyTable, RecoveryState, RecoveryStrategy,
};
use crate::persona::{PersonaCatalog, PersonaDescriptor};
use crate::prompt::{CoordinationPolicy, PromptBuilder};
use crate::response::{
    AdvisorProfile, AdvisorResponse, BatchResult, ErrorInfo, PersonaSnapshot, ResponseMetadata,
    ResponseSource,
};
use crate::statics::StaticResponseGenerator;
use crate::telemetry::{NoopSink, TelemetrySink};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Subsystem availability snapshot. Each probe is isolated; one failing
/// probe never hides the others.
#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub model_providers: HashMap<String, bool>,
    pub static_generator: bool,
    pub question_analyzer: bool,
    pub persona_service: bool,
}

pub struct ResponseOrchestrator {
    client: Arc<dyn ModelClient>,
    catalog: Arc<PersonaCatalog>,
    analyzer: QuestionAnalyzer,
    statics: StaticResponseGenerator,
    fallback_cache: Arc<FallbackCache>,
    result_cache: Arc<ResultCache>,
    policies: RecoveryPolicyTable,
    telemetry: Arc<dyn TelemetrySink>,
    config: BoardConfig,
}

impl ResponseOrchestrator {
    pub fn new(client: Arc<dyn ModelClient>, config: BoardConfig) -> Self {
        let result_cache = Arc::new(ResultCache::new(config.result_cache_ttl()));
        Self {
            client,
            catalog: Arc::new(PersonaCatalog::new()),
            analyzer: QuestionAnalyzer::new(),
            statics: StaticResponseGenerator::new(),
            fallback_cache: Arc::new(FallbackCache::new()),
            result_cache,
            policies: RecoveryPolicyTable::standard(),
            telemetry: Arc::new(NoopSink),
            config,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<PersonaCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_policies(mut self, policies: RecoveryPolicyTable) -> Self {
        self.policies = policies;
        self
    }

    /// Shared handle, e.g. for wiring [`crate::cache::spawn_sweeper`].
    pub fn fallback_cache(&self) -> Arc<FallbackCache> {
        Arc::clone(&self.fallback_cache)
    }

    pub fn result_cache(&self) -> Arc<ResultCache> {
        Arc::clone(&self.result_cache)
    }

    /// Answer one question with a batch of advisors. Every advisor in the
    /// input receives exactly one response, in input order; total failure
    /// of model, cache and static generation still yields the minimal
    /// apology entry rather than an error. The only `Err` this returns is
    /// configuration-class (fail-fast).
    pub async fn generate(
        &self,
        question: &str,
        advisors: &[AdvisorProfile],
        domain: &str,
    ) -> Result<BatchResult, BoardError> {
        self.validate_config()?;
        let started = Instant::now();

        let hint = Some(domain).filter(|d| !d.trim().is_empty());
        let analysis = self.analyzer.analyze(question, hint);

        let advisor_ids: Vec<String> = advisors.iter().map(|a| a.id.clone()).collect();

        if self.config.enable_caching {
            if let Some(mut cached) = self.result_cache.get(question, &advisor_ids, domain).await {
                self.telemetry.cache_event("result", true);
                cached.from_cache = true;
                return Ok(cached);
            }
            self.telemetry.cache_event("result", false);
        }

        // Lane restrictions only apply when the batch spans boards.
        let mut domains: Vec<String> = advisors.iter().map(|a| a.domain.clone()).collect();
        domains.sort();
        domains.dedup();
        let policy = (domains.len() > 1).then(|| CoordinationPolicy {
            active_domains: domains,
        });

        let window = self.config.max_concurrent_requests.max(1);
        let mut settled: Vec<(usize, Result<AdvisorResponse, BoardError>)> =
            stream::iter(advisors.iter().enumerate().map(|(index, advisor)| {
                let analysis = &analysis;
                let policy = policy.as_ref();
                async move {
                    (index, self.answer_one(advisor, question, analysis, policy).await)
                }
            }))
            .buffer_unordered(window)
            .collect()
            .await;

        // Completion order is arbitrary; the caller sees input order.
        settled.sort_by_key(|(index, _)| *index);

        let mut responses = Vec::with_capacity(settled.len());
        for (_, outcome) in settled {
            responses.push(outcome?);
        }

        let success_count = responses.iter().filter(|r| r.is_substantive()).count();
        let error_count = responses.len() - success_count;

        let result = BatchResult {
            responses,
            success_count,
            error_count,
            analysis,
            total_ms: started.elapsed().as_millis() as u64,
            from_cache: false,
        };

        // Batches assembled under failure must not be replayed for the
        // whole result TTL; the next identical request should reach the
        // (possibly recovered) model instead.
        let degraded = result.responses.iter().any(|r| r.metadata.error.is_some());
        if self.config.enable_caching && !degraded {
            self.result_cache
                .put(question, &advisor_ids, domain, result.clone())
                .await;
        }

        Ok(result)
    }

    /// Probe each subsystem independently. The analyzer, static generator
    /// and persona service have no external dependencies and report healthy
    /// unless their own invariants fail; providers are probed over the wire.
    pub async fn health_check(&self) -> HealthSnapshot {
        let mut model_providers = HashMap::new();
        let name = self.client.provider_name().to_string();
        let available = self.client.healthy().await;
        self.telemetry.provider_availability(&name, available);
        model_providers.insert(name, available);

        let question_analyzer = {
            let probe = self.analyzer.analyze("health check probe", None);
            probe.confidence > 0.0
        };

        let static_generator = {
            let probe_profile = AdvisorProfile::new("health-probe", "Probe", "Advisor", "general");
            let probe = self
                .statics
                .generate(&probe_profile, None, "health check probe", "general", None);
            probe.content.trim().len() > 50
        };

        let persona_service = self
            .catalog
            .list_by_domain("cliniboard")
            .iter()
            .all(|p| p.is_complete());

        HealthSnapshot {
            model_providers,
            static_generator,
            question_analyzer,
            persona_service,
        }
    }

    fn validate_config(&self) -> Result<(), BoardError> {
        if self.config.max_concurrent_requests == 0 {
            return Err(BoardError::new(
                ErrorKind::ConfigurationError,
                "max_concurrent_requests must be at least 1",
            ));
        }
        if self.config.retry.backoff_multiplier < 1.0 {
            return Err(BoardError::new(
                ErrorKind::ConfigurationError,
                "backoff_multiplier must be >= 1.0",
            ));
        }
        Ok(())
    }

    /// The per-advisor pipeline: prompt, model call with timeout, retry
    /// per policy, then the fallback ladder. `Err` only on fail-fast kinds.
    async fn answer_one(
        &self,
        advisor: &AdvisorProfile,
        question: &str,
        analysis: &QuestionAnalysis,
        policy: Option<&CoordinationPolicy>,
    ) -> Result<AdvisorResponse, BoardError> {
        let started = Instant::now();
        let persona = self.catalog.get(&advisor.id);
        let prompt = PromptBuilder::build(persona, advisor, question, analysis, policy);

        let call_options = CallOptions {
            timeout: self.config.response_timeout(),
            ..CallOptions::default()
        };

        let mut attempt: u32 = 1;

        // Initial call plus policy-bounded retries of the same call.
        let last_error = loop {
            self.telemetry
                .recovery_transition(&advisor.id, RecoveryState::Attempting { attempt });
            match self.call_model(&prompt, &call_options).await {
                Ok(content) => {
                    self.telemetry
                        .recovery_transition(&advisor.id, RecoveryState::Succeeded);
                    self.telemetry.provider_availability(self.client.provider_name(), true);
                    let response = self.model_response(advisor, persona, content, attempt, started);
                    if self.config.enable_caching {
                        self.fallback_cache
                            .put(&advisor.id, question, response.clone(), QualityTier::High)
                            .await;
                    }
                    self.telemetry.response_time(
                        &advisor.id,
                        ResponseSource::Model,
                        response.metadata.processing_ms,
                    );
                    return Ok(response);
                }
                Err(err) => {
                    let recovery = self.policies.get(err.kind);
                    self.telemetry.error(err.kind, recovery.severity, &err.message);
                    if matches!(
                        err.kind,
                        ErrorKind::ApiUnavailable
                            | ErrorKind::ServiceUnavailable
                            | ErrorKind::NetworkError
                            | ErrorKind::ResponseTimeout
                    ) {
                        self.telemetry
                            .provider_availability(self.client.provider_name(), false);
                    }

                    let budget = recovery.max_retries.min(self.config.retry.max_retries);
                    let retries_done = attempt - 1;
                    // Abort the retry loop the moment the observed kind is
                    // not retryable, even with budget remaining.
                    if self.policies.is_retryable(err.kind) && retries_done < budget {
                        self.telemetry.recovery_transition(
                            &advisor.id,
                            RecoveryState::Retrying { next_attempt: attempt + 1 },
                        );
                        tokio::time::sleep(backoff_delay(attempt, &self.config.retry)).await;
                        attempt += 1;
                        continue;
                    }

                    break err;
                }
            }
        };

        let recovery = self.policies.get(last_error.kind);
        if recovery.strategy == RecoveryStrategy::FailFast {
            self.telemetry
                .recovery_transition(&advisor.id, RecoveryState::FailedFast);
            return Err(last_error);
        }

        Ok(self
            .recover(advisor, persona, question, analysis, last_error, attempt, started)
            .await)
    }

    async fn call_model(
        &self,
        prompt: &str,
        options: &CallOptions,
    ) -> Result<String, BoardError> {
        let outcome = tokio::time::timeout(options.timeout, self.client.call(prompt, options)).await;
        match outcome {
            Err(_) => Err(BoardError::timeout(options.timeout.as_millis() as u64)),
            Ok(Err(err)) => Err(err),
            Ok(Ok(reply)) => {
                if reply.content.trim().is_empty() {
                    Err(BoardError::new(
                        ErrorKind::InvalidResponse,
                        "model returned empty content",
                    ))
                } else {
                    Ok(reply.content)
                }
            }
        }
    }

    /// The fallback ladder: fresh cached answer, then static generation,
    /// then an expired high-quality cache entry as an emergency source,
    /// then the hard-coded apology floor. Always returns something.
    async fn recover(
        &self,
        advisor: &AdvisorProfile,
        persona: Option<&PersonaDescriptor>,
        question: &str,
        analysis: &QuestionAnalysis,
        error: BoardError,
        attempts: u32,
        started: Instant,
    ) -> AdvisorResponse {
        let recovery = self.policies.get(error.kind);
        self.telemetry.fallback_used(&advisor.id, error.kind);
        self.telemetry
            .recovery_transition(&advisor.id, RecoveryState::FallbackInvoked);
        let error_info = ErrorInfo {
            kind: error.kind,
            message: error.message.clone(),
            fallback_used: true,
        };

        if self.config.enable_caching {
            if let Some(mut cached) = self.fallback_cache.try_get(&advisor.id, question).await {
                self.telemetry.cache_event("fallback", true);
                cached.metadata.source = ResponseSource::Cached;
                cached.metadata.attempts = attempts;
                cached.metadata.processing_ms = started.elapsed().as_millis() as u64;
                cached.metadata.error = Some(error_info);
                self.telemetry.response_time(
                    &advisor.id,
                    ResponseSource::Cached,
                    cached.metadata.processing_ms,
                );
                self.telemetry
                    .recovery_transition(&advisor.id, RecoveryState::Degraded);
                return cached;
            }
            self.telemetry.cache_event("fallback", false);
        }

        if recovery.fallback_to_static {
            let mut response =
                self.statics
                    .generate(advisor, persona, question, &advisor.domain, Some(analysis));
            response.metadata.attempts = attempts;
            response.metadata.processing_ms = started.elapsed().as_millis() as u64;
            response.metadata.error = Some(error_info);
            if self.config.enable_caching {
                self.fallback_cache
                    .put(&advisor.id, question, response.clone(), QualityTier::Medium)
                    .await;
            }
            self.telemetry.response_time(
                &advisor.id,
                ResponseSource::Static,
                response.metadata.processing_ms,
            );
            self.telemetry
                .recovery_transition(&advisor.id, RecoveryState::Degraded);
            return response;
        }

        // Emergency source: expired but high-quality cached answer.
        if self.config.enable_caching {
            if let Some(mut cached) = self.fallback_cache.try_get_degraded(&advisor.id, question).await
            {
                cached.metadata.source = ResponseSource::Cached;
                cached.metadata.attempts = attempts;
                cached.metadata.confidence = (cached.metadata.confidence * 0.5).max(0.2);
                cached.metadata.processing_ms = started.elapsed().as_millis() as u64;
                cached.metadata.error = Some(error_info);
                self.telemetry
                    .recovery_transition(&advisor.id, RecoveryState::Degraded);
                return cached;
            }
        }

        self.telemetry
            .recovery_transition(&advisor.id, RecoveryState::Degraded);
        self.apology(advisor, persona, error_info, attempts, started)
    }

    fn model_response(
        &self,
        advisor: &AdvisorProfile,
        persona: Option<&PersonaDescriptor>,
        content: String,
        attempts: u32,
        started: Instant,
    ) -> AdvisorResponse {
        // Confidence tapers slightly when the answer needed retries.
        let confidence = (0.9 - 0.05 * (attempts.saturating_sub(1)) as f32).max(0.7);
        AdvisorResponse {
            id: uuid::Uuid::new_v4().to_string(),
            advisor_id: advisor.id.clone(),
            content,
            created_at: chrono::Utc::now(),
            persona: self.snapshot(advisor, persona),
            metadata: ResponseMetadata {
                source: ResponseSource::Model,
                processing_ms: started.elapsed().as_millis() as u64,
                confidence,
                attempts,
                frameworks: persona.map(|p| p.frameworks.clone()).unwrap_or_default(),
                model: Some(self.client.provider_name().to_string()),
                error: None,
            },
        }
    }

    /// Last resort: the advisor-voiced minimal apology, confidence 0.1.
    /// Counted as a failure in the batch accounting but still a complete,
    /// non-empty response.
    fn apology(
        &self,
        advisor: &AdvisorProfile,
        persona: Option<&PersonaDescriptor>,
        error_info: ErrorInfo,
        attempts: u32,
        started: Instant,
    ) -> AdvisorResponse {
        AdvisorResponse {
            id: uuid::Uuid::new_v4().to_string(),
            advisor_id: advisor.id.clone(),
            content: "I apologize - I'm not able to give you a considered answer right now. \
                      Please ask again in a few minutes."
                .to_string(),
            created_at: chrono::Utc::now(),
            persona: self.snapshot(advisor, persona),
            metadata: ResponseMetadata {
                source: ResponseSource::Static,
                processing_ms: started.elapsed().as_millis() as u64,
                confidence: 0.1,
                attempts,
                frameworks: Vec::new(),
                model: None,
                error: Some(error_info),
            },
        }
    }

    fn snapshot(&self, advisor: &AdvisorProfile, persona: Option<&PersonaDescriptor>) -> PersonaSnapshot {
        match persona {
            Some(p) => PersonaSnapshot {
                name: advisor.name.clone(),
                expertise: p.expertise.clone(),
                tone: p.tone.clone(),
            },
            None => PersonaSnapshot {
                name: advisor.name.clone(),
                expertise: advisor.specialties.clone(),
                tone: "professional".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ModelReply, Usage};
    use async_trait::async_trait;

    struct AlwaysOk;

    #[async_trait]
    impl ModelClient for AlwaysOk {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn call(&self, _prompt: &str, _options: &CallOptions) -> Result<ModelReply, BoardError> {
            Ok(ModelReply {
                content: "a considered answer".to_string(),
                model: "mock-1".to_string(),
                provider: "mock".to_string(),
                timestamp: chrono::Utc::now(),
                usage: Usage::default(),
            })
        }
    }

    fn advisors(n: usize) -> Vec<AdvisorProfile> {
        (0..n)
            .map(|i| AdvisorProfile::new(&format!("adv-{i}"), &format!("Advisor {i}"), "Advisor", "prodboard"))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_advisor_list_is_empty_batch() {
        let orchestrator = ResponseOrchestrator::new(Arc::new(AlwaysOk), BoardConfig::default());
        let result = orchestrator.generate("q", &[], "prodboard").await.unwrap();
        assert!(result.responses.is_empty());
        assert_eq!(result.success_count, 0);
    }

    #[tokio::test]
    async fn test_zero_concurrency_fails_fast() {
        let config = BoardConfig {
            max_concurrent_requests: 0,
            ..BoardConfig::default()
        };
        let orchestrator = ResponseOrchestrator::new(Arc::new(AlwaysOk), config);
        let err = orchestrator
            .generate("q", &advisors(1), "prodboard")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfigurationError);
    }

    #[tokio::test]
    async fn test_responses_in_input_order() {
        let orchestrator = ResponseOrchestrator::new(Arc::new(AlwaysOk), BoardConfig::default());
        let batch = advisors(7);
        let result = orchestrator.generate("q", &batch, "prodboard").await.unwrap();
        let ids: Vec<&str> = result.responses.iter().map(|r| r.advisor_id.as_str()).collect();
        let expected: Vec<String> = batch.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
        assert!(result.for_advisor("adv-3").is_some());
    }

    #[tokio::test]
    async fn test_health_check_reports_all_subsystems() {
        let orchestrator = ResponseOrchestrator::new(Arc::new(AlwaysOk), BoardConfig::default());
        let snapshot = orchestrator.health_check().await;
        assert_eq!(snapshot.model_providers.get("mock"), Some(&true));
        assert!(snapshot.static_generator);
        assert!(snapshot.question_analyzer);
        assert!(snapshot.persona_service);
    }
}
