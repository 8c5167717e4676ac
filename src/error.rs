//! Error Taxonomy & Recovery Policy
//!
//! Every failure from any subsystem is normalized into one [`ErrorKind`]
//! before recovery logic runs; raw exceptions never reach the caller of
//! `generate()`. The policy table is immutable data - overrides produce a
//! new table rather than mutating shared state.

use crate::config::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Closed failure taxonomy. Anything unrecognized is coerced to
/// `UnknownError` with the original message preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ApiUnavailable,
    RateLimited,
    InvalidResponse,
    NetworkError,
    ConfigurationError,
    AuthenticationError,
    QuotaExceeded,
    PersonaNotFound,
    PromptGenerationError,
    QuestionAnalysisError,
    InvalidQuestionFormat,
    ResponseTimeout,
    ResponseValidationError,
    ConcurrentProcessingError,
    CacheError,
    ConfigurationLoadError,
    ServiceUnavailable,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ApiUnavailable => "api_unavailable",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::PersonaNotFound => "persona_not_found",
            ErrorKind::PromptGenerationError => "prompt_generation_error",
            ErrorKind::QuestionAnalysisError => "question_analysis_error",
            ErrorKind::InvalidQuestionFormat => "invalid_question_format",
            ErrorKind::ResponseTimeout => "response_timeout",
            ErrorKind::ResponseValidationError => "response_validation_error",
            ErrorKind::ConcurrentProcessingError => "concurrent_processing_error",
            ErrorKind::CacheError => "cache_error",
            ErrorKind::ConfigurationLoadError => "configuration_load_error",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified error carried through the recovery path.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct BoardError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BoardError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Coerce an arbitrary failure into the taxonomy, preserving its
    /// message for logging. Used at every subsystem boundary.
    pub fn coerce<E: fmt::Display>(err: E) -> Self {
        Self::new(ErrorKind::UnknownError, err.to_string())
    }

    pub fn timeout(elapsed_ms: u64) -> Self {
        Self::new(
            ErrorKind::ResponseTimeout,
            format!("model call exceeded {}ms", elapsed_ms),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    Retry,
    Fallback,
    GracefulDegradation,
    FailFast,
    UserIntervention,
}

/// Per-kind recovery parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    pub strategy: RecoveryStrategy,
    pub severity: Severity,
    /// Maximum retry attempts after the initial call (0 for non-retry kinds).
    pub max_retries: u32,
    /// Whether the static generator is a permitted fallback tier.
    pub fallback_to_static: bool,
    /// Whether the UI layer should surface a banner. Content is delivered
    /// either way; auth detail in particular must never leak to the user.
    pub notify_user: bool,
}

const fn policy(
    strategy: RecoveryStrategy,
    severity: Severity,
    max_retries: u32,
    fallback_to_static: bool,
    notify_user: bool,
) -> RecoveryPolicy {
    RecoveryPolicy {
        strategy,
        severity,
        max_retries,
        fallback_to_static,
        notify_user,
    }
}

/// Last-resort policy for kinds missing from a (possibly overridden) table.
const UNKNOWN_POLICY: RecoveryPolicy = policy(
    RecoveryStrategy::Fallback,
    Severity::Medium,
    0,
    true,
    false,
);

/// Immutable kind -> policy mapping. Construct once, share by reference;
/// [`RecoveryPolicyTable::with_policy`] returns a modified copy.
#[derive(Debug, Clone)]
pub struct RecoveryPolicyTable {
    policies: HashMap<ErrorKind, RecoveryPolicy>,
}

impl Default for RecoveryPolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RecoveryPolicyTable {
    pub fn standard() -> Self {
        use ErrorKind::*;
        use RecoveryStrategy::*;
        use Severity::*;

        let mut policies = HashMap::new();
        policies.insert(ApiUnavailable, policy(Fallback, High, 0, true, true));
        policies.insert(RateLimited, policy(Retry, Medium, 3, true, true));
        policies.insert(NetworkError, policy(Retry, Medium, 3, true, true));
        policies.insert(InvalidResponse, policy(Retry, Medium, 2, true, false));
        policies.insert(AuthenticationError, policy(Fallback, High, 0, true, false));
        policies.insert(QuotaExceeded, policy(Fallback, High, 0, true, false));
        policies.insert(PersonaNotFound, policy(GracefulDegradation, Low, 0, true, false));
        policies.insert(ResponseTimeout, policy(Fallback, Medium, 0, true, false));
        policies.insert(ResponseValidationError, policy(Retry, Medium, 2, true, false));
        policies.insert(CacheError, policy(GracefulDegradation, Low, 0, false, false));
        policies.insert(ServiceUnavailable, policy(Fallback, High, 0, true, true));
        policies.insert(PromptGenerationError, policy(Fallback, Medium, 0, true, false));
        policies.insert(QuestionAnalysisError, policy(GracefulDegradation, Low, 0, true, false));
        policies.insert(ConcurrentProcessingError, policy(Fallback, Medium, 0, true, false));
        policies.insert(InvalidQuestionFormat, policy(UserIntervention, Low, 0, true, true));
        policies.insert(ConfigurationError, policy(FailFast, Critical, 0, false, true));
        policies.insert(ConfigurationLoadError, policy(FailFast, Critical, 0, false, true));
        policies.insert(UnknownError, UNKNOWN_POLICY);

        Self { policies }
    }

    /// Policy for a kind. Kinds absent from the table (only possible after
    /// an override removed nothing - but never crash on it) resolve to the
    /// unknown-error policy.
    pub fn get(&self, kind: ErrorKind) -> RecoveryPolicy {
        self.policies
            .get(&kind)
            .copied()
            .or_else(|| self.policies.get(&ErrorKind::UnknownError).copied())
            .unwrap_or(UNKNOWN_POLICY)
    }

    /// A new table with one policy replaced. The original is untouched.
    pub fn with_policy(&self, kind: ErrorKind, policy: RecoveryPolicy) -> Self {
        let mut policies = self.policies.clone();
        policies.insert(kind, policy);
        Self { policies }
    }

    /// True when the kind's mapped strategy is retry. A retry loop aborts
    /// the moment it observes a non-retryable kind, without exhausting its
    /// budget.
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.get(kind).strategy == RecoveryStrategy::Retry
    }
}

/// Exponential backoff before retry attempt `retry_attempt` (1-based):
/// `min(base * multiplier^(attempt-1), max)`. There is no delay before the
/// first (initial) call.
pub fn backoff_delay(retry_attempt: u32, cfg: &RetryConfig) -> Duration {
    let exponent = retry_attempt.saturating_sub(1);
    let factor = cfg.backoff_multiplier.max(1.0).powi(exponent as i32);
    let delay_ms = (cfg.base_delay_ms as f64 * factor).min(cfg.max_delay_ms as f64);
    Duration::from_millis(delay_ms as u64)
}

/// State of one per-advisor recovery attempt. Terminal states are
/// `Succeeded`, `Degraded` and `FailedFast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Attempting { attempt: u32 },
    Retrying { next_attempt: u32 },
    FallbackInvoked,
    Succeeded,
    Degraded,
    FailedFast,
}

impl RecoveryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecoveryState::Succeeded | RecoveryState::Degraded | RecoveryState::FailedFast
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_policy_table_rows() {
        let table = RecoveryPolicyTable::standard();

        let rate = table.get(ErrorKind::RateLimited);
        assert_eq!(rate.strategy, RecoveryStrategy::Retry);
        assert_eq!(rate.max_retries, 3);
        assert!(rate.notify_user);

        let net = table.get(ErrorKind::NetworkError);
        assert_eq!(net.strategy, RecoveryStrategy::Retry);
        assert_eq!(net.max_retries, 3);

        let auth = table.get(ErrorKind::AuthenticationError);
        assert_eq!(auth.strategy, RecoveryStrategy::Fallback);
        assert_eq!(auth.max_retries, 0);
        // Never leak auth detail to the user
        assert!(!auth.notify_user);
        assert!(auth.fallback_to_static);

        let invalid = table.get(ErrorKind::InvalidResponse);
        assert_eq!(invalid.strategy, RecoveryStrategy::Retry);
        assert_eq!(invalid.max_retries, 2);

        let cache = table.get(ErrorKind::CacheError);
        assert_eq!(cache.strategy, RecoveryStrategy::GracefulDegradation);
        assert!(!cache.fallback_to_static);

        let api = table.get(ErrorKind::ApiUnavailable);
        assert_eq!(api.strategy, RecoveryStrategy::Fallback);
        assert!(api.notify_user);

        let config = table.get(ErrorKind::ConfigurationError);
        assert_eq!(config.strategy, RecoveryStrategy::FailFast);
        assert_eq!(config.severity, Severity::Critical);
    }

    #[test]
    fn test_unknown_kind_resolves_to_unknown_policy() {
        let table = RecoveryPolicyTable::standard();
        let unknown = table.get(ErrorKind::UnknownError);
        assert_eq!(unknown.strategy, RecoveryStrategy::Fallback);
        assert!(unknown.fallback_to_static);
    }

    #[test]
    fn test_with_policy_returns_new_table() {
        let table = RecoveryPolicyTable::standard();
        let overridden = table.with_policy(
            ErrorKind::RateLimited,
            policy(RecoveryStrategy::Fallback, Severity::Low, 0, true, false),
        );
        assert_eq!(overridden.get(ErrorKind::RateLimited).strategy, RecoveryStrategy::Fallback);
        // Original untouched
        assert_eq!(table.get(ErrorKind::RateLimited).strategy, RecoveryStrategy::Retry);
    }

    #[test]
    fn test_backoff_curve() {
        let cfg = RetryConfig {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(backoff_delay(1, &cfg), Duration::from_millis(500));
        assert_eq!(backoff_delay(2, &cfg), Duration::from_millis(1_000));
        assert_eq!(backoff_delay(3, &cfg), Duration::from_millis(2_000));
        // Capped at max_delay
        assert_eq!(backoff_delay(10, &cfg), Duration::from_millis(8_000));
    }

    #[test]
    fn test_coerce_preserves_message() {
        let err = BoardError::coerce("socket hangup mid-body");
        assert_eq!(err.kind, ErrorKind::UnknownError);
        assert!(err.message.contains("socket hangup"));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RecoveryState::Succeeded.is_terminal());
        assert!(RecoveryState::Degraded.is_terminal());
        assert!(RecoveryState::FailedFast.is_terminal());
        assert!(!RecoveryState::Attempting { attempt: 1 }.is_terminal());
        assert!(!RecoveryState::Retrying { next_attempt: 2 }.is_terminal());
        assert!(!RecoveryState::FallbackInvoked.is_terminal());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ApiUnavailable).unwrap();
        assert_eq!(json, "\"api_unavailable\"");
        assert_eq!(ErrorKind::ResponseTimeout.to_string(), "response_timeout");
    }
}
