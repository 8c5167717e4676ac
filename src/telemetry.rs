//! Telemetry Sink
//!
//! Fire-and-forget observability hooks. The core calls into a sink but
//! functions identically with a no-op; nothing here may affect control
//! flow or block the orchestration path.

use crate::error::{ErrorKind, RecoveryState, Severity};
use crate::response::ResponseSource;
use std::sync::Mutex;

pub trait TelemetrySink: Send + Sync {
    fn response_time(&self, _advisor_id: &str, _source: ResponseSource, _elapsed_ms: u64) {}

    fn fallback_used(&self, _advisor_id: &str, _kind: ErrorKind) {}

    /// One per-advisor recovery state transition, in occurrence order.
    fn recovery_transition(&self, _advisor_id: &str, _state: RecoveryState) {}

    /// `cache` names the cache ("fallback" / "result").
    fn cache_event(&self, _cache: &str, _hit: bool) {}

    fn provider_availability(&self, _provider: &str, _available: bool) {}

    fn error(&self, _kind: ErrorKind, _severity: Severity, _message: &str) {}
}

/// Does nothing. The default sink when the embedding application wires no
/// observability.
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

/// Forwards events to `tracing` so the embedding application's subscriber
/// decides what to keep.
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn response_time(&self, advisor_id: &str, source: ResponseSource, elapsed_ms: u64) {
        tracing::debug!(advisor_id, ?source, elapsed_ms, "advisor response settled");
    }

    fn fallback_used(&self, advisor_id: &str, kind: ErrorKind) {
        tracing::warn!(advisor_id, kind = kind.as_str(), "fallback path used");
    }

    fn recovery_transition(&self, advisor_id: &str, state: RecoveryState) {
        tracing::debug!(advisor_id, ?state, "recovery transition");
    }

    fn cache_event(&self, cache: &str, hit: bool) {
        tracing::debug!(cache, hit, "cache lookup");
    }

    fn provider_availability(&self, provider: &str, available: bool) {
        tracing::info!(provider, available, "provider availability");
    }

    fn error(&self, kind: ErrorKind, severity: Severity, message: &str) {
        match severity {
            Severity::Critical | Severity::High => {
                tracing::error!(kind = kind.as_str(), ?severity, message, "classified error")
            }
            _ => tracing::warn!(kind = kind.as_str(), ?severity, message, "classified error"),
        }
    }
}

/// Accumulates events in memory for assertions. Test use.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    ResponseTime {
        advisor_id: String,
        source: ResponseSource,
        elapsed_ms: u64,
    },
    FallbackUsed {
        advisor_id: String,
        kind: ErrorKind,
    },
    Recovery {
        advisor_id: String,
        state: RecoveryState,
    },
    CacheEvent {
        cache: String,
        hit: bool,
    },
    ProviderAvailability {
        provider: String,
        available: bool,
    },
    Error {
        kind: ErrorKind,
        severity: Severity,
    },
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count<F: Fn(&TelemetryEvent) -> bool>(&self, predicate: F) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: TelemetryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl TelemetrySink for RecordingSink {
    fn response_time(&self, advisor_id: &str, source: ResponseSource, elapsed_ms: u64) {
        self.push(TelemetryEvent::ResponseTime {
            advisor_id: advisor_id.to_string(),
            source,
            elapsed_ms,
        });
    }

    fn fallback_used(&self, advisor_id: &str, kind: ErrorKind) {
        self.push(TelemetryEvent::FallbackUsed {
            advisor_id: advisor_id.to_string(),
            kind,
        });
    }

    fn recovery_transition(&self, advisor_id: &str, state: RecoveryState) {
        self.push(TelemetryEvent::Recovery {
            advisor_id: advisor_id.to_string(),
            state,
        });
    }

    fn cache_event(&self, cache: &str, hit: bool) {
        self.push(TelemetryEvent::CacheEvent {
            cache: cache.to_string(),
            hit,
        });
    }

    fn provider_availability(&self, provider: &str, available: bool) {
        self.push(TelemetryEvent::ProviderAvailability {
            provider: provider.to_string(),
            available,
        });
    }

    fn error(&self, kind: ErrorKind, severity: Severity, _message: &str) {
        self.push(TelemetryEvent::Error { kind, severity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_accepts_everything() {
        let sink = NoopSink;
        sink.response_time("a1", ResponseSource::Model, 10);
        sink.fallback_used("a1", ErrorKind::NetworkError);
        sink.recovery_transition("a1", RecoveryState::Attempting { attempt: 1 });
        sink.cache_event("fallback", true);
        sink.provider_availability("gemini", false);
        sink.error(ErrorKind::UnknownError, Severity::Low, "x");
    }

    #[test]
    fn test_recording_sink_accumulates() {
        let sink = RecordingSink::new();
        sink.cache_event("result", true);
        sink.cache_event("result", false);
        sink.fallback_used("a1", ErrorKind::RateLimited);
        assert_eq!(sink.events().len(), 3);
        assert_eq!(
            sink.count(|e| matches!(e, TelemetryEvent::CacheEvent { hit: true, .. })),
            1
        );
    }
}
