pub mod analyzer;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod persona;
pub mod prompt;
pub mod response;
pub mod statics;
pub mod telemetry;

pub use analyzer::{QuestionAnalysis, QuestionAnalyzer, QuestionType};
pub use cache::{FallbackCache, QualityTier, ResultCache};
pub use client::{CallOptions, HttpModelClient, ModelClient, ModelReply};
pub use config::{BoardConfig, RetryConfig};
pub use error::{BoardError, ErrorKind, RecoveryPolicyTable, RecoveryStrategy};
pub use orchestrator::{HealthSnapshot, ResponseOrchestrator};
pub use persona::{PersonaCatalog, PersonaDescriptor};
pub use prompt::{CoordinationPolicy, PromptBuilder};
pub use response::{AdvisorProfile, AdvisorResponse, BatchResult, ResponseSource};
pub use statics::StaticResponseGenerator;
pub use telemetry::{NoopSink, TelemetrySink, TracingSink};
