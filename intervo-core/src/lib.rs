//! # Intervo Core
//!
//! Domain model and adaptive session engine for the Intervo interview
//! platform: a planner pre-computes questions with ideal answers, a
//! per-interview session task drives answers through evaluation and
//! follow-up probing, and a summarizer produces the completion report.
//!
//! External capabilities (LLM, embeddings, speech, persistence) are consumed
//! through the port traits in [`ports`]; adapter crates provide the
//! implementations.

pub mod config;
pub mod decider;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod planner;
pub mod ports;
pub mod session;
pub mod summarizer;

pub use config::EngineConfig;
pub use decider::{decide_follow_up, FollowUpDecision};
pub use domain::{
  Answer, Candidate, ConceptGap, CvAnalysis, Difficulty, Evaluation, ExtractedSkill,
  FollowUpQuestion, GapSeverity, Interview, InterviewStatus, PlanMetadata, Question, QuestionType,
  VoiceMetrics,
};
pub use error::{EngineError, ProviderError, Result, StoreError};
pub use evaluator::AnswerEvaluator;
pub use planner::InterviewPlanner;
pub use session::{InboundEvent, OutboundMessage, SessionDeps, SessionOrchestrator, SessionRegistry};
pub use summarizer::{DetailedFeedback, GapProgression, QuestionSummary, Summarizer};

/// Initialize env-filtered logging for the engine.
///
/// Levels follow the usual split: ERROR for failures that cancel a session,
/// WARN for degraded paths (rollback, fallbacks), INFO for transitions and
/// decisions, DEBUG for gap-detection detail.
#[cfg(feature = "logging")]
pub fn init_logging() {
  use tracing_subscriber::{fmt, EnvFilter};

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intervo_core=info"));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .init();
}
