//! Ports consumed by the engine: external capability providers and
//! persistence. Implementations live in the provider crates; mocks are
//! first-class peers of the real adapters.

pub mod llm;
pub mod speech;
pub mod store;
pub mod vector;

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

pub use llm::{
  EvaluationDigest, ExemplarQuestion, FollowUpPrompt, GapReport, LanguageModel, PlanningContext,
  RawEvaluation, RecommendationSet, SummaryContext,
};
pub use speech::{SpeechToText, TextToSpeech, Transcription};
pub use store::{
  AnswerStore, CandidateStore, CvAnalysisStore, EvaluationStore, FollowUpStore, InterviewStore,
  QuestionStore,
};
pub use vector::{Embeddings, QuestionFilter, SimilarQuestion};

/// Bound a provider call by `limit`, surfacing expiry as a recoverable
/// timeout. Every external call in the engine goes through this.
pub async fn timed<T, F>(limit: Duration, fut: F) -> Result<T, ProviderError>
where
  F: Future<Output = Result<T, ProviderError>>,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(result) => result,
    Err(_) => Err(ProviderError::Timeout {
      timeout_ms: limit.as_millis() as u64,
    }),
  }
}
