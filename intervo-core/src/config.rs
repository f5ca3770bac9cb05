use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Tunable knobs of the session engine.
///
/// The defaults mirror the recommended operational bounds: 30 s for LLM
/// calls, 10 s for embeddings and speech, a 0.8 similarity cut-off for
/// follow-up probing, and a 70/30 split between content and delivery in the
/// final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  #[serde(with = "humantime_serde")]
  pub llm_timeout: Duration,
  #[serde(with = "humantime_serde")]
  pub embedding_timeout: Duration,
  #[serde(with = "humantime_serde")]
  pub speech_timeout: Duration,

  /// Similarity at or above this value ends the follow-up cycle.
  pub similarity_threshold: f64,
  /// Hard cap on follow-ups per main question.
  pub max_follow_ups: u8,

  /// Weight of the content (theoretical) score in the overall score.
  pub theoretical_weight: f64,
  /// Weight of the delivery (speaking) score in the overall score.
  pub speaking_weight: f64,
  /// Speaking score assumed for answers without voice metrics.
  pub default_speaking_score: f64,

  /// Upper bound on planned questions per interview.
  pub max_questions: usize,
  /// Depth of the per-session inbound event queue.
  pub inbound_queue_depth: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      llm_timeout: Duration::from_secs(30),
      embedding_timeout: Duration::from_secs(10),
      speech_timeout: Duration::from_secs(10),
      similarity_threshold: 0.8,
      max_follow_ups: 3,
      theoretical_weight: 0.7,
      speaking_weight: 0.3,
      default_speaking_score: 50.0,
      max_questions: 5,
      inbound_queue_depth: 32,
    }
  }
}

impl EngineConfig {
  pub fn validate(&self) -> Result<()> {
    if (self.theoretical_weight + self.speaking_weight - 1.0).abs() > 0.01 {
      return Err(EngineError::invalid_input(
        "theoretical_weight and speaking_weight must sum to 1.0",
      ));
    }
    if !(0.0..=1.0).contains(&self.similarity_threshold) {
      return Err(EngineError::invalid_input(
        "similarity_threshold must be within [0, 1]",
      ));
    }
    if self.max_follow_ups == 0 || self.max_questions == 0 {
      return Err(EngineError::invalid_input(
        "max_follow_ups and max_questions must be positive",
      ));
    }
    Ok(())
  }
}
