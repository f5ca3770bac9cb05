use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Difficulty, QuestionType};
use crate::error::ProviderError;

/// Metadata filter for semantic question search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionFilter {
  pub question_type: Option<QuestionType>,
  pub difficulty: Option<Difficulty>,
}

/// One hit from semantic question search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarQuestion {
  pub question_id: Uuid,
  pub score: f64,
  pub metadata: serde_json::Value,
}

/// Text embedding and vector similarity capability.
#[async_trait]
pub trait Embeddings: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

  /// Cosine similarity of two vectors, clamped into [0, 1]. Mismatched or
  /// empty vectors score 0.
  fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
      return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
      dot += f64::from(*x) * f64::from(*y);
      norm_a += f64::from(*x) * f64::from(*x);
      norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
      return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
  }

  /// Semantic exemplar search. Optional: providers without an index return
  /// `Unsupported` and callers degrade to zero exemplars.
  async fn find_similar_questions(
    &self,
    _query: &[f32],
    _top_k: usize,
    _filter: &QuestionFilter,
  ) -> Result<Vec<SimilarQuestion>, ProviderError> {
    Err(ProviderError::Unsupported {
      operation: "find_similar_questions".to_string(),
    })
  }
}
