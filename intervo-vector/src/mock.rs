//! Scripted mock for the `Embeddings` port.
//!
//! Tests that need exact similarity values (threshold boundaries, follow-up
//! cycles) script them here; `cosine_similarity` pops the queue and falls
//! back to a fixed default once it runs dry.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use intervo_core::error::ProviderError;
use intervo_core::ports::Embeddings;

pub struct MockEmbeddings {
  similarities: Mutex<VecDeque<f64>>,
  default_similarity: f64,
}

impl Default for MockEmbeddings {
  fn default() -> Self {
    Self {
      similarities: Mutex::new(VecDeque::new()),
      default_similarity: 0.9,
    }
  }
}

impl MockEmbeddings {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue similarity values, consumed one per comparison.
  pub fn with_similarities<I>(self, values: I) -> Self
  where
    I: IntoIterator<Item = f64>,
  {
    self.similarities.lock().unwrap().extend(values);
    self
  }

  pub fn with_default_similarity(mut self, value: f64) -> Self {
    self.default_similarity = value;
    self
  }
}

#[async_trait]
impl Embeddings for MockEmbeddings {
  async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
    Ok(vec![1.0, 0.0, 0.0])
  }

  fn cosine_similarity(&self, _a: &[f32], _b: &[f32]) -> f64 {
    self
      .similarities
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or(self.default_similarity)
  }
}
