use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use intervo_core::error::ProviderError;
use intervo_core::ports::Embeddings;

const DEFAULT_DIMENSION: usize = 256;

/// Deterministic feature-hashing embedder: tokens hash into a fixed-size
/// bag-of-words vector which is then L2-normalized. No network, no model
/// weights; texts sharing vocabulary score high cosine similarity, disjoint
/// texts score near zero. Suitable for offline runs and tests.
pub struct HashEmbeddings {
  dimension: usize,
}

impl Default for HashEmbeddings {
  fn default() -> Self {
    Self {
      dimension: DEFAULT_DIMENSION,
    }
  }
}

impl HashEmbeddings {
  pub fn new(dimension: usize) -> Self {
    Self {
      dimension: dimension.max(1),
    }
  }

  fn bucket(&self, token: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % self.dimension
  }
}

#[async_trait]
impl Embeddings for HashEmbeddings {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
    let mut vector = vec![0.0f32; self.dimension];
    for word in text.split_whitespace() {
      let token = word
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
      if token.is_empty() {
        continue;
      }
      vector[self.bucket(&token)] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
      for value in &mut vector {
        *value /= norm;
      }
    }
    Ok(vector)
  }
}
