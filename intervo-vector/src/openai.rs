use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use intervo_core::error::ProviderError;
use intervo_core::ports::Embeddings;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// OpenAI-compatible embeddings client.
pub struct OpenAiEmbeddings {
  client: Client,
  api_key: String,
  base_url: String,
  model: String,
}

impl OpenAiEmbeddings {
  pub fn new(api_key: &str, base_url: Option<String>) -> Result<Self, ProviderError> {
    if api_key.is_empty() {
      return Err(ProviderError::Api {
        provider: "openai-embeddings".to_string(),
        message: "API key must not be empty".to_string(),
      });
    }
    Ok(Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
      model: DEFAULT_MODEL.to_string(),
    })
  }

  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self
  }
}

#[async_trait]
impl Embeddings for OpenAiEmbeddings {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
    let url = format!("{}/embeddings", self.base_url);
    let response = self
      .client
      .post(&url)
      .header("Authorization", format!("Bearer {}", self.api_key))
      .json(&json!({ "model": self.model, "input": text }))
      .send()
      .await
      .map_err(|err| ProviderError::Api {
        provider: "openai-embeddings".to_string(),
        message: err.to_string(),
      })?;

    if !response.status().is_success() {
      let status = response.status().as_u16();
      let body = response.text().await.unwrap_or_default();
      return Err(ProviderError::Api {
        provider: "openai-embeddings".to_string(),
        message: format!("{status} - {body}"),
      });
    }

    let parsed: EmbeddingResponse = response.json().await.map_err(|err| ProviderError::Parse {
      message: err.to_string(),
    })?;
    parsed
      .data
      .into_iter()
      .next()
      .map(|d| d.embedding)
      .ok_or_else(|| ProviderError::Parse {
        message: "embeddings response contained no data".to_string(),
      })
  }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_empty_api_key() {
    assert!(OpenAiEmbeddings::new("", None).is_err());
  }

  #[tokio::test]
  async fn embeds_against_mock_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/embeddings")
      .match_header("authorization", "Bearer key")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#)
      .create_async()
      .await;

    let embeddings = OpenAiEmbeddings::new("key", Some(server.url())).unwrap();
    let vector = embeddings.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn api_errors_surface_with_status() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/embeddings")
      .with_status(429)
      .with_body("slow down")
      .create_async()
      .await;

    let embeddings = OpenAiEmbeddings::new("key", Some(server.url())).unwrap();
    let err = embeddings.embed("hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { .. }));
    assert!(err.to_string().contains("429"));
  }
}
