use crate::{LlmError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod azure;
pub mod mock;
pub mod openai;

pub use azure::AzureOpenAiProvider;
pub use mock::MockChatProvider;
pub use openai::OpenAiProvider;

/// Request structure for chat-completion providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub temperature: Option<f32>,
  pub max_tokens: Option<u32>,
}

impl ChatRequest {
  pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
    Self {
      model: model.into(),
      messages: vec![
        ChatMessage::system(system),
        ChatMessage::user(user),
      ],
      temperature: None,
      max_tokens: None,
    }
  }

  pub fn with_temperature(mut self, temperature: f32) -> Self {
    self.temperature = Some(temperature);
    self
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: "system".to_string(),
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: "user".to_string(),
      content: content.into(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
  pub prompt_tokens: Option<u32>,
  pub completion_tokens: Option<u32>,
  pub total_tokens: Option<u32>,
}

/// Response structure from chat-completion providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
  pub content: String,
  pub usage: Option<TokenUsage>,
}

/// Trait that all chat-completion providers implement. Requests are unary;
/// the interview engine has no streaming consumers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
  /// Provider name (e.g. "openai", "azure-openai", "mock").
  fn name(&self) -> &str;

  async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;

  /// Validate that the provider is properly configured.
  async fn validate_config(&self) -> Result<()>;

  fn base_url(&self) -> &str;
}

/// Factory function to create providers by name.
pub fn create_provider(
  provider_name: &str,
  api_key: &str,
  base_url: Option<String>,
) -> Result<Arc<dyn ChatProvider>> {
  match provider_name.to_lowercase().as_str() {
    "mock" => Ok(Arc::new(MockChatProvider::new())),
    "openai" => Ok(Arc::new(OpenAiProvider::new(api_key, base_url)?)),
    "azure" | "azure-openai" => {
      let endpoint = base_url.ok_or_else(|| LlmError::ConfigurationError {
        message: "azure-openai requires an endpoint URL".to_string(),
      })?;
      Ok(Arc::new(AzureOpenAiProvider::new(api_key, &endpoint)?))
    }
    _ => Err(LlmError::UnsupportedProvider {
      provider: provider_name.to_string(),
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn factory_knows_its_providers() {
    assert!(create_provider("mock", "", None).is_ok());
    assert!(create_provider("openai", "key", None).is_ok());
    assert!(create_provider("azure", "key", Some("https://x.openai.azure.com".into())).is_ok());
    assert!(create_provider("azure", "key", None).is_err());
    assert!(create_provider("llamacpp", "key", None).is_err());
  }
}
