use crate::providers::{ChatProvider, ChatRequest, ChatResponse, TokenUsage};
use crate::{LlmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Azure OpenAI provider. Azure routes by deployment name rather than model
/// name and authenticates with an `api-key` header instead of a bearer
/// token; the `model` field of the request is ignored in favor of the
/// configured deployment.
pub struct AzureOpenAiProvider {
  client: Client,
  api_key: String,
  endpoint: String,
  deployment: String,
  api_version: String,
}

impl AzureOpenAiProvider {
  pub fn new(api_key: &str, endpoint: &str) -> Result<Self> {
    if api_key.is_empty() {
      return Err(LlmError::MissingApiKey {
        provider: "azure-openai".to_string(),
      });
    }
    if endpoint.is_empty() {
      return Err(LlmError::ConfigurationError {
        message: "azure-openai endpoint must not be empty".to_string(),
      });
    }

    Ok(Self {
      client: Client::new(),
      api_key: api_key.to_string(),
      endpoint: endpoint.trim_end_matches('/').to_string(),
      deployment: "gpt-4o".to_string(),
      api_version: DEFAULT_API_VERSION.to_string(),
    })
  }

  pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
    self.deployment = deployment.into();
    self
  }

  pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
    self.api_version = api_version.into();
    self
  }

  fn completions_url(&self) -> String {
    format!(
      "{}/openai/deployments/{}/chat/completions?api-version={}",
      self.endpoint, self.deployment, self.api_version
    )
  }

  fn build_request_body(&self, request: &ChatRequest) -> Value {
    let mut body = json!({ "messages": request.messages });
    if let Some(temperature) = request.temperature {
      body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
      body["max_tokens"] = json!(max_tokens);
    }
    body
  }
}

#[async_trait]
impl ChatProvider for AzureOpenAiProvider {
  fn name(&self) -> &str {
    "azure-openai"
  }

  async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
    let response = self
      .client
      .post(self.completions_url())
      .header("api-key", &self.api_key)
      .header("Content-Type", "application/json")
      .json(&self.build_request_body(request))
      .send()
      .await?;

    if !response.status().is_success() {
      let status_code = response.status().as_u16();
      let error_text = response.text().await.unwrap_or_default();
      return Err(LlmError::HttpError {
        status_code,
        message: error_text,
      });
    }

    let azure_response: AzureResponse = response.json().await?;
    let content = azure_response
      .choices
      .first()
      .and_then(|choice| choice.message.content.clone())
      .unwrap_or_default();
    let usage = azure_response.usage.map(|u| TokenUsage {
      prompt_tokens: Some(u.prompt_tokens),
      completion_tokens: Some(u.completion_tokens),
      total_tokens: Some(u.total_tokens),
    });

    Ok(ChatResponse { content, usage })
  }

  async fn validate_config(&self) -> Result<()> {
    if self.deployment.is_empty() {
      return Err(LlmError::ConfigurationError {
        message: "azure-openai deployment name must not be empty".to_string(),
      });
    }
    Ok(())
  }

  fn base_url(&self) -> &str {
    &self.endpoint
  }
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
  choices: Vec<AzureChoice>,
  usage: Option<AzureUsage>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
  message: AzureMessage,
}

#[derive(Debug, Deserialize)]
struct AzureMessage {
  content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureUsage {
  prompt_tokens: u32,
  completion_tokens: u32,
  total_tokens: u32,
}
