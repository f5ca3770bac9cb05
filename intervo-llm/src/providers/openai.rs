use crate::providers::{ChatProvider, ChatRequest, ChatResponse, TokenUsage};
use crate::{LlmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub struct OpenAiProvider {
  client: Client,
  api_key: String,
  base_url: String,
}

impl OpenAiProvider {
  pub fn new(api_key: &str, base_url: Option<String>) -> Result<Self> {
    if api_key.is_empty() {
      return Err(LlmError::MissingApiKey {
        provider: "openai".to_string(),
      });
    }

    let client = Client::new();
    let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());

    Ok(Self {
      client,
      api_key: api_key.to_string(),
      base_url,
    })
  }

  fn build_headers(&self) -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("Content-Type", "application/json".parse().unwrap());
    headers.insert(
      "Authorization",
      format!("Bearer {}", self.api_key).parse().unwrap(),
    );
    headers
  }

  fn build_request_body(&self, request: &ChatRequest) -> Value {
    let mut body = json!({
      "model": request.model,
      "messages": request.messages,
    });
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
impl ChatProvider for OpenAiProvider {
  fn name(&self) -> &str {
    "openai"
  }

  async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
    let url = format!("{}/chat/completions", self.base_url);
    let body = self.build_request_body(request);

    let response = self
      .client
      .post(&url)
      .headers(self.build_headers())
      .json(&body)
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

    let openai_response: OpenAiResponse = response.json().await?;

    let content = openai_response
      .choices
      .first()
      .and_then(|choice| choice.message.content.clone())
      .unwrap_or_default();

    let usage = openai_response.usage.map(|u| TokenUsage {
      prompt_tokens: Some(u.prompt_tokens),
      completion_tokens: Some(u.completion_tokens),
      total_tokens: Some(u.total_tokens),
    });

    Ok(ChatResponse { content, usage })
  }

  async fn validate_config(&self) -> Result<()> {
    let url = format!("{}/models", self.base_url);

    let response = self
      .client
      .get(&url)
      .headers(self.build_headers())
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(LlmError::AuthenticationError {
        provider: "openai".to_string(),
        message: "Failed to authenticate with OpenAI API".to_string(),
      });
    }

    Ok(())
  }

  fn base_url(&self) -> &str {
    &self.base_url
  }
}

// OpenAI API response structures
#[derive(Debug, Deserialize, Serialize)]
struct OpenAiResponse {
  choices: Vec<OpenAiChoice>,
  usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OpenAiChoice {
  message: OpenAiMessage,
  finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct OpenAiMessage {
  role: String,
  content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct OpenAiUsage {
  prompt_tokens: u32,
  completion_tokens: u32,
  total_tokens: u32,
}
