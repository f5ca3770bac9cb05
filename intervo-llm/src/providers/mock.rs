//! Mock chat provider for testing.
//!
//! Simulates chat-completion responses without network access: scripted
//! response queues, latency injection, and failure injection after a set
//! number of successful calls.

use crate::providers::{ChatProvider, ChatRequest, ChatResponse, TokenUsage};
use crate::{LlmError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockChatProvider {
  /// Scripted responses, popped in order; falls back to `default_response`.
  responses: Mutex<VecDeque<String>>,
  default_response: Option<String>,
  delay_ms: u64,
  simulate_error: bool,
  /// Error on every call once this many calls have succeeded.
  fail_after: Option<usize>,
  calls: AtomicUsize,
}

impl MockChatProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fixed response for every call.
  pub fn with_response(mut self, text: impl Into<String>) -> Self {
    self.default_response = Some(text.into());
    self
  }

  /// Queue of responses consumed one per call.
  pub fn with_responses<I, S>(self, responses: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    {
      let mut queue = self.responses.lock().unwrap();
      queue.extend(responses.into_iter().map(Into::into));
    }
    self
  }

  /// Simulated network latency in milliseconds.
  pub fn with_delay(mut self, delay_ms: u64) -> Self {
    self.delay_ms = delay_ms;
    self
  }

  /// Every call fails.
  pub fn with_error(mut self) -> Self {
    self.simulate_error = true;
    self
  }

  /// Calls succeed `n` times, then fail.
  pub fn fail_after(mut self, n: usize) -> Self {
    self.fail_after = Some(n);
    self
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn generate_default_response(&self, request: &ChatRequest) -> String {
    let first_user = request
      .messages
      .iter()
      .find(|m| m.role == "user")
      .map(|m| m.content.as_str())
      .unwrap_or("unknown");
    format!(
      "Mock response for: '{}'... (model: {})",
      first_user.chars().take(50).collect::<String>(),
      request.model
    )
  }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
  fn name(&self) -> &str {
    "mock"
  }

  async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
    if self.delay_ms > 0 {
      tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
    }

    let call = self.calls.fetch_add(1, Ordering::SeqCst);
    let should_fail = self.simulate_error || self.fail_after.is_some_and(|n| call >= n);
    if should_fail {
      return Err(LlmError::ModelExecutionError {
        message: "Mock provider simulated error".to_string(),
      });
    }

    let content = self
      .responses
      .lock()
      .unwrap()
      .pop_front()
      .or_else(|| self.default_response.clone())
      .unwrap_or_else(|| self.generate_default_response(request));

    let word_count = content.split_whitespace().count() as u32;
    Ok(ChatResponse {
      content,
      usage: Some(TokenUsage {
        prompt_tokens: Some(50),
        completion_tokens: Some(word_count),
        total_tokens: Some(50 + word_count),
      }),
    })
  }

  async fn validate_config(&self) -> Result<()> {
    if self.simulate_error {
      Err(LlmError::ConfigurationError {
        message: "Mock provider configured to simulate error".to_string(),
      })
    } else {
      Ok(())
    }
  }

  fn base_url(&self) -> &str {
    "mock://localhost"
  }
}
