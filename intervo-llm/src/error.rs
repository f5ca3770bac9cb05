use intervo_core::ProviderError;
use thiserror::Error;

/// Error types for LLM operations.
#[derive(Error, Debug)]
pub enum LlmError {
  #[error("Configuration error: {message}")]
  ConfigurationError { message: String },

  #[error("Provider '{provider}' not supported")]
  UnsupportedProvider { provider: String },

  #[error("API key missing for provider '{provider}'")]
  MissingApiKey { provider: String },

  #[error("HTTP request failed: {status_code} - {message}")]
  HttpError { status_code: u16, message: String },

  #[error("Request timeout after {timeout_ms}ms")]
  TimeoutError { timeout_ms: u64 },

  #[error("Rate limit exceeded for provider '{provider}': {message}")]
  RateLimitExceeded { provider: String, message: String },

  #[error("Authentication failed for provider '{provider}': {message}")]
  AuthenticationError { provider: String, message: String },

  #[error("API response parsing failed: {message}")]
  ResponseParsingError { message: String },

  #[error("Model execution error: {message}")]
  ModelExecutionError { message: String },

  #[error("Service unavailable for provider '{provider}': {message}")]
  ServiceUnavailable { provider: String, message: String },

  #[error("Network error: {message}")]
  NetworkError { message: String },
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Convert common HTTP and network errors to LlmError
impl From<reqwest::Error> for LlmError {
  fn from(error: reqwest::Error) -> Self {
    if error.is_timeout() {
      LlmError::TimeoutError { timeout_ms: 30000 }
    } else if let Some(status) = error.status() {
      let status_code = status.as_u16();
      let message = error.to_string();
      match status_code {
        401 => LlmError::AuthenticationError {
          provider: "unknown".to_string(),
          message,
        },
        429 => LlmError::RateLimitExceeded {
          provider: "unknown".to_string(),
          message,
        },
        503 => LlmError::ServiceUnavailable {
          provider: "unknown".to_string(),
          message,
        },
        _ => LlmError::HttpError {
          status_code,
          message,
        },
      }
    } else {
      LlmError::NetworkError {
        message: error.to_string(),
      }
    }
  }
}

impl From<serde_json::Error> for LlmError {
  fn from(error: serde_json::Error) -> Self {
    LlmError::ResponseParsingError {
      message: error.to_string(),
    }
  }
}

/// Map into the engine's provider-failure taxonomy at the port boundary.
impl From<LlmError> for ProviderError {
  fn from(error: LlmError) -> Self {
    match error {
      LlmError::TimeoutError { timeout_ms } => ProviderError::Timeout { timeout_ms },
      LlmError::ResponseParsingError { message } => ProviderError::Parse { message },
      other => ProviderError::Api {
        provider: "llm".to_string(),
        message: other.to_string(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_errors_stay_parse_errors_across_the_boundary() {
    let inner: LlmError = serde_json::from_str::<serde_json::Value>("{nope")
      .unwrap_err()
      .into();
    let port_error = ProviderError::from(inner);
    assert!(matches!(port_error, ProviderError::Parse { .. }));
  }

  #[test]
  fn timeouts_stay_timeouts_across_the_boundary() {
    let port_error = ProviderError::from(LlmError::TimeoutError { timeout_ms: 30000 });
    assert!(matches!(port_error, ProviderError::Timeout { timeout_ms: 30000 }));
  }
}
