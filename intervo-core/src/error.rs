use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::InterviewStatus;

/// Failure of an external capability provider (LLM, embeddings, speech).
///
/// Every variant is recoverable: the session stays in its current state and
/// the caller may retry by resending the same inbound event.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ProviderError {
  #[error("Provider request timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  #[error("Provider '{provider}' call failed: {message}")]
  Api { provider: String, message: String },

  #[error("Provider response could not be parsed: {message}")]
  Parse { message: String },

  #[error("Operation '{operation}' not supported by this provider")]
  Unsupported { operation: String },
}

/// Failure of a persistence port. Fatal for a running session.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum StoreError {
  #[error("{entity} {id} not found")]
  NotFound { entity: String, id: Uuid },

  #[error("Constraint violation: {message}")]
  Conflict { message: String },

  #[error("Store unavailable: {message}")]
  Unavailable { message: String },
}

impl StoreError {
  pub fn not_found(entity: &str, id: Uuid) -> Self {
    StoreError::NotFound {
      entity: entity.to_string(),
      id,
    }
  }
}

/// Top-level error type of the session engine.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum EngineError {
  #[error("{entity} {id} not found")]
  NotFound { entity: String, id: Uuid },

  #[error("Invalid state transition: {from} -> {to}")]
  InvalidTransition {
    from: InterviewStatus,
    to: InterviewStatus,
  },

  #[error("Invalid input: {message}")]
  InvalidInput { message: String },

  #[error(transparent)]
  Provider(#[from] ProviderError),

  #[error("Persistence failure: {0}")]
  Persistence(StoreError),

  #[error("Internal error: {message}")]
  Internal { message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<StoreError> for EngineError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
      other => EngineError::Persistence(other),
    }
  }
}

impl EngineError {
  pub fn not_found(entity: &str, id: Uuid) -> Self {
    EngineError::NotFound {
      entity: entity.to_string(),
      id,
    }
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    EngineError::InvalidInput {
      message: message.into(),
    }
  }

  /// Wire-level code carried by outbound `error` messages.
  pub fn code(&self) -> &'static str {
    match self {
      EngineError::NotFound { .. } => "NOT_FOUND",
      EngineError::InvalidTransition { .. } => "INVALID_STATE",
      EngineError::InvalidInput { .. } => "INVALID_INPUT",
      EngineError::Provider(_) => "PROVIDER_FAILURE",
      EngineError::Persistence(_) => "PERSISTENCE_FAILURE",
      EngineError::Internal { .. } => "INTERNAL",
    }
  }

  /// Whether the session may keep running after this error.
  ///
  /// Persistence and internal failures cancel the session; everything else is
  /// reported to the client and leaves state untouched.
  pub fn is_recoverable(&self) -> bool {
    !matches!(
      self,
      EngineError::Persistence(_) | EngineError::Internal { .. }
    )
  }
}
