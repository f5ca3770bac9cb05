use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Maximum follow-ups per main question; also the highest legal
/// `order_in_sequence`.
pub const MAX_ORDER_IN_SEQUENCE: u8 = 3;

/// A probe question generated mid-session to target gaps in the answer to a
/// specific main question. For one parent, orders are unique and form a
/// prefix of {1, 2, 3}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
  pub id: Uuid,
  pub parent_question_id: Uuid,
  pub interview_id: Uuid,
  pub text: String,
  /// Human-readable summary of the gaps that triggered this follow-up.
  pub generated_reason: String,
  pub order_in_sequence: u8,
  pub created_at: DateTime<Utc>,
}

impl FollowUpQuestion {
  pub fn new(
    parent_question_id: Uuid,
    interview_id: Uuid,
    text: impl Into<String>,
    generated_reason: impl Into<String>,
    order_in_sequence: u8,
  ) -> Result<Self> {
    if order_in_sequence == 0 || order_in_sequence > MAX_ORDER_IN_SEQUENCE {
      return Err(EngineError::invalid_input(format!(
        "order_in_sequence must be within 1..={MAX_ORDER_IN_SEQUENCE}, got {order_in_sequence}"
      )));
    }
    Ok(Self {
      id: Uuid::new_v4(),
      parent_question_id,
      interview_id,
      text: text.into(),
      generated_reason: generated_reason.into(),
      order_in_sequence,
      created_at: Utc::now(),
    })
  }

  pub fn is_last_allowed(&self) -> bool {
    self.order_in_sequence == MAX_ORDER_IN_SEQUENCE
  }
}
