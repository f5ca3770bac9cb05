use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConceptGap, Difficulty, QuestionType};

/// Messages the session emits toward the client, in transition order.
/// Wire-format-neutral: serialize as JSON or anything serde speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
  Question {
    question_id: Uuid,
    text: String,
    question_type: QuestionType,
    difficulty: Difficulty,
    /// 0-based position within the planned sequence.
    index: usize,
    total: usize,
    /// Base64-encoded synthesized audio.
    audio_payload: String,
  },
  FollowUpQuestion {
    question_id: Uuid,
    parent_question_id: Uuid,
    text: String,
    generated_reason: String,
    order_in_sequence: u8,
    audio_payload: String,
  },
  Evaluation {
    answer_id: Uuid,
    score: f64,
    feedback: String,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    similarity_score: Option<f64>,
    gaps: Vec<ConceptGap>,
  },
  InterviewComplete {
    interview_id: Uuid,
    overall_score: f64,
    total_questions: usize,
    feedback_url: String,
  },
  Error {
    code: String,
    message: String,
  },
}

impl OutboundMessage {
  pub fn kind(&self) -> &'static str {
    match self {
      OutboundMessage::Question { .. } => "question",
      OutboundMessage::FollowUpQuestion { .. } => "follow_up_question",
      OutboundMessage::Evaluation { .. } => "evaluation",
      OutboundMessage::InterviewComplete { .. } => "interview_complete",
      OutboundMessage::Error { .. } => "error",
    }
  }
}

/// Events the client sends into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
  TextAnswer {
    question_id: Uuid,
    answer_text: String,
  },
  /// Base64 audio. Chunks accumulate until `is_final`, then the buffered
  /// audio is transcribed and handled as one answer.
  AudioChunk {
    question_id: Uuid,
    audio_b64: String,
    is_final: bool,
  },
  GetNextQuestion,
  Cancel,
}
