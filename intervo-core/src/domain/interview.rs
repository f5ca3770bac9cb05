use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::summarizer::DetailedFeedback;

/// Session state of an interview. Doubles as the persisted interview status;
/// the orchestrator mirrors it in memory while a session task is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
  /// Planner is generating questions.
  Planning,
  /// Plan complete, session not yet opened.
  Idle,
  /// A main question is in front of the candidate.
  Questioning,
  /// An answer is being evaluated.
  Evaluating,
  /// A follow-up probe is in front of the candidate.
  FollowUp,
  Complete,
  Cancelled,
}

impl fmt::Display for InterviewStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      InterviewStatus::Planning => "planning",
      InterviewStatus::Idle => "idle",
      InterviewStatus::Questioning => "questioning",
      InterviewStatus::Evaluating => "evaluating",
      InterviewStatus::FollowUp => "follow_up",
      InterviewStatus::Complete => "complete",
      InterviewStatus::Cancelled => "cancelled",
    };
    f.write_str(s)
  }
}

/// Legal transitions, cancel excluded. Cancellation is handled separately:
/// any non-terminal state may move to `Cancelled`.
const TRANSITIONS: &[(InterviewStatus, InterviewStatus)] = &[
  (InterviewStatus::Planning, InterviewStatus::Idle),
  (InterviewStatus::Idle, InterviewStatus::Questioning),
  (InterviewStatus::Questioning, InterviewStatus::Evaluating),
  (InterviewStatus::Evaluating, InterviewStatus::FollowUp),
  (InterviewStatus::Evaluating, InterviewStatus::Questioning),
  (InterviewStatus::Evaluating, InterviewStatus::Complete),
  (InterviewStatus::FollowUp, InterviewStatus::Evaluating),
];

impl InterviewStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, InterviewStatus::Complete | InterviewStatus::Cancelled)
  }

  pub fn can_transition(self, to: InterviewStatus) -> bool {
    if to == InterviewStatus::Cancelled {
      return !self.is_terminal();
    }
    TRANSITIONS.iter().any(|&(from, target)| from == self && target == to)
  }
}

/// Planning provenance plus the cached completion report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
  pub strategy: String,
  pub n: usize,
  pub generated_at: DateTime<Utc>,
  pub cv_summary: String,
  pub completion_summary: Option<DetailedFeedback>,
}

impl PlanMetadata {
  pub fn new(n: usize, cv_summary: impl Into<String>) -> Self {
    Self {
      strategy: "adaptive_planning_v1".to_string(),
      n,
      generated_at: Utc::now(),
      cv_summary: cv_summary.into(),
      completion_summary: None,
    }
  }
}

/// Aggregate root of the interview domain. Owns its answers and follow-up
/// questions (by id); all state mutations go through `transition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
  pub id: Uuid,
  pub candidate_id: Uuid,
  pub cv_analysis_id: Uuid,
  pub status: InterviewStatus,
  pub question_ids: Vec<Uuid>,
  pub answer_ids: Vec<Uuid>,
  /// Index of the next unanswered planned question.
  pub current_question_index: usize,
  /// Follow-up questions generated during this session.
  pub adaptive_follow_ups: Vec<Uuid>,
  /// Main question whose follow-up thread is active, if any.
  pub current_parent_question_id: Option<Uuid>,
  pub current_followup_count: u8,
  pub plan_metadata: Option<PlanMetadata>,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Interview {
  pub fn new(candidate_id: Uuid, cv_analysis_id: Uuid) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      candidate_id,
      cv_analysis_id,
      status: InterviewStatus::Planning,
      question_ids: Vec::new(),
      answer_ids: Vec::new(),
      current_question_index: 0,
      adaptive_follow_ups: Vec::new(),
      current_parent_question_id: None,
      current_followup_count: 0,
      plan_metadata: None,
      started_at: None,
      completed_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// Move to `to`, enforcing the transition table. Timestamps are maintained
  /// here: `started_at` on the first move into `Questioning`, `completed_at`
  /// on entering a terminal state.
  pub fn transition(&mut self, to: InterviewStatus) -> Result<()> {
    if !self.status.can_transition(to) {
      return Err(EngineError::InvalidTransition {
        from: self.status,
        to,
      });
    }
    self.status = to;
    let now = Utc::now();
    if to == InterviewStatus::Questioning && self.started_at.is_none() {
      self.started_at = Some(now);
    }
    if to.is_terminal() {
      self.completed_at = Some(now);
    }
    self.updated_at = now;
    Ok(())
  }

  /// Planner hand-off: attach the plan and move Planning -> Idle.
  pub fn mark_ready(&mut self, question_ids: Vec<Uuid>, metadata: PlanMetadata) -> Result<()> {
    self.question_ids = question_ids;
    self.plan_metadata = Some(metadata);
    self.transition(InterviewStatus::Idle)
  }

  /// Record an answered question (main or follow-up). Does not advance the
  /// planned-question index; that happens only when the follow-up thread for
  /// the current main question closes.
  pub fn record_answer(&mut self, answer_id: Uuid) {
    self.answer_ids.push(answer_id);
    self.updated_at = Utc::now();
  }

  /// Close the current main-question thread and step to the next planned
  /// question.
  pub fn advance_question(&mut self) {
    self.current_question_index += 1;
    self.current_parent_question_id = None;
    self.current_followup_count = 0;
    self.updated_at = Utc::now();
  }

  pub fn has_more_questions(&self) -> bool {
    self.current_question_index < self.question_ids.len()
  }

  pub fn current_question_id(&self) -> Option<Uuid> {
    self.question_ids.get(self.current_question_index).copied()
  }

  pub fn record_follow_up(&mut self, follow_up_id: Uuid, parent_question_id: Uuid) {
    self.adaptive_follow_ups.push(follow_up_id);
    self.current_parent_question_id = Some(parent_question_id);
    self.current_followup_count = self.current_followup_count.saturating_add(1);
    self.updated_at = Utc::now();
  }

  pub fn progress_percentage(&self) -> f64 {
    if self.question_ids.is_empty() {
      return 0.0;
    }
    (self.current_question_index as f64 / self.question_ids.len() as f64) * 100.0
  }
}
