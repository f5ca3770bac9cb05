use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  Technical,
  Behavioral,
  Situational,
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      QuestionType::Technical => "technical",
      QuestionType::Behavioral => "behavioral",
      QuestionType::Situational => "situational",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    };
    f.write_str(s)
  }
}

/// An interview question. A question is *planned* iff it carries a non-empty
/// ideal answer, which is the reference text for similarity scoring and gap
/// detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: Uuid,
  pub text: String,
  pub question_type: QuestionType,
  pub difficulty: Difficulty,
  pub skills: Vec<String>,
  pub tags: Vec<String>,
  pub ideal_answer: Option<String>,
  /// Why the ideal answer is ideal.
  pub rationale: Option<String>,
  pub version: u32,
  pub embedding: Option<Vec<f32>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Question {
  pub fn new(
    text: impl Into<String>,
    question_type: QuestionType,
    difficulty: Difficulty,
  ) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      text: text.into(),
      question_type,
      difficulty,
      skills: Vec::new(),
      tags: Vec::new(),
      ideal_answer: None,
      rationale: None,
      version: 1,
      embedding: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn with_skills<I, S>(mut self, skills: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.skills = skills.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_ideal_answer(mut self, ideal_answer: impl Into<String>) -> Self {
    self.ideal_answer = Some(ideal_answer.into());
    self
  }

  pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
    self.rationale = Some(rationale.into());
    self
  }

  /// A question is planned when it has a non-empty ideal answer.
  pub fn is_planned(&self) -> bool {
    self
      .ideal_answer
      .as_deref()
      .is_some_and(|s| !s.trim().is_empty())
  }

  pub fn tests_skill(&self, skill: &str) -> bool {
    self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
  }
}
