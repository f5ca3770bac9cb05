use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
  Minor,
  Moderate,
  Major,
}

/// A concept present in the ideal answer but missing from the candidate's
/// answer. `resolved` is forward-only: once a later attempt covers the
/// concept it flips to true and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptGap {
  pub id: Uuid,
  pub evaluation_id: Uuid,
  pub concept: String,
  pub severity: GapSeverity,
  pub resolved: bool,
}

impl ConceptGap {
  pub fn new(evaluation_id: Uuid, concept: impl Into<String>, severity: GapSeverity) -> Self {
    Self {
      id: Uuid::new_v4(),
      evaluation_id,
      concept: concept.into(),
      severity,
      resolved: false,
    }
  }
}

/// Score adjustment per attempt: the main answer is free, follow-up attempts
/// cost -5 and -15 points.
pub fn attempt_penalty(attempt_number: u8) -> f64 {
  match attempt_number {
    1 => 0.0,
    2 => -5.0,
    _ => -15.0,
  }
}

/// Evaluation of a single answer, 1:1 with the answer. Produced by the
/// evaluator, persisted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
  pub id: Uuid,
  pub answer_id: Uuid,
  pub question_id: Uuid,
  pub interview_id: Uuid,

  /// LLM score before the attempt penalty.
  pub raw_score: f64,
  pub penalty: f64,
  /// clamp(raw_score + penalty, 0, 100).
  pub final_score: f64,
  /// Cosine similarity to the ideal answer; `None` iff the question carries
  /// no ideal answer. Exact zero is remapped to 0.01 upstream, so a stored
  /// value of 0.0 never means "computed as zero".
  pub similarity_score: Option<f64>,

  pub completeness: f64,
  pub relevance: f64,
  pub sentiment: Option<String>,
  pub reasoning: String,
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
  pub improvement_suggestions: Vec<String>,

  /// 1 for the main answer, 2 and 3 for follow-up attempts.
  pub attempt_number: u8,
  /// Evaluation of the previous attempt in the thread; `None` iff attempt 1.
  pub parent_evaluation_id: Option<Uuid>,

  pub gaps: Vec<ConceptGap>,
  pub created_at: DateTime<Utc>,
}

impl Evaluation {
  /// Set penalty and final score from the attempt number.
  pub fn apply_penalty(&mut self, attempt_number: u8) {
    self.attempt_number = attempt_number;
    self.penalty = attempt_penalty(attempt_number);
    self.final_score = (self.raw_score + self.penalty).clamp(0.0, 100.0);
  }

  pub fn has_unresolved_gaps(&self) -> bool {
    self.gaps.iter().any(|gap| !gap.resolved)
  }

  /// Unresolved gap concepts, in detection order.
  pub fn unresolved_gap_concepts(&self) -> Vec<String> {
    self
      .gaps
      .iter()
      .filter(|gap| !gap.resolved)
      .map(|gap| gap.concept.clone())
      .collect()
  }

  /// All gap concepts, resolved or not, in detection order.
  pub fn gap_concepts(&self) -> Vec<String> {
    self.gaps.iter().map(|gap| gap.concept.clone()).collect()
  }

  /// Worst severity among unresolved gaps.
  pub fn dominant_gap_severity(&self) -> Option<GapSeverity> {
    self
      .gaps
      .iter()
      .filter(|gap| !gap.resolved)
      .map(|gap| gap.severity)
      .max_by_key(|severity| match severity {
        GapSeverity::Minor => 0,
        GapSeverity::Moderate => 1,
        GapSeverity::Major => 2,
      })
  }

  /// Flip gaps covered by a later attempt. A concept is covered when it no
  /// longer appears among `still_missing`. Forward-only.
  pub fn resolve_covered_gaps(&mut self, still_missing: &[String]) -> usize {
    let mut flipped = 0;
    for gap in &mut self.gaps {
      if !gap.resolved && !still_missing.contains(&gap.concept) {
        gap.resolved = true;
        flipped += 1;
      }
    }
    flipped
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn evaluation(raw_score: f64) -> Evaluation {
    Evaluation {
      id: Uuid::new_v4(),
      answer_id: Uuid::new_v4(),
      question_id: Uuid::new_v4(),
      interview_id: Uuid::new_v4(),
      raw_score,
      penalty: 0.0,
      final_score: raw_score,
      similarity_score: None,
      completeness: 0.5,
      relevance: 0.5,
      sentiment: None,
      reasoning: String::new(),
      strengths: vec![],
      weaknesses: vec![],
      improvement_suggestions: vec![],
      attempt_number: 1,
      parent_evaluation_id: None,
      gaps: vec![],
      created_at: Utc::now(),
    }
  }

  #[test]
  fn penalty_progression() {
    assert_eq!(attempt_penalty(1), 0.0);
    assert_eq!(attempt_penalty(2), -5.0);
    assert_eq!(attempt_penalty(3), -15.0);
  }

  #[test]
  fn final_score_is_clamped() {
    let mut low = evaluation(10.0);
    low.apply_penalty(3);
    assert_eq!(low.final_score, 0.0);

    let mut mid = evaluation(80.0);
    mid.apply_penalty(2);
    assert_eq!(mid.final_score, 75.0);
    assert_eq!(mid.penalty, -5.0);
  }

  #[test]
  fn gap_resolution_is_forward_only() {
    let mut eval = evaluation(40.0);
    let id = eval.id;
    eval.gaps = vec![
      ConceptGap::new(id, "base case", GapSeverity::Major),
      ConceptGap::new(id, "call stack", GapSeverity::Moderate),
    ];

    // Second attempt still misses "call stack" only.
    let flipped = eval.resolve_covered_gaps(&["call stack".to_string()]);
    assert_eq!(flipped, 1);
    assert_eq!(eval.unresolved_gap_concepts(), vec!["call stack"]);

    // A later attempt that re-misses "base case" must not unresolve it.
    let flipped = eval.resolve_covered_gaps(&["base case".to_string(), "call stack".to_string()]);
    assert_eq!(flipped, 0);
    assert_eq!(eval.unresolved_gap_concepts(), vec!["call stack"]);
  }

  #[test]
  fn dominant_severity_picks_worst_unresolved() {
    let mut eval = evaluation(40.0);
    let id = eval.id;
    eval.gaps = vec![
      ConceptGap::new(id, "a", GapSeverity::Minor),
      ConceptGap::new(id, "b", GapSeverity::Major),
    ];
    assert_eq!(eval.dominant_gap_severity(), Some(GapSeverity::Major));
    eval.gaps[1].resolved = true;
    assert_eq!(eval.dominant_gap_severity(), Some(GapSeverity::Minor));
  }
}
