use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::domain::Evaluation;

/// Outcome of the follow-up decision for the current parent question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpDecision {
  pub needs_followup: bool,
  pub reason: String,
  /// Follow-ups already generated for this parent.
  pub follow_up_count: u8,
  /// Unresolved concepts across the whole follow-up cycle, first-seen order.
  pub cumulative_gaps: Vec<String>,
}

impl FollowUpDecision {
  fn no(reason: impl Into<String>, follow_up_count: u8) -> Self {
    Self {
      needs_followup: false,
      reason: reason.into(),
      follow_up_count,
      cumulative_gaps: Vec::new(),
    }
  }
}

/// Decide whether another follow-up is warranted for the active parent
/// question. Pure: no I/O, no side effects. Rules fire in order; the first
/// match wins.
pub fn decide_follow_up(
  config: &EngineConfig,
  follow_up_count: u8,
  latest: &Evaluation,
  prior_followup_evaluations: &[Evaluation],
) -> FollowUpDecision {
  if follow_up_count >= config.max_follow_ups {
    debug!(follow_up_count, "follow-up cap reached");
    return FollowUpDecision::no("max follow-ups reached", follow_up_count);
  }

  if let Some(similarity) = latest.similarity_score {
    if similarity >= config.similarity_threshold {
      return FollowUpDecision::no(
        format!(
          "similarity {:.2} >= {:.2}",
          similarity, config.similarity_threshold
        ),
        follow_up_count,
      );
    }
  }

  if !latest.has_unresolved_gaps() {
    return FollowUpDecision::no("no concept gaps detected", follow_up_count);
  }

  let cumulative_gaps = cumulative_gaps(latest, prior_followup_evaluations);
  if cumulative_gaps.is_empty() {
    return FollowUpDecision::no("no cumulative gaps", follow_up_count);
  }

  FollowUpDecision {
    needs_followup: true,
    reason: format!(
      "{} missing concepts: {}",
      cumulative_gaps.len(),
      cumulative_gaps.join(", ")
    ),
    follow_up_count,
    cumulative_gaps,
  }
}

/// Union of unresolved concepts from the latest evaluation and all prior
/// follow-up evaluations, preserving first-seen order.
fn cumulative_gaps(latest: &Evaluation, priors: &[Evaluation]) -> Vec<String> {
  let mut gaps: Vec<String> = Vec::new();
  for concept in latest
    .unresolved_gap_concepts()
    .into_iter()
    .chain(priors.iter().flat_map(Evaluation::unresolved_gap_concepts))
  {
    if !gaps.contains(&concept) {
      gaps.push(concept);
    }
  }
  gaps
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ConceptGap, GapSeverity};
  use chrono::Utc;
  use uuid::Uuid;

  fn evaluation(similarity: Option<f64>, gap_concepts: &[&str]) -> Evaluation {
    let id = Uuid::new_v4();
    Evaluation {
      id,
      answer_id: Uuid::new_v4(),
      question_id: Uuid::new_v4(),
      interview_id: Uuid::new_v4(),
      raw_score: 50.0,
      penalty: 0.0,
      final_score: 50.0,
      similarity_score: similarity,
      completeness: 0.5,
      relevance: 0.5,
      sentiment: None,
      reasoning: String::new(),
      strengths: vec![],
      weaknesses: vec![],
      improvement_suggestions: vec![],
      attempt_number: 1,
      parent_evaluation_id: None,
      gaps: gap_concepts
        .iter()
        .map(|c| ConceptGap::new(id, *c, GapSeverity::Moderate))
        .collect(),
      created_at: Utc::now(),
    }
  }

  fn config() -> EngineConfig {
    EngineConfig::default()
  }

  #[test]
  fn max_follow_ups_fires_first() {
    // Gaps are still present, but the cap wins.
    let latest = evaluation(Some(0.3), &["ownership"]);
    let decision = decide_follow_up(&config(), 3, &latest, &[]);
    assert!(!decision.needs_followup);
    assert_eq!(decision.reason, "max follow-ups reached");
    assert_eq!(decision.follow_up_count, 3);
    assert!(decision.cumulative_gaps.is_empty());
  }

  #[test]
  fn similarity_at_threshold_suppresses_follow_up() {
    // Threshold comparison is >=, so exactly 0.8 ends the cycle.
    let latest = evaluation(Some(0.8), &["ownership"]);
    let decision = decide_follow_up(&config(), 0, &latest, &[]);
    assert!(!decision.needs_followup);
    assert!(decision.reason.starts_with("similarity 0.80"));
  }

  #[test]
  fn similarity_below_threshold_with_gaps_probes() {
    let latest = evaluation(Some(0.45), &["base case", "call stack"]);
    let decision = decide_follow_up(&config(), 0, &latest, &[]);
    assert!(decision.needs_followup);
    assert_eq!(
      decision.cumulative_gaps,
      vec!["base case".to_string(), "call stack".to_string()]
    );
    assert_eq!(decision.reason, "2 missing concepts: base case, call stack");
  }

  #[test]
  fn no_unresolved_gaps_means_no_follow_up() {
    let mut latest = evaluation(Some(0.5), &["ownership"]);
    latest.gaps[0].resolved = true;
    let decision = decide_follow_up(&config(), 1, &latest, &[]);
    assert!(!decision.needs_followup);
    assert_eq!(decision.reason, "no concept gaps detected");
  }

  #[test]
  fn missing_similarity_does_not_suppress_gap_probing() {
    // Behavioral questions carry no similarity; gaps alone drive probing.
    let latest = evaluation(None, &["conflict handling"]);
    let decision = decide_follow_up(&config(), 0, &latest, &[]);
    assert!(decision.needs_followup);
  }

  #[test]
  fn cumulative_union_is_first_seen_ordered_and_deduplicated() {
    let latest = evaluation(Some(0.4), &["closures", "lifetimes"]);
    let prior_one = evaluation(Some(0.3), &["lifetimes", "borrowing"]);
    let prior_two = evaluation(Some(0.35), &["closures", "traits"]);
    let decision = decide_follow_up(&config(), 2, &latest, &[prior_one, prior_two]);
    assert!(decision.needs_followup);
    assert_eq!(
      decision.cumulative_gaps,
      vec!["closures", "lifetimes", "borrowing", "traits"]
    );
  }

  #[test]
  fn deciding_twice_yields_the_same_decision() {
    let latest = evaluation(Some(0.4), &["closures"]);
    let priors = vec![evaluation(Some(0.3), &["borrowing"])];
    let first = decide_follow_up(&config(), 1, &latest, &priors);
    let second = decide_follow_up(&config(), 1, &latest, &priors);
    assert_eq!(first, second);
  }
}
