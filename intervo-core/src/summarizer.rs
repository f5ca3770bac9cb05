use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{Answer, Evaluation, Interview};
use crate::error::{EngineError, Result};
use crate::ports::{
  timed, AnswerStore, EvaluationDigest, EvaluationStore, FollowUpStore, InterviewStore,
  LanguageModel, QuestionStore, RecommendationSet, SummaryContext,
};

/// How gaps moved across the whole interview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapProgression {
  pub questions_with_followups: usize,
  /// Concepts missing initially that the candidate covered in follow-ups.
  pub gaps_filled: usize,
  /// Concepts still missing after the last attempt.
  pub gaps_remaining: usize,
  pub avg_followups_per_question: f64,
}

/// Per-main-question breakdown: how the answer scored and how its gaps
/// evolved across the follow-up cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSummary {
  pub question_id: Uuid,
  pub question_text: String,
  pub main_answer_score: f64,
  pub follow_up_count: usize,
  pub initial_gaps: Vec<String>,
  pub final_gaps: Vec<String>,
  pub improvement: bool,
}

/// The completion report cached into `plan_metadata.completion_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedFeedback {
  pub interview_id: Uuid,
  /// 0.7 x theoretical + 0.3 x speaking.
  pub overall_score: f64,
  pub theoretical_score_avg: f64,
  pub speaking_score_avg: f64,
  pub total_questions: usize,
  pub total_follow_ups: usize,
  pub question_summaries: Vec<QuestionSummary>,
  pub gap_progression: GapProgression,
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
  pub study_topics: Vec<String>,
  pub technique_tips: Vec<String>,
  pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregates per-answer evaluations and gap history into the final report.
/// Runs once, inside the COMPLETE transition; the result is cached on the
/// interview and read back from there.
pub struct Summarizer {
  llm: Arc<dyn LanguageModel>,
  interviews: Arc<dyn InterviewStore>,
  questions: Arc<dyn QuestionStore>,
  answers: Arc<dyn AnswerStore>,
  evaluations: Arc<dyn EvaluationStore>,
  follow_ups: Arc<dyn FollowUpStore>,
  config: EngineConfig,
}

impl Summarizer {
  pub fn new(
    llm: Arc<dyn LanguageModel>,
    interviews: Arc<dyn InterviewStore>,
    questions: Arc<dyn QuestionStore>,
    answers: Arc<dyn AnswerStore>,
    evaluations: Arc<dyn EvaluationStore>,
    follow_ups: Arc<dyn FollowUpStore>,
    config: EngineConfig,
  ) -> Self {
    Self {
      llm,
      interviews,
      questions,
      answers,
      evaluations,
      follow_ups,
      config,
    }
  }

  /// Report for a stored interview. Returns the cached completion summary
  /// when one exists, so repeated calls are equal by construction.
  pub async fn summarize(&self, interview_id: Uuid) -> Result<DetailedFeedback> {
    let interview = self
      .interviews
      .get(interview_id)
      .await?
      .ok_or_else(|| EngineError::not_found("interview", interview_id))?;
    if let Some(summary) = interview
      .plan_metadata
      .as_ref()
      .and_then(|meta| meta.completion_summary.clone())
    {
      return Ok(summary);
    }
    self.summarize_interview(&interview).await
  }

  /// Build the report for `interview` from its persisted answers and
  /// evaluations.
  pub async fn summarize_interview(&self, interview: &Interview) -> Result<DetailedFeedback> {
    let answers = self.answers.get_by_interview_id(interview.id).await?;
    let mut evaluations: HashMap<Uuid, Evaluation> = HashMap::new();
    for answer in &answers {
      if let Some(evaluation) = self.evaluations.get_by_answer_id(answer.id).await? {
        evaluations.insert(answer.id, evaluation);
      }
    }

    let (theoretical_avg, speaking_avg, overall) = self.aggregate_scores(&answers, &evaluations);
    let (question_summaries, gap_progression) =
      self.per_question_breakdown(interview, &answers, &evaluations).await?;
    let recommendations = self
      .recommendations(interview, &answers, &evaluations, &gap_progression)
      .await;

    info!(
      interview_id = %interview.id,
      overall,
      questions = interview.question_ids.len(),
      follow_ups = interview.adaptive_follow_ups.len(),
      "interview summarized"
    );

    Ok(DetailedFeedback {
      interview_id: interview.id,
      overall_score: overall,
      theoretical_score_avg: theoretical_avg,
      speaking_score_avg: speaking_avg,
      total_questions: interview.question_ids.len(),
      total_follow_ups: interview.adaptive_follow_ups.len(),
      question_summaries,
      gap_progression,
      strengths: recommendations.strengths,
      weaknesses: recommendations.weaknesses,
      study_topics: recommendations.study_topics,
      technique_tips: recommendations.technique_tips,
      completed_at: interview.completed_at,
    })
  }

  fn aggregate_scores(
    &self,
    answers: &[Answer],
    evaluations: &HashMap<Uuid, Evaluation>,
  ) -> (f64, f64, f64) {
    let evaluated: Vec<&Answer> = answers
      .iter()
      .filter(|a| evaluations.contains_key(&a.id))
      .collect();
    if evaluated.is_empty() {
      return (0.0, 0.0, 0.0);
    }

    let count = evaluated.len() as f64;
    let theoretical_avg = evaluated
      .iter()
      .map(|a| evaluations[&a.id].final_score)
      .sum::<f64>()
      / count;
    let speaking_avg = evaluated
      .iter()
      .map(|a| a.speaking_score_or(self.config.default_speaking_score))
      .sum::<f64>()
      / count;
    let overall = theoretical_avg * self.config.theoretical_weight
      + speaking_avg * self.config.speaking_weight;

    (
      round2(theoretical_avg),
      round2(speaking_avg),
      round2(overall),
    )
  }

  async fn per_question_breakdown(
    &self,
    interview: &Interview,
    answers: &[Answer],
    evaluations: &HashMap<Uuid, Evaluation>,
  ) -> Result<(Vec<QuestionSummary>, GapProgression)> {
    let mut summaries = Vec::with_capacity(interview.question_ids.len());
    let mut questions_with_followups = 0usize;
    let mut total_followups = 0usize;
    let mut gaps_filled = 0usize;
    let mut gaps_remaining = 0usize;

    for question_id in &interview.question_ids {
      let question = self.questions.get(*question_id).await?;
      let main_answer = answers.iter().find(|a| a.question_id == *question_id);
      let main_evaluation = main_answer.and_then(|a| evaluations.get(&a.id));

      let follow_ups = self
        .follow_ups
        .get_by_parent_question_id(*question_id)
        .await?;
      let follow_up_answers: Vec<&Answer> = follow_ups
        .iter()
        .filter_map(|fu| answers.iter().find(|a| a.question_id == fu.id))
        .collect();

      // Every gap was unresolved when the main answer was evaluated; the
      // resolution flips happen on later attempts.
      let initial_gaps: Vec<String> = main_evaluation
        .map(|e| e.gap_concepts())
        .unwrap_or_default();
      let final_gaps: Vec<String> = match follow_up_answers
        .last()
        .and_then(|a| evaluations.get(&a.id))
      {
        Some(last_evaluation) => last_evaluation.unresolved_gap_concepts(),
        None => main_evaluation
          .map(|e| e.unresolved_gap_concepts())
          .unwrap_or_default(),
      };

      if main_answer.is_some() && !follow_up_answers.is_empty() {
        questions_with_followups += 1;
        total_followups += follow_up_answers.len();
        let final_set: HashSet<&String> = final_gaps.iter().collect();
        gaps_filled += initial_gaps.iter().filter(|g| !final_set.contains(g)).count();
        gaps_remaining += final_gaps.len();
      }

      summaries.push(QuestionSummary {
        question_id: *question_id,
        question_text: question.map(|q| q.text).unwrap_or_else(|| "Unknown".to_string()),
        main_answer_score: main_evaluation.map(|e| e.final_score).unwrap_or(0.0),
        follow_up_count: follow_up_answers.len(),
        improvement: final_gaps.len() < initial_gaps.len(),
        initial_gaps,
        final_gaps,
      });
    }

    let progression = GapProgression {
      questions_with_followups,
      gaps_filled,
      gaps_remaining,
      avg_followups_per_question: if questions_with_followups > 0 {
        round2(total_followups as f64 / questions_with_followups as f64)
      } else {
        0.0
      },
    };
    Ok((summaries, progression))
  }

  /// LLM-backed recommendations with a fixed safe fallback: completion must
  /// never fail because closing advice could not be generated.
  async fn recommendations(
    &self,
    interview: &Interview,
    answers: &[Answer],
    evaluations: &HashMap<Uuid, Evaluation>,
    gap_progression: &GapProgression,
  ) -> RecommendationSet {
    let context = SummaryContext {
      interview_id: interview.id,
      total_answers: answers.len(),
      gap_progression: gap_progression.clone(),
      evaluations: answers
        .iter()
        .filter_map(|a| evaluations.get(&a.id))
        .map(|e| EvaluationDigest {
          question_id: e.question_id,
          score: e.final_score,
          strengths: e.strengths.clone(),
          weaknesses: e.weaknesses.clone(),
        })
        .collect(),
    };

    match timed(
      self.config.llm_timeout,
      self.llm.generate_interview_recommendations(&context),
    )
    .await
    {
      Ok(set) => set,
      Err(err) => {
        warn!(%err, "recommendation generation failed, using fallback set");
        RecommendationSet::fallback()
      }
    }
  }
}

fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round2_keeps_two_decimals() {
    assert_eq!(round2(76.249999), 76.25);
    assert_eq!(round2(0.0), 0.0);
  }
}
