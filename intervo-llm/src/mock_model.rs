//! Mock implementation of the `LanguageModel` port.
//!
//! Returns realistic but fake interview content without any API calls.
//! Scripted queues let tests drive exact evaluation and gap sequences; the
//! defaults are deterministic functions of the input so flows stay
//! reproducible.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use intervo_core::domain::{Difficulty, Question};
use intervo_core::error::ProviderError;
use intervo_core::ports::{
  ExemplarQuestion, FollowUpPrompt, GapReport, LanguageModel, PlanningContext, RawEvaluation,
  RecommendationSet, SummaryContext,
};

#[derive(Default)]
pub struct MockLanguageModel {
  evaluations: Mutex<VecDeque<RawEvaluation>>,
  gap_reports: Mutex<VecDeque<GapReport>>,
  recommendations: Mutex<Option<RecommendationSet>>,
  /// `generate_ideal_answer` fails once this many calls have succeeded.
  fail_ideal_answer_after: Option<usize>,
  ideal_answer_calls: AtomicUsize,
  fail_recommendations: bool,
}

impl MockLanguageModel {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue scripted evaluations, consumed one per `evaluate_answer` call.
  pub fn with_evaluations<I>(self, evaluations: I) -> Self
  where
    I: IntoIterator<Item = RawEvaluation>,
  {
    self.evaluations.lock().unwrap().extend(evaluations);
    self
  }

  /// Queue scripted gap reports, consumed one per `detect_concept_gaps` call.
  pub fn with_gap_reports<I>(self, reports: I) -> Self
  where
    I: IntoIterator<Item = GapReport>,
  {
    self.gap_reports.lock().unwrap().extend(reports);
    self
  }

  pub fn with_recommendations(self, set: RecommendationSet) -> Self {
    *self.recommendations.lock().unwrap() = Some(set);
    self
  }

  /// Ideal-answer generation succeeds `n` times, then fails. Exercises the
  /// planner's rollback path.
  pub fn fail_ideal_answer_after(mut self, n: usize) -> Self {
    self.fail_ideal_answer_after = Some(n);
    self
  }

  /// Recommendation generation fails, exercising the summarizer fallback.
  pub fn fail_recommendations(mut self) -> Self {
    self.fail_recommendations = true;
    self
  }

  /// Deterministic default evaluation: score tracks answer length, feedback
  /// follows the score band.
  fn default_evaluation(answer_text: &str) -> RawEvaluation {
    let words = answer_text.split_whitespace().count();
    let score = if words >= 40 {
      88.0
    } else if words >= 15 {
      78.0
    } else {
      65.0
    };

    let (strengths, weaknesses, improvements, sentiment) = if score >= 85.0 {
      (
        vec![
          "Clear and comprehensive explanation".to_string(),
          "Good use of examples".to_string(),
          "Strong technical understanding".to_string(),
        ],
        vec!["Could provide more edge case handling".to_string()],
        vec!["Consider discussing performance implications".to_string()],
        "confident",
      )
    } else if score >= 75.0 {
      (
        vec![
          "Solid understanding of concepts".to_string(),
          "Relevant examples provided".to_string(),
        ],
        vec![
          "Missing some technical details".to_string(),
          "Could be more structured".to_string(),
        ],
        vec![
          "Add more specific examples".to_string(),
          "Elaborate on implementation details".to_string(),
        ],
        "positive",
      )
    } else {
      (
        vec!["Basic understanding demonstrated".to_string()],
        vec![
          "Lacks depth".to_string(),
          "Missing key concepts".to_string(),
        ],
        vec![
          "Study the fundamentals more thoroughly".to_string(),
          "Provide concrete examples".to_string(),
        ],
        "uncertain",
      )
    };

    RawEvaluation {
      score,
      completeness: (score / 100.0).min(0.95),
      relevance: 0.9,
      sentiment: Some(sentiment.to_string()),
      reasoning: format!("Mock evaluation: {sentiment} understanding across {words} words"),
      strengths,
      weaknesses,
      improvement_suggestions: improvements,
    }
  }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
  async fn generate_question(
    &self,
    _context: &PlanningContext,
    skill: &str,
    difficulty: Difficulty,
    _exemplars: &[ExemplarQuestion],
  ) -> Result<String, ProviderError> {
    Ok(format!("Mock {difficulty} question about {skill}?"))
  }

  async fn generate_ideal_answer(
    &self,
    question_text: &str,
    _context: &PlanningContext,
  ) -> Result<String, ProviderError> {
    let call = self.ideal_answer_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_ideal_answer_after.is_some_and(|n| call >= n) {
      return Err(ProviderError::Api {
        provider: "mock".to_string(),
        message: "Mock ideal-answer failure".to_string(),
      });
    }
    Ok(format!(
      "Mock ideal answer for '{}': covers the fundamental principles, \
       a worked example, and the relevant edge cases.",
      question_text.chars().take(50).collect::<String>()
    ))
  }

  async fn generate_rationale(
    &self,
    _question_text: &str,
    _ideal_answer: &str,
  ) -> Result<String, ProviderError> {
    Ok(
      "This answer demonstrates mastery by covering fundamental concepts, \
       providing practical examples, and explaining the reasoning behind \
       technical choices."
        .to_string(),
    )
  }

  async fn evaluate_answer(
    &self,
    _question: &Question,
    answer_text: &str,
  ) -> Result<RawEvaluation, ProviderError> {
    let scripted = self.evaluations.lock().unwrap().pop_front();
    Ok(scripted.unwrap_or_else(|| Self::default_evaluation(answer_text)))
  }

  async fn detect_concept_gaps(
    &self,
    _answer_text: &str,
    _ideal_answer: &str,
    _question_text: &str,
    _candidate_keywords: &[String],
  ) -> Result<GapReport, ProviderError> {
    let scripted = self.gap_reports.lock().unwrap().pop_front();
    Ok(scripted.unwrap_or_else(GapReport::none))
  }

  async fn generate_followup_question(
    &self,
    prompt: &FollowUpPrompt,
  ) -> Result<String, ProviderError> {
    let focus = prompt
      .missing_concepts
      .first()
      .cloned()
      .unwrap_or_else(|| "the previous topic".to_string());
    Ok(format!(
      "Follow-up #{}: could you go deeper into {focus}?",
      prompt.order
    ))
  }

  async fn generate_interview_recommendations(
    &self,
    _context: &SummaryContext,
  ) -> Result<RecommendationSet, ProviderError> {
    if self.fail_recommendations {
      return Err(ProviderError::Parse {
        message: "Mock recommendation response was not valid JSON".to_string(),
      });
    }
    let scripted = self.recommendations.lock().unwrap().clone();
    Ok(scripted.unwrap_or_else(|| RecommendationSet {
      strengths: vec![
        "Good understanding of fundamental concepts".to_string(),
        "Clear communication".to_string(),
        "Relevant examples provided".to_string(),
      ],
      weaknesses: vec![
        "Dive deeper into technical details".to_string(),
        "Some follow-ups were needed to surface depth".to_string(),
        "Structure answers more tightly".to_string(),
      ],
      study_topics: vec![
        "Review advanced topics in your primary stack".to_string(),
        "Practice algorithmic reasoning out loud".to_string(),
        "Study best practices and design patterns".to_string(),
      ],
      technique_tips: vec![
        "Lead with the core idea, then elaborate".to_string(),
        "Use concrete examples from past work".to_string(),
      ],
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use intervo_core::domain::QuestionType;

  fn question() -> Question {
    Question::new("Q", QuestionType::Technical, Difficulty::Easy)
  }

  fn context() -> PlanningContext {
    PlanningContext {
      cv_summary: "s".to_string(),
      skills: vec![],
      experience_years: 0.0,
    }
  }

  #[tokio::test]
  async fn default_evaluation_is_deterministic() {
    let model = MockLanguageModel::new();
    let short = model.evaluate_answer(&question(), "too short").await.unwrap();
    assert_eq!(short.score, 65.0);
    let again = model.evaluate_answer(&question(), "too short").await.unwrap();
    assert_eq!(short, again);
  }

  #[tokio::test]
  async fn scripted_evaluations_pop_in_order() {
    let mut first = MockLanguageModel::default_evaluation("x");
    first.score = 42.0;
    let mut second = MockLanguageModel::default_evaluation("x");
    second.score = 93.0;
    let model = MockLanguageModel::new().with_evaluations([first, second]);
    assert_eq!(model.evaluate_answer(&question(), "a").await.unwrap().score, 42.0);
    assert_eq!(model.evaluate_answer(&question(), "a").await.unwrap().score, 93.0);
  }

  #[tokio::test]
  async fn ideal_answer_failure_fires_at_configured_call() {
    let model = MockLanguageModel::new().fail_ideal_answer_after(2);
    assert!(model.generate_ideal_answer("q1", &context()).await.is_ok());
    assert!(model.generate_ideal_answer("q2", &context()).await.is_ok());
    assert!(model.generate_ideal_answer("q3", &context()).await.is_err());
  }
}
