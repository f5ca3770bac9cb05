use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Difficulty, GapSeverity, Question};
use crate::error::ProviderError;
use crate::summarizer::GapProgression;

/// Candidate background handed to generation prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
  pub cv_summary: String,
  pub skills: Vec<String>,
  pub experience_years: f64,
}

/// An existing question used as stylistic inspiration during planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarQuestion {
  pub text: String,
  pub skills: Vec<String>,
  pub difficulty: Difficulty,
}

/// Raw fields returned by answer evaluation, before penalty and gap
/// materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvaluation {
  pub score: f64,
  pub completeness: f64,
  pub relevance: f64,
  #[serde(default)]
  pub sentiment: Option<String>,
  #[serde(default)]
  pub reasoning: String,
  #[serde(default)]
  pub strengths: Vec<String>,
  #[serde(default)]
  pub weaknesses: Vec<String>,
  #[serde(default)]
  pub improvement_suggestions: Vec<String>,
}

impl RawEvaluation {
  /// Scoring for an empty answer: everything zero, no LLM round-trip.
  pub fn empty_answer() -> Self {
    Self {
      score: 0.0,
      completeness: 0.0,
      relevance: 0.0,
      sentiment: None,
      reasoning: "No answer was provided.".to_string(),
      strengths: Vec::new(),
      weaknesses: vec!["Answer was empty".to_string()],
      improvement_suggestions: vec!["Provide an answer to the question".to_string()],
    }
  }
}

/// Outcome of LLM gap confirmation over the keyword candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
  #[serde(default)]
  pub concepts: Vec<String>,
  pub confirmed: bool,
  #[serde(default = "GapReport::default_severity")]
  pub severity: GapSeverity,
}

impl GapReport {
  fn default_severity() -> GapSeverity {
    GapSeverity::Moderate
  }

  pub fn none() -> Self {
    Self {
      concepts: Vec::new(),
      confirmed: false,
      severity: GapSeverity::Moderate,
    }
  }
}

/// Everything the model needs to phrase the next follow-up probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPrompt {
  pub parent_question: String,
  pub answer_text: String,
  pub missing_concepts: Vec<String>,
  pub severity: GapSeverity,
  /// 1-based position of the follow-up being generated.
  pub order: u8,
  pub cumulative_gaps: Vec<String>,
  /// Texts of follow-ups already asked for this parent.
  pub previous_follow_ups: Vec<String>,
}

/// Per-answer digest fed into the recommendation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationDigest {
  pub question_id: Uuid,
  pub score: f64,
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryContext {
  pub interview_id: Uuid,
  pub total_answers: usize,
  pub gap_progression: GapProgression,
  pub evaluations: Vec<EvaluationDigest>,
}

/// Personalized closing recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
  pub strengths: Vec<String>,
  pub weaknesses: Vec<String>,
  pub study_topics: Vec<String>,
  pub technique_tips: Vec<String>,
}

impl RecommendationSet {
  /// Safe fallback used when the model response cannot be obtained or
  /// parsed; completion must never fail on recommendations.
  pub fn fallback() -> Self {
    Self {
      strengths: vec![
        "Engaged with every question".to_string(),
        "Completed the full interview".to_string(),
        "Responded to follow-up probing".to_string(),
      ],
      weaknesses: vec![
        "Some key concepts were not fully covered".to_string(),
        "Answers could be more structured".to_string(),
        "Depth varied across topics".to_string(),
      ],
      study_topics: vec![
        "Review the fundamentals of your primary skills".to_string(),
        "Practice explaining concepts out loud".to_string(),
        "Work through representative interview questions".to_string(),
      ],
      technique_tips: vec![
        "Structure answers as context, approach, result".to_string(),
        "Pause to organize your thoughts before answering".to_string(),
      ],
    }
  }
}

/// Language-model capability consumed by the engine. All operations are
/// unary request/response; providers decide how to prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn generate_question(
    &self,
    context: &PlanningContext,
    skill: &str,
    difficulty: Difficulty,
    exemplars: &[ExemplarQuestion],
  ) -> Result<String, ProviderError>;

  async fn generate_ideal_answer(
    &self,
    question_text: &str,
    context: &PlanningContext,
  ) -> Result<String, ProviderError>;

  async fn generate_rationale(
    &self,
    question_text: &str,
    ideal_answer: &str,
  ) -> Result<String, ProviderError>;

  async fn evaluate_answer(
    &self,
    question: &Question,
    answer_text: &str,
  ) -> Result<RawEvaluation, ProviderError>;

  async fn detect_concept_gaps(
    &self,
    answer_text: &str,
    ideal_answer: &str,
    question_text: &str,
    candidate_keywords: &[String],
  ) -> Result<GapReport, ProviderError>;

  async fn generate_followup_question(
    &self,
    prompt: &FollowUpPrompt,
  ) -> Result<String, ProviderError>;

  async fn generate_interview_recommendations(
    &self,
    context: &SummaryContext,
  ) -> Result<RecommendationSet, ProviderError>;
}
