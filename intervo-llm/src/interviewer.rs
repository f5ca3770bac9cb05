use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

use intervo_core::domain::{Difficulty, Question};
use intervo_core::error::ProviderError;
use intervo_core::ports::{
  ExemplarQuestion, FollowUpPrompt, GapReport, LanguageModel, PlanningContext, RawEvaluation,
  RecommendationSet, SummaryContext,
};

use crate::prompts;
use crate::providers::{ChatProvider, ChatRequest};
use crate::{LlmError, Result};

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Implements the engine's `LanguageModel` port on top of any
/// `ChatProvider`: renders prompts, strips markdown fences, parses JSON into
/// the core record types.
pub struct LlmInterviewer {
  provider: Arc<dyn ChatProvider>,
  model: String,
  temperature: f32,
}

impl LlmInterviewer {
  pub fn new(provider: Arc<dyn ChatProvider>, model: impl Into<String>) -> Self {
    Self {
      provider,
      model: model.into(),
      temperature: DEFAULT_TEMPERATURE,
    }
  }

  pub fn with_temperature(mut self, temperature: f32) -> Self {
    self.temperature = temperature;
    self
  }

  async fn chat(&self, system: String, user: String) -> Result<String> {
    let request = ChatRequest::new(&self.model, system, user).with_temperature(self.temperature);
    let response = self.provider.complete(&request).await?;
    debug!(provider = self.provider.name(), chars = response.content.len(), "chat completion");
    Ok(response.content.trim().to_string())
  }

  async fn chat_json<T: DeserializeOwned>(&self, system: String, user: String) -> Result<T> {
    let content = self.chat(system, user).await?;
    parse_json(&content)
  }
}

/// Strip markdown code fences the model may wrap JSON in, then parse.
fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T> {
  static OPEN_FENCE: OnceLock<Regex> = OnceLock::new();
  static CLOSE_FENCE: OnceLock<Regex> = OnceLock::new();
  let open = OPEN_FENCE.get_or_init(|| Regex::new(r"^```(?:json)?\s*\n?").unwrap());
  let close = CLOSE_FENCE.get_or_init(|| Regex::new(r"\n?```\s*$").unwrap());

  let opened = open.replace(content.trim(), "");
  let stripped = close.replace(opened.as_ref(), "");
  serde_json::from_str(stripped.trim()).map_err(|err| LlmError::ResponseParsingError {
    message: format!("{err}; content was: {}", content.chars().take(200).collect::<String>()),
  })
}

#[async_trait]
impl LanguageModel for LlmInterviewer {
  async fn generate_question(
    &self,
    context: &PlanningContext,
    skill: &str,
    difficulty: Difficulty,
    exemplars: &[ExemplarQuestion],
  ) -> std::result::Result<String, ProviderError> {
    let (system, user) = prompts::generate_question(context, skill, difficulty, exemplars);
    Ok(self.chat(system, user).await?)
  }

  async fn generate_ideal_answer(
    &self,
    question_text: &str,
    context: &PlanningContext,
  ) -> std::result::Result<String, ProviderError> {
    let (system, user) = prompts::generate_ideal_answer(question_text, context);
    Ok(self.chat(system, user).await?)
  }

  async fn generate_rationale(
    &self,
    question_text: &str,
    ideal_answer: &str,
  ) -> std::result::Result<String, ProviderError> {
    let (system, user) = prompts::generate_rationale(question_text, ideal_answer);
    Ok(self.chat(system, user).await?)
  }

  async fn evaluate_answer(
    &self,
    question: &Question,
    answer_text: &str,
  ) -> std::result::Result<RawEvaluation, ProviderError> {
    let (system, user) = prompts::evaluate_answer(
      &question.text,
      &question.question_type.to_string(),
      &question.difficulty.to_string(),
      &question.skills,
      question.ideal_answer.as_deref(),
      answer_text,
    );
    Ok(self.chat_json(system, user).await?)
  }

  async fn detect_concept_gaps(
    &self,
    answer_text: &str,
    ideal_answer: &str,
    question_text: &str,
    candidate_keywords: &[String],
  ) -> std::result::Result<GapReport, ProviderError> {
    let (system, user) =
      prompts::detect_concept_gaps(answer_text, ideal_answer, question_text, candidate_keywords);
    Ok(self.chat_json(system, user).await?)
  }

  async fn generate_followup_question(
    &self,
    prompt: &FollowUpPrompt,
  ) -> std::result::Result<String, ProviderError> {
    let (system, user) = prompts::generate_followup_question(prompt);
    Ok(self.chat(system, user).await?)
  }

  async fn generate_interview_recommendations(
    &self,
    context: &SummaryContext,
  ) -> std::result::Result<RecommendationSet, ProviderError> {
    let (system, user) = prompts::generate_interview_recommendations(context);
    Ok(self.chat_json(system, user).await?)
  }
}
