use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{Answer, ConceptGap, Evaluation, Question};
use crate::error::Result;
use crate::ports::{timed, Embeddings, GapReport, LanguageModel, RawEvaluation};

/// Keyword-gap candidates must exceed this count before the LLM confirmation
/// stage runs.
const KEYWORD_GAP_GATE: usize = 3;

/// Tokens at or below this length carry no signal for gap detection.
const MIN_TOKEN_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
  "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from",
  "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
  "will", "would", "should", "could", "may", "might", "must", "can", "this", "that", "these",
  "those",
];

/// Scores one answer: LLM evaluation, similarity against the ideal answer,
/// hybrid keyword+LLM gap detection, and the attempt penalty. Does not
/// persist anything; that is the orchestrator's job.
pub struct AnswerEvaluator {
  llm: Arc<dyn LanguageModel>,
  embeddings: Arc<dyn Embeddings>,
  config: EngineConfig,
}

impl AnswerEvaluator {
  pub fn new(
    llm: Arc<dyn LanguageModel>,
    embeddings: Arc<dyn Embeddings>,
    config: EngineConfig,
  ) -> Self {
    Self {
      llm,
      embeddings,
      config,
    }
  }

  /// Evaluate `answer` against `reference` (the main question whose ideal
  /// answer anchors similarity and gaps; for follow-up answers this is the
  /// parent question, while the produced evaluation keeps the answered
  /// question's id).
  pub async fn evaluate(
    &self,
    answer: &Answer,
    reference: &Question,
    attempt_number: u8,
    parent_evaluation_id: Option<Uuid>,
  ) -> Result<Evaluation> {
    let raw = if answer.text.trim().is_empty() {
      RawEvaluation::empty_answer()
    } else {
      timed(
        self.config.llm_timeout,
        self.llm.evaluate_answer(reference, &answer.text),
      )
      .await?
    };

    let ideal = reference
      .ideal_answer
      .as_deref()
      .filter(|s| !s.trim().is_empty());

    let similarity_score = match ideal {
      Some(ideal) => Some(self.similarity(&answer.text, ideal).await?),
      None => None,
    };

    let gap_report = match ideal {
      Some(ideal) => {
        self
          .detect_gaps(&answer.text, ideal, &reference.text)
          .await?
      }
      None => GapReport::none(),
    };

    let evaluation_id = Uuid::new_v4();
    let gaps: Vec<ConceptGap> = gap_report
      .concepts
      .iter()
      .map(|concept| ConceptGap::new(evaluation_id, concept, gap_report.severity))
      .collect();

    let mut evaluation = Evaluation {
      id: evaluation_id,
      answer_id: answer.id,
      question_id: answer.question_id,
      interview_id: answer.interview_id,
      raw_score: raw.score.clamp(0.0, 100.0),
      penalty: 0.0,
      final_score: 0.0,
      similarity_score,
      completeness: raw.completeness.clamp(0.0, 1.0),
      relevance: raw.relevance.clamp(0.0, 1.0),
      sentiment: raw.sentiment,
      reasoning: raw.reasoning,
      strengths: raw.strengths,
      weaknesses: raw.weaknesses,
      improvement_suggestions: raw.improvement_suggestions,
      attempt_number,
      parent_evaluation_id,
      gaps,
      created_at: Utc::now(),
    };
    evaluation.apply_penalty(attempt_number);

    info!(
      answer_id = %answer.id,
      final_score = evaluation.final_score,
      similarity = ?evaluation.similarity_score,
      gaps = evaluation.gaps.len(),
      attempt = attempt_number,
      "answer evaluated"
    );
    Ok(evaluation)
  }

  async fn similarity(&self, answer_text: &str, ideal_answer: &str) -> Result<f64> {
    let answer_vec = timed(
      self.config.embedding_timeout,
      self.embeddings.embed(answer_text),
    )
    .await?;
    let ideal_vec = timed(
      self.config.embedding_timeout,
      self.embeddings.embed(ideal_answer),
    )
    .await?;
    let similarity = self.embeddings.cosine_similarity(&answer_vec, &ideal_vec);
    // 0.0 is reserved for "not computed"; an exact-zero cosine is reported
    // as 0.01.
    Ok(if similarity == 0.0 { 0.01 } else { similarity })
  }

  async fn detect_gaps(
    &self,
    answer_text: &str,
    ideal_answer: &str,
    question_text: &str,
  ) -> Result<GapReport> {
    let candidates = missing_keywords(answer_text, ideal_answer);
    if candidates.len() <= KEYWORD_GAP_GATE {
      return Ok(GapReport::none());
    }
    debug!(candidates = candidates.len(), "confirming keyword gaps with LLM");
    let report = timed(
      self.config.llm_timeout,
      self
        .llm
        .detect_concept_gaps(answer_text, ideal_answer, question_text, &candidates),
    )
    .await?;
    Ok(report)
  }
}

/// Significant tokens of `text`: lowercased, punctuation-trimmed, longer
/// than three characters, not a stop word. Order-preserving and unique.
fn significant_tokens(text: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut tokens = Vec::new();
  for word in text.split_whitespace() {
    let token = word
      .trim_matches(|c: char| c.is_ascii_punctuation())
      .to_lowercase();
    if token.len() < MIN_TOKEN_LEN || STOP_WORDS.contains(&token.as_str()) {
      continue;
    }
    if seen.insert(token.clone()) {
      tokens.push(token);
    }
  }
  tokens
}

/// Keywords present in the ideal answer but absent from the candidate's
/// answer, in ideal-answer order.
fn missing_keywords(answer_text: &str, ideal_answer: &str) -> Vec<String> {
  let answered: HashSet<String> = significant_tokens(answer_text).into_iter().collect();
  significant_tokens(ideal_answer)
    .into_iter()
    .filter(|token| !answered.contains(token))
    .collect()
}
