use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Voice quality metrics produced by the speech-to-text provider alongside
/// the transcript. Quality scores are in [0, 1]; rate is words per minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceMetrics {
  pub intonation: f64,
  pub fluency: f64,
  pub confidence: f64,
  pub speaking_rate_wpm: f64,
}

impl VoiceMetrics {
  /// Delivery score on the 0-100 scale: mean of the three quality metrics.
  pub fn speaking_score(&self) -> f64 {
    (self.intonation + self.fluency + self.confidence) / 3.0 * 100.0
  }
}

/// A candidate's answer to a main or follow-up question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
  pub id: Uuid,
  pub interview_id: Uuid,
  pub question_id: Uuid,
  pub candidate_id: Uuid,
  pub text: String,
  pub is_voice: bool,
  pub audio_reference: Option<String>,
  pub duration_seconds: Option<f64>,
  pub voice_metrics: Option<VoiceMetrics>,
  pub created_at: DateTime<Utc>,
  pub evaluated_at: Option<DateTime<Utc>>,
}

impl Answer {
  pub fn text_answer(
    interview_id: Uuid,
    question_id: Uuid,
    candidate_id: Uuid,
    text: impl Into<String>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      interview_id,
      question_id,
      candidate_id,
      text: text.into(),
      is_voice: false,
      audio_reference: None,
      duration_seconds: None,
      voice_metrics: None,
      created_at: Utc::now(),
      evaluated_at: None,
    }
  }

  pub fn voice_answer(
    interview_id: Uuid,
    question_id: Uuid,
    candidate_id: Uuid,
    text: impl Into<String>,
    voice_metrics: VoiceMetrics,
    duration_seconds: f64,
  ) -> Self {
    let mut answer = Self::text_answer(interview_id, question_id, candidate_id, text);
    answer.is_voice = true;
    answer.voice_metrics = Some(voice_metrics);
    answer.duration_seconds = Some(duration_seconds);
    answer
  }

  pub fn mark_evaluated(&mut self) {
    self.evaluated_at = Some(Utc::now());
  }

  pub fn is_evaluated(&self) -> bool {
    self.evaluated_at.is_some()
  }

  /// Per-answer delivery score, falling back to `default` for text answers.
  pub fn speaking_score_or(&self, default: f64) -> f64 {
    self
      .voice_metrics
      .as_ref()
      .map(VoiceMetrics::speaking_score)
      .unwrap_or(default)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn speaking_score_averages_quality_metrics() {
    let metrics = VoiceMetrics {
      intonation: 0.6,
      fluency: 0.9,
      confidence: 0.9,
      speaking_rate_wpm: 140.0,
    };
    assert!((metrics.speaking_score() - 80.0).abs() < 1e-9);
  }

  #[test]
  fn text_answers_fall_back_to_default_speaking_score() {
    let answer = Answer::text_answer(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), "hi");
    assert_eq!(answer.speaking_score_or(50.0), 50.0);
    assert!(!answer.is_voice);
  }
}
