use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Difficulty;

/// One skill extracted from a CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
  pub name: String,
  pub proficiency: Option<String>,
  pub years: Option<f64>,
}

impl ExtractedSkill {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      proficiency: None,
      years: None,
    }
  }
}

/// Precomputed profile of a candidate's CV. A candidate may accumulate many
/// analyses; planning uses the latest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
  pub id: Uuid,
  pub candidate_id: Uuid,
  pub extracted_text: String,
  pub skills: Vec<ExtractedSkill>,
  pub experience_years: Option<f64>,
  pub education_level: Option<String>,
  pub suggested_topics: Vec<String>,
  pub suggested_difficulty: Difficulty,
  pub summary: Option<String>,
  pub embedding: Option<Vec<f32>>,
  pub created_at: DateTime<Utc>,
}

impl CvAnalysis {
  pub fn new(candidate_id: Uuid, extracted_text: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      candidate_id,
      extracted_text: extracted_text.into(),
      skills: Vec::new(),
      experience_years: None,
      education_level: None,
      suggested_topics: Vec::new(),
      suggested_difficulty: Difficulty::Medium,
      summary: None,
      embedding: None,
      created_at: Utc::now(),
    }
  }

  pub fn with_skills<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.skills = names.into_iter().map(ExtractedSkill::named).collect();
    self
  }

  /// Skill names in CV order, capped at `limit`.
  pub fn top_skills(&self, limit: usize) -> Vec<String> {
    self
      .skills
      .iter()
      .take(limit)
      .map(|s| s.name.clone())
      .collect()
  }

  pub fn has_skill(&self, name: &str) -> bool {
    self
      .skills
      .iter()
      .any(|s| s.name.eq_ignore_ascii_case(name))
  }

  pub fn summary_or_default(&self) -> String {
    self
      .summary
      .clone()
      .unwrap_or_else(|| "No summary".to_string())
  }
}
