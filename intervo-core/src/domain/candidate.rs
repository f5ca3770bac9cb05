use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Person being interviewed. Created once, referenced by interviews and
/// answers. The contact email is unique across candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  /// Reference to an uploaded CV artifact, if any.
  pub cv_artifact: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Candidate {
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      name: name.into(),
      email: email.into(),
      cv_artifact: None,
      created_at: Utc::now(),
    }
  }

  pub fn with_cv_artifact(mut self, artifact: impl Into<String>) -> Self {
    self.cv_artifact = Some(artifact.into());
    self
  }
}
