use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
  Answer, Candidate, CvAnalysis, Difficulty, Evaluation, FollowUpQuestion, Interview, Question,
};
use crate::error::StoreError;

/// Persistence ports, one per entity class. `get_*` returns `Ok(None)` for a
/// missing id; `update`/`delete` of a missing id is a `NotFound` error.

#[async_trait]
pub trait CandidateStore: Send + Sync {
  async fn save(&self, candidate: &Candidate) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError>;
  async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>, StoreError>;
  async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CvAnalysisStore: Send + Sync {
  async fn save(&self, analysis: &CvAnalysis) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<CvAnalysis>, StoreError>;
  /// Most recent analysis for a candidate; planning uses this.
  async fn latest_for_candidate(&self, candidate_id: Uuid)
    -> Result<Option<CvAnalysis>, StoreError>;
  async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
  async fn save(&self, question: &Question) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<Question>, StoreError>;
  async fn update(&self, question: &Question) -> Result<(), StoreError>;
  async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
  /// Questions testing `skill` at `difficulty`, for exemplar retrieval.
  async fn find_by_skill(
    &self,
    skill: &str,
    difficulty: Difficulty,
  ) -> Result<Vec<Question>, StoreError>;
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
  async fn save(&self, interview: &Interview) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<Interview>, StoreError>;
  async fn get_by_candidate_id(&self, candidate_id: Uuid) -> Result<Vec<Interview>, StoreError>;
  async fn update(&self, interview: &Interview) -> Result<(), StoreError>;
  /// Cascade: removes the interview with its answers, evaluations, and
  /// follow-up questions.
  async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
  async fn save(&self, answer: &Answer) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<Answer>, StoreError>;
  async fn get_by_interview_id(&self, interview_id: Uuid) -> Result<Vec<Answer>, StoreError>;
  async fn get_by_question_id(&self, question_id: Uuid) -> Result<Option<Answer>, StoreError>;
}

#[async_trait]
pub trait EvaluationStore: Send + Sync {
  async fn save(&self, evaluation: &Evaluation) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError>;
  async fn get_by_answer_id(&self, answer_id: Uuid) -> Result<Option<Evaluation>, StoreError>;
  /// Used to persist forward-only gap-resolution flips.
  async fn update(&self, evaluation: &Evaluation) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FollowUpStore: Send + Sync {
  async fn save(&self, follow_up: &FollowUpQuestion) -> Result<(), StoreError>;
  async fn get(&self, id: Uuid) -> Result<Option<FollowUpQuestion>, StoreError>;
  /// Follow-ups for a parent, ordered by `order_in_sequence`.
  async fn get_by_parent_question_id(
    &self,
    parent_question_id: Uuid,
  ) -> Result<Vec<FollowUpQuestion>, StoreError>;
  async fn count_by_parent_question_id(&self, parent_question_id: Uuid)
    -> Result<usize, StoreError>;
}
