use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use intervo_core::domain::{
  Answer, Candidate, CvAnalysis, Difficulty, Evaluation, FollowUpQuestion, Interview, Question,
};
use intervo_core::error::StoreError;
use intervo_core::ports::{
  AnswerStore, CandidateStore, CvAnalysisStore, EvaluationStore, FollowUpStore, InterviewStore,
  QuestionStore,
};

/// All entity tables in one struct so a single `Arc<MemoryStore>` can serve
/// every persistence port.
#[derive(Default)]
pub struct MemoryStore {
  candidates: RwLock<HashMap<Uuid, Candidate>>,
  cv_analyses: RwLock<HashMap<Uuid, CvAnalysis>>,
  questions: RwLock<HashMap<Uuid, Question>>,
  interviews: RwLock<HashMap<Uuid, Interview>>,
  answers: RwLock<HashMap<Uuid, Answer>>,
  evaluations: RwLock<HashMap<Uuid, Evaluation>>,
  follow_ups: RwLock<HashMap<Uuid, FollowUpQuestion>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CandidateStore for MemoryStore {
  async fn save(&self, candidate: &Candidate) -> Result<(), StoreError> {
    let mut table = self.candidates.write().await;
    let duplicate_email = table
      .values()
      .any(|existing| existing.id != candidate.id && existing.email == candidate.email);
    if duplicate_email {
      return Err(StoreError::Conflict {
        message: format!("candidate email '{}' already exists", candidate.email),
      });
    }
    table.insert(candidate.id, candidate.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
    Ok(self.candidates.read().await.get(&id).cloned())
  }

  async fn get_by_email(&self, email: &str) -> Result<Option<Candidate>, StoreError> {
    Ok(
      self
        .candidates
        .read()
        .await
        .values()
        .find(|c| c.email == email)
        .cloned(),
    )
  }

  async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
    self
      .candidates
      .write()
      .await
      .remove(&id)
      .map(|_| ())
      .ok_or_else(|| StoreError::not_found("candidate", id))
  }
}

#[async_trait]
impl CvAnalysisStore for MemoryStore {
  async fn save(&self, analysis: &CvAnalysis) -> Result<(), StoreError> {
    self
      .cv_analyses
      .write()
      .await
      .insert(analysis.id, analysis.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<CvAnalysis>, StoreError> {
    Ok(self.cv_analyses.read().await.get(&id).cloned())
  }

  async fn latest_for_candidate(
    &self,
    candidate_id: Uuid,
  ) -> Result<Option<CvAnalysis>, StoreError> {
    Ok(
      self
        .cv_analyses
        .read()
        .await
        .values()
        .filter(|a| a.candidate_id == candidate_id)
        .max_by_key(|a| a.created_at)
        .cloned(),
    )
  }

  async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
    self
      .cv_analyses
      .write()
      .await
      .remove(&id)
      .map(|_| ())
      .ok_or_else(|| StoreError::not_found("cv analysis", id))
  }
}

#[async_trait]
impl QuestionStore for MemoryStore {
  async fn save(&self, question: &Question) -> Result<(), StoreError> {
    self
      .questions
      .write()
      .await
      .insert(question.id, question.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
    Ok(self.questions.read().await.get(&id).cloned())
  }

  async fn update(&self, question: &Question) -> Result<(), StoreError> {
    let mut table = self.questions.write().await;
    if !table.contains_key(&question.id) {
      return Err(StoreError::not_found("question", question.id));
    }
    table.insert(question.id, question.clone());
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
    self
      .questions
      .write()
      .await
      .remove(&id)
      .map(|_| ())
      .ok_or_else(|| StoreError::not_found("question", id))
  }

  async fn find_by_skill(
    &self,
    skill: &str,
    difficulty: Difficulty,
  ) -> Result<Vec<Question>, StoreError> {
    let mut matches: Vec<Question> = self
      .questions
      .read()
      .await
      .values()
      .filter(|q| q.difficulty == difficulty && q.tests_skill(skill))
      .cloned()
      .collect();
    matches.sort_by_key(|q| q.created_at);
    Ok(matches)
  }
}

#[async_trait]
impl InterviewStore for MemoryStore {
  async fn save(&self, interview: &Interview) -> Result<(), StoreError> {
    self
      .interviews
      .write()
      .await
      .insert(interview.id, interview.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Interview>, StoreError> {
    Ok(self.interviews.read().await.get(&id).cloned())
  }

  async fn get_by_candidate_id(&self, candidate_id: Uuid) -> Result<Vec<Interview>, StoreError> {
    let mut interviews: Vec<Interview> = self
      .interviews
      .read()
      .await
      .values()
      .filter(|i| i.candidate_id == candidate_id)
      .cloned()
      .collect();
    interviews.sort_by_key(|i| i.created_at);
    Ok(interviews)
  }

  async fn update(&self, interview: &Interview) -> Result<(), StoreError> {
    let mut table = self.interviews.write().await;
    if !table.contains_key(&interview.id) {
      return Err(StoreError::not_found("interview", interview.id));
    }
    table.insert(interview.id, interview.clone());
    Ok(())
  }

  async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
    self
      .interviews
      .write()
      .await
      .remove(&id)
      .ok_or_else(|| StoreError::not_found("interview", id))?;

    // The interview owns its answers, evaluations, and follow-ups.
    let removed_answers: Vec<Uuid> = {
      let mut answers = self.answers.write().await;
      let ids: Vec<Uuid> = answers
        .values()
        .filter(|a| a.interview_id == id)
        .map(|a| a.id)
        .collect();
      for answer_id in &ids {
        answers.remove(answer_id);
      }
      ids
    };
    {
      let mut evaluations = self.evaluations.write().await;
      evaluations.retain(|_, e| !removed_answers.contains(&e.answer_id));
    }
    {
      let mut follow_ups = self.follow_ups.write().await;
      follow_ups.retain(|_, f| f.interview_id != id);
    }
    Ok(())
  }
}

#[async_trait]
impl AnswerStore for MemoryStore {
  async fn save(&self, answer: &Answer) -> Result<(), StoreError> {
    self.answers.write().await.insert(answer.id, answer.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Answer>, StoreError> {
    Ok(self.answers.read().await.get(&id).cloned())
  }

  async fn get_by_interview_id(&self, interview_id: Uuid) -> Result<Vec<Answer>, StoreError> {
    let mut answers: Vec<Answer> = self
      .answers
      .read()
      .await
      .values()
      .filter(|a| a.interview_id == interview_id)
      .cloned()
      .collect();
    answers.sort_by_key(|a| a.created_at);
    Ok(answers)
  }

  async fn get_by_question_id(&self, question_id: Uuid) -> Result<Option<Answer>, StoreError> {
    Ok(
      self
        .answers
        .read()
        .await
        .values()
        .filter(|a| a.question_id == question_id)
        .max_by_key(|a| a.created_at)
        .cloned(),
    )
  }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
  async fn save(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
    self
      .evaluations
      .write()
      .await
      .insert(evaluation.id, evaluation.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<Evaluation>, StoreError> {
    Ok(self.evaluations.read().await.get(&id).cloned())
  }

  async fn get_by_answer_id(&self, answer_id: Uuid) -> Result<Option<Evaluation>, StoreError> {
    Ok(
      self
        .evaluations
        .read()
        .await
        .values()
        .find(|e| e.answer_id == answer_id)
        .cloned(),
    )
  }

  async fn update(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
    let mut table = self.evaluations.write().await;
    if !table.contains_key(&evaluation.id) {
      return Err(StoreError::not_found("evaluation", evaluation.id));
    }
    table.insert(evaluation.id, evaluation.clone());
    Ok(())
  }
}

#[async_trait]
impl FollowUpStore for MemoryStore {
  async fn save(&self, follow_up: &FollowUpQuestion) -> Result<(), StoreError> {
    let mut table = self.follow_ups.write().await;
    let order_taken = table.values().any(|existing| {
      existing.parent_question_id == follow_up.parent_question_id
        && existing.order_in_sequence == follow_up.order_in_sequence
        && existing.id != follow_up.id
    });
    if order_taken {
      return Err(StoreError::Conflict {
        message: format!(
          "follow-up order {} already exists for parent {}",
          follow_up.order_in_sequence, follow_up.parent_question_id
        ),
      });
    }
    table.insert(follow_up.id, follow_up.clone());
    Ok(())
  }

  async fn get(&self, id: Uuid) -> Result<Option<FollowUpQuestion>, StoreError> {
    Ok(self.follow_ups.read().await.get(&id).cloned())
  }

  async fn get_by_parent_question_id(
    &self,
    parent_question_id: Uuid,
  ) -> Result<Vec<FollowUpQuestion>, StoreError> {
    let mut follow_ups: Vec<FollowUpQuestion> = self
      .follow_ups
      .read()
      .await
      .values()
      .filter(|f| f.parent_question_id == parent_question_id)
      .cloned()
      .collect();
    follow_ups.sort_by_key(|f| f.order_in_sequence);
    Ok(follow_ups)
  }

  async fn count_by_parent_question_id(
    &self,
    parent_question_id: Uuid,
  ) -> Result<usize, StoreError> {
    Ok(
      self
        .follow_ups
        .read()
        .await
        .values()
        .filter(|f| f.parent_question_id == parent_question_id)
        .count(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use intervo_core::domain::{PlanMetadata, QuestionType};

  #[tokio::test]
  async fn interview_round_trips_identically() {
    let store = MemoryStore::new();
    let mut interview = Interview::new(Uuid::new_v4(), Uuid::new_v4());
    interview
      .mark_ready(
        vec![Uuid::new_v4(), Uuid::new_v4()],
        PlanMetadata::new(2, "summary"),
      )
      .unwrap();
    interview.record_answer(Uuid::new_v4());
    interview.record_follow_up(Uuid::new_v4(), interview.question_ids[0]);

    InterviewStore::save(&store, &interview).await.unwrap();
    let reloaded = InterviewStore::get(&store, interview.id).await.unwrap().unwrap();
    assert_eq!(interview, reloaded);
  }

  #[tokio::test]
  async fn update_of_missing_interview_is_not_found() {
    let store = MemoryStore::new();
    let interview = Interview::new(Uuid::new_v4(), Uuid::new_v4());
    let err = InterviewStore::update(&store, &interview).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
  }

  #[tokio::test]
  async fn duplicate_candidate_email_conflicts() {
    let store = MemoryStore::new();
    let first = Candidate::new("Ada", "ada@example.com");
    let second = Candidate::new("Grace", "ada@example.com");
    CandidateStore::save(&store, &first).await.unwrap();
    let err = CandidateStore::save(&store, &second).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
    // Re-saving the same candidate is fine.
    CandidateStore::save(&store, &first).await.unwrap();
  }

  #[tokio::test]
  async fn latest_cv_analysis_wins() {
    let store = MemoryStore::new();
    let candidate_id = Uuid::new_v4();
    let mut older = CvAnalysis::new(candidate_id, "old");
    older.created_at = older.created_at - chrono::Duration::hours(1);
    let newer = CvAnalysis::new(candidate_id, "new");
    CvAnalysisStore::save(&store, &older).await.unwrap();
    CvAnalysisStore::save(&store, &newer).await.unwrap();

    let latest = store
      .latest_for_candidate(candidate_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(latest.extracted_text, "new");
  }

  #[tokio::test]
  async fn follow_ups_come_back_in_sequence_order_and_orders_are_unique() {
    let store = MemoryStore::new();
    let parent = Uuid::new_v4();
    let interview = Uuid::new_v4();
    for order in [2u8, 1, 3] {
      let follow_up = FollowUpQuestion::new(parent, interview, "q", "r", order).unwrap();
      FollowUpStore::save(&store, &follow_up).await.unwrap();
    }

    let follow_ups = store.get_by_parent_question_id(parent).await.unwrap();
    let orders: Vec<u8> = follow_ups.iter().map(|f| f.order_in_sequence).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(store.count_by_parent_question_id(parent).await.unwrap(), 3);

    let duplicate = FollowUpQuestion::new(parent, interview, "q", "r", 2).unwrap();
    let err = FollowUpStore::save(&store, &duplicate).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
  }

  #[tokio::test]
  async fn deleting_an_interview_cascades() {
    let store = MemoryStore::new();
    let candidate_id = Uuid::new_v4();
    let mut interview = Interview::new(candidate_id, Uuid::new_v4());
    let question = Question::new("Q1", QuestionType::Technical, Difficulty::Easy);
    interview
      .mark_ready(vec![question.id], PlanMetadata::new(1, "s"))
      .unwrap();
    QuestionStore::save(&store, &question).await.unwrap();
    InterviewStore::save(&store, &interview).await.unwrap();

    let answer = Answer::text_answer(interview.id, question.id, candidate_id, "hi");
    AnswerStore::save(&store, &answer).await.unwrap();
    let follow_up = FollowUpQuestion::new(question.id, interview.id, "fu", "r", 1).unwrap();
    FollowUpStore::save(&store, &follow_up).await.unwrap();

    InterviewStore::delete(&store, interview.id).await.unwrap();
    assert!(AnswerStore::get(&store, answer.id).await.unwrap().is_none());
    assert!(FollowUpStore::get(&store, follow_up.id).await.unwrap().is_none());
    // Planned questions are shared assets and survive the cascade.
    assert!(QuestionStore::get(&store, question.id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn answers_by_interview_are_in_creation_order() {
    let store = MemoryStore::new();
    let interview_id = Uuid::new_v4();
    let candidate_id = Uuid::new_v4();
    let mut first = Answer::text_answer(interview_id, Uuid::new_v4(), candidate_id, "one");
    first.created_at = first.created_at - chrono::Duration::minutes(2);
    let second = Answer::text_answer(interview_id, Uuid::new_v4(), candidate_id, "two");
    AnswerStore::save(&store, &second).await.unwrap();
    AnswerStore::save(&store, &first).await.unwrap();

    let answers = store.get_by_interview_id(interview_id).await.unwrap();
    let texts: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two"]);
  }
}
