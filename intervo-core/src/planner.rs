use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{Difficulty, Interview, PlanMetadata, Question, QuestionType};
use crate::error::{EngineError, Result};
use crate::ports::{
  timed, CvAnalysisStore, ExemplarQuestion, InterviewStore, LanguageModel, PlanningContext,
  QuestionStore,
};

/// Maximum exemplar questions handed to the generation prompt.
const MAX_EXEMPLARS: usize = 3;

/// Pre-computes the planned question sequence for an interview: N questions
/// (from skill diversity), each with an ideal answer and rationale, persisted
/// before the session starts.
pub struct InterviewPlanner {
  llm: Arc<dyn LanguageModel>,
  cv_analyses: Arc<dyn CvAnalysisStore>,
  interviews: Arc<dyn InterviewStore>,
  questions: Arc<dyn QuestionStore>,
  config: EngineConfig,
}

impl InterviewPlanner {
  pub fn new(
    llm: Arc<dyn LanguageModel>,
    cv_analyses: Arc<dyn CvAnalysisStore>,
    interviews: Arc<dyn InterviewStore>,
    questions: Arc<dyn QuestionStore>,
    config: EngineConfig,
  ) -> Self {
    Self {
      llm,
      cv_analyses,
      interviews,
      questions,
      config,
    }
  }

  /// Plan against the candidate's most recent CV analysis.
  pub async fn plan_for_candidate(&self, candidate_id: Uuid) -> Result<Interview> {
    let analysis = self
      .cv_analyses
      .latest_for_candidate(candidate_id)
      .await?
      .ok_or_else(|| EngineError::not_found("cv analysis for candidate", candidate_id))?;
    self.plan(analysis.id, candidate_id).await
  }

  /// Produce an interview in `Idle` state with a fully populated question
  /// list. On generation failure the questions created by this call are
  /// deleted best-effort and the interview is left in `Planning`.
  pub async fn plan(&self, cv_analysis_id: Uuid, candidate_id: Uuid) -> Result<Interview> {
    let analysis = self
      .cv_analyses
      .get(cv_analysis_id)
      .await?
      .ok_or_else(|| EngineError::not_found("cv analysis", cv_analysis_id))?;

    let n = question_count(analysis.skills.len()).min(self.config.max_questions);
    info!(
      interview_questions = n,
      skills = analysis.skills.len(),
      "starting interview planning"
    );

    let mut interview = Interview::new(candidate_id, cv_analysis_id);
    self.interviews.save(&interview).await?;

    let context = PlanningContext {
      cv_summary: analysis.summary_or_default(),
      skills: analysis.top_skills(5),
      experience_years: analysis.experience_years.unwrap_or(0.0),
    };

    let question_ids = match self.generate_all(&context, n).await {
      Ok(ids) => ids,
      Err(err) => {
        warn!(%err, "question generation failed, rolling back partial plan");
        return Err(err);
      }
    };

    interview.mark_ready(question_ids, PlanMetadata::new(n, analysis.summary_or_default()))?;
    self.interviews.update(&interview).await?;

    info!(interview_id = %interview.id, questions = n, "interview planning complete");
    Ok(interview)
  }

  async fn generate_all(&self, context: &PlanningContext, n: usize) -> Result<Vec<Uuid>> {
    let mut question_ids = Vec::with_capacity(n);
    for index in 0..n {
      let result = match self.generate_question(context, index, n).await {
        Ok(question) => self
          .questions
          .save(&question)
          .await
          .map(|_| question.id)
          .map_err(EngineError::from),
        Err(err) => Err(err),
      };
      match result {
        Ok(id) => {
          info!(question = index + 1, total = n, question_id = %id, "generated planned question");
          question_ids.push(id);
        }
        Err(err) => {
          self.rollback(&question_ids).await;
          return Err(err);
        }
      }
    }
    Ok(question_ids)
  }

  async fn generate_question(
    &self,
    context: &PlanningContext,
    index: usize,
    total: usize,
  ) -> Result<Question> {
    let (question_type, difficulty) = slot(index, total);
    let skill = if context.skills.is_empty() {
      "general".to_string()
    } else {
      context.skills[index % context.skills.len()].clone()
    };

    let exemplars = self.exemplars(&skill, question_type, difficulty).await;

    let text = timed(
      self.config.llm_timeout,
      self
        .llm
        .generate_question(context, &skill, difficulty, &exemplars),
    )
    .await?;
    let ideal_answer = timed(
      self.config.llm_timeout,
      self.llm.generate_ideal_answer(&text, context),
    )
    .await?;
    let rationale = timed(
      self.config.llm_timeout,
      self.llm.generate_rationale(&text, &ideal_answer),
    )
    .await?;

    Ok(
      Question::new(text, question_type, difficulty)
        .with_skills([skill])
        .with_ideal_answer(ideal_answer)
        .with_rationale(rationale),
    )
  }

  /// Existing questions matching (skill, difficulty, type), capped at three.
  /// Retrieval failure degrades to zero exemplars.
  async fn exemplars(
    &self,
    skill: &str,
    question_type: QuestionType,
    difficulty: Difficulty,
  ) -> Vec<ExemplarQuestion> {
    match self.questions.find_by_skill(skill, difficulty).await {
      Ok(matches) => matches
        .into_iter()
        .filter(|q| q.question_type == question_type)
        .take(MAX_EXEMPLARS)
        .map(|q| ExemplarQuestion {
          text: q.text,
          skills: q.skills,
          difficulty: q.difficulty,
        })
        .collect(),
      Err(err) => {
        warn!(%err, skill, "exemplar retrieval failed, continuing without exemplars");
        Vec::new()
      }
    }
  }

  async fn rollback(&self, question_ids: &[Uuid]) {
    for id in question_ids {
      if let Err(err) = self.questions.delete(*id).await {
        warn!(question_id = %id, %err, "failed to delete question during plan rollback");
      }
    }
  }
}

/// Question count from skill diversity alone; experience years are
/// deliberately ignored.
pub fn question_count(skill_count: usize) -> usize {
  match skill_count {
    0..=2 => 2,
    3..=4 => 3,
    5..=7 => 4,
    _ => 5,
  }
}

/// Type and difficulty by position: 60/30/10 technical/behavioral/
/// situational, 50/30/20 easy/medium/hard, counts truncated.
pub fn slot(index: usize, total: usize) -> (QuestionType, Difficulty) {
  let technical = (total as f64 * 0.6) as usize;
  let behavioral = (total as f64 * 0.3) as usize;
  let question_type = if index < technical {
    QuestionType::Technical
  } else if index < technical + behavioral {
    QuestionType::Behavioral
  } else {
    QuestionType::Situational
  };

  let easy = (total as f64 * 0.5) as usize;
  let medium = (total as f64 * 0.3) as usize;
  let difficulty = if index < easy {
    Difficulty::Easy
  } else if index < easy + medium {
    Difficulty::Medium
  } else {
    Difficulty::Hard
  };

  (question_type, difficulty)
}
