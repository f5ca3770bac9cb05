use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decider::{decide_follow_up, FollowUpDecision};
use crate::domain::{
  Answer, Evaluation, FollowUpQuestion, GapSeverity, Interview, InterviewStatus, Question,
};
use crate::error::{EngineError, Result};
use crate::evaluator::AnswerEvaluator;
use crate::ports::{
  timed, AnswerStore, Embeddings, EvaluationStore, FollowUpPrompt, FollowUpStore, InterviewStore,
  LanguageModel, QuestionStore, SpeechToText, TextToSpeech, Transcription,
};
use crate::session::messages::{InboundEvent, OutboundMessage};
use crate::summarizer::Summarizer;

/// Everything a session task needs, shared across sessions. Providers are
/// globally shared and stateless from the engine's viewpoint.
pub struct SessionDeps {
  pub llm: Arc<dyn LanguageModel>,
  pub embeddings: Arc<dyn Embeddings>,
  pub stt: Arc<dyn SpeechToText>,
  pub tts: Arc<dyn TextToSpeech>,
  pub interviews: Arc<dyn InterviewStore>,
  pub questions: Arc<dyn QuestionStore>,
  pub answers: Arc<dyn AnswerStore>,
  pub evaluations: Arc<dyn EvaluationStore>,
  pub follow_ups: Arc<dyn FollowUpStore>,
  pub config: EngineConfig,
}

/// Drives exactly one interview from `Idle` to a terminal state. Owned by a
/// single session task; all mutable session state lives here, so no locking
/// is needed beyond the registry lookup.
pub struct SessionOrchestrator {
  interview_id: Uuid,
  deps: Arc<SessionDeps>,
  evaluator: AnswerEvaluator,
  outbound: mpsc::Sender<OutboundMessage>,
  state: InterviewStatus,
  current_question_id: Option<Uuid>,
  /// Main question whose thread is active; equals `current_question_id`
  /// while a main question is posed, stays put during follow-ups.
  parent_question_id: Option<Uuid>,
  follow_up_count: u8,
  audio_buffer: Vec<u8>,
}

impl SessionOrchestrator {
  pub fn new(
    interview_id: Uuid,
    deps: Arc<SessionDeps>,
    outbound: mpsc::Sender<OutboundMessage>,
  ) -> Self {
    let evaluator = AnswerEvaluator::new(
      deps.llm.clone(),
      deps.embeddings.clone(),
      deps.config.clone(),
    );
    Self {
      interview_id,
      deps,
      evaluator,
      outbound,
      state: InterviewStatus::Idle,
      current_question_id: None,
      parent_question_id: None,
      follow_up_count: 0,
      audio_buffer: Vec::new(),
    }
  }

  pub fn state(&self) -> InterviewStatus {
    self.state
  }

  /// Process one inbound event. Returns false once the session is over.
  ///
  /// Recoverable failures (provider errors, bad input, out-of-state events)
  /// surface as an `error` message and leave state untouched; persistence
  /// and internal failures cancel the session.
  pub async fn handle_event(&mut self, event: InboundEvent) -> bool {
    let result = match event {
      InboundEvent::GetNextQuestion => self.start_session().await,
      InboundEvent::TextAnswer {
        question_id,
        answer_text,
      } => self.handle_answer(question_id, answer_text, None).await,
      InboundEvent::AudioChunk {
        question_id,
        audio_b64,
        is_final,
      } => self.handle_audio_chunk(question_id, audio_b64, is_final).await,
      InboundEvent::Cancel => {
        self.cancel("cancelled by client").await;
        return false;
      }
    };

    if let Err(err) = result {
      warn!(interview_id = %self.interview_id, %err, "session event failed");
      self.emit_error(&err).await;
      if !err.is_recoverable() {
        self.cancel("unrecoverable failure").await;
        return false;
      }
    }
    !self.state.is_terminal()
  }

  /// Idle -> Questioning. Validation and synthesis happen before any state
  /// mutation: an orchestrator that cannot find its subject never leaves
  /// Idle, and a failed start can simply be retried.
  async fn start_session(&mut self) -> Result<()> {
    if self.state != InterviewStatus::Idle {
      return Err(EngineError::InvalidTransition {
        from: self.state,
        to: InterviewStatus::Questioning,
      });
    }

    let mut interview = self.load_interview().await?;
    if interview.status != InterviewStatus::Idle {
      return Err(EngineError::InvalidTransition {
        from: interview.status,
        to: InterviewStatus::Questioning,
      });
    }
    let question_id = interview
      .current_question_id()
      .ok_or_else(|| EngineError::invalid_input("interview has no planned questions"))?;
    let question = self.load_question(question_id).await?;
    let audio_payload = self.synthesize(&question.text).await?;

    interview.transition(InterviewStatus::Questioning)?;
    interview.current_parent_question_id = Some(question.id);
    interview.current_followup_count = 0;
    self.deps.interviews.update(&interview).await?;

    self.state = InterviewStatus::Questioning;
    self.current_question_id = Some(question.id);
    self.parent_question_id = Some(question.id);
    self.follow_up_count = 0;

    info!(interview_id = %self.interview_id, question_id = %question.id, "session started");
    self
      .emit(OutboundMessage::Question {
        question_id: question.id,
        text: question.text.clone(),
        question_type: question.question_type,
        difficulty: question.difficulty,
        index: interview.current_question_index,
        total: interview.question_ids.len(),
        audio_payload,
      })
      .await;
    Ok(())
  }

  async fn handle_audio_chunk(
    &mut self,
    question_id: Uuid,
    audio_b64: String,
    is_final: bool,
  ) -> Result<()> {
    let bytes = BASE64.decode(audio_b64.as_bytes()).map_err(|err| {
      EngineError::invalid_input(format!("audio payload is not valid base64: {err}"))
    })?;
    self.audio_buffer.extend_from_slice(&bytes);
    if !is_final {
      return Ok(());
    }

    let transcription = timed(
      self.deps.config.speech_timeout,
      self.deps.stt.transcribe(&self.audio_buffer, "en-US"),
    )
    .await?;
    self.audio_buffer.clear();
    let text = transcription.text.clone();
    self.handle_answer(question_id, text, Some(transcription)).await
  }

  /// The answer-received protocol. The Questioning/FollowUp -> Evaluating
  /// transition is persisted first; every provider round-trip runs before
  /// anything else persists, so a recoverable failure rolls the state back
  /// and the client can resend the same answer.
  async fn handle_answer(
    &mut self,
    question_id: Uuid,
    text: String,
    transcription: Option<Transcription>,
  ) -> Result<()> {
    if !matches!(
      self.state,
      InterviewStatus::Questioning | InterviewStatus::FollowUp
    ) {
      return Err(EngineError::InvalidTransition {
        from: self.state,
        to: InterviewStatus::Evaluating,
      });
    }
    let current = self
      .current_question_id
      .ok_or_else(|| EngineError::invalid_input("no active question"))?;
    if question_id != current {
      return Err(EngineError::invalid_input(format!(
        "answer targets question {question_id} but the active question is {current}"
      )));
    }

    let origin = self.state;
    let mut interview = self.load_interview().await?;
    interview.transition(InterviewStatus::Evaluating)?;
    self.deps.interviews.update(&interview).await?;
    self.state = InterviewStatus::Evaluating;

    match self.process_answer(interview, text, transcription).await {
      Ok(()) => Ok(()),
      Err(err) if err.is_recoverable() => {
        let mut interview = self.load_interview().await?;
        interview.transition(origin)?;
        self.deps.interviews.update(&interview).await?;
        self.state = origin;
        Err(err)
      }
      Err(err) => Err(err),
    }
  }

  async fn process_answer(
    &mut self,
    mut interview: Interview,
    text: String,
    transcription: Option<Transcription>,
  ) -> Result<()> {
    let parent_id = self.parent_question_id.ok_or_else(|| EngineError::Internal {
      message: "evaluating with no active parent question".to_string(),
    })?;
    let parent = self.load_question(parent_id).await?;
    let question_id = self.current_question_id.ok_or_else(|| EngineError::Internal {
      message: "evaluating with no active question".to_string(),
    })?;

    let mut answer = match transcription {
      Some(t) => Answer::voice_answer(
        interview.id,
        question_id,
        interview.candidate_id,
        text,
        t.voice_metrics,
        t.duration_seconds,
      ),
      None => Answer::text_answer(interview.id, question_id, interview.candidate_id, text),
    };

    // Earlier attempts in this thread, main answer first.
    let mut thread = self.thread_evaluations(&parent).await?;
    let attempt_number = (self.follow_up_count + 1).min(3);
    let parent_evaluation_id = thread.last().map(|e| e.id);

    let evaluation = self
      .evaluator
      .evaluate(&answer, &parent, attempt_number, parent_evaluation_id)
      .await?;
    answer.mark_evaluated();

    // A later attempt resolves previously recorded gaps it now covers.
    let mut resolved_priors: Vec<Evaluation> = Vec::new();
    if attempt_number > 1 {
      let still_missing = evaluation.unresolved_gap_concepts();
      for prior in &mut thread {
        if prior.resolve_covered_gaps(&still_missing) > 0 {
          resolved_priors.push(prior.clone());
        }
      }
    }

    let follow_up_count = self
      .deps
      .follow_ups
      .count_by_parent_question_id(parent.id)
      .await?
      .min(u8::MAX as usize) as u8;
    let prior_followups: Vec<Evaluation> = thread
      .iter()
      .filter(|e| e.attempt_number > 1)
      .cloned()
      .collect();
    let decision = decide_follow_up(
      &self.deps.config,
      follow_up_count,
      &evaluation,
      &prior_followups,
    );
    info!(
      interview_id = %self.interview_id,
      needs_followup = decision.needs_followup,
      reason = %decision.reason,
      follow_up_count = decision.follow_up_count,
      "follow-up decision"
    );

    if decision.needs_followup {
      self
        .ask_follow_up(interview, &parent, &answer, &evaluation, resolved_priors, decision)
        .await
    } else {
      interview.advance_question();
      if interview.has_more_questions() {
        self
          .ask_next_question(interview, &answer, &evaluation, resolved_priors)
          .await
      } else {
        self
          .complete(interview, &answer, &evaluation, resolved_priors)
          .await
      }
    }
  }

  async fn ask_follow_up(
    &mut self,
    mut interview: Interview,
    parent: &Question,
    answer: &Answer,
    evaluation: &Evaluation,
    resolved_priors: Vec<Evaluation>,
    decision: FollowUpDecision,
  ) -> Result<()> {
    let order = decision.follow_up_count + 1;
    let previous_follow_ups: Vec<String> = self
      .deps
      .follow_ups
      .get_by_parent_question_id(parent.id)
      .await?
      .into_iter()
      .map(|fu| fu.text)
      .collect();

    let prompt = FollowUpPrompt {
      parent_question: parent.text.clone(),
      answer_text: answer.text.clone(),
      missing_concepts: decision.cumulative_gaps.clone(),
      severity: evaluation
        .dominant_gap_severity()
        .unwrap_or(GapSeverity::Moderate),
      order,
      cumulative_gaps: decision.cumulative_gaps.clone(),
      previous_follow_ups,
    };
    let text = timed(
      self.deps.config.llm_timeout,
      self.deps.llm.generate_followup_question(&prompt),
    )
    .await?;
    let audio_payload = self.synthesize(&text).await?;

    // All provider calls succeeded; persist the whole transition.
    let follow_up = FollowUpQuestion::new(
      parent.id,
      interview.id,
      text,
      decision.reason.clone(),
      order,
    )?;
    self
      .persist_answer(&mut interview, answer, evaluation, &resolved_priors)
      .await?;
    self.deps.follow_ups.save(&follow_up).await?;
    interview.record_follow_up(follow_up.id, parent.id);
    interview.transition(InterviewStatus::FollowUp)?;
    self.deps.interviews.update(&interview).await?;

    self.state = InterviewStatus::FollowUp;
    self.current_question_id = Some(follow_up.id);
    self.follow_up_count = order;

    self.emit_evaluation(evaluation).await;
    self
      .emit(OutboundMessage::FollowUpQuestion {
        question_id: follow_up.id,
        parent_question_id: parent.id,
        text: follow_up.text.clone(),
        generated_reason: follow_up.generated_reason.clone(),
        order_in_sequence: order,
        audio_payload,
      })
      .await;
    info!(interview_id = %self.interview_id, order, "follow-up question sent");
    Ok(())
  }

  async fn ask_next_question(
    &mut self,
    mut interview: Interview,
    answer: &Answer,
    evaluation: &Evaluation,
    resolved_priors: Vec<Evaluation>,
  ) -> Result<()> {
    let question_id = interview.current_question_id().ok_or_else(|| EngineError::Internal {
      message: "advanced past the last planned question".to_string(),
    })?;
    let question = self.load_question(question_id).await?;
    let audio_payload = self.synthesize(&question.text).await?;

    self
      .persist_answer(&mut interview, answer, evaluation, &resolved_priors)
      .await?;
    interview.current_parent_question_id = Some(question.id);
    interview.transition(InterviewStatus::Questioning)?;
    self.deps.interviews.update(&interview).await?;

    self.state = InterviewStatus::Questioning;
    self.current_question_id = Some(question.id);
    self.parent_question_id = Some(question.id);
    self.follow_up_count = 0;

    self.emit_evaluation(evaluation).await;
    self
      .emit(OutboundMessage::Question {
        question_id: question.id,
        text: question.text.clone(),
        question_type: question.question_type,
        difficulty: question.difficulty,
        index: interview.current_question_index,
        total: interview.question_ids.len(),
        audio_payload,
      })
      .await;
    info!(interview_id = %self.interview_id, question_id = %question.id, "next question sent");
    Ok(())
  }

  async fn complete(
    &mut self,
    mut interview: Interview,
    answer: &Answer,
    evaluation: &Evaluation,
    resolved_priors: Vec<Evaluation>,
  ) -> Result<()> {
    self
      .persist_answer(&mut interview, answer, evaluation, &resolved_priors)
      .await?;
    interview.transition(InterviewStatus::Complete)?;

    // Summarize against the freshly persisted answers, cache the report on
    // the interview, then persist the terminal state in one update.
    let summarizer = Summarizer::new(
      self.deps.llm.clone(),
      self.deps.interviews.clone(),
      self.deps.questions.clone(),
      self.deps.answers.clone(),
      self.deps.evaluations.clone(),
      self.deps.follow_ups.clone(),
      self.deps.config.clone(),
    );
    let summary = summarizer.summarize_interview(&interview).await?;
    match interview.plan_metadata.as_mut() {
      Some(meta) => meta.completion_summary = Some(summary.clone()),
      None => {
        return Err(EngineError::Internal {
          message: "completing an interview that was never planned".to_string(),
        })
      }
    }
    self.deps.interviews.update(&interview).await?;
    self.state = InterviewStatus::Complete;

    self.emit_evaluation(evaluation).await;
    self
      .emit(OutboundMessage::InterviewComplete {
        interview_id: interview.id,
        overall_score: summary.overall_score,
        total_questions: interview.question_ids.len(),
        feedback_url: format!("/interviews/{}/feedback", interview.id),
      })
      .await;
    info!(interview_id = %self.interview_id, overall_score = summary.overall_score, "interview complete");
    Ok(())
  }

  /// Answer, its evaluation, and any gap-resolution flips persist together,
  /// scoped to the single state transition being made.
  async fn persist_answer(
    &self,
    interview: &mut Interview,
    answer: &Answer,
    evaluation: &Evaluation,
    resolved_priors: &[Evaluation],
  ) -> Result<()> {
    self.deps.answers.save(answer).await?;
    self.deps.evaluations.save(evaluation).await?;
    for prior in resolved_priors {
      self.deps.evaluations.update(prior).await?;
    }
    interview.record_answer(answer.id);
    Ok(())
  }

  /// Evaluations of every earlier attempt in the parent's thread: the main
  /// answer first, then follow-up answers in sequence order.
  async fn thread_evaluations(&self, parent: &Question) -> Result<Vec<Evaluation>> {
    let mut evaluations = Vec::new();
    if let Some(main_answer) = self.deps.answers.get_by_question_id(parent.id).await? {
      if let Some(evaluation) = self.deps.evaluations.get_by_answer_id(main_answer.id).await? {
        evaluations.push(evaluation);
      }
    }
    for follow_up in self
      .deps
      .follow_ups
      .get_by_parent_question_id(parent.id)
      .await?
    {
      if let Some(fu_answer) = self.deps.answers.get_by_question_id(follow_up.id).await? {
        if let Some(evaluation) = self.deps.evaluations.get_by_answer_id(fu_answer.id).await? {
          evaluations.push(evaluation);
        }
      }
    }
    Ok(evaluations)
  }

  async fn cancel(&mut self, reason: &str) {
    if self.state.is_terminal() {
      return;
    }
    match self.deps.interviews.get(self.interview_id).await {
      Ok(Some(mut interview)) if !interview.status.is_terminal() => {
        if interview.transition(InterviewStatus::Cancelled).is_ok() {
          if let Err(err) = self.deps.interviews.update(&interview).await {
            warn!(interview_id = %self.interview_id, %err, "failed to persist cancellation");
          }
        }
      }
      Ok(_) => {}
      Err(err) => {
        warn!(interview_id = %self.interview_id, %err, "failed to load interview for cancellation")
      }
    }
    self.state = InterviewStatus::Cancelled;
    info!(interview_id = %self.interview_id, reason, "session cancelled");
  }

  async fn synthesize(&self, text: &str) -> Result<String> {
    let audio = timed(
      self.deps.config.speech_timeout,
      self.deps.tts.synthesize(text, None, 1.0),
    )
    .await?;
    Ok(BASE64.encode(audio))
  }

  async fn emit_evaluation(&self, evaluation: &Evaluation) {
    self
      .emit(OutboundMessage::Evaluation {
        answer_id: evaluation.answer_id,
        score: evaluation.final_score,
        feedback: evaluation.reasoning.clone(),
        strengths: evaluation.strengths.clone(),
        weaknesses: evaluation.weaknesses.clone(),
        similarity_score: evaluation.similarity_score,
        gaps: evaluation.gaps.clone(),
      })
      .await;
  }

  async fn emit(&self, message: OutboundMessage) {
    if self.outbound.send(message).await.is_err() {
      warn!(interview_id = %self.interview_id, "outbound channel closed, dropping message");
    }
  }

  async fn emit_error(&self, err: &EngineError) {
    self
      .emit(OutboundMessage::Error {
        code: err.code().to_string(),
        message: err.to_string(),
      })
      .await;
  }

  async fn load_interview(&self) -> Result<Interview> {
    self
      .deps
      .interviews
      .get(self.interview_id)
      .await?
      .ok_or_else(|| EngineError::not_found("interview", self.interview_id))
  }

  async fn load_question(&self, id: Uuid) -> Result<Question> {
    self
      .deps
      .questions
      .get(id)
      .await?
      .ok_or_else(|| EngineError::not_found("question", id))
  }
}
