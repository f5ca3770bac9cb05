//! End-to-end session scenarios against the mock provider stack: scripted
//! language model, scripted embeddings, mock speech, in-memory store.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::sync::mpsc;
use uuid::Uuid;

use intervo_core::domain::{
  Candidate, CvAnalysis, Difficulty, GapSeverity, Interview, InterviewStatus, PlanMetadata,
  Question, QuestionType,
};
use intervo_core::error::EngineError;
use intervo_core::ports::{
  AnswerStore, CandidateStore, CvAnalysisStore, EvaluationStore, GapReport, InterviewStore,
  QuestionStore, RawEvaluation,
};
use intervo_core::{
  EngineConfig, InboundEvent, InterviewPlanner, OutboundMessage, SessionDeps, SessionRegistry,
  Summarizer,
};
use intervo_llm::MockLanguageModel;
use intervo_speech::MockSpeech;
use intervo_store::MemoryStore;
use intervo_vector::MockEmbeddings;

struct Harness {
  store: Arc<MemoryStore>,
  llm: Arc<MockLanguageModel>,
  registry: SessionRegistry,
}

fn harness(llm: MockLanguageModel, embeddings: MockEmbeddings) -> Harness {
  let store = Arc::new(MemoryStore::new());
  let llm = Arc::new(llm);
  let speech = Arc::new(MockSpeech::new());
  let deps = Arc::new(SessionDeps {
    llm: llm.clone(),
    embeddings: Arc::new(embeddings),
    stt: speech.clone(),
    tts: speech,
    interviews: store.clone(),
    questions: store.clone(),
    answers: store.clone(),
    evaluations: store.clone(),
    follow_ups: store.clone(),
    config: EngineConfig::default(),
  });
  Harness {
    store: store.clone(),
    llm,
    registry: SessionRegistry::new(deps),
  }
}

impl Harness {
  fn planner(&self) -> InterviewPlanner {
    InterviewPlanner::new(
      self.llm.clone(),
      self.store.clone(),
      self.store.clone(),
      self.store.clone(),
      EngineConfig::default(),
    )
  }

  fn summarizer(&self) -> Summarizer {
    Summarizer::new(
      self.llm.clone(),
      self.store.clone(),
      self.store.clone(),
      self.store.clone(),
      self.store.clone(),
      self.store.clone(),
      EngineConfig::default(),
    )
  }

  async fn seed_candidate(&self, skills: &[&str]) -> (Candidate, CvAnalysis) {
    let candidate = Candidate::new("Ada Lovelace", format!("{}@example.com", Uuid::new_v4()));
    CandidateStore::save(&*self.store, &candidate).await.unwrap();
    let analysis =
      CvAnalysis::new(candidate.id, "cv text").with_skills(skills.iter().copied());
    CvAnalysisStore::save(&*self.store, &analysis).await.unwrap();
    (candidate, analysis)
  }

  async fn plan(&self, skills: &[&str]) -> Interview {
    let (candidate, analysis) = self.seed_candidate(skills).await;
    self.planner().plan(analysis.id, candidate.id).await.unwrap()
  }

  /// Hand-built single-question interview, bypassing the planner.
  async fn seed_single_question(
    &self,
    question_type: QuestionType,
    ideal_answer: Option<&str>,
  ) -> (Interview, Question) {
    let candidate = Candidate::new("Ada Lovelace", format!("{}@example.com", Uuid::new_v4()));
    CandidateStore::save(&*self.store, &candidate).await.unwrap();
    let mut question = Question::new("Seed question?", question_type, Difficulty::Medium);
    if let Some(ideal) = ideal_answer {
      question = question.with_ideal_answer(ideal);
    }
    QuestionStore::save(&*self.store, &question).await.unwrap();
    let mut interview = Interview::new(candidate.id, Uuid::new_v4());
    interview
      .mark_ready(vec![question.id], PlanMetadata::new(1, "seeded"))
      .unwrap();
    InterviewStore::save(&*self.store, &interview).await.unwrap();
    (interview, question)
  }

  async fn open(&self, interview_id: Uuid) -> mpsc::Receiver<OutboundMessage> {
    let (tx, rx) = mpsc::channel(64);
    self.registry.open(interview_id, tx).await.unwrap();
    rx
  }

  async fn interview(&self, id: Uuid) -> Interview {
    InterviewStore::get(&*self.store, id).await.unwrap().unwrap()
  }
}

async fn next_message(rx: &mut mpsc::Receiver<OutboundMessage>) -> OutboundMessage {
  tokio::time::timeout(Duration::from_secs(5), rx.recv())
    .await
    .expect("timed out waiting for an outbound message")
    .expect("outbound channel closed early")
}

fn raw(score: f64) -> RawEvaluation {
  RawEvaluation {
    score,
    completeness: 0.7,
    relevance: 0.9,
    sentiment: Some("confident".to_string()),
    reasoning: format!("scored {score}"),
    strengths: vec!["clear".to_string()],
    weaknesses: vec![],
    improvement_suggestions: vec![],
  }
}

fn confirmed_gaps(concepts: &[&str]) -> GapReport {
  GapReport {
    concepts: concepts.iter().map(|c| c.to_string()).collect(),
    confirmed: true,
    severity: GapSeverity::Major,
  }
}

fn expect_question(message: OutboundMessage) -> (Uuid, usize, usize) {
  match message {
    OutboundMessage::Question {
      question_id,
      index,
      total,
      audio_payload,
      ..
    } => {
      assert!(!audio_payload.is_empty());
      (question_id, index, total)
    }
    other => panic!("expected question, got {}", other.kind()),
  }
}

fn expect_follow_up(message: OutboundMessage) -> (Uuid, Uuid, u8) {
  match message {
    OutboundMessage::FollowUpQuestion {
      question_id,
      parent_question_id,
      order_in_sequence,
      ..
    } => (question_id, parent_question_id, order_in_sequence),
    other => panic!("expected follow_up_question, got {}", other.kind()),
  }
}

fn expect_evaluation(message: OutboundMessage) -> (f64, Option<f64>, usize) {
  match message {
    OutboundMessage::Evaluation {
      score,
      similarity_score,
      gaps,
      ..
    } => (score, similarity_score, gaps.len()),
    other => panic!("expected evaluation, got {}", other.kind()),
  }
}

fn expect_complete(message: OutboundMessage) -> (Uuid, f64, usize) {
  match message {
    OutboundMessage::InterviewComplete {
      interview_id,
      overall_score,
      total_questions,
      ..
    } => (interview_id, overall_score, total_questions),
    other => panic!("expected interview_complete, got {}", other.kind()),
  }
}

fn expect_error(message: OutboundMessage) -> String {
  match message {
    OutboundMessage::Error { code, .. } => code,
    other => panic!("expected error, got {}", other.kind()),
  }
}

fn answer(question_id: Uuid, text: &str) -> InboundEvent {
  InboundEvent::TextAnswer {
    question_id,
    answer_text: text.to_string(),
  }
}

// S1 - happy path, two planned questions, no follow-ups.
#[tokio::test]
async fn s1_happy_path_without_follow_ups() {
  let h = harness(
    MockLanguageModel::new().with_evaluations([raw(85.0), raw(90.0)]),
    MockEmbeddings::new().with_similarities([0.85, 0.90]),
  );
  let interview = h.plan(&["Python", "FastAPI"]).await;
  assert_eq!(interview.status, InterviewStatus::Idle);
  assert_eq!(interview.question_ids.len(), 2);

  let mut rx = h.open(interview.id).await;
  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (q1, index, total) = expect_question(next_message(&mut rx).await);
  assert_eq!((index, total), (0, 2));

  h.registry
    .dispatch(interview.id, answer(q1, "A thorough first answer."))
    .await
    .unwrap();
  let (score, similarity, gap_count) = expect_evaluation(next_message(&mut rx).await);
  assert_eq!(score, 85.0);
  assert_eq!(similarity, Some(0.85));
  assert_eq!(gap_count, 0);
  let (q2, index, total) = expect_question(next_message(&mut rx).await);
  assert_eq!((index, total), (1, 2));
  assert_ne!(q1, q2);

  h.registry
    .dispatch(interview.id, answer(q2, "A thorough second answer."))
    .await
    .unwrap();
  let (score, similarity, _) = expect_evaluation(next_message(&mut rx).await);
  assert_eq!(score, 90.0);
  assert_eq!(similarity, Some(0.90));
  let (completed_id, overall, total_questions) = expect_complete(next_message(&mut rx).await);
  assert_eq!(completed_id, interview.id);
  // 0.7 * (85 + 90) / 2 + 0.3 * 50 (text answers default the speaking score).
  assert_eq!(overall, 76.25);
  assert_eq!(total_questions, 2);

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Complete);
  assert_eq!(stored.current_question_index, stored.question_ids.len());
  assert!(stored.completed_at.is_some());
  let summary = stored
    .plan_metadata
    .as_ref()
    .and_then(|m| m.completion_summary.as_ref())
    .expect("completion summary cached on the interview");
  assert_eq!(summary.overall_score, 76.25);
  assert_eq!(summary.theoretical_score_avg, 87.5);
  assert_eq!(summary.speaking_score_avg, 50.0);

  // Read-back is idempotent and serves the cached report.
  let summarizer = h.summarizer();
  let first = summarizer.summarize(interview.id).await.unwrap();
  let second = summarizer.summarize(interview.id).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(&first, summary);

  // The session is finished; further events have nowhere to go.
  h.registry.close(interview.id).await;
  let err = h
    .registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap_err();
  assert!(matches!(err, EngineError::NotFound { .. }));
}

// S2 - one follow-up, then advance to the next main question.
#[tokio::test]
async fn s2_single_follow_up_then_advance() {
  let h = harness(
    MockLanguageModel::new()
      .with_evaluations([raw(45.0), raw(85.0), raw(88.0)])
      .with_gap_reports([confirmed_gaps(&["base case", "call stack"])]),
    MockEmbeddings::new().with_similarities([0.45, 0.85, 0.90]),
  );
  let interview = h.plan(&["Python", "FastAPI"]).await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (q1, ..) = expect_question(next_message(&mut rx).await);

  h.registry
    .dispatch(interview.id, answer(q1, "It calls itself."))
    .await
    .unwrap();
  let (score, similarity, gap_count) = expect_evaluation(next_message(&mut rx).await);
  assert_eq!(score, 45.0);
  assert_eq!(similarity, Some(0.45));
  assert_eq!(gap_count, 2);
  let (fu1, parent, order) = expect_follow_up(next_message(&mut rx).await);
  assert_eq!(parent, q1);
  assert_eq!(order, 1);

  h.registry
    .dispatch(
      interview.id,
      answer(fu1, "A much better answer covering everything asked."),
    )
    .await
    .unwrap();
  let (score, similarity, _) = expect_evaluation(next_message(&mut rx).await);
  // Second attempt carries the -5 penalty.
  assert_eq!(score, 80.0);
  assert_eq!(similarity, Some(0.85));
  let (q2, index, _) = expect_question(next_message(&mut rx).await);
  assert_eq!(index, 1);
  assert_ne!(q2, q1);

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Questioning);
  assert_eq!(stored.adaptive_follow_ups.len(), 1);
  assert_eq!(stored.answer_ids.len(), 2);

  // The follow-up answer covered both concepts, so the main evaluation's
  // gaps were resolved forward.
  let main_answer = AnswerStore::get_by_question_id(&*h.store, q1)
    .await
    .unwrap()
    .unwrap();
  let main_eval = EvaluationStore::get_by_answer_id(&*h.store, main_answer.id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(main_eval.gaps.len(), 2);
  assert!(main_eval.gaps.iter().all(|gap| gap.resolved));
}

// S3 - three follow-ups exhausted, then the session advances anyway.
#[tokio::test]
async fn s3_max_follow_ups_exhausted() {
  let h = harness(
    MockLanguageModel::new()
      .with_evaluations([raw(40.0), raw(50.0), raw(55.0), raw(60.0), raw(90.0)])
      .with_gap_reports([
        confirmed_gaps(&["indexes", "query planner"]),
        confirmed_gaps(&["indexes"]),
        confirmed_gaps(&["indexes"]),
        confirmed_gaps(&["indexes"]),
      ]),
    MockEmbeddings::new().with_similarities([0.40, 0.50, 0.55, 0.60, 0.90]),
  );
  let interview = h.plan(&["SQL", "Postgres"]).await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (q1, ..) = expect_question(next_message(&mut rx).await);

  let mut current = q1;
  for expected_order in 1u8..=3 {
    h.registry
      .dispatch(interview.id, answer(current, "Still a thin answer."))
      .await
      .unwrap();
    let _evaluation = expect_evaluation(next_message(&mut rx).await);
    let (fu, parent, order) = expect_follow_up(next_message(&mut rx).await);
    assert_eq!(parent, q1);
    assert_eq!(order, expected_order);
    current = fu;
  }

  // Fourth answer of the thread: cap reached, so the session moves on.
  h.registry
    .dispatch(interview.id, answer(current, "Final thin answer."))
    .await
    .unwrap();
  let (score, ..) = expect_evaluation(next_message(&mut rx).await);
  // Attempt number clamps at 3: raw 60 - 15.
  assert_eq!(score, 45.0);
  let (q2, index, _) = expect_question(next_message(&mut rx).await);
  assert_eq!(index, 1);
  assert_ne!(q2, q1);

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.adaptive_follow_ups.len(), 3);
  let follow_ups = intervo_core::ports::FollowUpStore::get_by_parent_question_id(&*h.store, q1)
    .await
    .unwrap();
  let orders: Vec<u8> = follow_ups.iter().map(|f| f.order_in_sequence).collect();
  assert_eq!(orders, vec![1, 2, 3]);
}

// S4 - behavioral question with no ideal answer: no similarity, no gaps.
#[tokio::test]
async fn s4_behavioral_question_skips_similarity() {
  let h = harness(MockLanguageModel::new(), MockEmbeddings::new());
  let (interview, question) = h
    .seed_single_question(QuestionType::Behavioral, None)
    .await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (qid, ..) = expect_question(next_message(&mut rx).await);
  assert_eq!(qid, question.id);

  h.registry
    .dispatch(
      interview.id,
      answer(qid, "I talked it through with the teammate and we agreed."),
    )
    .await
    .unwrap();
  let (_, similarity, gap_count) = expect_evaluation(next_message(&mut rx).await);
  assert_eq!(similarity, None);
  assert_eq!(gap_count, 0);
  expect_complete(next_message(&mut rx).await);

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Complete);
}

// S5 - an answer in Idle is rejected without mutating anything.
#[tokio::test]
async fn s5_answer_in_idle_is_rejected() {
  let h = harness(
    MockLanguageModel::new(),
    MockEmbeddings::new().with_default_similarity(0.9),
  );
  let interview = h.plan(&["Python"]).await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, answer(Uuid::new_v4(), "eager answer"))
    .await
    .unwrap();
  let code = expect_error(next_message(&mut rx).await);
  assert_eq!(code, "INVALID_STATE");

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Idle);
  assert!(AnswerStore::get_by_interview_id(&*h.store, interview.id)
    .await
    .unwrap()
    .is_empty());

  // The session is still usable.
  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  expect_question(next_message(&mut rx).await);
}

// S6 - a mid-plan LLM failure rolls back the questions it created.
#[tokio::test]
async fn s6_planner_rolls_back_on_generation_failure() {
  let h = harness(
    MockLanguageModel::new().fail_ideal_answer_after(2),
    MockEmbeddings::new(),
  );
  let skills = ["Rust", "Tokio", "SQL", "Kafka", "Redis"];
  let (candidate, analysis) = h.seed_candidate(&skills).await;

  let err = h
    .planner()
    .plan(analysis.id, candidate.id)
    .await
    .unwrap_err();
  assert!(matches!(err, EngineError::Provider(_)));

  let interviews = InterviewStore::get_by_candidate_id(&*h.store, candidate.id)
    .await
    .unwrap();
  assert_eq!(interviews.len(), 1);
  assert_eq!(interviews[0].status, InterviewStatus::Planning);
  assert!(interviews[0].question_ids.is_empty());

  // The two questions persisted before the failure were deleted.
  for skill in ["Rust", "Tokio"] {
    let remaining = QuestionStore::find_by_skill(&*h.store, skill, Difficulty::Easy)
      .await
      .unwrap();
    assert!(remaining.is_empty(), "question for {skill} survived rollback");
  }
}

// Similarity of exactly 0.8 is "good enough": the threshold is >=.
#[tokio::test]
async fn similarity_exactly_at_threshold_does_not_probe() {
  let h = harness(
    MockLanguageModel::new()
      .with_evaluations([raw(70.0)])
      .with_gap_reports([confirmed_gaps(&["something"])]),
    MockEmbeddings::new().with_similarities([0.8]),
  );
  let (interview, _) = h
    .seed_single_question(
      QuestionType::Technical,
      Some("A reference answer with several significant concepts inside."),
    )
    .await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (qid, ..) = expect_question(next_message(&mut rx).await);
  h.registry
    .dispatch(interview.id, answer(qid, "short answer"))
    .await
    .unwrap();
  expect_evaluation(next_message(&mut rx).await);
  expect_complete(next_message(&mut rx).await);
}

// Cancellation is terminal: the interview cannot be resumed.
#[tokio::test]
async fn cancel_mid_session_is_terminal() {
  let h = harness(MockLanguageModel::new(), MockEmbeddings::new());
  let interview = h.plan(&["Python"]).await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  expect_question(next_message(&mut rx).await);
  assert_eq!(h.registry.active_sessions().await, 1);

  h.registry.cancel(interview.id).await.unwrap();
  h.registry.close(interview.id).await;
  assert_eq!(h.registry.active_sessions().await, 0);

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Cancelled);
  assert!(stored.completed_at.is_some());

  let err = h
    .registry
    .open(interview.id, mpsc::channel(8).0)
    .await
    .unwrap_err();
  assert!(matches!(err, EngineError::InvalidInput { .. }));
}

// Voice answers flow through STT and carry voice metrics into the summary.
#[tokio::test]
async fn voice_answer_carries_metrics_into_summary() {
  let h = harness(
    MockLanguageModel::new().with_evaluations([raw(80.0)]),
    MockEmbeddings::new().with_default_similarity(0.9),
  );
  let (interview, question) = h
    .seed_single_question(
      QuestionType::Technical,
      Some("A reference answer with several significant concepts inside."),
    )
    .await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (qid, ..) = expect_question(next_message(&mut rx).await);
  assert_eq!(qid, question.id);

  let chunk = BASE64.encode(vec![7u8; 16_000]);
  h.registry
    .dispatch(
      interview.id,
      InboundEvent::AudioChunk {
        question_id: qid,
        audio_b64: chunk.clone(),
        is_final: false,
      },
    )
    .await
    .unwrap();
  h.registry
    .dispatch(
      interview.id,
      InboundEvent::AudioChunk {
        question_id: qid,
        audio_b64: chunk,
        is_final: true,
      },
    )
    .await
    .unwrap();

  expect_evaluation(next_message(&mut rx).await);
  expect_complete(next_message(&mut rx).await);

  let answers = AnswerStore::get_by_interview_id(&*h.store, interview.id)
    .await
    .unwrap();
  assert_eq!(answers.len(), 1);
  assert!(answers[0].is_voice);
  assert!(answers[0].voice_metrics.is_some());
  assert!(answers[0].duration_seconds.unwrap() > 0.0);

  let stored = h.interview(interview.id).await;
  let summary = stored
    .plan_metadata
    .unwrap()
    .completion_summary
    .expect("summary cached");
  // Mock metrics always grade above the text-answer default of 50.
  assert!(summary.speaking_score_avg > 50.0);
}

// Malformed base64 audio is invalid input, not a crash.
#[tokio::test]
async fn malformed_audio_payload_is_invalid_input() {
  let h = harness(MockLanguageModel::new(), MockEmbeddings::new());
  let interview = h.plan(&["Python"]).await;
  let mut rx = h.open(interview.id).await;

  h.registry
    .dispatch(interview.id, InboundEvent::GetNextQuestion)
    .await
    .unwrap();
  let (qid, ..) = expect_question(next_message(&mut rx).await);

  h.registry
    .dispatch(
      interview.id,
      InboundEvent::AudioChunk {
        question_id: qid,
        audio_b64: "&&& not base64 &&&".to_string(),
        is_final: true,
      },
    )
    .await
    .unwrap();
  let code = expect_error(next_message(&mut rx).await);
  assert_eq!(code, "INVALID_INPUT");

  let stored = h.interview(interview.id).await;
  assert_eq!(stored.status, InterviewStatus::Questioning);
}

// Planner boundaries: zero skills plan as "general", many skills cap at 5.
#[tokio::test]
async fn planner_boundary_skill_counts() {
  let h = harness(MockLanguageModel::new(), MockEmbeddings::new());

  let no_skills = h.plan(&[]).await;
  assert_eq!(no_skills.question_ids.len(), 2);
  let first = QuestionStore::get(&*h.store, no_skills.question_ids[0])
    .await
    .unwrap()
    .unwrap();
  assert_eq!(first.skills, vec!["general"]);
  assert!(first.is_planned());

  let many: Vec<String> = (0..20).map(|i| format!("skill-{i}")).collect();
  let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
  let capped = h.plan(&many_refs).await;
  assert_eq!(capped.question_ids.len(), 5);
}

// Planning by candidate resolves the latest CV analysis.
#[tokio::test]
async fn plan_for_candidate_uses_latest_analysis() {
  let h = harness(MockLanguageModel::new(), MockEmbeddings::new());
  let candidate = Candidate::new("Ada Lovelace", "ada@example.com");
  CandidateStore::save(&*h.store, &candidate).await.unwrap();

  let mut older = CvAnalysis::new(candidate.id, "old cv").with_skills(["Python"]);
  older.created_at = older.created_at - chrono::Duration::hours(2);
  CvAnalysisStore::save(&*h.store, &older).await.unwrap();
  let newer =
    CvAnalysis::new(candidate.id, "new cv").with_skills(["Rust", "Tokio", "SQL", "Kafka", "Redis"]);
  CvAnalysisStore::save(&*h.store, &newer).await.unwrap();

  let interview = h.planner().plan_for_candidate(candidate.id).await.unwrap();
  assert_eq!(interview.cv_analysis_id, newer.id);
  // Five skills plan four questions, not the two the older analysis implies.
  assert_eq!(interview.question_ids.len(), 4);
}
