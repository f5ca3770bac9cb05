use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::session::messages::{InboundEvent, OutboundMessage};
use crate::session::orchestrator::{SessionDeps, SessionOrchestrator};

struct SessionHandle {
  inbound: mpsc::Sender<InboundEvent>,
  task: JoinHandle<()>,
}

/// Maps interview id to the inbound channel of its session task. One
/// lightweight task per active interview owns all mutable session state;
/// external code communicates only by message, so the registry lock covers
/// nothing but the lookup itself.
pub struct SessionRegistry {
  deps: Arc<SessionDeps>,
  sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
  pub fn new(deps: Arc<SessionDeps>) -> Self {
    Self {
      deps,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  /// Open a session for `interview_id`, spawning its task. The interview
  /// must exist and carry a planned question list; outbound messages go to
  /// `outbound` in transition order.
  pub async fn open(
    &self,
    interview_id: Uuid,
    outbound: mpsc::Sender<OutboundMessage>,
  ) -> Result<()> {
    let mut sessions = self.sessions.lock().await;
    if let Some(handle) = sessions.get(&interview_id) {
      if !handle.inbound.is_closed() {
        return Err(EngineError::invalid_input(
          "a session is already open for this interview",
        ));
      }
      sessions.remove(&interview_id);
    }

    let interview = self
      .deps
      .interviews
      .get(interview_id)
      .await?
      .ok_or_else(|| EngineError::not_found("interview", interview_id))?;
    if interview.question_ids.is_empty() {
      return Err(EngineError::invalid_input(
        "interview has no planned questions",
      ));
    }
    if interview.status.is_terminal() {
      return Err(EngineError::invalid_input(format!(
        "interview is already {}",
        interview.status
      )));
    }

    let (tx, mut rx) = mpsc::channel(self.deps.config.inbound_queue_depth);
    let deps = self.deps.clone();
    let task = tokio::spawn(async move {
      let mut orchestrator = SessionOrchestrator::new(interview_id, deps, outbound);
      while let Some(event) = rx.recv().await {
        if !orchestrator.handle_event(event).await {
          break;
        }
      }
      // Terminal: drain whatever queued up behind the final transition.
      rx.close();
      while rx.try_recv().is_ok() {}
      debug!(%interview_id, "session task finished");
    });

    sessions.insert(interview_id, SessionHandle { inbound: tx, task });
    info!(%interview_id, "session opened");
    Ok(())
  }

  /// Queue one inbound event to the session task. Events are processed
  /// strictly FIFO per interview.
  pub async fn dispatch(&self, interview_id: Uuid, event: InboundEvent) -> Result<()> {
    let sender = {
      let sessions = self.sessions.lock().await;
      sessions
        .get(&interview_id)
        .map(|handle| handle.inbound.clone())
        .ok_or_else(|| EngineError::not_found("session", interview_id))?
    };
    if sender.send(event).await.is_err() {
      // The task ended; forget the stale handle.
      self.sessions.lock().await.remove(&interview_id);
      return Err(EngineError::not_found("session", interview_id));
    }
    Ok(())
  }

  pub async fn cancel(&self, interview_id: Uuid) -> Result<()> {
    self.dispatch(interview_id, InboundEvent::Cancel).await
  }

  /// Drop the inbound side and wait for the task to wind down.
  pub async fn close(&self, interview_id: Uuid) {
    let handle = self.sessions.lock().await.remove(&interview_id);
    if let Some(handle) = handle {
      drop(handle.inbound);
      let _ = handle.task.await;
      info!(%interview_id, "session closed");
    }
  }

  pub async fn active_sessions(&self) -> usize {
    let mut sessions = self.sessions.lock().await;
    sessions.retain(|_, handle| !handle.inbound.is_closed());
    sessions.len()
  }
}
