//! Session management - one conversation per user request

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::channel::TurnStream;
use crate::error::SquadError;
use crate::orchestrator::{Orchestrator, Outcome};
use crate::transcript::{Transcript, Turn};

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a session as seen by the UI layer.
///
/// `Complete`, `Aborted`, and `Failed` are deliberately distinct: the
/// caller must be able to tell "document finished" from "gave up at the
/// iteration ceiling" from "hard failure mid-conversation".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Created, not yet running
    Idle,
    Running,
    /// The completion judgment accepted the document
    Complete,
    /// Iteration ceiling reached or cancelled by the caller
    Aborted,
    /// Hard failure; the partial transcript is retained
    Failed,
}

struct SessionState {
    status: RwLock<SessionStatus>,
    /// Canonical transcript - full history, never truncated
    transcript: RwLock<Transcript>,
    failure: RwLock<Option<Arc<SquadError>>>,
    /// Consumer turn feed, claimed at most once
    stream: Mutex<Option<TurnStream>>,
    cancel: CancellationToken,
}

/// Handle to a running or finished session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    state: Arc<SessionState>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        *self.state.status.read()
    }

    /// The canonical transcript so far
    pub fn transcript(&self) -> Transcript {
        self.state.transcript.read().clone()
    }

    /// The error that failed the session, if any
    pub fn failure(&self) -> Option<Arc<SquadError>> {
        self.state.failure.read().clone()
    }

    /// Claim the turn stream. Yields `None` after the first call - the
    /// stream is finite and not restartable.
    pub fn take_stream(&self) -> Option<TurnStream> {
        self.state.stream.lock().take()
    }

    /// Request cooperative cancellation. Honored at the next turn
    /// boundary; an in-flight contribution runs to its timeout and its
    /// result is discarded.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }
}

/// Owns all sessions and runs each one on its own task.
///
/// Sessions are independent; the only shared state is the read-only agent
/// registry inside the orchestrator.
pub struct SessionManager {
    orchestrator: Arc<Orchestrator>,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionManager {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session for a user request.
    ///
    /// The conversation runs on its own task; use [`stream_turns`] to
    /// follow it live and [`status`] to poll for the terminal state.
    ///
    /// [`stream_turns`]: SessionManager::stream_turns
    /// [`status`]: SessionManager::status
    pub fn start_session(&self, request: impl Into<String>) -> SessionId {
        let request = request.into();
        let id = SessionId::new();
        let (consumer_tx, stream) = TurnStream::new();

        let state = Arc::new(SessionState {
            status: RwLock::new(SessionStatus::Idle),
            transcript: RwLock::new(Transcript::new()),
            failure: RwLock::new(None),
            stream: Mutex::new(Some(stream)),
            cancel: CancellationToken::new(),
        });
        let handle = SessionHandle {
            id,
            state: Arc::clone(&state),
        };
        self.sessions.write().insert(id, handle);

        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            *state.status.write() = SessionStatus::Running;
            info!(session_id = %id, "Session started");

            // The orchestrator emits turns on an internal channel; the
            // forwarder appends each to the canonical transcript and then
            // relays it to the consumer stream.
            let (inner_tx, mut inner_rx) = mpsc::unbounded_channel::<Turn>();
            let forwarder = tokio::spawn({
                let state = Arc::clone(&state);
                async move {
                    while let Some(turn) = inner_rx.recv().await {
                        state.transcript.write().push(turn.clone());
                        let _ = consumer_tx.send(turn);
                    }
                }
            });

            let result = orchestrator.run(&request, inner_tx, state.cancel.clone()).await;
            // Sender dropped inside run; wait for the forwarder to drain so
            // the transcript is canonical before the terminal status lands.
            let _ = forwarder.await;

            match result {
                Ok((_, Outcome::Complete)) => {
                    *state.status.write() = SessionStatus::Complete;
                    info!(session_id = %id, "Session complete");
                }
                Ok((_, Outcome::Aborted)) => {
                    *state.status.write() = SessionStatus::Aborted;
                    info!(session_id = %id, "Session aborted");
                }
                Err(err) => {
                    error!(session_id = %id, error = %err, "Session failed");
                    *state.failure.write() = Some(Arc::new(err));
                    *state.status.write() = SessionStatus::Failed;
                }
            }
        });

        id
    }

    /// Claim the finite stream of turns for a session. Fails with
    /// `StreamConsumed` on a second call - a new request needs a new
    /// session.
    pub fn stream_turns(&self, id: SessionId) -> Result<TurnStream, SquadError> {
        let handle = self.get(id)?;
        handle
            .take_stream()
            .ok_or(SquadError::StreamConsumed(id))
    }

    pub fn status(&self, id: SessionId) -> Result<SessionStatus, SquadError> {
        Ok(self.get(id)?.status())
    }

    /// The canonical transcript of a session so far
    pub fn transcript(&self, id: SessionId) -> Result<Transcript, SquadError> {
        Ok(self.get(id)?.transcript())
    }

    /// The error that failed a session, if any
    pub fn failure(&self, id: SessionId) -> Result<Option<Arc<SquadError>>, SquadError> {
        Ok(self.get(id)?.failure())
    }

    /// Request cooperative cancellation of a session
    pub fn cancel(&self, id: SessionId) -> Result<(), SquadError> {
        self.get(id)?.cancel();
        Ok(())
    }

    pub fn get(&self, id: SessionId) -> Result<SessionHandle, SquadError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SquadError::SessionNotFound(id))
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentRole, Contributor};
    use crate::history::HistoryReducer;
    use crate::registry::AgentRegistry;
    use crate::selection::{SelectionPolicy, SpeakerJudge};
    use crate::termination::{CompletionJudge, TerminationPolicy};
    use crate::transcript::{AgentId, ContextWindow, Turn};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Canned(&'static str);

    #[async_trait]
    impl Contributor for Canned {
        async fn produce(&self, _context: &ContextWindow) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl Contributor for Failing {
        async fn produce(&self, _context: &ContextWindow) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("transport error"))
        }
    }

    struct Alternator;

    #[async_trait]
    impl SpeakerJudge for Alternator {
        async fn pick(
            &self,
            latest: &Turn,
            _registry: &AgentRegistry,
        ) -> anyhow::Result<Vec<AgentId>> {
            let next = if latest.speaker.as_str() == "SolutionArch" {
                "TechArch"
            } else {
                "SolutionArch"
            };
            Ok(vec![AgentId::from(next)])
        }
    }

    struct CompleteOn(&'static str);

    #[async_trait]
    impl CompletionJudge for CompleteOn {
        async fn is_complete(&self, latest: &Turn) -> anyhow::Result<bool> {
            Ok(latest.content.contains(self.0))
        }
    }

    fn manager(second: Arc<dyn Contributor>, max_iterations: usize) -> SessionManager {
        let mut registry = AgentRegistry::new();
        registry
            .register(Agent::new(
                "SolutionArch",
                AgentRole::SolutionArchitect,
                Arc::new(Canned("high-level design")),
            ))
            .unwrap();
        registry
            .register(Agent::new("TechArch", AgentRole::TechnicalArchitect, second))
            .unwrap();

        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            SelectionPolicy::new("SolutionArch", Arc::new(Alternator)),
            TerminationPolicy::new(max_iterations, Arc::new(CompleteOn("final document"))),
            HistoryReducer::new(10),
        );
        SessionManager::new(orchestrator)
    }

    async fn wait_terminal(manager: &SessionManager, id: SessionId) -> SessionStatus {
        for _ in 0..200 {
            let status = manager.status(id).unwrap();
            if !matches!(status, SessionStatus::Idle | SessionStatus::Running) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never reached a terminal state");
    }

    #[tokio::test]
    async fn test_session_streams_turns_and_completes() {
        let manager = manager(Arc::new(Canned("final document")), 20);
        let id = manager.start_session("design a web shop");

        let turns = manager.stream_turns(id).unwrap().collect().await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker.as_str(), "SolutionArch");
        assert_eq!(turns[1].speaker.as_str(), "TechArch");

        assert_eq!(wait_terminal(&manager, id).await, SessionStatus::Complete);
        assert_eq!(manager.transcript(id).unwrap().len(), 2);
        assert!(manager.failure(id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_is_one_shot() {
        let manager = manager(Arc::new(Canned("final document")), 20);
        let id = manager.start_session("design a web shop");

        let _stream = manager.stream_turns(id).unwrap();
        assert!(matches!(
            manager.stream_turns(id).unwrap_err(),
            SquadError::StreamConsumed(_)
        ));
    }

    #[tokio::test]
    async fn test_ceiling_yields_aborted_status() {
        let manager = manager(Arc::new(Canned("still drafting")), 3);
        let id = manager.start_session("design a web shop");

        assert_eq!(wait_terminal(&manager, id).await, SessionStatus::Aborted);
        assert_eq!(manager.transcript(id).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_turn_yields_failed_status_with_partial_transcript() {
        let manager = manager(Arc::new(Failing), 20);
        let id = manager.start_session("design a web shop");

        assert_eq!(wait_terminal(&manager, id).await, SessionStatus::Failed);

        let transcript = manager.transcript(id).unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().speaker.as_str(), "SolutionArch");

        let failure = manager.failure(id).unwrap().expect("failure recorded");
        assert!(matches!(
            failure.as_ref(),
            SquadError::TurnFailed { agent, .. } if agent.as_str() == "TechArch"
        ));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let manager = manager(Arc::new(Canned("final document")), 20);
        let missing = SessionId::new();
        assert!(matches!(
            manager.status(missing).unwrap_err(),
            SquadError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let manager = manager(Arc::new(Canned("final document")), 20);
        let first = manager.start_session("a web shop");
        let second = manager.start_session("a data platform");
        assert_ne!(first, second);

        assert_eq!(wait_terminal(&manager, first).await, SessionStatus::Complete);
        assert_eq!(wait_terminal(&manager, second).await, SessionStatus::Complete);
        assert_eq!(manager.session_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_marks_session_aborted() {
        // A contributor that parks until cancellation is requested, so the
        // cancel lands deterministically while the session is mid-turn.
        struct Parked(CancellationToken);

        #[async_trait]
        impl Contributor for Parked {
            async fn produce(&self, _context: &ContextWindow) -> anyhow::Result<String> {
                self.0.cancelled().await;
                Ok("late".to_string())
            }
        }

        let gate = CancellationToken::new();
        let mut registry = AgentRegistry::new();
        registry
            .register(Agent::new(
                "SolutionArch",
                AgentRole::SolutionArchitect,
                Arc::new(Parked(gate.clone())),
            ))
            .unwrap();
        registry
            .register(Agent::new(
                "TechArch",
                AgentRole::TechnicalArchitect,
                Arc::new(Canned("review")),
            ))
            .unwrap();

        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            SelectionPolicy::new("SolutionArch", Arc::new(Alternator)),
            TerminationPolicy::new(20, Arc::new(CompleteOn("never"))),
            HistoryReducer::new(10),
        );
        let manager = SessionManager::new(orchestrator);

        let id = manager.start_session("design a web shop");
        manager.cancel(id).unwrap();
        gate.cancel();

        assert_eq!(wait_terminal(&manager, id).await, SessionStatus::Aborted);
    }
}
