//! Turn orchestrator - drives the collaboration loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::SquadConfig;
use crate::error::SquadError;
use crate::history::HistoryReducer;
use crate::registry::AgentRegistry;
use crate::selection::{SelectionPolicy, SpeakerJudge};
use crate::termination::{CompletionJudge, TerminationPolicy, Verdict};
use crate::tools::{ToolBridge, ToolInvocation, ToolResult};
use crate::transcript::{ContextWindow, Transcript, Turn};

const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Loop phase, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingAgent,
    Evaluating,
    Complete,
    Aborted,
}

fn enter(phase: Phase) {
    debug!(?phase, "Phase transition");
}

/// Terminal outcome of a session run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The completion judgment accepted the document
    Complete,
    /// The iteration ceiling was hit, or the caller cancelled
    Aborted,
}

/// Drives one conversation: select a speaker, collect its contribution,
/// splice in tool results, and repeat until the termination policy stops
/// the loop.
///
/// Turns are strictly sequential within a session; the loop suspends only
/// at the agent contribution call and the tool bridge call.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    selection: SelectionPolicy,
    termination: TerminationPolicy,
    reducer: HistoryReducer,
    tools: Option<Arc<dyn ToolBridge>>,
    turn_timeout: Duration,
    tool_timeout: Duration,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("turn_timeout", &self.turn_timeout)
            .field("tool_timeout", &self.tool_timeout)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        selection: SelectionPolicy,
        termination: TerminationPolicy,
        reducer: HistoryReducer,
    ) -> Self {
        Self {
            registry,
            selection,
            termination,
            reducer,
            tools: None,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Assemble an orchestrator from configuration and pluggable judges.
    /// Validates the configuration against the registry up front, so a bad
    /// setup fails at startup instead of mid-session.
    pub fn from_config(
        registry: Arc<AgentRegistry>,
        config: &SquadConfig,
        speaker_judge: Arc<dyn SpeakerJudge>,
        completion_judge: Arc<dyn CompletionJudge>,
    ) -> Result<Self, SquadError> {
        config.validate(&registry)?;

        let selection = SelectionPolicy::new(config.initial_agent.clone(), speaker_judge);
        let termination = TerminationPolicy::new(config.max_iterations, completion_judge);
        let reducer = HistoryReducer::new(config.history_limit);

        Ok(Self::new(registry, selection, termination, reducer)
            .with_turn_timeout(config.turn_timeout())
            .with_tool_timeout(config.tool_timeout()))
    }

    pub fn with_tools(mut self, bridge: Arc<dyn ToolBridge>) -> Self {
        self.tools = Some(bridge);
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Run one conversation to its terminal state.
    ///
    /// Each completed turn is emitted on `turns` as it lands; the channel
    /// closes when the loop stops. Cancellation is honored between turns
    /// only - an issued contribution call runs to its own timeout and its
    /// result is discarded.
    ///
    /// A failed contribution surfaces as [`SquadError::TurnFailed`] with
    /// the transcript so far; the failed call leaves no turn behind and
    /// does not advance the iteration count.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        request: &str,
        turns: mpsc::UnboundedSender<Turn>,
        cancel: CancellationToken,
    ) -> Result<(Transcript, Outcome), SquadError> {
        enter(Phase::Idle);
        let request: Arc<str> = Arc::from(request);
        let mut transcript = Transcript::new();
        let mut iterations = 0usize;

        // Empty transcript: yields the configured initial agent.
        let mut next = self.selection.select_next(&transcript, &self.registry).await?;
        enter(Phase::AwaitingAgent);

        loop {
            if cancel.is_cancelled() {
                info!(turns = transcript.len(), "Session cancelled between turns");
                enter(Phase::Aborted);
                return Ok((transcript, Outcome::Aborted));
            }

            let agent = self.registry.resolve(&next)?;
            let window = ContextWindow {
                request: Arc::clone(&request),
                recent: self.reducer.reduce(&transcript),
            };

            debug!(agent = %next, turn = transcript.len() + 1, "Requesting contribution");
            let content = match timeout(self.turn_timeout, agent.produce(&window)).await {
                Ok(Ok(content)) => content,
                Ok(Err(source)) => {
                    return Err(SquadError::TurnFailed {
                        agent: next,
                        source,
                        transcript,
                    });
                }
                Err(_) => {
                    return Err(SquadError::TurnFailed {
                        agent: next,
                        source: anyhow::anyhow!(
                            "contribution timed out after {:?}",
                            self.turn_timeout
                        ),
                        transcript,
                    });
                }
            };

            if cancel.is_cancelled() {
                info!(agent = %next, "Discarding in-flight contribution, session cancelled");
                enter(Phase::Aborted);
                return Ok((transcript, Outcome::Aborted));
            }

            let mut turn = Turn::new(next.clone(), content);
            if let Some(result) = self.try_tool_call(&turn.content).await {
                turn = turn.with_attachment(result);
            }

            transcript.push(turn.clone());
            iterations += 1;
            let _ = turns.send(turn);
            enter(Phase::Evaluating);

            match self.termination.should_stop(&transcript, iterations).await? {
                Verdict::Complete => {
                    info!(turns = transcript.len(), "Architecture document complete");
                    enter(Phase::Complete);
                    return Ok((transcript, Outcome::Complete));
                }
                Verdict::Aborted => {
                    warn!(
                        turns = transcript.len(),
                        max = self.termination.max_iterations(),
                        "Iteration ceiling reached, giving up"
                    );
                    enter(Phase::Aborted);
                    return Ok((transcript, Outcome::Aborted));
                }
                Verdict::Continue => {
                    next = self.selection.select_next(&transcript, &self.registry).await?;
                    enter(Phase::AwaitingAgent);
                }
            }
        }
    }

    /// Attempt the tool call requested by a contribution, if any.
    ///
    /// Failures degrade the turn - the text stands, the attachment is
    /// omitted - and never fail the session.
    async fn try_tool_call(&self, content: &str) -> Option<ToolResult> {
        let invocation = ToolInvocation::extract(content)?;
        let bridge = self.tools.as_ref()?;

        match timeout(
            self.tool_timeout,
            bridge.call_tool(&invocation.tool, invocation.arguments.clone()),
        )
        .await
        {
            Ok(Ok(result)) if result.success => Some(result),
            Ok(Ok(_)) => {
                warn!(tool = %invocation.tool, "Tool reported failure, omitting attachment");
                None
            }
            Ok(Err(error)) => {
                warn!(tool = %invocation.tool, %error, "Tool call failed, omitting attachment");
                None
            }
            Err(_) => {
                warn!(tool = %invocation.tool, "Tool call timed out, omitting attachment");
                None
            }
        }
    }
}
