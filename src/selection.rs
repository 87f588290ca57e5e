//! Speaker selection - deciding which agent takes the next turn

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::AgentRole;
use crate::error::SquadError;
use crate::registry::AgentRegistry;
use crate::squad::names;
use crate::transcript::{AgentId, Transcript, Turn};

/// Judgment over the latest turn: who should speak next.
///
/// Returns candidate names; the selection policy accepts exactly one, and
/// it must be registered. Implementations may consult a model backend or
/// apply scripted rules.
#[async_trait]
pub trait SpeakerJudge: Send + Sync {
    async fn pick(&self, latest: &Turn, registry: &AgentRegistry) -> anyhow::Result<Vec<AgentId>>;
}

/// Per-turn speaker selection.
///
/// A state machine over agent identities: the state space is the closed set
/// of registered names, and the judge picks each transition from the latest
/// turn's content.
pub struct SelectionPolicy {
    initial: AgentId,
    judge: Arc<dyn SpeakerJudge>,
}

impl SelectionPolicy {
    pub fn new(initial: impl Into<AgentId>, judge: Arc<dyn SpeakerJudge>) -> Self {
        Self {
            initial: initial.into(),
            judge,
        }
    }

    pub fn initial_agent(&self) -> &AgentId {
        &self.initial
    }

    /// Pick the next speaker.
    ///
    /// An empty transcript always yields the configured starter. Otherwise
    /// the judge's answer is validated strictly: anything other than exactly
    /// one registered name is an `InvalidSelection`. There is deliberately
    /// no fallback to a default agent - that would mask a broken
    /// collaboration flow.
    pub async fn select_next(
        &self,
        transcript: &Transcript,
        registry: &AgentRegistry,
    ) -> Result<AgentId, SquadError> {
        let Some(latest) = transcript.last() else {
            debug!(agent = %self.initial, "Empty transcript, starting with initial agent");
            return Ok(self.initial.clone());
        };

        let candidates = self
            .judge
            .pick(latest, registry)
            .await
            .map_err(SquadError::Judgment)?;

        match candidates.as_slice() {
            [name] => {
                if !registry.contains(name) {
                    return Err(SquadError::InvalidSelection(format!(
                        "judge named unregistered agent `{name}`"
                    )));
                }
                debug!(from = %latest.speaker, to = %name, "Selected next speaker");
                Ok(name.clone())
            }
            [] => Err(SquadError::InvalidSelection(
                "judge returned no candidate".into(),
            )),
            many => Err(SquadError::InvalidSelection(format!(
                "judge returned {} candidates: {}",
                many.len(),
                many.iter()
                    .map(AgentId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Deterministic routing over the squad's collaboration flow.
///
/// Mirrors the review chain the squad follows: the platform selector routes
/// requirements to the recommended solution architect, then the draft moves
/// through technical, security, and data review before the documentation
/// specialist assembles the final document. If the specialist's draft is
/// judged incomplete, the flow loops back to the general solution architect
/// for another pass.
///
/// Expects the default roster of [`crate::squad::architecture_squad`]; with
/// a different roster, missing or ambiguous roles surface as
/// `InvalidSelection` through the policy's validation.
pub struct ScriptedFlow;

impl ScriptedFlow {
    /// Follow the platform selector's recommendation: the first registered
    /// agent name mentioned in its response. With no recommendation the
    /// general solution architect takes over.
    fn route_recommendation(latest: &Turn, registry: &AgentRegistry) -> Vec<AgentId> {
        let mut first: Option<(usize, AgentId)> = None;
        for name in registry.names() {
            if name == &latest.speaker {
                continue;
            }
            if let Some(pos) = latest.content.find(name.as_str()) {
                if first.as_ref().map_or(true, |(best, _)| pos < *best) {
                    first = Some((pos, name.clone()));
                }
            }
        }

        match first {
            Some((_, name)) => vec![name],
            None => vec![AgentId::from(names::SOLUTION_ARCHITECT)],
        }
    }
}

#[async_trait]
impl SpeakerJudge for ScriptedFlow {
    async fn pick(&self, latest: &Turn, registry: &AgentRegistry) -> anyhow::Result<Vec<AgentId>> {
        if latest.speaker.as_str() == names::PLATFORM_SELECTOR {
            return Ok(Self::route_recommendation(latest, registry));
        }

        let speaker = registry.resolve(&latest.speaker)?;
        let next_role = match speaker.role() {
            AgentRole::SolutionArchitect | AgentRole::PlatformSpecialist(_) => {
                AgentRole::TechnicalArchitect
            }
            AgentRole::TechnicalArchitect => AgentRole::SecurityArchitect,
            AgentRole::SecurityArchitect => AgentRole::DataArchitect,
            AgentRole::DataArchitect => AgentRole::DocumentationSpecialist,
            AgentRole::DocumentationSpecialist => AgentRole::SolutionArchitect,
        };

        // The selector only ever opens the conversation; keep it out of the
        // review chain even though it shares the solution-architect role.
        Ok(registry
            .by_role(next_role)
            .into_iter()
            .map(|agent| agent.id().clone())
            .filter(|id| id.as_str() != names::PLATFORM_SELECTOR)
            .collect())
    }
}
