//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SquadError;
use crate::registry::AgentRegistry;
use crate::squad::names;
use crate::transcript::AgentId;

/// Tunables for a collaboration session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    /// Hard ceiling on turns per session
    pub max_iterations: usize,
    /// Recency window fed to agents and judgment calls
    pub history_limit: usize,
    /// Who opens the conversation
    pub initial_agent: AgentId,
    /// Per-contribution timeout, seconds
    pub turn_timeout_secs: u64,
    /// Per-tool-call timeout, seconds
    pub tool_timeout_secs: u64,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            history_limit: 10,
            initial_agent: AgentId::from(names::PLATFORM_SELECTOR),
            turn_timeout_secs: 120,
            tool_timeout_secs: 30,
        }
    }
}

impl SquadConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Setup-time validation. Errors here abort startup rather than
    /// surfacing mid-session.
    pub fn validate(&self, registry: &AgentRegistry) -> Result<(), SquadError> {
        if self.max_iterations < 1 {
            return Err(SquadError::Config(
                "max_iterations must be at least 1".into(),
            ));
        }
        if !registry.contains(&self.initial_agent) {
            return Err(SquadError::Config(format!(
                "initial agent `{}` is not registered",
                self.initial_agent
            )));
        }
        Ok(())
    }
}
