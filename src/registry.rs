//! Agent registry - the fixed roster of squad participants

use std::collections::HashMap;

use tracing::info;

use crate::agent::{Agent, AgentRole};
use crate::error::SquadError;
use crate::transcript::AgentId;

/// Catalogue of all registered agents.
///
/// Populated once at setup, then frozen behind an `Arc` and shared
/// read-only across sessions. There is no removal operation.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
    /// Registration order, for stable listings
    order: Vec<AgentId>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent under its unique name
    pub fn register(&mut self, agent: Agent) -> Result<(), SquadError> {
        let id = agent.id().clone();
        if self.agents.contains_key(&id) {
            return Err(SquadError::DuplicateName(id));
        }

        info!(agent = %id, role = ?agent.role(), "Registered agent");
        self.order.push(id.clone());
        self.agents.insert(id, agent);
        Ok(())
    }

    /// Look up an agent by name
    pub fn resolve(&self, name: &AgentId) -> Result<&Agent, SquadError> {
        self.agents
            .get(name)
            .ok_or_else(|| SquadError::UnknownAgent(name.clone()))
    }

    pub fn contains(&self, name: &AgentId) -> bool {
        self.agents.contains_key(name)
    }

    /// All agents carrying the given role, in registration order
    pub fn by_role(&self, role: AgentRole) -> Vec<&Agent> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .filter(|agent| agent.role() == role)
            .collect()
    }

    /// Agent names in registration order
    pub fn names(&self) -> impl Iterator<Item = &AgentId> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
