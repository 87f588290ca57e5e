//! The default architecture squad roster

use std::sync::Arc;

use crate::agent::{Agent, AgentRole, Contributor, Platform};
use crate::error::SquadError;
use crate::registry::AgentRegistry;

/// Canonical agent names used by the scripted collaboration flow
pub mod names {
    pub const PLATFORM_SELECTOR: &str = "Platform_Selector";
    pub const SOLUTION_ARCHITECT: &str = "Solution_Architect";
    pub const AZURE_SOLUTION_ARCHITECT: &str = "Azure_Solution_Architect";
    pub const AWS_SOLUTION_ARCHITECT: &str = "AWS_Solution_Architect";
    pub const KUBERNETES_SOLUTION_ARCHITECT: &str = "Kubernetes_Solution_Architect";
    pub const TECHNICAL_ARCHITECT: &str = "Technical_Architect";
    pub const SECURITY_ARCHITECT: &str = "Security_Architect";
    pub const DATA_ARCHITECT: &str = "Data_Architect";
    pub const DOCUMENTATION_SPECIALIST: &str = "Documentation_Specialist";
}

/// Name and role of every squad persona, in speaking-flow order
pub const ROSTER: [(&str, AgentRole); 9] = [
    (names::PLATFORM_SELECTOR, AgentRole::SolutionArchitect),
    (names::SOLUTION_ARCHITECT, AgentRole::SolutionArchitect),
    (
        names::AZURE_SOLUTION_ARCHITECT,
        AgentRole::PlatformSpecialist(Platform::Azure),
    ),
    (
        names::AWS_SOLUTION_ARCHITECT,
        AgentRole::PlatformSpecialist(Platform::Aws),
    ),
    (
        names::KUBERNETES_SOLUTION_ARCHITECT,
        AgentRole::PlatformSpecialist(Platform::Kubernetes),
    ),
    (names::TECHNICAL_ARCHITECT, AgentRole::TechnicalArchitect),
    (names::SECURITY_ARCHITECT, AgentRole::SecurityArchitect),
    (names::DATA_ARCHITECT, AgentRole::DataArchitect),
    (
        names::DOCUMENTATION_SPECIALIST,
        AgentRole::DocumentationSpecialist,
    ),
];

/// Build the full squad registry, creating one contributor per persona via
/// the supplied factory (typically a closure over an LLM client).
pub fn architecture_squad<F>(mut contributor_for: F) -> Result<AgentRegistry, SquadError>
where
    F: FnMut(&str, AgentRole) -> Arc<dyn Contributor>,
{
    let mut registry = AgentRegistry::new();
    for (name, role) in ROSTER {
        registry.register(Agent::new(name, role, contributor_for(name, role)))?;
    }
    Ok(registry)
}
