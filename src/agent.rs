//! Agent implementation - a named participant that produces contributions

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transcript::{AgentId, ContextWindow};

/// Cloud platform covered by a certified specialist architect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Azure,
    Aws,
    Kubernetes,
}

/// Role of an agent in the squad. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// High-level system design, patterns, and requirement routing
    SolutionArchitect,
    /// Platform-certified solution architect
    PlatformSpecialist(Platform),
    /// Detailed technical specifications
    TechnicalArchitect,
    /// Security design and compliance
    SecurityArchitect,
    /// Data strategy and storage design
    DataArchitect,
    /// Assembles the final architecture document
    DocumentationSpecialist,
}

/// Capability to produce a text contribution given conversation context.
///
/// Implementations wrap an LLM backend or a scripted persona; the core
/// treats them as opaque and only distinguishes success from transport
/// failure.
#[async_trait]
pub trait Contributor: Send + Sync {
    async fn produce(&self, context: &ContextWindow) -> anyhow::Result<String>;
}

/// A single squad participant.
///
/// Created once at setup, immutable for the life of the process.
#[derive(Clone)]
pub struct Agent {
    id: AgentId,
    role: AgentRole,
    contributor: Arc<dyn Contributor>,
}

impl Agent {
    pub fn new(
        name: impl Into<AgentId>,
        role: AgentRole,
        contributor: Arc<dyn Contributor>,
    ) -> Self {
        Self {
            id: name.into(),
            role,
            contributor,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Ask the agent for its next contribution
    pub async fn produce(&self, context: &ContextWindow) -> anyhow::Result<String> {
        self.contributor.produce(context).await
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
