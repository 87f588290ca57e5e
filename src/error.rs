//! Squad error types

use thiserror::Error;

use crate::session::SessionId;
use crate::transcript::{AgentId, Transcript};

/// Errors that can occur in the squad system
#[derive(Debug, Error)]
pub enum SquadError {
    /// An agent was registered under a name that is already taken
    #[error("duplicate agent name: {0}")]
    DuplicateName(AgentId),

    /// Lookup of an unregistered agent
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The speaker judgment named zero, several, or an unregistered agent.
    /// Never silently substituted - a bad selection means the collaboration
    /// flow itself is broken.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// An agent's contribution call errored or timed out. Carries the
    /// transcript accumulated before the failure so the caller can still
    /// display the partial conversation.
    #[error("turn failed for {agent}: {source}")]
    TurnFailed {
        agent: AgentId,
        #[source]
        source: anyhow::Error,
        transcript: Transcript,
    },

    /// A selection or termination judgment call itself failed
    #[error("judgment failed: {0}")]
    Judgment(#[source] anyhow::Error),

    /// Session lookup failed
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The turn stream for a session was already claimed
    #[error("turn stream already consumed for session {0}")]
    StreamConsumed(SessionId),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
