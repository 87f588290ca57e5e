//! The conversation transcript - an append-only record of agent turns

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tools::ToolResult;

/// Identifier for a squad agent.
///
/// Agents are identified by their unique name, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One agent's contribution to the conversation.
///
/// Turns are never mutated after creation; the transcript exclusively owns
/// them in append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this contribution
    pub speaker: AgentId,
    /// The text contribution
    pub content: String,
    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
    /// Structured result spliced in by the tool bridge, if the agent
    /// requested a tool call and it succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<ToolResult>,
}

impl Turn {
    pub fn new(speaker: impl Into<AgentId>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
            timestamp: Utc::now(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, result: ToolResult) -> Self {
        self.attachment = Some(result);
        self
    }
}

/// Ordered, append-only sequence of turns.
///
/// Ordering is strictly append-time order. Nothing removes or reorders
/// turns here; the history reducer produces bounded *copies* and leaves the
/// canonical transcript intact for audit and display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The most recent turn - the input to selection and termination
    /// judgments
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}

/// What an agent sees when asked to produce a contribution: the user's
/// original request plus a bounded window of recent turns.
///
/// The request is not itself a turn - the transcript holds agent
/// contributions only.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    /// The user request that started the session
    pub request: Arc<str>,
    /// Recent turns, bounded by the history reducer
    pub recent: Transcript,
}
