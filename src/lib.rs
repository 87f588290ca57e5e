//! # Archsquad
//!
//! Multi-agent architecture collaboration engine.
//!
//! A squad of specialist architect agents takes turns drafting and
//! reviewing an architecture document for a user's system requirements,
//! moderated by pluggable selection and termination judgments.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SESSION MANAGER                          │
//! │   startSession / streamTurns / getStatus / cancel               │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ one task per session
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       TURN ORCHESTRATOR                         │
//! │                                                                 │
//! │   ┌───────────┐   reduced    ┌──────────┐   latest turn         │
//! │   │  History  │───history──▶ │  Agent   │──────┬───────────┐    │
//! │   │  Reducer  │              │ .produce │      ▼           ▼    │
//! │   └───────────┘              └──────────┘  Selection  Termination│
//! │                                   │         Policy      Policy  │
//! │                              ```tool``` ?                       │
//! │                                   ▼                             │
//! │                             ┌──────────┐                        │
//! │                             │   Tool   │  diagram renderer etc. │
//! │                             │  Bridge  │  (failure degrades,    │
//! │                             └──────────┘   never aborts)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Agent**: a named participant that produces a text contribution from
//!   conversation context
//! - **Transcript**: the append-only record of turns in a session
//! - **Selection Policy**: decides the next speaker; invalid judgments fail
//!   loudly instead of falling back
//! - **Termination Policy**: decides when the document is done, with a hard
//!   iteration ceiling as a convergence failsafe
//! - **Session**: one conversation per user request, streamed turn by turn

pub mod agent;
pub mod channel;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod registry;
pub mod selection;
pub mod session;
pub mod squad;
pub mod termination;
pub mod tools;
pub mod transcript;

pub use agent::{Agent, AgentRole, Contributor, Platform};
pub use channel::TurnStream;
pub use config::SquadConfig;
pub use error::SquadError;
pub use history::HistoryReducer;
pub use orchestrator::{Orchestrator, Outcome};
pub use registry::AgentRegistry;
pub use selection::{ScriptedFlow, SelectionPolicy, SpeakerJudge};
pub use session::{SessionHandle, SessionId, SessionManager, SessionStatus};
pub use squad::architecture_squad;
pub use termination::{CompletionJudge, SectionChecklist, TerminationPolicy, Verdict};
pub use tools::{ToolBridge, ToolError, ToolInvocation, ToolResult};
pub use transcript::{AgentId, ContextWindow, Transcript, Turn};
