//! Tool bridge - pass-through to external tool processes
//!
//! Agents can request a call to an external tool (e.g. a diagram renderer)
//! by embedding a fenced block in their contribution. The block is opened
//! with three backticks and the tag `tool` and contains a JSON object of the
//! form `{"tool": "render_diagram", "arguments": {...}}`. The orchestrator
//! extracts the request, calls the bridge, and attaches the structured
//! result to the turn. Tool failures degrade the turn (no attachment) and
//! never fail the session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const FENCE_OPEN: &str = "```tool";
const FENCE_CLOSE: &str = "```";

/// Structured result of a tool call.
///
/// The payload is opaque to the core (e.g. an encoded diagram image); only
/// the success flag is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Which tool produced this result
    pub tool: String,
    /// Whether the tool considers the call successful
    pub success: bool,
    /// Opaque payload for the UI layer
    pub payload: Value,
}

/// Tool bridge errors. Non-fatal to the session by design.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool call timed out")]
    Timeout,

    #[error("tool call failed: {0}")]
    Failed(String),
}

/// Interface to an external tool process
#[async_trait]
pub trait ToolBridge: Send + Sync {
    async fn call_tool(
        &self,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolResult, ToolError>;
}

/// A tool request embedded in an agent's contribution
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Extract the first tool request from a contribution, if any.
    ///
    /// Malformed blocks are ignored rather than failing the turn - the text
    /// contribution still stands on its own.
    pub fn extract(content: &str) -> Option<Self> {
        let start = content.find(FENCE_OPEN)?;
        let body = &content[start + FENCE_OPEN.len()..];
        let end = body.find(FENCE_CLOSE)?;
        serde_json::from_str(body[..end].trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_invocation() {
        let content = "Here is the deployment view.\n\
                       ```tool\n\
                       {\"tool\": \"render_diagram\", \"arguments\": {\"format\": \"mermaid\"}}\n\
                       ```\n\
                       See attached.";

        let invocation = ToolInvocation::extract(content).unwrap();
        assert_eq!(invocation.tool, "render_diagram");
        assert_eq!(invocation.arguments["format"], json!("mermaid"));
    }

    #[test]
    fn test_missing_arguments_default_empty() {
        let content = "```tool\n{\"tool\": \"render_diagram\"}\n```";
        let invocation = ToolInvocation::extract(content).unwrap();
        assert!(invocation.arguments.is_empty());
    }

    #[test]
    fn test_no_block_yields_none() {
        assert!(ToolInvocation::extract("plain prose, no tools").is_none());
    }

    #[test]
    fn test_malformed_block_ignored() {
        let content = "```tool\nnot json at all\n```";
        assert!(ToolInvocation::extract(content).is_none());
    }

    #[test]
    fn test_unterminated_block_ignored() {
        let content = "```tool\n{\"tool\": \"render_diagram\"}";
        assert!(ToolInvocation::extract(content).is_none());
    }
}
