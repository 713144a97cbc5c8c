//! Error types for tool state handling.

use inkwell_ipc::{IpcError, ToolId};

use crate::mode::Mode;

/// Errors raised while translating input or applying replicated events.
///
/// None of these reach the broadcast channel: input handlers and the replica
/// loop log them and carry on.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unexpected state {mode:?} at {input}")]
    UnexpectedState { input: &'static str, mode: Mode },

    #[error("Unknown tool {0}")]
    UnknownTool(ToolId),

    #[error("{event} does not apply to a {kind}")]
    NotApplicable {
        event: &'static str,
        kind: &'static str,
    },

    #[error("Bus error: {0}")]
    Ipc(#[from] IpcError),
}
