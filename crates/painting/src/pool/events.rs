//! Events emitted by an ink pool for lifecycle hooks.

use crate::types::InkId;

/// Why an ink object left its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    /// An eraser touched it
    Erased,
    /// Double-click removed the most recent stroke
    Undo,
    /// The whole pool was cleared
    Cleared,
    /// The pool was full and this was the oldest stroke
    Evicted,
}

/// Events emitted by [`super::InkPool`].
///
/// These let an external object-lifecycle or networking layer react to ink
/// coming and going without coupling to the pool itself.
#[derive(Debug, Clone, PartialEq)]
pub enum InkEvent {
    /// A finished stroke was moved into the pool
    Pooled {
        id: InkId,
        name: String,
        vertex_count: usize,
    },
    /// A stroke was destroyed
    Destroyed {
        id: InkId,
        name: String,
        reason: DestroyReason,
    },
}
