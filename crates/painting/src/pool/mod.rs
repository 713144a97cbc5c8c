//! Ink pools: where finished strokes live until they are destroyed.
//!
//! This module provides:
//! - [`InkPool`] - Bounded append-only storage of finished ink
//! - [`InkEvent`] - Lifecycle events for external object/network hooks

mod events;
mod storage;

pub use events::{DestroyReason, InkEvent};
pub use storage::InkPool;
