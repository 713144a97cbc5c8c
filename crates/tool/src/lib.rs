//! Replicated pen and eraser tools for shared 3D ink
//!
//! Every participant runs the same deterministic state machine per pen:
//! - [`mode`] - Modes and the transition table, replayable from an event log
//! - [`input`] - Double-click detection and input-to-event translation
//! - [`pen`] - Pen mode owner, ink producer and paired eraser
//! - [`eraser`] - Eraser contact gate and standalone erasers
//! - [`manager`] - All tools of one replica and cross-tool operations
//! - [`participant`] - Replica driver on top of the broadcast bus
//!
//! Assumption: a single user manipulates a given tool at a time. Two
//! participants driving the same tool concurrently will each converge to a
//! valid mode, but not necessarily the same one.

pub mod eraser;
pub mod error;
pub mod input;
pub mod manager;
pub mod mode;
pub mod participant;
pub mod pen;

pub use eraser::{Eraser, EraserVisual, StandaloneEraser, DEFAULT_ERASER_RADIUS};
pub use error::ToolError;
pub use input::{translate_press, translate_release, ClickDetector, Press};
pub use manager::PenManager;
pub use mode::{plan, replay, Mode, SideEffect, Transition};
pub use participant::Participant;
pub use pen::Pen;
