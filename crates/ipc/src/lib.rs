//! Replication protocol for Inkwell
//!
//! Defines the events replicas exchange to keep pen and eraser modes in step,
//! their JSON envelope, and an in-process bus that fans them out with
//! per-sender ordering.

pub mod bus;
pub mod error;
pub mod messages;

pub use bus::{Bus, Mailbox};
pub use error::IpcError;
pub use messages::{Outbox, ParticipantId, ToolEvent, ToolId, ToolMessage};
