//! Replicated tool events and their wire envelope.

use serde::{Deserialize, Serialize};

use crate::error::IpcError;

/// A participant in a shared session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "participant#{}", self.0)
    }
}

/// A pen/eraser pair or a standalone eraser, same id on every replica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolId(pub u32);

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tool#{}", self.0)
    }
}

/// Zero-argument events every replica applies in delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ToolEvent {
    /// Pen mode transitions
    ToPenIdle,
    ToPenUsing,
    ToEraseIdle,
    ToEraseUsing,
    /// Destroy the most recently finished stroke of a pen
    DestroyLastInk,
    /// Destroy every finished stroke of a pen
    ClearInk,
    /// Standalone eraser use-down
    StartErasing,
    /// Standalone eraser use-up
    FinishErasing,
}

impl ToolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToPenIdle => "ToPenIdle",
            Self::ToPenUsing => "ToPenUsing",
            Self::ToEraseIdle => "ToEraseIdle",
            Self::ToEraseUsing => "ToEraseUsing",
            Self::DestroyLastInk => "DestroyLastInk",
            Self::ClearInk => "ClearInk",
            Self::StartErasing => "StartErasing",
            Self::FinishErasing => "FinishErasing",
        }
    }
}

/// Envelope carried by the broadcast bus.
///
/// `seq` counts up from zero per sender so receivers can notice gaps; the bus
/// guarantees per-sender order but nothing across senders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub sender: ParticipantId,
    pub seq: u64,
    pub tool: ToolId,
    pub event: ToolEvent,
}

impl ToolMessage {
    /// Encode to a JSON frame
    pub fn encode(&self) -> Result<String, IpcError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON frame
    pub fn decode(frame: &str) -> Result<Self, IpcError> {
        if frame.trim().is_empty() {
            return Err(IpcError::InvalidFormat("empty frame".to_string()));
        }
        Ok(serde_json::from_str(frame)?)
    }
}

/// Hands out per-sender sequence numbers
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: ParticipantId,
    next_seq: u64,
}

impl Outbox {
    pub fn new(sender: ParticipantId) -> Self {
        Self {
            sender,
            next_seq: 0,
        }
    }

    pub fn sender(&self) -> ParticipantId {
        self.sender
    }

    /// Wrap an event for `tool` in the next envelope
    pub fn envelope(&mut self, tool: ToolId, event: ToolEvent) -> ToolMessage {
        let seq = self.next_seq;
        self.next_seq += 1;
        ToolMessage {
            sender: self.sender,
            seq,
            tool,
            event,
        }
    }
}
