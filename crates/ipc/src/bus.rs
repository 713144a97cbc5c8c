//! In-process broadcast bus with one mailbox per participant.
//!
//! Every published frame lands in every joined mailbox, the publisher's own
//! included. Mailboxes are unbounded FIFO channels, so frames from one sender
//! arrive in the order sent; frames from different senders interleave in
//! publish order, which replicas must not rely on.

use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::error::IpcError;
use crate::messages::{ParticipantId, ToolMessage};

/// Shared handle to the session bus. Cloning shares the subscriber list.
#[derive(Clone, Default)]
pub struct Bus {
    subscribers: Arc<RwLock<Vec<(ParticipantId, UnboundedSender<String>)>>>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriber_count = self.subscribers.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("Bus")
            .field("subscriber_count", &subscriber_count)
            .finish()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the bus, receiving every frame published from now on.
    pub fn join(&self, participant: ParticipantId) -> Result<Mailbox, IpcError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .map_err(|_| IpcError::Poisoned)?
            .push((participant, tx));
        tracing::debug!("{} joined the bus", participant);
        Ok(Mailbox { participant, rx })
    }

    /// Encode and deliver `message` to every mailbox. Returns the delivery count.
    pub fn publish(&self, message: &ToolMessage) -> Result<usize, IpcError> {
        let frame = message.encode()?;
        tracing::trace!("publish {} -> {}", message.sender, frame);
        self.publish_frame(frame)
    }

    /// Deliver a raw frame to every mailbox, dropping mailboxes whose owner left.
    pub fn publish_frame(&self, frame: String) -> Result<usize, IpcError> {
        let mut subscribers = self.subscribers.write().map_err(|_| IpcError::Poisoned)?;
        subscribers.retain(|(participant, tx)| {
            let delivered = tx.send(frame.clone()).is_ok();
            if !delivered {
                tracing::debug!("{} left the bus", participant);
            }
            delivered
        });
        Ok(subscribers.len())
    }

    /// Number of joined mailboxes
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }
}

/// Receiving end for one participant. Never blocks.
#[derive(Debug)]
pub struct Mailbox {
    participant: ParticipantId,
    rx: UnboundedReceiver<String>,
}

impl Mailbox {
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Next frame if one is waiting, decoded. `None` when the mailbox is empty.
    pub fn try_next(&mut self) -> Option<Result<ToolMessage, IpcError>> {
        match self.rx.try_recv() {
            Ok(frame) => Some(ToolMessage::decode(&frame)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Everything currently waiting, in arrival order.
    pub fn drain(&mut self) -> Vec<Result<ToolMessage, IpcError>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
