//! One participant's replica of the shared session.
//!
//! Local input is translated by the [`PenManager`] and published on the bus.
//! Nothing is applied at publish time: the participant's own events come back
//! through its mailbox like everyone else's and are applied by [`Participant::pump`].

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use glam::Vec3;
use inkwell_config::ToolConfig;
use inkwell_ipc::{Bus, Mailbox, Outbox, ParticipantId, ToolEvent, ToolId, ToolMessage};
use painting::{InkId, Pose};

use crate::error::ToolError;
use crate::manager::PenManager;

/// A replica: its tools, its outbox and its mailbox
#[derive(Debug)]
pub struct Participant {
    id: ParticipantId,
    manager: PenManager,
    bus: Bus,
    outbox: Outbox,
    mailbox: Mailbox,
    next_seq: HashMap<ParticipantId, u64>,
    sequence_gaps: u64,
}

impl Participant {
    /// Join `bus` as participant `id`
    pub fn join(id: ParticipantId, bus: &Bus, config: ToolConfig) -> Result<Self, ToolError> {
        let mailbox = bus.join(id)?;
        Ok(Self {
            id,
            manager: PenManager::new(config),
            bus: bus.clone(),
            outbox: Outbox::new(id),
            mailbox,
            next_seq: HashMap::new(),
            sequence_gaps: 0,
        })
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn manager(&self) -> &PenManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PenManager {
        &mut self.manager
    }

    /// Frames that arrived out of sequence from a sender already seen
    pub fn sequence_gaps(&self) -> u64 {
        self.sequence_gaps
    }

    // ------------------------------------------------------------------
    // Local input
    // ------------------------------------------------------------------

    pub fn pickup(&mut self, tool: ToolId) {
        let events = self.manager.pickup(tool);
        self.broadcast_result(tool, events);
    }

    pub fn drop_tool(&mut self, tool: ToolId) {
        let events = self.manager.drop_tool(tool);
        self.broadcast_result(tool, events);
    }

    pub fn use_down(&mut self, tool: ToolId, now: Duration) {
        let events = self.manager.use_down(tool, now);
        self.broadcast_result(tool, events);
    }

    pub fn use_up(&mut self, tool: ToolId) {
        let events = self.manager.use_up(tool);
        self.broadcast_result(tool, events);
    }

    pub fn set_use_double_click(&mut self, value: bool) {
        for (tool, event) in self.manager.set_use_double_click(value) {
            if !self.broadcast(tool, event) {
                self.manager.resync_input(tool);
            }
        }
    }

    pub fn respawn(&mut self) {
        for (tool, event) in self.manager.respawn() {
            if !self.broadcast(tool, event) {
                self.manager.resync_input(tool);
            }
        }
    }

    /// Ask every replica to destroy all ink of `tool`
    pub fn request_clear(&mut self, tool: ToolId) {
        self.broadcast(tool, ToolEvent::ClearInk);
    }

    /// Publish one event for `tool` to every replica, this one included.
    /// Returns false if the bus refused it.
    pub fn broadcast(&mut self, tool: ToolId, event: ToolEvent) -> bool {
        let message = self.outbox.envelope(tool, event);
        match self.bus.publish(&message) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("{} failed to broadcast {}: {}", self.id, event.name(), e);
                false
            }
        }
    }

    fn broadcast_result(&mut self, tool: ToolId, events: Result<Vec<ToolEvent>, ToolError>) {
        match events {
            Ok(events) => {
                let mut sent = true;
                for event in events {
                    sent &= self.broadcast(tool, event);
                }
                if !sent {
                    self.manager.resync_input(tool);
                }
            }
            Err(e) => tracing::error!("{}: {}", self.id, e),
        }
    }

    // ------------------------------------------------------------------
    // Replicated events
    // ------------------------------------------------------------------

    /// Apply every delivered message in arrival order. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(frame) = self.mailbox.try_next() {
            match frame {
                Ok(message) => {
                    if self.deliver(message) {
                        applied += 1;
                    }
                }
                Err(e) => tracing::warn!("{} dropped a malformed frame: {}", self.id, e),
            }
        }
        applied
    }

    /// Apply a single message. Returns false if it could not be applied.
    pub fn deliver(&mut self, message: ToolMessage) -> bool {
        self.check_sequence(&message);
        let applied = if message.sender == self.id {
            self.manager.apply_own(message.tool, message.event)
        } else {
            self.manager.apply(message.tool, message.event)
        };
        match applied {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "{} could not apply {} from {}: {}",
                    self.id,
                    message.event.name(),
                    message.sender,
                    e
                );
                false
            }
        }
    }

    /// Senders are tracked from the first frame seen, so joining late is not a gap
    fn check_sequence(&mut self, message: &ToolMessage) {
        match self.next_seq.entry(message.sender) {
            Entry::Vacant(entry) => {
                entry.insert(message.seq + 1);
            }
            Entry::Occupied(mut entry) => {
                let expected = *entry.get();
                if message.seq != expected {
                    self.sequence_gaps += 1;
                    tracing::warn!(
                        "{} expected seq {} from {}, got {}",
                        self.id,
                        expected,
                        message.sender,
                        message.seq
                    );
                }
                entry.insert(message.seq + 1);
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame update and contacts
    // ------------------------------------------------------------------

    /// Advance tool `tool` by `dt` seconds with its tip at `tip`.
    ///
    /// Pens follow the tip and record ink; an erasing eraser destroys whatever
    /// its sphere touches. Returns ink destroyed this tick.
    pub fn tick(&mut self, tool: ToolId, dt: f32, tip: Pose) -> Vec<(ToolId, InkId)> {
        if let Some(pen) = self.manager.pen_mut(tool) {
            pen.update(dt, tip);
        } else if let Some(eraser) = self.manager.eraser_mut(tool) {
            eraser.set_local_pose(tip);
        }
        self.manager.erase_at(tool, tip.position)
    }

    /// Host-detected contact between `eraser` and ink `ink` owned by pen `owner`
    pub fn on_eraser_contact(&mut self, eraser: ToolId, owner: ToolId, ink: InkId) -> bool {
        self.manager.on_eraser_contact(eraser, owner, ink)
    }

    /// Erase with `eraser`'s sphere at world `center`
    pub fn erase_at(&mut self, eraser: ToolId, center: Vec3) -> Vec<(ToolId, InkId)> {
        self.manager.erase_at(eraser, center)
    }
}
