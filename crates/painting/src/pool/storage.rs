//! Bounded append-only storage for finished ink.

use std::collections::VecDeque;

use glam::Vec3;

use crate::ink::InkObject;
use crate::types::InkId;

use super::events::{DestroyReason, InkEvent};

/// Bounded append-only collection of finished strokes, oldest first.
///
/// Only the most recent entry is addressable for undo; any entry can be
/// destroyed by id (eraser contact). When a push would exceed capacity the
/// oldest stroke is evicted first.
pub struct InkPool {
    strokes: VecDeque<InkObject>,
    capacity: usize,
    /// Lifecycle listeners; each receives every event.
    #[allow(clippy::type_complexity)]
    event_listeners: Vec<Box<dyn Fn(&InkEvent) + Send + Sync>>,
}

impl std::fmt::Debug for InkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkPool")
            .field("stroke_count", &self.strokes.len())
            .field("capacity", &self.capacity)
            .field("listener_count", &self.event_listeners.len())
            .finish()
    }
}

impl Default for InkPool {
    fn default() -> Self {
        Self::with_capacity(inkwell_config::DEFAULT_INK_POOL_CAPACITY)
    }
}

impl InkPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool holding at most `capacity` strokes (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strokes: VecDeque::new(),
            capacity: capacity.max(1),
            event_listeners: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Iterate strokes oldest first
    pub fn iter(&self) -> impl Iterator<Item = &InkObject> {
        self.strokes.iter()
    }

    pub fn get(&self, id: InkId) -> Option<&InkObject> {
        self.strokes.iter().find(|ink| ink.id() == id)
    }

    /// Most recently pooled stroke
    pub fn last(&self) -> Option<&InkObject> {
        self.strokes.back()
    }

    /// Append a finished stroke, evicting the oldest if the pool is full.
    pub fn push(&mut self, ink: InkObject) {
        while self.strokes.len() >= self.capacity {
            let Some(oldest) = self.strokes.pop_front() else {
                break;
            };
            tracing::debug!("Ink pool full, evicting {}", oldest.name());
            self.emit_destroyed(&oldest, DestroyReason::Evicted);
        }

        let event = InkEvent::Pooled {
            id: ink.id(),
            name: ink.name().to_string(),
            vertex_count: ink.mesh().map_or(0, |m| m.vertex_count()),
        };
        self.strokes.push_back(ink);
        self.emit_event(&event);
    }

    /// Destroy the most recently pooled stroke. `None` when empty.
    pub fn destroy_last(&mut self) -> Option<InkObject> {
        let ink = self.strokes.pop_back()?;
        self.emit_destroyed(&ink, DestroyReason::Undo);
        Some(ink)
    }

    /// Destroy a specific stroke. `None` if it is not in this pool.
    pub fn destroy(&mut self, id: InkId, reason: DestroyReason) -> Option<InkObject> {
        let index = self.strokes.iter().position(|ink| ink.id() == id)?;
        let ink = self.strokes.remove(index)?;
        self.emit_destroyed(&ink, reason);
        Some(ink)
    }

    /// Destroy every stroke, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let drained: Vec<InkObject> = self.strokes.drain(..).collect();
        for ink in &drained {
            self.emit_destroyed(ink, DestroyReason::Cleared);
        }
        drained.len()
    }

    /// Ids of strokes whose collider a sphere at world `center` touches
    pub fn overlapping(&self, center: Vec3, radius: f32) -> Vec<InkId> {
        self.strokes
            .iter()
            .filter(|ink| ink.touches_sphere(center, radius))
            .map(|ink| ink.id())
            .collect()
    }

    /// Register a lifecycle listener.
    pub fn add_event_listener<F>(&mut self, listener: F)
    where
        F: Fn(&InkEvent) + Send + Sync + 'static,
    {
        self.event_listeners.push(Box::new(listener));
    }

    fn emit_destroyed(&self, ink: &InkObject, reason: DestroyReason) {
        self.emit_event(&InkEvent::Destroyed {
            id: ink.id(),
            name: ink.name().to_string(),
            reason,
        });
    }

    fn emit_event(&self, event: &InkEvent) {
        for listener in &self.event_listeners {
            listener(event);
        }
    }
}
