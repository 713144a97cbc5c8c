//! Tool manager: the set of pens and erasers a replica knows about.
//!
//! The manager owns every tool so that cross-tool work (an eraser touching ink
//! from another pen, clearing everything, tracking who is holding what) needs
//! no back-references between tools.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use inkwell_config::ToolConfig;
use inkwell_ipc::{ToolEvent, ToolId};
use painting::InkId;

use crate::eraser::{Eraser, StandaloneEraser};
use crate::error::ToolError;
use crate::pen::Pen;

/// Every pen and standalone eraser of one replica
#[derive(Debug)]
pub struct PenManager {
    config: ToolConfig,
    pens: BTreeMap<ToolId, Pen>,
    erasers: BTreeMap<ToolId, StandaloneEraser>,
    in_use: BTreeSet<ToolId>,
}

impl PenManager {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            config,
            pens: BTreeMap::new(),
            erasers: BTreeMap::new(),
            in_use: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Register a pen under `id`, replacing any tool already there
    pub fn add_pen(&mut self, id: ToolId) -> &mut Pen {
        self.erasers.remove(&id);
        let mut pen = Pen::new(self.config.clone());
        pen.init();
        match self.pens.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(pen);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(pen),
        }
    }

    /// Register a standalone eraser under `id`, replacing any tool already there
    pub fn add_eraser(&mut self, id: ToolId) -> &mut StandaloneEraser {
        self.pens.remove(&id);
        match self.erasers.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(StandaloneEraser::new());
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(StandaloneEraser::new()),
        }
    }

    pub fn pen(&self, id: ToolId) -> Option<&Pen> {
        self.pens.get(&id)
    }

    pub fn pen_mut(&mut self, id: ToolId) -> Option<&mut Pen> {
        self.pens.get_mut(&id)
    }

    pub fn eraser(&self, id: ToolId) -> Option<&StandaloneEraser> {
        self.erasers.get(&id)
    }

    pub fn eraser_mut(&mut self, id: ToolId) -> Option<&mut StandaloneEraser> {
        self.erasers.get_mut(&id)
    }

    pub fn pens(&self) -> impl Iterator<Item = (ToolId, &Pen)> {
        self.pens.iter().map(|(id, pen)| (*id, pen))
    }

    pub fn pen_ids(&self) -> Vec<ToolId> {
        self.pens.keys().copied().collect()
    }

    /// Reset every pen's local presentation; replicated modes are untouched
    pub fn init(&mut self) {
        for pen in self.pens.values_mut() {
            pen.init();
        }
    }

    // ------------------------------------------------------------------
    // Local surface operations (return events to broadcast)
    // ------------------------------------------------------------------

    pub fn pickup(&mut self, id: ToolId) -> Result<Vec<ToolEvent>, ToolError> {
        if let Some(pen) = self.pens.get_mut(&id) {
            self.in_use.insert(id);
            return Ok(pen.on_pickup());
        }
        let eraser = self.erasers.get_mut(&id).ok_or(ToolError::UnknownTool(id))?;
        self.in_use.insert(id);
        eraser.on_pickup();
        Ok(Vec::new())
    }

    pub fn drop_tool(&mut self, id: ToolId) -> Result<Vec<ToolEvent>, ToolError> {
        if let Some(pen) = self.pens.get_mut(&id) {
            self.in_use.remove(&id);
            return Ok(pen.on_drop());
        }
        let eraser = self.erasers.get_mut(&id).ok_or(ToolError::UnknownTool(id))?;
        self.in_use.remove(&id);
        eraser.on_drop();
        Ok(Vec::new())
    }

    pub fn use_down(&mut self, id: ToolId, now: std::time::Duration) -> Result<Vec<ToolEvent>, ToolError> {
        if let Some(pen) = self.pens.get_mut(&id) {
            return Ok(pen.on_use_down(now));
        }
        let eraser = self.erasers.get(&id).ok_or(ToolError::UnknownTool(id))?;
        Ok(vec![eraser.on_use_down()])
    }

    pub fn use_up(&mut self, id: ToolId) -> Result<Vec<ToolEvent>, ToolError> {
        if let Some(pen) = self.pens.get_mut(&id) {
            return Ok(pen.on_use_up());
        }
        let eraser = self.erasers.get(&id).ok_or(ToolError::UnknownTool(id))?;
        Ok(vec![eraser.on_use_up()])
    }

    /// Toggle double-click on every pen
    pub fn set_use_double_click(&mut self, value: bool) -> Vec<(ToolId, ToolEvent)> {
        self.pens
            .iter_mut()
            .flat_map(|(id, pen)| {
                let id = *id;
                pen.set_use_double_click(value).into_iter().map(move |e| (id, e))
            })
            .collect()
    }

    /// Respawn every tool (drop if held, reset pose where this replica has authority)
    pub fn respawn(&mut self) -> Vec<(ToolId, ToolEvent)> {
        let mut events = Vec::new();
        for (id, pen) in self.pens.iter_mut() {
            events.extend(pen.respawn().into_iter().map(|e| (*id, e)));
        }
        for eraser in self.erasers.values_mut() {
            eraser.respawn();
        }
        self.in_use.clear();
        events
    }

    /// Destroy every finished stroke of every pen on this replica
    pub fn clear(&mut self) -> usize {
        self.pens.values_mut().map(|pen| pen.clear()).sum()
    }

    pub fn is_in_use(&self, id: ToolId) -> bool {
        self.in_use.contains(&id)
    }

    /// True while the local user holds any tool
    pub fn any_in_use(&self) -> bool {
        !self.in_use.is_empty()
    }

    // ------------------------------------------------------------------
    // Replicated events
    // ------------------------------------------------------------------

    /// Apply an event broadcast by another replica
    pub fn apply(&mut self, id: ToolId, event: ToolEvent) -> Result<(), ToolError> {
        self.apply_from(id, event, false)
    }

    /// Apply an event this replica broadcast, delivered back
    pub fn apply_own(&mut self, id: ToolId, event: ToolEvent) -> Result<(), ToolError> {
        self.apply_from(id, event, true)
    }

    fn apply_from(&mut self, id: ToolId, event: ToolEvent, own: bool) -> Result<(), ToolError> {
        if let Some(pen) = self.pens.get_mut(&id) {
            if own {
                pen.apply_own(event)?;
            } else {
                pen.apply(event)?;
            }
            return Ok(());
        }
        self.erasers
            .get_mut(&id)
            .ok_or(ToolError::UnknownTool(id))?
            .apply(event)
    }

    /// Drop the input prediction of pen `id` after its events failed to go out
    pub fn resync_input(&mut self, id: ToolId) {
        if let Some(pen) = self.pens.get_mut(&id) {
            pen.resync_input();
        }
    }

    // ------------------------------------------------------------------
    // Contacts (local, not replicated)
    // ------------------------------------------------------------------

    /// The eraser that tool `id` currently presents: a pen's paired eraser or a standalone one
    pub fn eraser_of(&self, id: ToolId) -> Option<&Eraser> {
        self.pens
            .get(&id)
            .map(|pen| pen.eraser())
            .or_else(|| self.erasers.get(&id).map(|e| e.eraser()))
    }

    /// An eraser of tool `eraser_id` touched ink `ink` owned by pen `owner`.
    ///
    /// Destroys the ink if the eraser is erasing and the ink is tagged.
    pub fn on_eraser_contact(&mut self, eraser_id: ToolId, owner: ToolId, ink: InkId) -> bool {
        let Some(eraser) = self.eraser_of(eraser_id).cloned() else {
            return false;
        };
        let Some(pen) = self.pens.get_mut(&owner) else {
            return false;
        };
        let destroyed = pen.erase_contact(&eraser, ink);
        if destroyed {
            tracing::debug!("{} erased {} of {}", eraser_id, ink, owner);
        }
        destroyed
    }

    /// Erase whatever the eraser of `eraser_id` touches with its sphere at world `center`
    pub fn erase_at(&mut self, eraser_id: ToolId, center: Vec3) -> Vec<(ToolId, InkId)> {
        let Some(eraser) = self.eraser_of(eraser_id).cloned() else {
            return Vec::new();
        };
        if !eraser.is_active() || !eraser.is_erasing() {
            return Vec::new();
        }

        let touched: Vec<(ToolId, InkId)> = self
            .pens
            .iter()
            .flat_map(|(owner, pen)| {
                pen.pool()
                    .overlapping(center, eraser.radius())
                    .into_iter()
                    .map(move |ink| (*owner, ink))
            })
            .collect();

        touched
            .into_iter()
            .filter(|(owner, ink)| {
                self.pens
                    .get_mut(owner)
                    .is_some_and(|pen| pen.erase_contact(&eraser, *ink))
            })
            .collect()
    }
}
