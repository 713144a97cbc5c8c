//! The pen: mode owner, ink producer and its paired eraser.
//!
//! Every replica holds a `Pen` for each pen in the session. Input handlers
//! (`on_*`) run only on the holder's replica and return events to broadcast;
//! [`Pen::apply`] runs on every replica when those events are delivered.
//!
//! The holder translates input from a predicted mode that already includes
//! the transitions it has broadcast but not yet seen delivered, so a press and
//! release inside one round trip still produce both events.

use std::time::Duration;

use glam::Vec3;
use inkwell_config::ToolConfig;
use inkwell_ipc::ToolEvent;
use painting::{ink_name, DestroyReason, InkId, InkObject, InkPool, InkTag, Pose};

use crate::eraser::Eraser;
use crate::error::ToolError;
use crate::input::{translate_press, translate_release, ClickDetector};
use crate::mode::{plan, Mode, SideEffect};

/// A pen with its in-progress ink, ink pool and paired eraser
#[derive(Debug)]
pub struct Pen {
    config: ToolConfig,
    mode: Mode,
    /// Mode local input is translated from
    input_mode: Mode,
    /// Own transition events broadcast but not yet delivered back
    in_flight: usize,
    eraser: Eraser,
    ink: Option<InkObject>,
    pool: InkPool,
    ink_count: u64,
    spawn_target: Pose,
    local_pose: Pose,
    held: bool,
    owner: bool,
    use_double_click: bool,
    clicks: ClickDetector,
}

impl Pen {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            mode: Mode::PenIdle,
            input_mode: Mode::PenIdle,
            in_flight: 0,
            eraser: Eraser::paired(),
            ink: None,
            pool: InkPool::with_capacity(config.ink_pool_capacity),
            ink_count: 0,
            spawn_target: Pose::IDENTITY,
            local_pose: Pose::IDENTITY,
            held: false,
            owner: false,
            use_double_click: config.use_double_click,
            clicks: ClickDetector::new(config.click_interval()),
            config,
        }
    }

    /// Reset local presentation: the eraser is shown only in eraser modes and
    /// the click timer is cleared.
    ///
    /// The replicated mode and any stroke in progress are left alone; moving
    /// every replica back to the pen goes through a broadcast `ToPenIdle`.
    pub fn init(&mut self) {
        self.eraser.set_active(!self.mode.is_pen());
        if self.mode != Mode::EraserUsing {
            self.eraser.finish_erasing();
        }
        self.clicks.reset();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode input is translated from: the replicated mode advanced by this
    /// replica's own undelivered transitions
    pub fn input_mode(&self) -> Mode {
        self.input_mode
    }

    /// Forget undelivered transitions, e.g. after a failed broadcast
    pub fn resync_input(&mut self) {
        self.in_flight = 0;
        self.input_mode = self.mode;
    }

    pub fn eraser(&self) -> &Eraser {
        &self.eraser
    }

    pub fn pool(&self) -> &InkPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut InkPool {
        &mut self.pool
    }

    /// Ink currently being drawn
    pub fn ink(&self) -> Option<&InkObject> {
        self.ink.as_ref()
    }

    pub fn spawn_target(&self) -> &Pose {
        &self.spawn_target
    }

    pub fn local_pose(&self) -> &Pose {
        &self.local_pose
    }

    pub fn set_local_pose(&mut self, pose: Pose) {
        self.local_pose = pose;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether this replica has transform authority over the pen
    pub fn set_owner(&mut self, owner: bool) {
        self.owner = owner;
    }

    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn use_double_click(&self) -> bool {
        self.use_double_click
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Local input (holder's replica only)
    // ------------------------------------------------------------------

    pub fn on_pickup(&mut self) -> Vec<ToolEvent> {
        self.held = true;
        self.emit(&[ToolEvent::ToPenIdle])
    }

    /// Dropping always returns the pair to idle pen mode
    pub fn on_drop(&mut self) -> Vec<ToolEvent> {
        self.held = false;
        self.emit(&[ToolEvent::ToPenIdle])
    }

    /// Trigger press at local time `now`
    pub fn on_use_down(&mut self, now: Duration) -> Vec<ToolEvent> {
        let press = self.clicks.press(now, self.use_double_click);
        match translate_press(self.input_mode, press) {
            Ok(events) => self.emit(events),
            Err(e) => {
                tracing::error!("{}", e);
                Vec::new()
            }
        }
    }

    pub fn on_use_up(&mut self) -> Vec<ToolEvent> {
        match translate_release(self.input_mode) {
            Ok(events) => self.emit(events),
            Err(e) => {
                tracing::error!("{}", e);
                Vec::new()
            }
        }
    }

    pub fn set_use_double_click(&mut self, value: bool) -> Vec<ToolEvent> {
        self.use_double_click = value;
        self.emit(&[ToolEvent::ToPenIdle])
    }

    /// Record outgoing events in the input prediction
    fn emit(&mut self, events: &[ToolEvent]) -> Vec<ToolEvent> {
        for target in events.iter().filter_map(|e| Mode::target_of(*e)) {
            self.input_mode = target;
            self.in_flight += 1;
        }
        events.to_vec()
    }

    /// Drop if held and, with transform authority, return to the local origin
    pub fn respawn(&mut self) -> Vec<ToolEvent> {
        let events = if self.held { self.on_drop() } else { Vec::new() };
        if self.owner {
            self.local_pose = Pose::IDENTITY;
        }
        events
    }

    // ------------------------------------------------------------------
    // Replicated events (every replica)
    // ------------------------------------------------------------------

    /// Apply an event this replica broadcast itself, once it is delivered back
    pub fn apply_own(&mut self, event: ToolEvent) -> Result<&'static [SideEffect], ToolError> {
        if Mode::target_of(event).is_some() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        self.apply(event)
    }

    /// Apply a delivered event, returning the side effects it ran
    pub fn apply(&mut self, event: ToolEvent) -> Result<&'static [SideEffect], ToolError> {
        if let Some(target) = Mode::target_of(event) {
            let effects = self.transition(target);
            if self.in_flight == 0 {
                self.input_mode = self.mode;
            }
            return Ok(effects);
        }

        match event {
            ToolEvent::DestroyLastInk => {
                self.destroy_last_ink();
                Ok(&[])
            }
            ToolEvent::ClearInk => {
                self.clear();
                Ok(&[])
            }
            other => Err(ToolError::NotApplicable {
                event: other.name(),
                kind: "pen",
            }),
        }
    }

    /// Move to `target`, running the table's side effects in order
    pub fn transition(&mut self, target: Mode) -> &'static [SideEffect] {
        let transition = plan(self.mode, target);
        for effect in transition.effects {
            self.run(*effect);
        }
        if !transition.is_noop() {
            tracing::debug!("Pen {:?} -> {:?}", transition.from, transition.to);
        }
        self.mode = transition.to;
        transition.effects
    }

    fn run(&mut self, effect: SideEffect) {
        match effect {
            SideEffect::StartDrawing => self.start_drawing(),
            SideEffect::FinishDrawing => self.finish_drawing(),
            SideEffect::ToEraser => self.eraser.set_active(true),
            SideEffect::ToPen => {
                self.eraser.finish_erasing();
                self.eraser.set_active(false);
            }
            SideEffect::StartErasing => self.eraser.start_erasing(),
            SideEffect::FinishErasing => self.eraser.finish_erasing(),
        }
    }

    fn start_drawing(&mut self) {
        if self.ink.is_some() {
            tracing::warn!("Starting a stroke while one is in progress; finishing the old one");
            self.finish_drawing();
        }

        let id = InkId(self.ink_count);
        let tag = InkTag {
            name: ink_name(&self.config.ink_prefix, self.ink_count),
            layer: self.config.ink_layer,
        };
        self.ink_count += 1;

        tracing::debug!("Spawning {}", tag.name);
        let mut ink = InkObject::spawn(id, tag, self.spawn_target);
        // The stroke starts where it was spawned
        ink.follow(self.spawn_target);
        self.ink = Some(ink);
    }

    fn finish_drawing(&mut self) {
        let Some(mut ink) = self.ink.take() else {
            return;
        };
        ink.finish(self.spawn_target, self.config.ribbon_half_width);
        self.pool.push(ink);
    }

    /// Remove the most recently finished stroke; no-op when the pool is empty
    pub fn destroy_last_ink(&mut self) -> Option<InkId> {
        self.pool.destroy_last().map(|ink| ink.id())
    }

    /// Destroy every finished stroke, returning how many there were
    pub fn clear(&mut self) -> usize {
        let removed = self.pool.clear();
        if removed > 0 {
            tracing::info!("Cleared {} strokes", removed);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Per-frame update and contacts (every replica, local decisions)
    // ------------------------------------------------------------------

    /// Advance the spawn target toward the pen `tip` and record ink.
    ///
    /// The holder's replica smooths the motion; other replicas snap to the tip.
    pub fn update(&mut self, dt: f32, tip: Pose) {
        self.spawn_target = if self.held {
            self.spawn_target
                .lerp_toward(&tip, dt * self.config.follow_speed)
        } else {
            tip
        };

        if let Some(ink) = self.ink.as_mut() {
            ink.follow(self.spawn_target);
        }
    }

    /// Ink in this pen's pool that the paired eraser touches at world `center`
    pub fn eraser_overlaps(&self, pool: &InkPool, center: Vec3) -> Vec<InkId> {
        if !self.eraser.is_erasing() || !self.eraser.is_active() {
            return Vec::new();
        }
        pool.overlapping(center, self.eraser.radius())
    }

    /// Contact between an eraser and ink `id` of this pen: destroy it if the
    /// eraser's gate allows. Returns whether the ink was destroyed.
    pub fn erase_contact(&mut self, eraser: &Eraser, id: InkId) -> bool {
        let allowed = self.pool.get(id).is_some_and(|ink| {
            eraser.should_erase(ink.tag(), self.config.ink_layer, &self.config.ink_prefix)
        });
        if !allowed {
            return false;
        }
        self.pool.destroy(id, DestroyReason::Erased).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> Pen {
        Pen::new(ToolConfig::default())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn apply_all(pen: &mut Pen, events: Vec<ToolEvent>) {
        for event in events {
            pen.apply_own(event).unwrap();
        }
    }

    /// Press, drag along +Z, release
    fn draw_stroke(pen: &mut Pen, start: Duration) {
        let events = pen.on_use_down(start);
        apply_all(pen, events);
        for i in 0..4 {
            pen.update(0.016, Pose::from_position(Vec3::new(0.0, 1.0, i as f32 * 0.05)));
        }
        let events = pen.on_use_up();
        apply_all(pen, events);
    }

    #[test]
    fn test_press_release_draws_a_stroke() {
        let mut pen = pen();
        let events = pen.on_use_down(ms(0));
        assert_eq!(events, vec![ToolEvent::ToPenUsing]);
        apply_all(&mut pen, events);
        assert_eq!(pen.mode(), Mode::PenUsing);
        assert!(pen.ink().is_some());

        pen.update(0.016, Pose::from_position(Vec3::ZERO));
        pen.update(0.016, Pose::from_position(Vec3::Z));

        let events = pen.on_use_up();
        assert_eq!(events, vec![ToolEvent::ToPenIdle]);
        apply_all(&mut pen, events);

        assert_eq!(pen.mode(), Mode::PenIdle);
        assert!(pen.ink().is_none());
        assert_eq!(pen.pool().len(), 1);
        let mesh = pen.pool().last().and_then(|ink| ink.mesh()).unwrap();
        assert!(mesh.point_count() >= 2);
        assert_eq!(pen.pool().last().unwrap().name(), "Ink000000");
    }

    #[test]
    fn test_repeated_pen_idle_has_no_side_effects() {
        let mut pen = pen();
        assert!(pen.apply(ToolEvent::ToPenIdle).unwrap().is_empty());
        assert!(pen.apply(ToolEvent::ToPenIdle).unwrap().is_empty());
        assert_eq!(pen.mode(), Mode::PenIdle);
        assert!(pen.pool().is_empty());
        assert!(!pen.eraser().is_active());
    }

    #[test]
    fn test_retrigger_while_drawing_keeps_the_stroke() {
        let mut pen = pen();
        pen.apply(ToolEvent::ToPenUsing).unwrap();
        pen.update(0.016, Pose::from_position(Vec3::X));
        assert!(pen.apply(ToolEvent::ToPenUsing).unwrap().is_empty());
        assert_eq!(pen.ink().map(|ink| ink.samples().len()), Some(2));
    }

    #[test]
    fn test_stroke_starts_at_spawn_point() {
        let mut pen = pen();
        let start = Vec3::new(0.2, 1.0, 0.3);
        pen.update(0.016, Pose::from_position(start));
        pen.apply(ToolEvent::ToPenUsing).unwrap();
        assert_eq!(pen.ink().map(|ink| ink.samples()), Some(vec![start]));

        pen.update(0.016, Pose::from_position(start + Vec3::Z));
        assert_eq!(pen.ink().unwrap().samples(), vec![start, start + Vec3::Z]);
    }

    #[test]
    fn test_tap_before_delivery_still_releases() {
        let mut pen = pen();
        let down = pen.on_use_down(ms(0));
        assert_eq!(pen.input_mode(), Mode::PenUsing);
        assert_eq!(pen.mode(), Mode::PenIdle);

        // Release arrives before the press is delivered back
        let up = pen.on_use_up();
        assert_eq!(up, vec![ToolEvent::ToPenIdle]);

        apply_all(&mut pen, down);
        assert_eq!(pen.mode(), Mode::PenUsing);
        assert_eq!(pen.input_mode(), Mode::PenIdle);
        apply_all(&mut pen, up);
        assert_eq!(pen.mode(), Mode::PenIdle);
        assert_eq!(pen.pool().len(), 1);
    }

    #[test]
    fn test_remote_events_move_input_mode_when_settled() {
        let mut pen = pen();
        pen.apply(ToolEvent::ToEraseIdle).unwrap();
        assert_eq!(pen.input_mode(), Mode::EraserIdle);
        assert_eq!(pen.on_use_down(ms(0)), vec![ToolEvent::ToEraseUsing]);
    }

    #[test]
    fn test_resync_after_lost_broadcast() {
        let mut pen = pen();
        pen.on_use_down(ms(0));
        assert_eq!(pen.input_mode(), Mode::PenUsing);
        pen.resync_input();
        assert_eq!(pen.input_mode(), Mode::PenIdle);
        assert_eq!(pen.on_use_down(ms(1000)), vec![ToolEvent::ToPenUsing]);
    }

    #[test]
    fn test_init_keeps_mode_and_stroke() {
        let mut pen = pen();
        let events = pen.on_use_down(ms(0));
        apply_all(&mut pen, events);
        pen.update(0.016, Pose::from_position(Vec3::Z));

        pen.init();
        assert_eq!(pen.mode(), Mode::PenUsing);
        assert!(pen.ink().is_some());
        assert!(!pen.eraser().is_active());

        let events = pen.on_use_up();
        assert_eq!(events, vec![ToolEvent::ToPenIdle]);
        apply_all(&mut pen, events);
        assert_eq!(pen.pool().len(), 1);
    }

    #[test]
    fn test_init_in_eraser_mode_shows_eraser() {
        let mut pen = pen();
        pen.apply(ToolEvent::ToEraseUsing).unwrap();
        pen.init();
        assert_eq!(pen.mode(), Mode::EraserUsing);
        assert!(pen.eraser().is_active());
        assert!(pen.eraser().is_erasing());

        pen.apply(ToolEvent::ToEraseIdle).unwrap();
        pen.init();
        assert!(pen.eraser().is_active());
        assert!(!pen.eraser().is_erasing());
    }

    #[test]
    fn test_double_click_undoes_and_swaps_to_eraser() {
        let mut pen = pen();
        draw_stroke(&mut pen, ms(0));
        draw_stroke(&mut pen, ms(1000));
        assert_eq!(pen.pool().len(), 2);

        // Second press lands 100ms after the one that started the last stroke
        let events = pen.on_use_down(ms(1100));
        assert_eq!(events, vec![ToolEvent::DestroyLastInk, ToolEvent::ToEraseIdle]);
        apply_all(&mut pen, events);

        assert_eq!(pen.mode(), Mode::EraserIdle);
        assert!(pen.eraser().is_active());
        assert_eq!(pen.pool().len(), 1);
        assert_eq!(pen.pool().last().unwrap().name(), "Ink000000");

        // Double-click again swaps back to the pen
        let events = pen.on_use_down(ms(3000));
        assert_eq!(events, vec![ToolEvent::ToEraseUsing]);
        apply_all(&mut pen, events);
        let events = pen.on_use_up();
        apply_all(&mut pen, events);
        let events = pen.on_use_down(ms(3150));
        assert_eq!(events, vec![ToolEvent::ToPenIdle]);
        apply_all(&mut pen, events);
        assert_eq!(pen.mode(), Mode::PenIdle);
        assert!(!pen.eraser().is_active());
    }

    #[test]
    fn test_slow_presses_are_independent() {
        let mut pen = pen();
        draw_stroke(&mut pen, ms(0));
        draw_stroke(&mut pen, ms(200));
        assert_eq!(pen.pool().len(), 2);
        assert_eq!(pen.mode(), Mode::PenIdle);
    }

    #[test]
    fn test_double_click_disabled() {
        let mut pen = pen();
        let events = pen.set_use_double_click(false);
        assert_eq!(events, vec![ToolEvent::ToPenIdle]);
        draw_stroke(&mut pen, ms(0));
        draw_stroke(&mut pen, ms(50));
        assert_eq!(pen.pool().len(), 2);
    }

    #[test]
    fn test_unexpected_input_emits_nothing() {
        let mut pen = pen();
        assert!(pen.on_use_up().is_empty());
        pen.apply(ToolEvent::ToPenUsing).unwrap();
        assert!(pen.on_use_down(ms(5000)).is_empty());
        assert_eq!(pen.mode(), Mode::PenUsing);
    }

    #[test]
    fn test_undo_on_empty_pool_is_noop() {
        let mut pen = pen();
        assert!(pen.apply(ToolEvent::DestroyLastInk).unwrap().is_empty());
        assert!(pen.pool().is_empty());
    }

    #[test]
    fn test_clear_pool_of_five() {
        let mut pen = pen();
        for i in 0..5 {
            draw_stroke(&mut pen, ms(i * 1000));
        }
        assert_eq!(pen.pool().len(), 5);
        pen.apply(ToolEvent::ClearInk).unwrap();
        assert_eq!(pen.pool().len(), 0);
    }

    #[test]
    fn test_eraser_contact_requires_erasing() {
        let mut pen = pen();
        draw_stroke(&mut pen, ms(0));
        let id = pen.pool().last().unwrap().id();

        pen.apply(ToolEvent::ToEraseIdle).unwrap();
        let eraser = pen.eraser().clone();
        assert!(!pen.erase_contact(&eraser, id));
        assert_eq!(pen.pool().len(), 1);

        pen.apply(ToolEvent::ToEraseUsing).unwrap();
        assert!(pen.eraser().is_erasing());
        let eraser = pen.eraser().clone();
        assert!(pen.erase_contact(&eraser, id));
        assert!(pen.pool().is_empty());
    }

    #[test]
    fn test_leaving_erase_using_stops_erasing() {
        let mut pen = pen();
        pen.apply(ToolEvent::ToEraseUsing).unwrap();
        assert!(pen.eraser().is_erasing());
        let effects = pen.apply(ToolEvent::ToPenUsing).unwrap();
        assert_eq!(
            effects,
            &[SideEffect::FinishErasing, SideEffect::ToPen, SideEffect::StartDrawing]
        );
        assert!(!pen.eraser().is_erasing());
        assert!(!pen.eraser().is_active());
        assert!(pen.ink().is_some());
    }

    #[test]
    fn test_holder_smooths_spawn_target() {
        let mut pen = pen();
        pen.on_pickup();
        pen.update(0.01, Pose::from_position(Vec3::X));
        let x = pen.spawn_target().position.x;
        assert!(x > 0.0 && x < 1.0);

        pen.on_drop();
        pen.update(0.01, Pose::from_position(Vec3::X));
        assert_eq!(pen.spawn_target().position, Vec3::X);
    }

    #[test]
    fn test_respawn_drops_and_resets_when_owner() {
        let mut pen = pen();
        pen.set_local_pose(Pose::from_position(Vec3::ONE));
        pen.on_pickup();
        assert_eq!(pen.respawn(), vec![ToolEvent::ToPenIdle]);
        assert!(!pen.is_held());
        assert_eq!(pen.local_pose().position, Vec3::ONE);

        pen.set_owner(true);
        assert!(pen.respawn().is_empty());
        assert_eq!(*pen.local_pose(), Pose::IDENTITY);
    }

    #[test]
    fn test_pen_rejects_standalone_eraser_events() {
        let mut pen = pen();
        assert!(matches!(
            pen.apply(ToolEvent::StartErasing),
            Err(ToolError::NotApplicable { kind: "pen", .. })
        ));
    }
}
