//! Erasers: the overlap gate and the standalone eraser tool.

use inkwell_ipc::ToolEvent;
use painting::{InkTag, Pose};

use crate::error::ToolError;

/// Default radius of the eraser contact sphere
pub const DEFAULT_ERASER_RADIUS: f32 = 0.03;

/// Material shown on the eraser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraserVisual {
    #[default]
    Normal,
    Erasing,
}

/// Eraser volume. Destroys ink it touches only while active and erasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Eraser {
    active: bool,
    erasing: bool,
    visual: EraserVisual,
    radius: f32,
}

impl Default for Eraser {
    fn default() -> Self {
        Self {
            active: true,
            erasing: false,
            visual: EraserVisual::Normal,
            radius: DEFAULT_ERASER_RADIUS,
        }
    }
}

impl Eraser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Eraser that starts hidden, as the half of a pen/eraser pair
    pub fn paired() -> Self {
        Self {
            active: false,
            ..Self::default()
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_erasing(&mut self) {
        self.erasing = true;
        self.visual = EraserVisual::Erasing;
    }

    pub fn finish_erasing(&mut self) {
        self.erasing = false;
        self.visual = EraserVisual::Normal;
    }

    pub fn is_erasing(&self) -> bool {
        self.erasing
    }

    pub fn visual(&self) -> EraserVisual {
        self.visual
    }

    pub(crate) fn set_visual(&mut self, visual: EraserVisual) {
        self.visual = visual;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Contact gate: should touching an object with `tag` destroy it?
    pub fn should_erase(&self, tag: &InkTag, ink_layer: u8, ink_prefix: &str) -> bool {
        self.active && self.erasing && tag.is_ink(ink_layer, ink_prefix)
    }
}

/// An eraser with its own pickup, not paired with a pen.
///
/// Use-down/up broadcast `StartErasing`/`FinishErasing`; every replica flips
/// the gate on delivery.
#[derive(Debug, Clone, Default)]
pub struct StandaloneEraser {
    eraser: Eraser,
    held: bool,
    owner: bool,
    local_pose: Pose,
}

impl StandaloneEraser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eraser(&self) -> &Eraser {
        &self.eraser
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn set_owner(&mut self, owner: bool) {
        self.owner = owner;
    }

    pub fn local_pose(&self) -> &Pose {
        &self.local_pose
    }

    pub fn set_local_pose(&mut self, pose: Pose) {
        self.local_pose = pose;
    }

    pub fn on_pickup(&mut self) {
        self.held = true;
        self.eraser.set_visual(EraserVisual::Normal);
    }

    /// Dropped erasers show the erasing material while they lie around.
    pub fn on_drop(&mut self) {
        self.held = false;
        self.eraser.set_visual(EraserVisual::Erasing);
    }

    pub fn on_use_down(&self) -> ToolEvent {
        ToolEvent::StartErasing
    }

    pub fn on_use_up(&self) -> ToolEvent {
        ToolEvent::FinishErasing
    }

    /// Apply a replicated event
    pub fn apply(&mut self, event: ToolEvent) -> Result<(), ToolError> {
        match event {
            ToolEvent::StartErasing => self.eraser.start_erasing(),
            ToolEvent::FinishErasing => self.eraser.finish_erasing(),
            other => {
                return Err(ToolError::NotApplicable {
                    event: other.name(),
                    kind: "standalone eraser",
                })
            }
        }
        Ok(())
    }

    /// Drop if held; return to the local origin if this replica owns the eraser
    pub fn respawn(&mut self) {
        if self.held {
            self.on_drop();
        }
        if self.owner {
            self.local_pose = Pose::IDENTITY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ink_tag() -> InkTag {
        InkTag {
            name: "Ink000001".to_string(),
            layer: 17,
        }
    }

    #[test]
    fn test_gate_follows_erasing_flag() {
        let mut eraser = Eraser::new();
        assert!(!eraser.should_erase(&ink_tag(), 17, "Ink"));

        eraser.start_erasing();
        assert_eq!(eraser.visual(), EraserVisual::Erasing);
        assert!(eraser.should_erase(&ink_tag(), 17, "Ink"));

        eraser.finish_erasing();
        assert_eq!(eraser.visual(), EraserVisual::Normal);
        assert!(!eraser.should_erase(&ink_tag(), 17, "Ink"));
    }

    #[test]
    fn test_gate_ignores_untagged_objects() {
        let mut eraser = Eraser::new();
        eraser.start_erasing();
        let wall = InkTag {
            name: "Wall".to_string(),
            layer: 17,
        };
        let wrong_layer = InkTag {
            name: "Ink000001".to_string(),
            layer: 0,
        };
        assert!(!eraser.should_erase(&wall, 17, "Ink"));
        assert!(!eraser.should_erase(&wrong_layer, 17, "Ink"));
    }

    #[test]
    fn test_hidden_eraser_never_erases() {
        let mut eraser = Eraser::paired();
        eraser.start_erasing();
        assert!(!eraser.should_erase(&ink_tag(), 17, "Ink"));
    }

    #[test]
    fn test_standalone_events() {
        let mut standalone = StandaloneEraser::new();
        standalone.apply(standalone.on_use_down()).unwrap();
        assert!(standalone.eraser().is_erasing());
        standalone.apply(standalone.on_use_up()).unwrap();
        assert!(!standalone.eraser().is_erasing());
        assert!(standalone.apply(ToolEvent::ToPenUsing).is_err());
    }

    #[test]
    fn test_standalone_pickup_drop_visuals_and_respawn() {
        let mut standalone = StandaloneEraser::new();
        standalone.set_owner(true);
        standalone.set_local_pose(Pose::from_position(Vec3::ONE));

        standalone.on_pickup();
        assert_eq!(standalone.eraser().visual(), EraserVisual::Normal);

        standalone.respawn();
        assert!(!standalone.is_held());
        assert_eq!(standalone.eraser().visual(), EraserVisual::Erasing);
        assert_eq!(*standalone.local_pose(), Pose::IDENTITY);
    }
}
