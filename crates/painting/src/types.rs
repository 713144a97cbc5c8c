use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identifier of an ink object, unique within the pen that created it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InkId(pub u64);

impl std::fmt::Display for InkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ink#{}", self.0)
    }
}

/// World-space position and orientation of an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Pose at the origin with no rotation
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with no rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Local-to-world transform
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.position)
    }

    /// Map a local-space point into world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Map a world-space point into this pose's local space
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Move toward `target` by fraction `t` (clamped to 0..=1)
    pub fn lerp_toward(&self, target: &Pose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        Pose {
            position: self.position.lerp(target.position, t),
            rotation: self.rotation.slerp(target.rotation, t).normalize(),
        }
    }
}

/// Name and layer that identify an object as ink to an eraser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkTag {
    pub name: String,
    pub layer: u8,
}

impl InkTag {
    /// True when the tag carries the ink layer and its name starts with `prefix`
    pub fn is_ink(&self, ink_layer: u8, prefix: &str) -> bool {
        self.layer == ink_layer && self.name.starts_with(prefix)
    }
}
