//! Ink objects: one stroke from instantiation to destruction.

use glam::Vec3;

use crate::constants::INK_NAME_DIGITS;
use crate::ribbon::{build_ribbon, RibbonMesh};
use crate::trail::{RecordedTrail, TrailSampler};
use crate::types::{InkId, InkTag, Pose};

/// Name for the `counter`-th ink spawned with `prefix`, e.g. `Ink000042`
pub fn ink_name(prefix: &str, counter: u64) -> String {
    format!("{prefix}{counter:0width$}", width = INK_NAME_DIGITS)
}

/// A single stroke of ink.
///
/// While drawing, the object follows the pen's spawn target and its trail
/// records samples. Once finished it is frozen: the trail is disabled, the
/// ribbon collider is built and only destruction remains.
pub struct InkObject {
    id: InkId,
    tag: InkTag,
    pose: Pose,
    trail: Box<dyn TrailSampler>,
    mesh: Option<RibbonMesh>,
}

impl std::fmt::Debug for InkObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InkObject")
            .field("id", &self.id)
            .field("name", &self.tag.name)
            .field("layer", &self.tag.layer)
            .field("pose", &self.pose)
            .field("recording", &self.trail.is_enabled())
            .field("mesh_vertices", &self.mesh.as_ref().map(|m| m.vertex_count()))
            .finish()
    }
}

impl InkObject {
    /// Spawn ink at `pose` with an in-memory trail, recording enabled
    pub fn spawn(id: InkId, tag: InkTag, pose: Pose) -> Self {
        Self::with_trail(id, tag, pose, Box::new(RecordedTrail::new()))
    }

    /// Spawn ink with a host-provided trail sampler, recording enabled
    pub fn with_trail(id: InkId, tag: InkTag, pose: Pose, mut trail: Box<dyn TrailSampler>) -> Self {
        trail.set_enabled(true);
        Self {
            id,
            tag,
            pose,
            trail,
            mesh: None,
        }
    }

    pub fn id(&self) -> InkId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.tag.name
    }

    pub fn tag(&self) -> &InkTag {
        &self.tag
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Collider mesh, present once the ink is finished
    pub fn mesh(&self) -> Option<&RibbonMesh> {
        self.mesh.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.trail.is_enabled()
    }

    /// Follow the parent while drawing and record the new position
    pub fn follow(&mut self, parent: Pose) {
        if self.is_finished() {
            return;
        }
        self.pose = parent;
        self.trail.sample(parent.position);
    }

    /// Recorded centerline so far
    pub fn samples(&self) -> Vec<Vec3> {
        let mut buffer = Vec::new();
        self.trail.positions(&mut buffer);
        buffer
    }

    /// Stop recording and build the collider in the local space of `frame`.
    ///
    /// Calling this twice rebuilds nothing; the first mesh is kept.
    pub fn finish(&mut self, frame: Pose, half_width: f32) -> &RibbonMesh {
        if self.mesh.is_none() {
            self.trail.set_enabled(false);
            self.pose = frame;
            let points = self.samples();
            let mesh = build_ribbon(&points, &self.pose, half_width);
            tracing::debug!(
                "Finished {} with {} samples -> {} vertices",
                self.tag.name,
                points.len(),
                mesh.vertex_count()
            );
            self.mesh = Some(mesh);
        }
        self.mesh.get_or_insert_with(RibbonMesh::default)
    }

    /// Does an eraser sphere at world `center` touch this ink's collider?
    pub fn touches_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.mesh
            .as_ref()
            .is_some_and(|mesh| crate::contact::sphere_touches_ribbon(center, radius, &self.pose, mesh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(n: u64) -> InkTag {
        InkTag {
            name: ink_name("Ink", n),
            layer: 17,
        }
    }

    #[test]
    fn test_ink_name_is_zero_padded() {
        assert_eq!(ink_name("Ink", 0), "Ink000000");
        assert_eq!(ink_name("Ink", 42), "Ink000042");
        assert_eq!(ink_name("Ink", 1_234_567), "Ink1234567");
    }

    #[test]
    fn test_follow_records_while_drawing() {
        let mut ink = InkObject::spawn(InkId(0), tag(0), Pose::IDENTITY);
        assert!(ink.is_recording());
        ink.follow(Pose::from_position(Vec3::X));
        ink.follow(Pose::from_position(Vec3::Y));
        assert_eq!(ink.samples(), vec![Vec3::X, Vec3::Y]);
        assert_eq!(ink.pose().position, Vec3::Y);
    }

    #[test]
    fn test_finish_builds_mesh_once() {
        let mut ink = InkObject::spawn(InkId(1), tag(1), Pose::IDENTITY);
        ink.follow(Pose::from_position(Vec3::ZERO));
        ink.follow(Pose::from_position(Vec3::Z));
        ink.follow(Pose::from_position(Vec3::Z * 2.0));

        let vertices = ink.finish(Pose::IDENTITY, 0.005).vertex_count();
        assert_eq!(vertices, 6);
        assert!(!ink.is_recording());

        // Late samples are ignored and a second finish keeps the first mesh
        ink.follow(Pose::from_position(Vec3::ONE));
        assert_eq!(ink.finish(Pose::IDENTITY, 0.005).vertex_count(), 6);
    }

    #[test]
    fn test_unsampled_ink_gets_minimal_collider() {
        let mut ink = InkObject::spawn(InkId(2), tag(2), Pose::IDENTITY);
        let mesh = ink.finish(Pose::from_position(Vec3::ONE), 0.005);
        assert_eq!(mesh.point_count(), 2);
        assert!(mesh.is_well_formed());
    }
}
