//! Trail sampling for in-progress ink.
//!
//! A trail records the centerline of a stroke while the pen is drawing. The
//! recording primitive itself belongs to the host (renderer or physics); this
//! module defines the contract the rest of the crate relies on and a plain
//! in-memory recorder.

use glam::Vec3;

/// Records world-space positions over time for one stroke
pub trait TrailSampler: Send {
    /// Offer a new position. Ignored while the sampler is disabled.
    fn sample(&mut self, position: Vec3);

    /// Copy every recorded position into `buffer` (replacing its contents)
    /// and return how many there are.
    fn positions(&self, buffer: &mut Vec<Vec3>) -> usize;

    /// Turn recording on or off
    fn set_enabled(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;
}

/// In-memory trail that keeps every sample at least `min_distance` apart
#[derive(Debug, Clone, Default)]
pub struct RecordedTrail {
    points: Vec<Vec3>,
    enabled: bool,
    min_distance: f32,
}

impl RecordedTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trail that drops samples closer than `min_distance` to the previous one
    pub fn with_min_distance(min_distance: f32) -> Self {
        Self {
            min_distance: min_distance.max(0.0),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl TrailSampler for RecordedTrail {
    fn sample(&mut self, position: Vec3) {
        if !self.enabled {
            return;
        }
        if let Some(last) = self.points.last() {
            if self.min_distance > 0.0 && last.distance(position) < self.min_distance {
                return;
            }
        }
        self.points.push(position);
    }

    fn positions(&self, buffer: &mut Vec<Vec3>) -> usize {
        buffer.clear();
        buffer.extend_from_slice(&self.points);
        buffer.len()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
