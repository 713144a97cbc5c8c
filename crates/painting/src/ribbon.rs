//! Ribbon collider meshing for finished ink.
//!
//! A stroke's centerline becomes a thin double-sided strip: every sample
//! contributes two vertices offset along the stroke's local X axis, and every
//! pair of consecutive samples is stitched with two triangles. The same mesh
//! serves as the render mesh and as the collision volume an eraser overlaps.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{INDICES_PER_SEGMENT, MIN_RIBBON_POINTS, VERTICES_PER_POINT};
use crate::types::Pose;

/// Interleaved vertex layout for GPU upload
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct RibbonVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Triangle-list mesh built from a stroke centerline, in the stroke's local space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RibbonMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of centerline samples the mesh was built from
    pub fn point_count(&self) -> usize {
        self.positions.len() / VERTICES_PER_POINT
    }

    /// Iterate triangles as vertex position triples
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }

    /// Interleave positions and normals for a vertex buffer
    pub fn interleaved(&self) -> Vec<RibbonVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| RibbonVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect()
    }

    /// Raw bytes of the interleaved vertex buffer
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.interleaved()).to_vec()
    }

    /// True when every position and normal is finite and every index is in range
    pub fn is_well_formed(&self) -> bool {
        let count = self.positions.len() as u32;
        !self.positions.is_empty()
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self.normals.len() == self.positions.len()
            && self.positions.iter().all(|p| p.is_finite())
            && self.normals.iter().all(|n| n.is_finite())
            && self.indices.iter().all(|&i| i < count)
    }

    /// Convert to a Bevy mesh usable for rendering and as a collider source
    #[cfg(feature = "bevy")]
    pub fn to_bevy_mesh(&self) -> bevy::prelude::Mesh {
        use bevy::asset::RenderAssetUsages;
        use bevy::mesh::{Indices, PrimitiveTopology};
        use bevy::prelude::Mesh;

        let positions: Vec<[f32; 3]> = self.positions.iter().map(|p| p.to_array()).collect();
        let normals: Vec<[f32; 3]> = self.normals.iter().map(|n| n.to_array()).collect();

        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_indices(Indices::U32(self.indices.clone()));
        mesh
    }
}

/// Replacement centerline for a trail that recorded fewer than two samples:
/// a short vertical segment hanging from `origin`.
pub fn degenerate_centerline(origin: Vec3, half_width: f32) -> [Vec3; 2] {
    [origin, origin + Vec3::NEG_Y * half_width]
}

/// Build a ribbon from world-space centerline `points`, expressed in `frame`'s local space.
///
/// Callers must pass at least [`MIN_RIBBON_POINTS`] samples; shorter input is
/// padded with [`degenerate_centerline`] at the frame origin so the output is
/// never empty.
pub fn build_ribbon(points: &[Vec3], frame: &Pose, half_width: f32) -> RibbonMesh {
    let fallback;
    let points = if points.len() < MIN_RIBBON_POINTS {
        tracing::debug!(
            "build_ribbon: {} samples, substituting a minimal segment",
            points.len()
        );
        fallback = degenerate_centerline(frame.position, half_width);
        &fallback[..]
    } else {
        points
    };

    let point_count = points.len();
    let offset = Vec3::X * half_width;

    let mut positions = Vec::with_capacity(point_count * VERTICES_PER_POINT);
    for &world in points {
        let local = frame.inverse_transform_point(world);
        positions.push(local + offset);
        positions.push(local - offset);
    }

    let mut indices = Vec::with_capacity((point_count - 1) * INDICES_PER_SEGMENT);
    for segment in 0..point_count - 1 {
        let base = (segment * VERTICES_PER_POINT) as u32;
        indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base + 3,
            base + 2,
            base + 1,
        ]);
    }

    let normals = recalculate_normals(&positions, &indices);

    RibbonMesh {
        positions,
        normals,
        indices,
    }
}

/// Area-weighted vertex normals; vertices on zero-area triangles get +Z.
fn recalculate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn line(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(0.0, 0.0, i as f32 * 0.1)).collect()
    }

    #[test]
    fn test_buffer_sizes_follow_point_count() {
        for n in [2, 3, 10, 57] {
            let mesh = build_ribbon(&line(n), &Pose::IDENTITY, 0.005);
            assert_eq!(mesh.vertex_count(), 2 * n);
            assert_eq!(mesh.indices.len(), 6 * (n - 1));
            assert_eq!(mesh.point_count(), n);
            assert!(mesh.is_well_formed());
        }
    }

    #[test]
    fn test_segment_index_pattern() {
        let mesh = build_ribbon(&line(3), &Pose::IDENTITY, 0.005);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 2, 1, 2, 3, 4, 5, 4, 3]);
    }

    #[test]
    fn test_vertices_offset_along_local_x() {
        let mesh = build_ribbon(&line(2), &Pose::IDENTITY, 0.005);
        assert_eq!(mesh.positions[0], Vec3::new(0.005, 0.0, 0.0));
        assert_eq!(mesh.positions[1], Vec3::new(-0.005, 0.0, 0.0));
        assert!((mesh.positions[2] - Vec3::new(0.005, 0.0, 0.1)).length() < 1e-6);
    }

    #[test]
    fn test_identical_points_stay_well_formed() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let mesh = build_ribbon(&[p, p], &Pose::IDENTITY, 0.005);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.is_well_formed());
    }

    #[test]
    fn test_short_input_is_padded() {
        let frame = Pose::from_position(Vec3::new(2.0, 3.0, 4.0));
        let empty = build_ribbon(&[], &frame, 0.005);
        let single = build_ribbon(&[Vec3::ONE], &frame, 0.005);
        for mesh in [empty, single] {
            assert_eq!(mesh.vertex_count(), 4);
            assert_eq!(mesh.indices.len(), 6);
            assert!(mesh.is_well_formed());
            // Frame origin maps to local zero; second point hangs below it
            assert!((mesh.positions[0] - Vec3::new(0.005, 0.0, 0.0)).length() < 1e-6);
            assert!((mesh.positions[2] - Vec3::new(0.005, -0.005, 0.0)).length() < 1e-6);
        }
    }

    #[test]
    fn test_mesh_is_in_frame_local_space() {
        let frame = Pose::new(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_z(0.7));
        let world = [frame.transform_point(Vec3::ZERO), frame.transform_point(Vec3::Y)];
        let mesh = build_ribbon(&world, &frame, 0.01);
        assert!((mesh.positions[0] - Vec3::new(0.01, 0.0, 0.0)).length() < 1e-5);
        assert!((mesh.positions[3] - Vec3::new(-0.01, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_normals_are_unit_length() {
        let mesh = build_ribbon(&line(4), &Pose::IDENTITY, 0.005);
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertex_bytes_layout() {
        let mesh = build_ribbon(&line(2), &Pose::IDENTITY, 0.005);
        let bytes = mesh.vertex_bytes();
        assert_eq!(bytes.len(), mesh.vertex_count() * std::mem::size_of::<RibbonVertex>());
        assert_eq!(std::mem::size_of::<RibbonVertex>(), 24);
    }
}
