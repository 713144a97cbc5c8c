//! Overlap queries between an eraser volume and ink colliders.
//!
//! Erasers are treated as spheres. A contact is reported when the sphere
//! reaches any triangle of an ink ribbon. Ribbons are thin, so this is the
//! coarse collision the eraser relies on rather than a tube test.

use glam::Vec3;

use crate::ribbon::RibbonMesh;
use crate::types::Pose;

/// Closest point on triangle `(a, b, c)` to `p`.
///
/// Region-based test from Ericson, "Real-Time Collision Detection" 5.1.5.
/// Degenerate triangles fall through to their edges and vertices.
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = va + vb + vc;
    if denom.abs() < f32::EPSILON {
        // Collinear corners that slipped past the region tests
        return [a, b, c]
            .into_iter()
            .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
            .unwrap_or(a);
    }
    let v = vb / denom;
    let w = vc / denom;
    a + ab * v + ac * w
}

/// Does a sphere at world `center` reach the ribbon owned by an object at `frame`?
pub fn sphere_touches_ribbon(center: Vec3, radius: f32, frame: &Pose, mesh: &RibbonMesh) -> bool {
    let local = frame.inverse_transform_point(center);
    let radius_sq = radius * radius;
    mesh.triangles().any(|[a, b, c]| {
        closest_point_on_triangle(local, a, b, c).distance_squared(local) <= radius_sq
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ribbon::build_ribbon;

    #[test]
    fn test_closest_point_regions() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        // Inside the face
        let inside = closest_point_on_triangle(Vec3::new(0.25, 0.25, 1.0), a, b, c);
        assert!((inside - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-6);
        // Vertex region
        assert_eq!(closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c), a);
        // Edge region
        let edge = closest_point_on_triangle(Vec3::new(0.5, -1.0, 0.0), a, b, c);
        assert!((edge - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_does_not_produce_nan() {
        let p = Vec3::ONE;
        let q = closest_point_on_triangle(Vec3::ZERO, p, p, p);
        assert_eq!(q, p);
    }

    #[test]
    fn test_sphere_touches_ribbon() {
        let frame = Pose::from_position(Vec3::new(0.0, 1.0, 0.0));
        let points = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0)];
        let mesh = build_ribbon(&points, &frame, 0.005);

        assert!(sphere_touches_ribbon(Vec3::new(0.0, 1.02, 0.5), 0.03, &frame, &mesh));
        assert!(!sphere_touches_ribbon(Vec3::new(0.0, 1.2, 0.5), 0.03, &frame, &mesh));
        assert!(!sphere_touches_ribbon(Vec3::new(0.0, 1.0, 1.5), 0.03, &frame, &mesh));
    }
}
