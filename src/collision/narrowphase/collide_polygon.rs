use super::manifold::{
    ClipVertex, ContactFeature, ContactFeatureType, Manifold, ManifoldPoint, ManifoldType,
    clip_segment_to_line,
};
use crate::{
    collision::shapes::PolygonShape,
    math::{Transform, Vec2Ext},
};

/// Reference-face selection bias: prefer A unless B is clearly better.
pub(crate) const RELATIVE_TOL: f32 = 0.98;
pub(crate) const ABSOLUTE_TOL: f32 = 0.001;

#[inline]
const fn next_index(i: usize, count: usize) -> usize {
    if i + 1 < count { i + 1 } else { 0 }
}

#[inline]
const fn prev_index(i: usize, count: usize) -> usize {
    if i > 0 { i - 1 } else { count - 1 }
}

/// Separation of `poly2` along the normal of `edge1` on `poly1`.
fn edge_separation(
    poly1: &PolygonShape,
    xf1: &Transform,
    edge1: usize,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> f32 {
    debug_assert!(edge1 < poly1.count());

    // Normal from poly1's frame into poly2's frame.
    let normal1_world = xf1.q.mul(poly1.normals[edge1]);
    let normal1 = xf2.q.mul_t(normal1_world);

    // Support vertex on poly2 for -normal.
    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, v) in poly2.vertices.iter().enumerate() {
        let dot = v.dot(normal1);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let v1 = xf1.mul(poly1.vertices[edge1]);
    let v2 = xf2.mul(poly2.vertices[index]);
    (v2 - v1).dot(normal1_world)
}

/// Hill-climbs over the edge normals of `poly1`, starting from the one facing `poly2`.
/// Returns the best edge and its separation.
fn find_max_separation(
    poly1: &PolygonShape,
    xf1: &Transform,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> (usize, f32) {
    let count1 = poly1.count();

    // Body origins stand in for the centroids.
    let d_local1 = xf1.q.mul_t(xf2.p - xf1.p);

    let mut edge = 0;
    let mut max_dot = -f32::MAX;
    for (i, n) in poly1.normals.iter().enumerate() {
        let dot = n.dot(d_local1);
        if dot > max_dot {
            max_dot = dot;
            edge = i;
        }
    }

    let s = edge_separation(poly1, xf1, edge, poly2, xf2);

    let prev_edge = prev_index(edge, count1);
    let s_prev = edge_separation(poly1, xf1, prev_edge, poly2, xf2);

    let next_edge = next_index(edge, count1);
    let s_next = edge_separation(poly1, xf1, next_edge, poly2, xf2);

    let (mut best_edge, mut best_separation, forward) = if s_prev > s && s_prev > s_next {
        (prev_edge, s_prev, false)
    } else if s_next > s {
        (next_edge, s_next, true)
    } else {
        return (edge, s);
    };

    loop {
        let edge = if forward {
            next_index(best_edge, count1)
        } else {
            prev_index(best_edge, count1)
        };

        let s = edge_separation(poly1, xf1, edge, poly2, xf2);
        if s > best_separation {
            best_edge = edge;
            best_separation = s;
        } else {
            break;
        }
    }

    (best_edge, best_separation)
}

/// The edge of `poly2` most anti-parallel to `edge1` of `poly1`, in world space.
fn find_incident_edge(
    poly1: &PolygonShape,
    xf1: &Transform,
    edge1: usize,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    debug_assert!(edge1 < poly1.count());

    let normal1 = xf2.q.mul_t(xf1.q.mul(poly1.normals[edge1]));

    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in poly2.normals.iter().enumerate() {
        let dot = normal1.dot(*n);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = next_index(i1, poly2.count());

    let clip_vertex = |i: usize| ClipVertex {
        v: xf2.mul(poly2.vertices[i]),
        id: ContactFeature::new(
            edge1 as u8,
            i as u8,
            ContactFeatureType::Face,
            ContactFeatureType::Vertex,
        )
        .into(),
    };

    [clip_vertex(i1), clip_vertex(i2)]
}

/// SAT with clipping. The reference face is the one with the larger separation,
/// biased toward polygon A to keep the normal from flickering between frames.
pub fn collide_polygons(
    manifold: &mut Manifold,
    poly_a: &PolygonShape,
    xf_a: &Transform,
    poly_b: &PolygonShape,
    xf_b: &Transform,
) {
    manifold.clear();
    let total_radius = poly_a.radius + poly_b.radius;

    let (edge_a, separation_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return;
    }

    let (edge_b, separation_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return;
    }

    let (poly1, poly2, xf1, xf2, edge1, flip) =
        if separation_b > RELATIVE_TOL * separation_a + ABSOLUTE_TOL {
            manifold.manifold_type = ManifoldType::FaceB;
            (poly_b, poly_a, xf_b, xf_a, edge_b, true)
        } else {
            manifold.manifold_type = ManifoldType::FaceA;
            (poly_a, poly_b, xf_a, xf_b, edge_a, false)
        };

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let iv1 = edge1;
    let iv2 = next_index(edge1, poly1.count());

    let v11 = poly1.vertices[iv1];
    let v12 = poly1.vertices[iv2];

    let local_tangent = (v12 - v11).normalize();
    let local_normal = local_tangent.cross_s(1.0);
    let plane_point = 0.5 * (v11 + v12);

    let tangent = xf1.q.mul(local_tangent);
    let normal = tangent.cross_s(1.0);

    let v11 = xf1.mul(v11);
    let v12 = xf1.mul(v12);

    let front_offset = normal.dot(v11);

    // Side offsets, extended by the skin.
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    let clip_points1 = clip_segment_to_line(&incident_edge, -tangent, side_offset1, iv1 as u8);
    let Ok(clip_points1) = <[ClipVertex; 2]>::try_from(clip_points1.as_slice()) else {
        return;
    };

    let clip_points2 = clip_segment_to_line(&clip_points1, tangent, side_offset2, iv2 as u8);
    if clip_points2.len() < 2 {
        return;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    for cv in &clip_points2 {
        let separation = normal.dot(cv.v) - front_offset;
        if separation <= total_radius {
            let id = if flip {
                cv.id.features().swapped().into()
            } else {
                cv.id
            };

            manifold
                .points
                .push(ManifoldPoint::new(xf2.mul_t(cv.v), id));
        }
    }
}
