use arrayvec::ArrayVec;
use glam::Vec2;

use super::{
    collide_polygon::{ABSOLUTE_TOL, RELATIVE_TOL},
    manifold::{
        ClipVertex, ContactFeature, ContactFeatureType, ContactId, Manifold, ManifoldPoint,
        ManifoldType, clip_segment_to_line,
    },
};
use crate::{
    collision::shapes::{CircleShape, EdgeShape, PolygonShape},
    math::{Transform, Vec2Ext},
    settings::{ANGULAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS},
};

/// Collides an edge with a circle, honouring the ghost vertices so a circle
/// rolling over a chain of edges does not snag on interior corners.
pub fn collide_edge_and_circle(
    manifold: &mut Manifold,
    edge_a: &EdgeShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) {
    manifold.clear();

    // Circle center in the edge's frame.
    let q = xf_a.mul_t(xf_b.mul(circle_b.position));

    let a = edge_a.vertex1;
    let b = edge_a.vertex2;
    let e = b - a;

    // Barycentric coordinates.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let radius = edge_a.radius + circle_b.radius;
    let vertex_hit = |index_a: u8, type_a: ContactFeatureType| -> ContactId {
        ContactFeature::new(index_a, 0, type_a, ContactFeatureType::Vertex).into()
    };

    // Region A
    if v <= 0.0 {
        if q.distance_squared(a) > radius * radius {
            return;
        }

        // The previous edge owns this region.
        if edge_a.has_vertex0 {
            let e1 = a - edge_a.vertex0;
            if e1.dot(a - q) > 0.0 {
                return;
            }
        }

        manifold.set_single(
            ManifoldType::Circles,
            Vec2::ZERO,
            a,
            ManifoldPoint::new(
                circle_b.position,
                vertex_hit(0, ContactFeatureType::Vertex),
            ),
        );
        return;
    }

    // Region B
    if u <= 0.0 {
        if q.distance_squared(b) > radius * radius {
            return;
        }

        // The next edge owns this region.
        if edge_a.has_vertex3 {
            let e2 = edge_a.vertex3 - b;
            if e2.dot(q - b) > 0.0 {
                return;
            }
        }

        manifold.set_single(
            ManifoldType::Circles,
            Vec2::ZERO,
            b,
            ManifoldPoint::new(
                circle_b.position,
                vertex_hit(1, ContactFeatureType::Vertex),
            ),
        );
        return;
    }

    // Region AB
    let den = e.length_squared();
    debug_assert!(den > 0.0);
    let p = (u * a + v * b) / den;
    if q.distance_squared(p) > radius * radius {
        return;
    }

    let mut n = Vec2::new(-e.y, e.x);
    if n.dot(q - a) < 0.0 {
        n = -n;
    }

    manifold.set_single(
        ManifoldType::FaceA,
        n.normalize(),
        a,
        ManifoldPoint::new(circle_b.position, vertex_hit(0, ContactFeatureType::Face)),
    );
}

/// Collides an edge with a polygon using the edge's neighbourhood to restrict
/// the admissible normals.
pub fn collide_edge_and_polygon(
    manifold: &mut Manifold,
    edge_a: &EdgeShape,
    xf_a: &Transform,
    polygon_b: &PolygonShape,
    xf_b: &Transform,
) {
    EpCollider::new(edge_a, xf_a, polygon_b, xf_b).collide(manifold, polygon_b);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EpAxisType {
    EdgeA,
    EdgeB,
}

#[derive(Clone, Copy, Debug)]
struct EpAxis {
    axis_type: EpAxisType,
    index: usize,
    separation: f32,
}

/// Reference face used for clipping.
struct ReferenceFace {
    i1: usize,
    i2: usize,
    v1: Vec2,
    v2: Vec2,
    normal: Vec2,
    side_normal1: Vec2,
    side_offset1: f32,
    side_normal2: Vec2,
    side_offset2: f32,
}

impl ReferenceFace {
    fn new(i1: usize, i2: usize, v1: Vec2, v2: Vec2, normal: Vec2) -> Self {
        let side_normal1 = normal.cross_s(1.0);
        let side_normal2 = -side_normal1;
        Self {
            i1,
            i2,
            v1,
            v2,
            normal,
            side_normal1,
            side_offset1: side_normal1.dot(v1),
            side_normal2,
            side_offset2: side_normal2.dot(v2),
        }
    }
}

/// Polygon B expressed in the edge's frame.
struct TempPolygon {
    vertices: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
    normals: ArrayVec<Vec2, MAX_POLYGON_VERTICES>,
}

impl TempPolygon {
    #[inline]
    fn count(&self) -> usize {
        self.vertices.len()
    }
}

struct EpCollider {
    polygon_b: TempPolygon,
    /// Transform of B relative to A.
    xf: Transform,
    v1: Vec2,
    v2: Vec2,
    normal1: Vec2,
    normal: Vec2,
    lower_limit: Vec2,
    upper_limit: Vec2,
    radius: f32,
    front: bool,
}

impl EpCollider {
    // 1. classify v1 and v2 as convex or concave
    // 2. classify the polygon origin as front or back
    // 3. pick the normal and the admissible normal range from the table below
    fn new(
        edge_a: &EdgeShape,
        xf_a: &Transform,
        polygon_b: &PolygonShape,
        xf_b: &Transform,
    ) -> Self {
        let xf = xf_a.mul_t_xf(xf_b);
        // The body origin stands in for the polygon centroid.
        let centroid_b = xf.p;

        let v0 = edge_a.vertex0;
        let v1 = edge_a.vertex1;
        let v2 = edge_a.vertex2;
        let v3 = edge_a.vertex3;

        let edge1 = (v2 - v1).normalize_or_zero();
        let normal1 = edge1.cross_s(1.0);
        let offset1 = normal1.dot(centroid_b - v1);

        let (normal0, offset0, convex1) = if edge_a.has_vertex0 {
            let edge0 = (v1 - v0).normalize_or_zero();
            let normal0 = edge0.cross_s(1.0);
            (normal0, normal0.dot(centroid_b - v0), edge0.perp_dot(edge1) >= 0.0)
        } else {
            (Vec2::ZERO, 0.0, false)
        };

        let (normal2, offset2, convex2) = if edge_a.has_vertex3 {
            let edge2 = (v3 - v2).normalize_or_zero();
            let normal2 = edge2.cross_s(1.0);
            (normal2, normal2.dot(centroid_b - v2), edge1.perp_dot(edge2) > 0.0)
        } else {
            (Vec2::ZERO, 0.0, false)
        };

        // (front, front lower/upper, back lower/upper)
        let (front, limits_front, limits_back) = match (edge_a.has_vertex0, edge_a.has_vertex3) {
            (true, true) => match (convex1, convex2) {
                (true, true) => (
                    offset0 >= 0.0 || offset1 >= 0.0 || offset2 >= 0.0,
                    (normal0, normal2),
                    (-normal1, -normal1),
                ),
                (true, false) => (
                    offset0 >= 0.0 || (offset1 >= 0.0 && offset2 >= 0.0),
                    (normal0, normal1),
                    (-normal2, -normal1),
                ),
                (false, true) => (
                    offset2 >= 0.0 || (offset0 >= 0.0 && offset1 >= 0.0),
                    (normal1, normal2),
                    (-normal1, -normal0),
                ),
                (false, false) => (
                    offset0 >= 0.0 && offset1 >= 0.0 && offset2 >= 0.0,
                    (normal1, normal1),
                    (-normal2, -normal0),
                ),
            },
            (true, false) => {
                if convex1 {
                    (
                        offset0 >= 0.0 || offset1 >= 0.0,
                        (normal0, -normal1),
                        (normal1, -normal1),
                    )
                } else {
                    (
                        offset0 >= 0.0 && offset1 >= 0.0,
                        (normal1, -normal1),
                        (normal1, -normal0),
                    )
                }
            }
            (false, true) => {
                if convex2 {
                    (
                        offset1 >= 0.0 || offset2 >= 0.0,
                        (-normal1, normal2),
                        (-normal1, normal1),
                    )
                } else {
                    (
                        offset1 >= 0.0 && offset2 >= 0.0,
                        (-normal1, normal1),
                        (-normal2, normal1),
                    )
                }
            }
            (false, false) => (offset1 >= 0.0, (-normal1, -normal1), (normal1, normal1)),
        };

        let (normal, (lower_limit, upper_limit)) = if front {
            (normal1, limits_front)
        } else {
            (-normal1, limits_back)
        };

        let polygon_b = TempPolygon {
            vertices: polygon_b.vertices.iter().map(|&v| xf.mul(v)).collect(),
            normals: polygon_b.normals.iter().map(|&n| xf.q.mul(n)).collect(),
        };

        Self {
            polygon_b,
            xf,
            v1,
            v2,
            normal1,
            normal,
            lower_limit,
            upper_limit,
            radius: 2.0 * POLYGON_RADIUS,
            front,
        }
    }

    fn collide(&self, manifold: &mut Manifold, polygon_b: &PolygonShape) {
        manifold.clear();

        let edge_axis = self.compute_edge_separation();
        if edge_axis.separation > self.radius {
            return;
        }

        let polygon_axis = self.compute_polygon_separation();
        if polygon_axis.is_some_and(|axis| axis.separation > self.radius) {
            return;
        }

        let primary_axis = match polygon_axis {
            Some(axis) if axis.separation > RELATIVE_TOL * edge_axis.separation + ABSOLUTE_TOL => {
                axis
            }
            _ => edge_axis,
        };

        let count = self.polygon_b.count();
        let (incident, rf) = if primary_axis.axis_type == EpAxisType::EdgeA {
            manifold.manifold_type = ManifoldType::FaceA;

            // Polygon normal most anti-parallel to the edge normal.
            let best_index = self
                .polygon_b
                .normals
                .iter()
                .map(|n| self.normal.dot(*n))
                .enumerate()
                .fold((0, f32::MAX), |best, (i, value)| {
                    if value < best.1 { (i, value) } else { best }
                })
                .0;

            let i1 = best_index;
            let i2 = if i1 + 1 < count { i1 + 1 } else { 0 };

            let clip_vertex = |i: usize| ClipVertex {
                v: self.polygon_b.vertices[i],
                id: ContactFeature::new(
                    0,
                    i as u8,
                    ContactFeatureType::Face,
                    ContactFeatureType::Vertex,
                )
                .into(),
            };

            let rf = if self.front {
                ReferenceFace::new(0, 1, self.v1, self.v2, self.normal1)
            } else {
                ReferenceFace::new(1, 0, self.v2, self.v1, -self.normal1)
            };

            ([clip_vertex(i1), clip_vertex(i2)], rf)
        } else {
            manifold.manifold_type = ManifoldType::FaceB;

            let clip_vertex = |v: Vec2| ClipVertex {
                v,
                id: ContactFeature::new(
                    0,
                    primary_axis.index as u8,
                    ContactFeatureType::Vertex,
                    ContactFeatureType::Face,
                )
                .into(),
            };

            let i1 = primary_axis.index;
            let i2 = if i1 + 1 < count { i1 + 1 } else { 0 };
            let rf = ReferenceFace::new(
                i1,
                i2,
                self.polygon_b.vertices[i1],
                self.polygon_b.vertices[i2],
                self.polygon_b.normals[i1],
            );

            ([clip_vertex(self.v1), clip_vertex(self.v2)], rf)
        };

        // Clip the incident edge against the side planes of the reference face.
        let clip_points1 =
            clip_segment_to_line(&incident, rf.side_normal1, rf.side_offset1, rf.i1 as u8);
        let Ok(clip_points1) = <[ClipVertex; 2]>::try_from(clip_points1.as_slice()) else {
            return;
        };

        let clip_points2 =
            clip_segment_to_line(&clip_points1, rf.side_normal2, rf.side_offset2, rf.i2 as u8);
        if clip_points2.len() < 2 {
            return;
        }

        if primary_axis.axis_type == EpAxisType::EdgeA {
            manifold.local_normal = rf.normal;
            manifold.local_point = rf.v1;
        } else {
            manifold.local_normal = polygon_b.normals[rf.i1];
            manifold.local_point = polygon_b.vertices[rf.i1];
        }

        for cv in &clip_points2 {
            let separation = rf.normal.dot(cv.v - rf.v1);
            if separation > self.radius {
                continue;
            }

            let point = if primary_axis.axis_type == EpAxisType::EdgeA {
                ManifoldPoint::new(self.xf.mul_t(cv.v), cv.id)
            } else {
                ManifoldPoint::new(cv.v, cv.id.features().swapped().into())
            };
            manifold.points.push(point);
        }
    }

    fn compute_edge_separation(&self) -> EpAxis {
        let separation = self
            .polygon_b
            .vertices
            .iter()
            .map(|&v| self.normal.dot(v - self.v1))
            .fold(f32::MAX, f32::min);

        EpAxis {
            axis_type: EpAxisType::EdgeA,
            index: usize::from(!self.front),
            separation,
        }
    }

    /// `None` when no polygon normal falls inside the admissible range.
    fn compute_polygon_separation(&self) -> Option<EpAxis> {
        let mut axis: Option<EpAxis> = None;
        let perp = Vec2::new(-self.normal.y, self.normal.x);

        for (i, (&v, &normal)) in self
            .polygon_b
            .vertices
            .iter()
            .zip(&self.polygon_b.normals)
            .enumerate()
        {
            let n = -normal;

            let s1 = n.dot(v - self.v1);
            let s2 = n.dot(v - self.v2);
            let s = s1.min(s2);

            if s > self.radius {
                // No collision.
                return Some(EpAxis {
                    axis_type: EpAxisType::EdgeB,
                    index: i,
                    separation: s,
                });
            }

            // Adjacency.
            let limit = if n.dot(perp) >= 0.0 {
                self.upper_limit
            } else {
                self.lower_limit
            };
            if (n - limit).dot(self.normal) < -ANGULAR_SLOP {
                continue;
            }

            if axis.is_none_or(|best| s > best.separation) {
                axis = Some(EpAxis {
                    axis_type: EpAxisType::EdgeB,
                    index: i,
                    separation: s,
                });
            }
        }

        axis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::narrowphase::manifold::WorldManifold;

    fn ground() -> EdgeShape {
        EdgeShape::new(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0))
    }

    #[test]
    fn circle_regions() {
        let edge = ground();
        let circle = CircleShape::new(0.5);
        let mut m = Manifold::default();

        // Over the middle of the edge.
        let xf = Transform::from_position(Vec2::new(0.5, 0.4));
        collide_edge_and_circle(&mut m, &edge, &Transform::IDENTITY, &circle, &xf);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::FaceA);
        assert!((m.local_normal - Vec2::Y).length() < 1e-6);
        assert_eq!(m.points[0].id.features().type_a, ContactFeatureType::Face);

        // Below the edge flips the normal.
        let xf = Transform::from_position(Vec2::new(0.5, -0.4));
        collide_edge_and_circle(&mut m, &edge, &Transform::IDENTITY, &circle, &xf);
        assert!((m.local_normal + Vec2::Y).length() < 1e-6);

        // Past vertex2.
        let xf = Transform::from_position(Vec2::new(2.3, 0.1));
        collide_edge_and_circle(&mut m, &edge, &Transform::IDENTITY, &circle, &xf);
        assert_eq!(m.point_count(), 1);
        assert_eq!(m.manifold_type, ManifoldType::Circles);
        assert_eq!(m.local_point, Vec2::new(2.0, 0.0));
        assert_eq!(m.points[0].id.features().index_a, 1);

        // Out of reach.
        let xf = Transform::from_position(Vec2::new(0.0, 1.0));
        collide_edge_and_circle(&mut m, &edge, &Transform::IDENTITY, &circle, &xf);
        assert_eq!(m.point_count(), 0);
    }

    #[test]
    fn ghost_vertex_suppresses_corner() {
        // A continuing edge to the left owns the region around vertex1.
        let edge = ground().with_vertex0(Vec2::new(-4.0, 0.0));
        let circle = CircleShape::new(0.5);
        let mut m = Manifold::default();

        let xf = Transform::from_position(Vec2::new(-2.2, 0.3));
        collide_edge_and_circle(&mut m, &edge, &Transform::IDENTITY, &circle, &xf);
        assert_eq!(m.point_count(), 0);

        collide_edge_and_circle(&mut m, &ground(), &Transform::IDENTITY, &circle, &xf);
        assert_eq!(m.point_count(), 1);
    }

    #[test]
    fn box_resting_on_edge() {
        let edge = ground();
        let b = PolygonShape::new_box(0.5, 0.5);
        let xf_b = Transform::from_position(Vec2::new(0.0, 0.5));
        let mut m = Manifold::default();

        collide_edge_and_polygon(&mut m, &edge, &Transform::IDENTITY, &b, &xf_b);
        assert_eq!(m.point_count(), 2);
        assert_eq!(m.manifold_type, ManifoldType::FaceA);
        assert!((m.local_normal - Vec2::Y).length() < 1e-6);

        let wm = WorldManifold::new(&m, &Transform::IDENTITY, edge.radius, &xf_b, b.radius);
        assert!((wm.normal - Vec2::Y).length() < 1e-6);
        for p in &wm.points[..wm.point_count] {
            assert!(p.y.abs() < 0.02);
        }
    }

    #[test]
    fn box_away_from_edge() {
        let b = PolygonShape::new_box(0.5, 0.5);
        let xf_b = Transform::from_position(Vec2::new(0.0, 1.0));
        let mut m = Manifold::default();

        collide_edge_and_polygon(&mut m, &ground(), &Transform::IDENTITY, &b, &xf_b);
        assert_eq!(m.point_count(), 0);
    }
}
