use arrayvec::ArrayVec;
use glam::Vec2;

use crate::{
    collision::aabb::{Aabb, RayCastInput, RayCastOutput},
    math::{Rot, Transform},
    settings::{EPSILON, MAX_POLYGON_VERTICES, POLYGON_RADIUS},
};

pub type Vertices = ArrayVec<Vec2, MAX_POLYGON_VERTICES>;

/// A convex polygon wound counter-clockwise, with one outward unit normal per edge.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonShape {
    pub vertices: Vertices,
    pub normals: Vertices,
    pub radius: f32,
}

impl PolygonShape {
    /// # Panics
    ///
    /// If `vertices` has fewer than 3 or more than [`MAX_POLYGON_VERTICES`] points,
    /// or if two consecutive points coincide.
    #[must_use]
    pub fn new(vertices: &[Vec2]) -> Self {
        let mut shape = Self {
            vertices: ArrayVec::new(),
            normals: ArrayVec::new(),
            radius: POLYGON_RADIUS,
        };
        shape.set(vertices);
        shape
    }

    /// Axis-aligned box centered on the body origin.
    #[must_use]
    pub fn new_box(half_width: f32, half_height: f32) -> Self {
        Self::new(&[
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    /// Box rotated by `angle` around `center`, both in body-local space.
    #[must_use]
    pub fn new_oriented_box(half_width: f32, half_height: f32, center: Vec2, angle: f32) -> Self {
        let xf = Transform {
            p: center,
            q: Rot::new(angle),
        };
        let corners = [
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ];
        Self::new(&corners.map(|v| xf.mul(v)))
    }

    pub fn set(&mut self, input: &[Vec2]) {
        assert!(
            (3..=MAX_POLYGON_VERTICES).contains(&input.len()),
            "polygon needs 3..={MAX_POLYGON_VERTICES} vertices, got {}",
            input.len()
        );

        self.vertices.clear();
        self.normals.clear();
        self.vertices.extend(input.iter().copied());

        let count = self.vertices.len();
        for i in 0..count {
            let next = if i + 1 < count { i + 1 } else { 0 };
            let edge = self.vertices[next] - self.vertices[i];
            assert!(
                edge.length_squared() > EPSILON * EPSILON,
                "polygon edge {i} has zero length"
            );

            self.normals.push(Vec2::new(edge.y, -edge.x).normalize());
        }
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        let local = xf.q.mul_t(point - xf.p);
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(&v, n)| n.dot(local - v) <= 0.0)
    }

    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let p1 = xf.q.mul_t(input.p1 - xf.p);
        let p2 = xf.q.mul_t(input.p2 - xf.p);
        let d = p2 - p1;

        let mut lower = 0.0;
        let mut upper = input.max_fraction;
        let mut index = None;

        for (i, (&v, &n)) in self.vertices.iter().zip(&self.normals).enumerate() {
            // dot(normal, p1 + a * d - v) = 0
            let numerator = n.dot(v - p1);
            let denominator = n.dot(d);

            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else if denominator < 0.0 && numerator < lower * denominator {
                // Entering this half-space.
                lower = numerator / denominator;
                index = Some(i);
            } else if denominator > 0.0 && numerator < upper * denominator {
                // Leaving this half-space.
                upper = numerator / denominator;
            }

            if upper < lower {
                return None;
            }
        }

        debug_assert!((0.0..=input.max_fraction).contains(&lower));

        index.map(|i| RayCastOutput {
            fraction: lower,
            normal: xf.q.mul(self.normals[i]),
        })
    }

    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let first = xf.mul(self.vertices[0]);
        let (lower, upper) = self.vertices[1..]
            .iter()
            .map(|&v| xf.mul(v))
            .fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let r = Vec2::splat(self.radius);
        Aabb::new(lower - r, upper + r)
    }

    /// Area of the polygon below the plane `dot(normal, x) = offset` and the
    /// centroid of that part, in world space.
    #[must_use]
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f32, xf: &Transform) -> (f32, Vec2) {
        let count = self.count();

        // Plane into shape space.
        let normal_l = xf.q.mul_t(normal);
        let offset_l = offset - normal.dot(xf.p);

        let mut depths = [0.0; MAX_POLYGON_VERTICES];
        let mut dive_count = 0;
        let mut into_index = None;
        let mut outo_index = None;

        let mut last_submerged = false;
        for (i, &v) in self.vertices.iter().enumerate() {
            depths[i] = normal_l.dot(v) - offset_l;
            let is_submerged = depths[i] < -EPSILON;
            if i > 0 {
                if is_submerged && !last_submerged {
                    into_index = Some(i - 1);
                    dive_count += 1;
                } else if !is_submerged && last_submerged {
                    outo_index = Some(i - 1);
                    dive_count += 1;
                }
            }
            last_submerged = is_submerged;
        }

        let (into_index, outo_index) = match (dive_count, into_index, outo_index) {
            (0, ..) => {
                // Either fully dry or fully wet.
                if last_submerged {
                    return self.full_area(xf);
                }
                return (0.0, Vec2::ZERO);
            }
            (1, None, Some(outo)) => (count - 1, outo),
            (1, Some(into), None) => (into, count - 1),
            (_, Some(into), Some(outo)) => (into, outo),
            _ => return (0.0, Vec2::ZERO),
        };

        let into_index2 = (into_index + 1) % count;
        let outo_index2 = (outo_index + 1) % count;

        let into_lambda = -depths[into_index] / (depths[into_index2] - depths[into_index]);
        let outo_lambda = -depths[outo_index] / (depths[outo_index2] - depths[outo_index]);

        let into_vec = self.vertices[into_index].lerp(self.vertices[into_index2], into_lambda);
        let outo_vec = self.vertices[outo_index].lerp(self.vertices[outo_index2], outo_lambda);

        let mut area = 0.0;
        let mut center = Vec2::ZERO;
        let mut p2 = self.vertices[into_index2];

        // Fan of triangles rooted at into_vec, walking from into_index2 to outo_index2.
        let mut i = into_index2;
        while i != outo_index2 {
            i = (i + 1) % count;
            let p3 = if i == outo_index2 {
                outo_vec
            } else {
                self.vertices[i]
            };

            let triangle_area = 0.5 * (p2 - into_vec).perp_dot(p3 - into_vec);
            area += triangle_area;
            center += triangle_area / 3.0 * (into_vec + p2 + p3);

            p2 = p3;
        }

        if area <= EPSILON {
            return (0.0, Vec2::ZERO);
        }

        (area, xf.mul(center / area))
    }

    fn full_area(&self, xf: &Transform) -> (f32, Vec2) {
        let origin = self.vertices[0];
        let mut area = 0.0;
        let mut center = Vec2::ZERO;
        for w in self.vertices[1..].windows(2) {
            let triangle_area = 0.5 * (w[0] - origin).perp_dot(w[1] - origin);
            area += triangle_area;
            center += triangle_area / 3.0 * (origin + w[0] + w[1]);
        }
        (area, xf.mul(center / area))
    }

    /// Whether the vertex loop is convex and counter-clockwise.
    #[must_use]
    pub fn validate(&self) -> bool {
        let count = self.count();
        for i1 in 0..count {
            let i2 = if i1 + 1 < count { i1 + 1 } else { 0 };
            let p = self.vertices[i1];
            let e = self.vertices[i2] - p;

            let convex = (0..count)
                .filter(|&j| j != i1 && j != i2)
                .all(|j| e.perp_dot(self.vertices[j] - p) >= 0.0);
            if !convex {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_normals_are_outward() {
        let b = PolygonShape::new_box(1.0, 2.0);
        assert_eq!(b.count(), 4);
        assert_eq!(b.normals[0], Vec2::new(0.0, -1.0));
        assert_eq!(b.normals[1], Vec2::new(1.0, 0.0));
        assert_eq!(b.normals[2], Vec2::new(0.0, 1.0));
        assert_eq!(b.normals[3], Vec2::new(-1.0, 0.0));
        assert!(b.validate());
    }

    #[test]
    fn clockwise_loop_fails_validation() {
        let cw = PolygonShape::new(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ]);
        assert!(!cw.validate());
    }

    #[test]
    #[should_panic(expected = "zero length")]
    fn degenerate_edge_panics() {
        let _ = PolygonShape::new(&[Vec2::ZERO, Vec2::ZERO, Vec2::ONE]);
    }

    #[test]
    #[should_panic]
    fn too_few_vertices_panics() {
        let _ = PolygonShape::new(&[Vec2::ZERO, Vec2::ONE]);
    }

    #[test]
    fn point_containment() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let xf = Transform::new(Vec2::new(10.0, 0.0), std::f32::consts::FRAC_PI_4);
        assert!(b.test_point(&xf, Vec2::new(10.0, 1.3)));
        assert!(!b.test_point(&xf, Vec2::new(11.0, 1.0)));
    }

    #[test]
    fn ray_cast_reports_entry_face() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let input = RayCastInput::new(Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0), 1.0);
        let out = b.ray_cast(&input, &Transform::IDENTITY).unwrap();
        assert!((out.fraction - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(out.normal, Vec2::new(-1.0, 0.0));

        let miss = RayCastInput::new(Vec2::new(-3.0, 2.0), Vec2::new(3.0, 2.0), 1.0);
        assert!(b.ray_cast(&miss, &Transform::IDENTITY).is_none());
    }

    #[test]
    fn submerged_half_box() {
        let b = PolygonShape::new_box(1.0, 1.0);
        let (area, centroid) = b.compute_submerged_area(Vec2::Y, 0.0, &Transform::IDENTITY);
        assert!((area - 2.0).abs() < 1e-5);
        assert!((centroid - Vec2::new(0.0, -0.5)).length() < 1e-5);

        let (wet, c) = b.compute_submerged_area(Vec2::Y, 5.0, &Transform::IDENTITY);
        assert!((wet - 4.0).abs() < 1e-5);
        assert!(c.length() < 1e-5);

        let (dry, _) = b.compute_submerged_area(Vec2::Y, -5.0, &Transform::IDENTITY);
        assert_eq!(dry, 0.0);
    }
}
