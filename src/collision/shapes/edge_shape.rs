use glam::Vec2;

use crate::{
    collision::aabb::{Aabb, RayCastInput, RayCastOutput},
    math::Transform,
    settings::POLYGON_RADIUS,
};

/// A line segment. The optional ghost vertices `vertex0` and `vertex3` describe the
/// neighbouring segments of a chain so contacts at shared corners stay smooth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeShape {
    pub vertex0: Vec2,
    pub vertex1: Vec2,
    pub vertex2: Vec2,
    pub vertex3: Vec2,
    pub has_vertex0: bool,
    pub has_vertex3: bool,
    pub radius: f32,
}

impl EdgeShape {
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self {
            vertex0: Vec2::ZERO,
            vertex1: start,
            vertex2: end,
            vertex3: Vec2::ZERO,
            has_vertex0: false,
            has_vertex3: false,
            radius: POLYGON_RADIUS,
        }
    }

    #[must_use]
    pub const fn with_vertex0(mut self, vertex0: Vec2) -> Self {
        self.vertex0 = vertex0;
        self.has_vertex0 = true;
        self
    }

    #[must_use]
    pub const fn with_vertex3(mut self, vertex3: Vec2) -> Self {
        self.vertex3 = vertex3;
        self.has_vertex3 = true;
        self
    }

    /// Resets the segment and clears both ghost vertices.
    pub const fn set(&mut self, start: Vec2, end: Vec2) {
        self.vertex1 = start;
        self.vertex2 = end;
        self.has_vertex0 = false;
        self.has_vertex3 = false;
    }

    #[inline]
    #[must_use]
    pub const fn test_point(&self, _xf: &Transform, _point: Vec2) -> bool {
        false
    }

    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        // Into the edge's frame.
        let p1 = xf.q.mul_t(input.p1 - xf.p);
        let p2 = xf.q.mul_t(input.p2 - xf.p);
        let d = p2 - p1;

        let v1 = self.vertex1;
        let v2 = self.vertex2;
        let e = v2 - v1;
        let normal = Vec2::new(e.y, -e.x).normalize_or_zero();

        // dot(normal, p1 + t * d - v1) = 0
        let numerator = normal.dot(v1 - p1);
        let denominator = normal.dot(d);

        if denominator == 0.0 {
            return None;
        }

        let t = numerator / denominator;
        if t < 0.0 || input.max_fraction < t {
            return None;
        }

        let q = p1 + t * d;

        let rr = e.length_squared();
        if rr == 0.0 {
            return None;
        }

        let s = (q - v1).dot(e) / rr;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let normal = if numerator > 0.0 { -normal } else { normal };
        Some(RayCastOutput {
            fraction: t,
            normal: xf.q.mul(normal),
        })
    }

    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let v1 = xf.mul(self.vertex1);
        let v2 = xf.mul(self.vertex2);
        let r = Vec2::splat(self.radius);
        Aabb::new(v1.min(v2) - r, v1.max(v2) + r)
    }

    /// Edges have no area.
    #[inline]
    #[must_use]
    pub const fn compute_submerged_area(
        &self,
        _normal: Vec2,
        _offset: f32,
        _xf: &Transform,
    ) -> (f32, Vec2) {
        (0.0, Vec2::ZERO)
    }
}
