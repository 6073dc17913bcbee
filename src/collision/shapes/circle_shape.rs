use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use crate::{
    collision::aabb::{Aabb, RayCastInput, RayCastOutput},
    math::Transform,
    settings::EPSILON,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleShape {
    /// Center in body-local space.
    pub position: Vec2,
    pub radius: f32,
}

impl CircleShape {
    #[inline]
    #[must_use]
    pub const fn new(radius: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            radius,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_position(radius: f32, position: Vec2) -> Self {
        Self { position, radius }
    }

    #[must_use]
    pub fn test_point(&self, xf: &Transform, point: Vec2) -> bool {
        let center = xf.mul(self.position);
        (point - center).length_squared() <= self.radius * self.radius
    }

    /// Collision Detection in Interactive 3D Environments, section 3.1.2.
    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput, xf: &Transform) -> Option<RayCastOutput> {
        let position = xf.mul(self.position);
        let s = input.p1 - position;
        let b = s.length_squared() - self.radius * self.radius;

        let r = input.p2 - input.p1;
        let c = s.dot(r);
        let rr = r.length_squared();
        let sigma = c * c - rr * b;

        // Negative discriminant or a degenerate segment.
        if sigma < 0.0 || rr < EPSILON {
            return None;
        }

        let a = -(c + sigma.sqrt());
        if (0.0..=input.max_fraction * rr).contains(&a) {
            let fraction = a / rr;
            return Some(RayCastOutput {
                fraction,
                normal: (s + fraction * r).normalize_or_zero(),
            });
        }

        None
    }

    #[must_use]
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        let p = xf.mul(self.position);
        let r = Vec2::splat(self.radius);
        Aabb::new(p - r, p + r)
    }

    /// Area below the plane `dot(normal, x) = offset` and its centroid.
    #[must_use]
    pub fn compute_submerged_area(&self, normal: Vec2, offset: f32, xf: &Transform) -> (f32, Vec2) {
        let p = xf.mul(self.position);
        let l = -(normal.dot(p) - offset);

        if l < -self.radius + EPSILON {
            return (0.0, Vec2::ZERO);
        }

        let r2 = self.radius * self.radius;
        if l > self.radius {
            return (PI * r2, p);
        }

        let l2 = l * l;
        let area = r2 * ((l / self.radius).asin() + FRAC_PI_2) + l * (r2 - l2).sqrt();
        let com = -2.0 / 3.0 * (r2 - l2).powf(1.5) / area;

        (area, p + normal * com)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_front() {
        let circle = CircleShape::new(1.0);
        let xf = Transform::from_position(Vec2::new(5.0, 0.0));
        let input = RayCastInput::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 1.0);
        let out = circle.ray_cast(&input, &xf).unwrap();
        assert!((out.fraction - 0.4).abs() < 1e-5);
        assert!((out.normal - Vec2::new(-1.0, 0.0)).length() < 1e-5);

        let short = RayCastInput::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.3);
        assert!(circle.ray_cast(&short, &xf).is_none());
    }

    #[test]
    fn submerged_area_halves() {
        let circle = CircleShape::new(1.0);
        let (full, c) = circle.compute_submerged_area(Vec2::Y, 5.0, &Transform::IDENTITY);
        assert!((full - PI).abs() < 1e-5);
        assert_eq!(c, Vec2::ZERO);

        let (dry, _) = circle.compute_submerged_area(Vec2::Y, -5.0, &Transform::IDENTITY);
        assert_eq!(dry, 0.0);

        let (half, centroid) = circle.compute_submerged_area(Vec2::Y, 0.0, &Transform::IDENTITY);
        assert!((half - PI * 0.5).abs() < 1e-4);
        assert!(centroid.y < 0.0);
    }
}
