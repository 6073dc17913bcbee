use std::ops::{Add, AddAssign};

use glam::Vec2;

use crate::settings::EPSILON;

/// Ray-cast input. The ray extends from `p1` to `p1 + max_fraction * (p2 - p1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f32,
}

impl RayCastInput {
    #[inline]
    #[must_use]
    pub const fn new(p1: Vec2, p2: Vec2, max_fraction: f32) -> Self {
        Self {
            p1,
            p2,
            max_fraction,
        }
    }
}

/// Ray-cast output. The hit point is `p1 + fraction * (p2 - p1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayCastOutput {
    pub fraction: f32,
    pub normal: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub const ZERO: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ZERO,
    };

    #[inline]
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        let half = Vec2::new(width * 0.5, height * 0.5);
        Self::new(center - half, center + half)
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half-widths.
    #[inline]
    #[must_use]
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    #[must_use]
    pub fn perimeter(&self) -> f32 {
        2.0 * (self.width() + self.height())
    }

    /// Corners, counter-clockwise starting from `min`.
    #[must_use]
    pub fn vertices(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }

    /// Upper-right quadrant.
    #[must_use]
    pub fn q1(&self) -> Self {
        Self::new(self.center(), self.max)
    }

    /// Upper-left quadrant.
    #[must_use]
    pub fn q2(&self) -> Self {
        let c = self.center();
        Self::new(Vec2::new(self.min.x, c.y), Vec2::new(c.x, self.max.y))
    }

    /// Lower-left quadrant.
    #[must_use]
    pub fn q3(&self) -> Self {
        Self::new(self.min, self.center())
    }

    /// Lower-right quadrant.
    #[must_use]
    pub fn q4(&self) -> Self {
        let c = self.center();
        Self::new(Vec2::new(c.x, self.min.y), Vec2::new(self.max.x, c.y))
    }

    #[must_use]
    pub fn quadrants(&self) -> [Self; 4] {
        [self.q1(), self.q2(), self.q3(), self.q4()]
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        let d = self.max - self.min;
        d.x >= 0.0 && d.y >= 0.0 && self.min.is_finite() && self.max.is_finite()
    }

    #[inline]
    pub fn combine(&mut self, other: &Self) {
        *self += *other;
    }

    #[inline]
    #[must_use]
    pub fn combined(a: &Self, b: &Self) -> Self {
        *a + *b
    }

    /// Whether `other` lies entirely inside this box.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Strict containment with an epsilon inset to absorb rounding.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x > self.min.x + EPSILON
            && point.x < self.max.x - EPSILON
            && point.y > self.min.y + EPSILON
            && point.y < self.max.y - EPSILON
    }

    #[inline]
    #[must_use]
    pub fn test_overlap(&self, rhs: &Self) -> bool {
        self.min.cmple(rhs.max).all() && self.max.cmpge(rhs.min).all()
    }

    /// Slab test (Real-Time Collision Detection, p179).
    #[must_use]
    pub fn ray_cast(&self, input: &RayCastInput) -> Option<RayCastOutput> {
        let mut tmin = -f32::MAX;
        let mut tmax = f32::MAX;

        let p = input.p1;
        let d = input.p2 - input.p1;
        let abs_d = d.abs();

        let mut normal = Vec2::ZERO;

        for i in 0..2 {
            if abs_d[i] < EPSILON {
                // Parallel.
                if p[i] < self.min[i] || self.max[i] < p[i] {
                    return None;
                }
            } else {
                let inv_d = 1.0 / d[i];
                let mut t1 = (self.min[i] - p[i]) * inv_d;
                let mut t2 = (self.max[i] - p[i]) * inv_d;

                let mut s = -1.0;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                    s = 1.0;
                }

                if t1 > tmin {
                    normal = Vec2::ZERO;
                    normal[i] = s;
                    tmin = t1;
                }

                tmax = tmax.min(t2);

                if tmin > tmax {
                    return None;
                }
            }
        }

        // Starts inside, or hits past the max fraction.
        if tmin < 0.0 || input.max_fraction < tmin {
            return None;
        }

        Some(RayCastOutput {
            fraction: tmin,
            normal,
        })
    }
}

impl Add for Aabb {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            min: self.min.min(rhs.min),
            max: self.max.max(rhs.max),
        }
    }
}

impl AddAssign for Aabb {
    fn add_assign(&mut self, rhs: Self) {
        self.min = self.min.min(rhs.min);
        self.max = self.max.max(rhs.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::ONE)
    }

    #[test]
    fn quadrants_tile_the_box() {
        let b = Aabb::new(Vec2::new(-2.0, -2.0), Vec2::new(2.0, 2.0));
        let [q1, q2, q3, q4] = b.quadrants();
        assert_eq!(q1, Aabb::new(Vec2::ZERO, Vec2::new(2.0, 2.0)));
        assert_eq!(q2, Aabb::new(Vec2::new(-2.0, 0.0), Vec2::new(0.0, 2.0)));
        assert_eq!(q3, Aabb::new(Vec2::new(-2.0, -2.0), Vec2::ZERO));
        assert_eq!(q4, Aabb::new(Vec2::new(0.0, -2.0), Vec2::new(2.0, 0.0)));
        let sum: f32 = [q1, q2, q3, q4].iter().map(|q| q.width() * q.height()).sum();
        assert_eq!(sum, 16.0);
    }

    #[test]
    fn containment_and_overlap() {
        let outer = Aabb::new(Vec2::splat(-1.0), Vec2::splat(2.0));
        assert!(outer.contains(&unit()));
        assert!(!unit().contains(&outer));

        let touching = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        assert!(unit().test_overlap(&touching));
        let apart = Aabb::new(Vec2::new(1.01, 0.0), Vec2::new(2.0, 1.0));
        assert!(!unit().test_overlap(&apart));

        assert!(unit().contains_point(Vec2::splat(0.5)));
        assert!(!unit().contains_point(Vec2::new(0.0, 0.5)));
    }

    #[test]
    fn ray_cast_hits_near_face() {
        let input = RayCastInput::new(Vec2::new(-1.0, 0.5), Vec2::new(3.0, 0.5), 1.0);
        let out = unit().ray_cast(&input).unwrap();
        assert!((out.fraction - 0.25).abs() < 1e-6);
        assert_eq!(out.normal, Vec2::new(-1.0, 0.0));

        let reversed = RayCastInput::new(Vec2::new(3.0, 0.5), Vec2::new(-1.0, 0.5), 1.0);
        let out = unit().ray_cast(&reversed).unwrap();
        assert!((out.fraction - 0.5).abs() < 1e-6);
        assert_eq!(out.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn ray_cast_misses() {
        let inside = RayCastInput::new(Vec2::splat(0.5), Vec2::new(3.0, 0.5), 1.0);
        assert!(unit().ray_cast(&inside).is_none());

        let short = RayCastInput::new(Vec2::new(-1.0, 0.5), Vec2::new(3.0, 0.5), 0.2);
        assert!(unit().ray_cast(&short).is_none());

        let parallel = RayCastInput::new(Vec2::new(-1.0, 2.0), Vec2::new(3.0, 2.0), 1.0);
        assert!(unit().ray_cast(&parallel).is_none());
    }

    #[test]
    fn union() {
        let mut a = unit();
        a.combine(&Aabb::new(Vec2::splat(-1.0), Vec2::ZERO));
        assert_eq!(a, Aabb::new(Vec2::splat(-1.0), Vec2::ONE));
        assert_eq!(a.perimeter(), 8.0);
        assert!(a.is_valid());
        assert!(!Aabb::new(Vec2::ONE, Vec2::ZERO).is_valid());
    }
}
