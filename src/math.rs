use glam::Vec2;

/// Rotation stored as a sine/cosine pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rot {
    pub s: f32,
    pub c: f32,
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot {
    pub const IDENTITY: Self = Self { s: 0.0, c: 1.0 };

    #[must_use]
    pub fn new(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    #[inline]
    pub fn set(&mut self, angle: f32) {
        *self = Self::new(angle);
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    #[must_use]
    pub const fn x_axis(&self) -> Vec2 {
        Vec2::new(self.c, self.s)
    }

    #[must_use]
    pub const fn y_axis(&self) -> Vec2 {
        Vec2::new(-self.s, self.c)
    }

    /// Rotate a vector.
    #[inline]
    #[must_use]
    pub fn mul(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse rotate a vector.
    #[inline]
    #[must_use]
    pub fn mul_t(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }

    /// `q * r`
    #[must_use]
    pub fn mul_rot(&self, r: &Self) -> Self {
        Self {
            s: self.s * r.c + self.c * r.s,
            c: self.c * r.c - self.s * r.s,
        }
    }

    /// `transpose(q) * r`
    #[must_use]
    pub fn mul_t_rot(&self, r: &Self) -> Self {
        Self {
            s: self.c * r.s - self.s * r.c,
            c: self.c * r.c + self.s * r.s,
        }
    }
}

/// A rigid transform: translation `p` and rotation `q`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub p: Vec2,
    pub q: Rot,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    #[must_use]
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            p: position,
            q: Rot::new(angle),
        }
    }

    #[must_use]
    pub const fn from_position(position: Vec2) -> Self {
        Self {
            p: position,
            q: Rot::IDENTITY,
        }
    }

    pub fn set(&mut self, position: Vec2, angle: f32) {
        self.p = position;
        self.q.set(angle);
    }

    /// Local to world.
    #[inline]
    #[must_use]
    pub fn mul(&self, v: Vec2) -> Vec2 {
        self.q.mul(v) + self.p
    }

    /// World to local.
    #[inline]
    #[must_use]
    pub fn mul_t(&self, v: Vec2) -> Vec2 {
        self.q.mul_t(v - self.p)
    }

    /// Frame of `b` expressed in the frame of `self`.
    #[must_use]
    pub fn mul_t_xf(&self, b: &Self) -> Self {
        Self {
            q: self.q.mul_t_rot(&b.q),
            p: self.q.mul_t(b.p - self.p),
        }
    }
}

pub trait Vec2Ext {
    /// `v x s`, the vector rotated -90 degrees and scaled.
    fn cross_s(self, s: f32) -> Vec2;
}

impl Vec2Ext for Vec2 {
    #[inline]
    fn cross_s(self, s: f32) -> Vec2 {
        cross_vs(self, s)
    }
}

/// `v x s`
#[inline]
#[must_use]
pub fn cross_vs(v: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * v.y, -s * v.x)
}

/// `s x v`
#[inline]
#[must_use]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn transform_round_trip() {
        let xf = Transform::new(Vec2::new(3.0, -2.0), 0.7);
        let p = Vec2::new(1.25, 4.0);
        let back = xf.mul_t(xf.mul(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn relative_transform() {
        let a = Transform::new(Vec2::new(1.0, 0.0), FRAC_PI_2);
        let b = Transform::new(Vec2::new(1.0, 2.0), FRAC_PI_2);
        let rel = a.mul_t_xf(&b);
        assert!(rel.q.angle().abs() < 1e-5);
        assert!((rel.p - Vec2::new(2.0, 0.0)).length() < 1e-5);

        let local = Vec2::new(0.5, -0.25);
        let via_rel = a.mul(rel.mul(local));
        assert!((via_rel - b.mul(local)).length() < 1e-5);
    }

    #[test]
    fn cross_helpers() {
        let v = Vec2::new(2.0, 3.0);
        assert_eq!(v.cross_s(1.0), Vec2::new(3.0, -2.0));
        assert_eq!(cross_vs(v, 1.0), v.cross_s(1.0));
        assert_eq!(cross_sv(1.0, v), Vec2::new(-3.0, 2.0));
    }
}
