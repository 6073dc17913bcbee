mod dynamic_tree;
mod dynamic_tree_broadphase;
mod quad_tree;
mod quad_tree_broadphase;

pub use dynamic_tree::*;
pub use dynamic_tree_broadphase::*;
pub use quad_tree::*;
pub use quad_tree_broadphase::*;

use glam::Vec2;

use crate::{
    collision::aabb::{Aabb, RayCastInput},
    dynamics::BodyHandle,
    error::Result,
    settings::{AABB_EXTENSION, AABB_MULTIPLIER},
};

/// Opaque broad-phase proxy id.
pub type ProxyId = usize;

/// The broad-phase record of one body's shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixtureProxy {
    /// Fat AABB once the proxy is in a broad-phase.
    pub aabb: Aabb,
    pub body: BodyHandle,
    pub proxy_id: ProxyId,
}

impl FixtureProxy {
    #[must_use]
    pub const fn new(aabb: Aabb, body: BodyHandle) -> Self {
        Self {
            aabb,
            body,
            proxy_id: usize::MAX,
        }
    }
}

/// Enlarges `aabb` by the extension margin, then stretches it along the
/// predicted displacement.
#[must_use]
pub(crate) fn fatten(aabb: &Aabb, displacement: Vec2) -> Aabb {
    let r = Vec2::splat(AABB_EXTENSION);
    let mut b = Aabb::new(aabb.min - r, aabb.max + r);

    let d = AABB_MULTIPLIER * displacement;
    if d.x < 0.0 {
        b.min.x += d.x;
    } else {
        b.max.x += d.x;
    }

    if d.y < 0.0 {
        b.min.y += d.y;
    } else {
        b.max.y += d.y;
    }

    b
}

/// A spatial index over fixture proxies that reports newly overlapping pairs.
pub trait BroadPhase {
    fn proxy_count(&self) -> usize;

    /// Calls `callback` once per unordered pair of overlapping proxies where at
    /// least one side moved since the last call, then clears the move buffer.
    fn update_pairs<F: FnMut(&FixtureProxy, &FixtureProxy)>(&mut self, callback: F);

    /// Whether the fat AABBs of two proxies overlap.
    fn test_overlap(&self, proxy_a: ProxyId, proxy_b: ProxyId) -> Result<bool>;

    /// Inserts the proxy with a fattened copy of its AABB and returns its id.
    fn add_proxy(&mut self, proxy: FixtureProxy) -> ProxyId;

    fn remove_proxy(&mut self, proxy_id: ProxyId) -> Result<()>;

    /// Returns whether the proxy had to be re-inserted, that is, whether `aabb`
    /// escaped the current fat AABB.
    fn move_proxy(&mut self, proxy_id: ProxyId, aabb: &Aabb, displacement: Vec2) -> Result<bool>;

    fn get_proxy(&self, proxy_id: ProxyId) -> Result<&FixtureProxy>;

    /// Buffers the proxy so the next `update_pairs` re-reports its pairs.
    fn touch_proxy(&mut self, proxy_id: ProxyId) -> Result<()>;

    fn get_fat_aabb(&self, proxy_id: ProxyId) -> Result<Aabb>;

    /// Calls `callback` for each proxy overlapping `aabb` until it returns `false`.
    fn query<F: FnMut(ProxyId) -> bool>(&self, aabb: &Aabb, callback: F);

    /// Appends every proxy overlapping `aabb` to `out`.
    fn query_into(&self, aabb: &Aabb, out: &mut Vec<FixtureProxy>) {
        self.query(aabb, |proxy_id| {
            if let Ok(proxy) = self.get_proxy(proxy_id) {
                out.push(*proxy);
            }
            true
        });
    }

    /// Ray casts against the fat AABBs. See [`DynamicTree::ray_cast`] for the
    /// callback protocol.
    fn ray_cast<F: FnMut(&RayCastInput, ProxyId) -> f32>(&self, input: &RayCastInput, callback: F);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatten_predicts_displacement() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let fat = fatten(&aabb, Vec2::new(-1.0, 0.5));

        assert!((fat.min.x - (-AABB_EXTENSION - 2.0)).abs() < 1e-6);
        assert!((fat.max.x - (1.0 + AABB_EXTENSION)).abs() < 1e-6);
        assert!((fat.min.y + AABB_EXTENSION).abs() < 1e-6);
        assert!((fat.max.y - (1.0 + AABB_EXTENSION + 1.0)).abs() < 1e-6);
    }
}
