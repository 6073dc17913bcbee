use glam::Vec2;

use super::{BroadPhase, DynamicTree, FixtureProxy, ProxyId};
use crate::{
    collision::aabb::{Aabb, RayCastInput},
    error::{CollideError, Result},
};

/// Broad-phase over a [`DynamicTree`]. Moved proxies are buffered and only they
/// are queried when looking for new pairs.
#[derive(Clone, Debug, Default)]
pub struct DynamicTreeBroadPhase {
    tree: DynamicTree<FixtureProxy>,
    proxy_count: usize,
    move_buffer: Vec<ProxyId>,
    pair_buffer: Vec<(ProxyId, ProxyId)>,
}

impl DynamicTreeBroadPhase {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: DynamicTree::new(),
            proxy_count: 0,
            move_buffer: Vec::with_capacity(16),
            pair_buffer: Vec::with_capacity(16),
        }
    }

    #[inline]
    #[must_use]
    pub const fn tree(&self) -> &DynamicTree<FixtureProxy> {
        &self.tree
    }

    #[must_use]
    pub fn tree_height(&self) -> i32 {
        self.tree.height()
    }

    pub fn shift_origin(&mut self, new_origin: Vec2) {
        self.tree.shift_origin(new_origin);
    }

    fn buffer_move(&mut self, proxy_id: ProxyId) {
        self.move_buffer.push(proxy_id);
    }

    fn unbuffer_move(&mut self, proxy_id: ProxyId) {
        self.move_buffer.retain(|&id| id != proxy_id);
    }

    fn check(&self, proxy_id: ProxyId) -> Result<()> {
        if self.tree.is_proxy(proxy_id) {
            Ok(())
        } else {
            Err(CollideError::ProxyNotFound { proxy_id })
        }
    }
}

impl BroadPhase for DynamicTreeBroadPhase {
    fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    fn update_pairs<F: FnMut(&FixtureProxy, &FixtureProxy)>(&mut self, mut callback: F) {
        self.pair_buffer.clear();

        // Query the tree with each moved proxy.
        for &query_id in &self.move_buffer {
            let Some(fat_aabb) = self.tree.fat_aabb(query_id) else {
                continue;
            };

            let pair_buffer = &mut self.pair_buffer;
            self.tree.query(&fat_aabb, |proxy_id| {
                // A proxy cannot form a pair with itself.
                if proxy_id != query_id {
                    pair_buffer.push((proxy_id.min(query_id), proxy_id.max(query_id)));
                }
                true
            });
        }

        self.move_buffer.clear();

        // Sorting exposes duplicates.
        self.pair_buffer.sort_unstable();
        self.pair_buffer.dedup();

        for &(id_a, id_b) in &self.pair_buffer {
            if let (Some(proxy_a), Some(proxy_b)) =
                (self.tree.user_data(id_a), self.tree.user_data(id_b))
            {
                callback(proxy_a, proxy_b);
            }
        }
    }

    fn test_overlap(&self, proxy_a: ProxyId, proxy_b: ProxyId) -> Result<bool> {
        let aabb_a = self.get_fat_aabb(proxy_a)?;
        let aabb_b = self.get_fat_aabb(proxy_b)?;
        Ok(aabb_a.test_overlap(&aabb_b))
    }

    fn add_proxy(&mut self, mut proxy: FixtureProxy) -> ProxyId {
        let aabb = proxy.aabb;
        let proxy_id = self.tree.create_proxy(&aabb, proxy);

        if let Some(fat_aabb) = self.tree.fat_aabb(proxy_id) {
            proxy.aabb = fat_aabb;
        }
        proxy.proxy_id = proxy_id;
        if let Some(stored) = self.tree.user_data_mut(proxy_id) {
            *stored = proxy;
        }

        self.proxy_count += 1;
        self.buffer_move(proxy_id);
        proxy_id
    }

    fn remove_proxy(&mut self, proxy_id: ProxyId) -> Result<()> {
        self.check(proxy_id)?;

        self.unbuffer_move(proxy_id);
        self.proxy_count -= 1;
        self.tree.destroy_proxy(proxy_id);
        Ok(())
    }

    fn move_proxy(&mut self, proxy_id: ProxyId, aabb: &Aabb, displacement: Vec2) -> Result<bool> {
        self.check(proxy_id)?;

        let moved = self.tree.move_proxy(proxy_id, aabb, displacement);
        if moved {
            let fat_aabb = self.tree.fat_aabb(proxy_id);
            if let (Some(stored), Some(fat_aabb)) = (self.tree.user_data_mut(proxy_id), fat_aabb) {
                stored.aabb = fat_aabb;
            }
            self.buffer_move(proxy_id);
        }

        Ok(moved)
    }

    fn get_proxy(&self, proxy_id: ProxyId) -> Result<&FixtureProxy> {
        self.tree
            .user_data(proxy_id)
            .ok_or(CollideError::ProxyNotFound { proxy_id })
    }

    fn touch_proxy(&mut self, proxy_id: ProxyId) -> Result<()> {
        self.check(proxy_id)?;
        self.buffer_move(proxy_id);
        Ok(())
    }

    fn get_fat_aabb(&self, proxy_id: ProxyId) -> Result<Aabb> {
        self.tree
            .fat_aabb(proxy_id)
            .ok_or(CollideError::ProxyNotFound { proxy_id })
    }

    fn query<F: FnMut(ProxyId) -> bool>(&self, aabb: &Aabb, callback: F) {
        self.tree.query(aabb, callback);
    }

    fn ray_cast<F: FnMut(&RayCastInput, ProxyId) -> f32>(&self, input: &RayCastInput, callback: F) {
        self.tree.ray_cast(input, callback);
    }
}
