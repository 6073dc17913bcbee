use ahash::{AHashMap, AHashSet};
use glam::Vec2;
use log::debug;

use super::{BroadPhase, FixtureProxy, ProxyId, QuadTree, fatten};
use crate::{
    collision::aabb::{Aabb, RayCastInput},
    error::{CollideError, Result},
    settings::{QUAD_TREE_MAX_BUCKET, QUAD_TREE_MAX_DEPTH, QUAD_TREE_REBUILD_THRESHOLD},
};

/// Broad-phase over a [`QuadTree`] covering a bounded world span.
///
/// Ids of removed proxies are recycled, so live ids stay dense. Pair
/// deduplication packs two ids into one `u32`, which caps the number of live
/// proxies at `1 << 16`.
#[derive(Clone, Debug)]
pub struct QuadTreeBroadPhase {
    quad_tree: QuadTree<FixtureProxy>,
    /// Proxy id to quad-tree element key.
    id_register: AHashMap<ProxyId, usize>,
    move_buffer: AHashSet<ProxyId>,
    pair_set: AHashSet<u32>,
    pair_buffer: Vec<(ProxyId, ProxyId)>,
    next_id: ProxyId,
    free_ids: Vec<ProxyId>,
    tree_move_count: usize,
}

impl QuadTreeBroadPhase {
    #[must_use]
    pub fn new(span: Aabb) -> Self {
        Self {
            quad_tree: QuadTree::new(span, QUAD_TREE_MAX_DEPTH, QUAD_TREE_MAX_BUCKET),
            id_register: AHashMap::new(),
            move_buffer: AHashSet::new(),
            pair_set: AHashSet::with_capacity(1024),
            pair_buffer: Vec::new(),
            next_id: 0,
            free_ids: Vec::new(),
            tree_move_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn quad_tree(&self) -> &QuadTree<FixtureProxy> {
        &self.quad_tree
    }

    fn element_key(&self, proxy_id: ProxyId) -> Result<usize> {
        self.id_register
            .get(&proxy_id)
            .copied()
            .ok_or(CollideError::ProxyNotFound { proxy_id })
    }

    fn reinsert(&mut self, key: usize, span: Aabb) {
        self.quad_tree.update(key, span);

        self.tree_move_count += 1;
        if self.tree_move_count > QUAD_TREE_REBUILD_THRESHOLD {
            debug!(
                "rebuilding quad-tree after {} moves ({} proxies)",
                self.tree_move_count,
                self.id_register.len()
            );
            self.quad_tree.rebuild();
            self.tree_move_count = 0;
        }
    }

    /// Packs an ordered pair into the dedup key.
    #[inline]
    fn pair_key(id_a: ProxyId, id_b: ProxyId) -> u32 {
        debug_assert!(id_a < id_b);
        assert!(id_b <= 0xFFFF, "proxy id {id_b} does not fit the pair key");
        ((id_a as u32) << 16) | id_b as u32
    }
}

impl BroadPhase for QuadTreeBroadPhase {
    fn proxy_count(&self) -> usize {
        self.id_register.len()
    }

    fn update_pairs<F: FnMut(&FixtureProxy, &FixtureProxy)>(&mut self, mut callback: F) {
        self.pair_buffer.clear();
        self.pair_set.clear();

        // Sorted so pairs come out in a stable order.
        let mut moved: Vec<ProxyId> = self.move_buffer.drain().collect();
        moved.sort_unstable();

        for base_id in moved {
            let Some(element) = self
                .id_register
                .get(&base_id)
                .and_then(|&key| self.quad_tree.get(key))
            else {
                continue;
            };

            let pair_set = &mut self.pair_set;
            let pair_buffer = &mut self.pair_buffer;
            self.quad_tree.query(&element.span, |_, other| {
                let proxy_id = other.value.proxy_id;
                // A proxy cannot form a pair with itself.
                if proxy_id != base_id {
                    let pair = (proxy_id.min(base_id), proxy_id.max(base_id));
                    if pair_set.insert(Self::pair_key(pair.0, pair.1)) {
                        pair_buffer.push(pair);
                    }
                }
                true
            });
        }

        for &(id_a, id_b) in &self.pair_buffer {
            let proxy_a = self
                .id_register
                .get(&id_a)
                .and_then(|&key| self.quad_tree.get(key));
            let proxy_b = self
                .id_register
                .get(&id_b)
                .and_then(|&key| self.quad_tree.get(key));

            if let (Some(a), Some(b)) = (proxy_a, proxy_b) {
                callback(&a.value, &b.value);
            }
        }
    }

    fn test_overlap(&self, proxy_a: ProxyId, proxy_b: ProxyId) -> Result<bool> {
        let aabb_a = self.get_fat_aabb(proxy_a)?;
        let aabb_b = self.get_fat_aabb(proxy_b)?;
        Ok(aabb_a.test_overlap(&aabb_b))
    }

    fn add_proxy(&mut self, mut proxy: FixtureProxy) -> ProxyId {
        let proxy_id = self.free_ids.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        });
        assert!(proxy_id <= 0xFFFF, "too many live proxies for the quad-tree broad-phase");

        proxy.proxy_id = proxy_id;
        proxy.aabb = fatten(&proxy.aabb, Vec2::ZERO);

        let key = self.quad_tree.insert(proxy.aabb, proxy);
        self.id_register.insert(proxy_id, key);
        proxy_id
    }

    fn remove_proxy(&mut self, proxy_id: ProxyId) -> Result<()> {
        let key = self.element_key(proxy_id)?;

        self.move_buffer.remove(&proxy_id);
        self.id_register.remove(&proxy_id);
        self.quad_tree.remove(key);
        self.free_ids.push(proxy_id);
        Ok(())
    }

    fn move_proxy(&mut self, proxy_id: ProxyId, aabb: &Aabb, displacement: Vec2) -> Result<bool> {
        let key = self.element_key(proxy_id)?;
        let fat_aabb = self.get_fat_aabb(proxy_id)?;

        // Still within the fat AABB.
        if fat_aabb.contains(aabb) {
            return Ok(false);
        }

        let b = fatten(aabb, displacement);
        if let Some(element) = self.quad_tree.get_mut(key) {
            element.value.aabb = b;
        }
        self.reinsert(key, b);
        self.move_buffer.insert(proxy_id);
        Ok(true)
    }

    fn get_proxy(&self, proxy_id: ProxyId) -> Result<&FixtureProxy> {
        let key = self.element_key(proxy_id)?;
        self.quad_tree
            .get(key)
            .map(|element| &element.value)
            .ok_or(CollideError::ProxyNotFound { proxy_id })
    }

    fn touch_proxy(&mut self, proxy_id: ProxyId) -> Result<()> {
        self.element_key(proxy_id)?;
        self.move_buffer.insert(proxy_id);
        Ok(())
    }

    fn get_fat_aabb(&self, proxy_id: ProxyId) -> Result<Aabb> {
        let key = self.element_key(proxy_id)?;
        self.quad_tree
            .get(key)
            .map(|element| element.span)
            .ok_or(CollideError::ProxyNotFound { proxy_id })
    }

    fn query<F: FnMut(ProxyId) -> bool>(&self, aabb: &Aabb, mut callback: F) {
        self.quad_tree.query(aabb, |_, element| callback(element.value.proxy_id));
    }

    fn query_into(&self, aabb: &Aabb, out: &mut Vec<FixtureProxy>) {
        self.quad_tree.query(aabb, |_, element| {
            out.push(element.value);
            true
        });
    }

    fn ray_cast<F: FnMut(&RayCastInput, ProxyId) -> f32>(
        &self,
        input: &RayCastInput,
        mut callback: F,
    ) {
        self.quad_tree.ray_cast(input, |sub_input, key| {
            match self.quad_tree.get(key) {
                Some(element) => callback(sub_input, element.value.proxy_id),
                None => -1.0,
            }
        });
    }
}
