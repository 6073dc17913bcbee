use glam::Vec2;
use log::trace;

use super::fatten;
use crate::collision::aabb::{Aabb, RayCastInput};

pub const NULL_NODE: usize = usize::MAX;

const INITIAL_CAPACITY: usize = 16;
const STACK_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
struct TreeNode<T> {
    aabb: Aabb,
    user_data: Option<T>,
    /// Parent while allocated, next free slot while on the free list.
    parent_or_next: usize,
    child1: usize,
    child2: usize,
    /// Leaf = 0, free node = -1.
    height: i32,
}

impl<T> TreeNode<T> {
    const fn free(next: usize) -> Self {
        Self {
            aabb: Aabb::ZERO,
            user_data: None,
            parent_or_next: next,
            child1: NULL_NODE,
            child2: NULL_NODE,
            height: -1,
        }
    }

    #[inline]
    const fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// A dynamic AABB tree broad-phase, inspired by Nathanael Presson's btDbvt.
///
/// Leaves are proxies holding a fattened AABB, so a proxy can move a little
/// without triggering a tree update. Internal nodes are balanced with AVL
/// rotations after every insertion and removal.
///
/// Nodes are pooled in a growable array and relocatable, so node indices are
/// used instead of references. Freed slots are threaded into a free list.
#[derive(Clone, Debug)]
pub struct DynamicTree<T> {
    nodes: Vec<TreeNode<T>>,
    root: usize,
    free_list: usize,
    node_count: usize,
    insertion_count: usize,
}

impl<T> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicTree<T> {
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(INITIAL_CAPACITY),
            root: NULL_NODE,
            free_list: NULL_NODE,
            node_count: 0,
            insertion_count: 0,
        };
        tree.grow_pool(INITIAL_CAPACITY);
        tree
    }

    /// Extends the pool to `new_capacity` slots and links the new ones into the free list.
    fn grow_pool(&mut self, new_capacity: usize) {
        let start = self.nodes.len();
        debug_assert!(new_capacity > start);
        debug_assert_eq!(self.free_list, NULL_NODE);

        self.nodes.extend((start..new_capacity).map(|i| {
            TreeNode::free(if i + 1 < new_capacity { i + 1 } else { NULL_NODE })
        }));
        self.free_list = start;
    }

    fn allocate_node(&mut self) -> usize {
        if self.free_list == NULL_NODE {
            debug_assert_eq!(self.node_count, self.nodes.len());
            let capacity = self.nodes.len() * 2;
            trace!("growing dynamic tree node pool to {capacity}");
            self.grow_pool(capacity);
        }

        let node_id = self.free_list;
        let node = &mut self.nodes[node_id];
        self.free_list = node.parent_or_next;
        node.parent_or_next = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = 0;
        node.user_data = None;
        self.node_count += 1;
        node_id
    }

    fn free_node(&mut self, node_id: usize) -> Option<T> {
        debug_assert!(node_id < self.nodes.len());
        debug_assert!(self.node_count > 0);

        let node = &mut self.nodes[node_id];
        node.parent_or_next = self.free_list;
        node.height = -1;
        self.free_list = node_id;
        self.node_count -= 1;
        node.user_data.take()
    }

    /// Creates a leaf holding `aabb` fattened by the extension margin.
    pub fn create_proxy(&mut self, aabb: &Aabb, user_data: T) -> usize {
        let proxy_id = self.allocate_node();

        let node = &mut self.nodes[proxy_id];
        node.aabb = fatten(aabb, Vec2::ZERO);
        node.user_data = Some(user_data);
        node.height = 0;

        self.insert_leaf(proxy_id);
        proxy_id
    }

    /// Removes the leaf and hands back its user data.
    ///
    /// # Panics
    ///
    /// If `proxy_id` is not a live leaf.
    pub fn destroy_proxy(&mut self, proxy_id: usize) -> Option<T> {
        assert!(self.is_proxy(proxy_id), "invalid proxy id {proxy_id}");

        self.remove_leaf(proxy_id);
        self.free_node(proxy_id)
    }

    /// Re-inserts the proxy if `aabb` escaped its fat AABB. The new fat AABB is
    /// extended along `displacement`. Returns whether the tree changed.
    ///
    /// # Panics
    ///
    /// If `proxy_id` is not a live leaf.
    pub fn move_proxy(&mut self, proxy_id: usize, aabb: &Aabb, displacement: Vec2) -> bool {
        assert!(self.is_proxy(proxy_id), "invalid proxy id {proxy_id}");

        if self.nodes[proxy_id].aabb.contains(aabb) {
            return false;
        }

        self.remove_leaf(proxy_id);
        self.nodes[proxy_id].aabb = fatten(aabb, displacement);
        self.insert_leaf(proxy_id);
        true
    }

    /// Whether `proxy_id` names a live leaf.
    #[must_use]
    pub fn is_proxy(&self, proxy_id: usize) -> bool {
        self.nodes.get(proxy_id).is_some_and(|node| node.height == 0)
    }

    #[must_use]
    pub fn user_data(&self, proxy_id: usize) -> Option<&T> {
        self.nodes
            .get(proxy_id)
            .filter(|node| node.height == 0)
            .and_then(|node| node.user_data.as_ref())
    }

    #[must_use]
    pub fn user_data_mut(&mut self, proxy_id: usize) -> Option<&mut T> {
        self.nodes
            .get_mut(proxy_id)
            .filter(|node| node.height == 0)
            .and_then(|node| node.user_data.as_mut())
    }

    #[must_use]
    pub fn fat_aabb(&self, proxy_id: usize) -> Option<Aabb> {
        self.nodes
            .get(proxy_id)
            .filter(|node| node.height == 0)
            .map(|node| node.aabb)
    }

    /// Number of allocated nodes, leaves and internal nodes alike.
    #[inline]
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    #[must_use]
    pub const fn insertion_count(&self) -> usize {
        self.insertion_count
    }

    /// Calls `callback` with every proxy whose fat AABB overlaps `aabb`.
    /// Returning `false` from the callback ends the query.
    pub fn query<F: FnMut(usize) -> bool>(&self, aabb: &Aabb, mut callback: F) {
        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }

            let node = &self.nodes[node_id];
            if !node.aabb.test_overlap(aabb) {
                continue;
            }

            if node.is_leaf() {
                if !callback(node_id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Ray casts against the proxies in the tree.
    ///
    /// The callback receives the input clipped to the current closest hit and
    /// returns the new max fraction: `0` ends the cast, a negative value ignores
    /// the proxy, and a positive value clips the ray.
    pub fn ray_cast<F: FnMut(&RayCastInput, usize) -> f32>(
        &self,
        input: &RayCastInput,
        mut callback: F,
    ) {
        let p1 = input.p1;
        let p2 = input.p2;
        let r = p2 - p1;
        assert!(r.length_squared() > 0.0, "ray cast with a zero-length segment");
        let r = r.normalize();

        // Perpendicular to the segment.
        let v = Vec2::new(-r.y, r.x);
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;
        let segment_aabb = |max_fraction: f32| {
            let t = p1 + max_fraction * (p2 - p1);
            Aabb::new(p1.min(t), p1.max(t))
        };
        let mut segment = segment_aabb(max_fraction);

        let mut stack = Vec::with_capacity(STACK_CAPACITY);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            if node_id == NULL_NODE {
                continue;
            }

            let node = &self.nodes[node_id];
            if !node.aabb.test_overlap(&segment) {
                continue;
            }

            // Separating axis for segment (Gino, p80).
            // |dot(v, p1 - c)| > dot(|v|, h)
            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput::new(p1, p2, max_fraction);
                let value = callback(&sub_input, node_id);

                if value == 0.0 {
                    // Terminated by the client.
                    return;
                }

                if value > 0.0 {
                    max_fraction = value;
                    segment = segment_aabb(max_fraction);
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        self.insertion_count += 1;

        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf].parent_or_next = NULL_NODE;
            return;
        }

        // Find the best sibling for this node.
        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = self.root;
        while !self.nodes[index].is_leaf() {
            let node = &self.nodes[index];
            let child1 = node.child1;
            let child2 = node.child2;

            let area = node.aabb.perimeter();
            let combined_area = (node.aabb + leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the new leaf.
            let cost = 2.0 * combined_area;

            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let descend_cost = |child: usize| {
                let child = &self.nodes[child];
                let new_area = (leaf_aabb + child.aabb).perimeter();
                if child.is_leaf() {
                    new_area + inheritance_cost
                } else {
                    new_area - child.aabb.perimeter() + inheritance_cost
                }
            };

            let cost1 = descend_cost(child1);
            let cost2 = descend_cost(child2);

            if cost < cost1 && cost < cost2 {
                break;
            }

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        // Create a new parent.
        let old_parent = self.nodes[sibling].parent_or_next;
        let new_parent = self.allocate_node();
        {
            let sibling_node = &self.nodes[sibling];
            let aabb = leaf_aabb + sibling_node.aabb;
            let height = sibling_node.height + 1;

            let parent = &mut self.nodes[new_parent];
            parent.parent_or_next = old_parent;
            parent.aabb = aabb;
            parent.height = height;
            parent.child1 = sibling;
            parent.child2 = leaf;
        }

        self.replace_child(old_parent, sibling, new_parent);
        self.nodes[sibling].parent_or_next = new_parent;
        self.nodes[leaf].parent_or_next = new_parent;

        // Walk back up the tree fixing heights and AABBs.
        self.refit_from(self.nodes[leaf].parent_or_next);
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf].parent_or_next;
        let grand_parent = self.nodes[parent].parent_or_next;
        let sibling = if self.nodes[parent].child1 == leaf {
            self.nodes[parent].child2
        } else {
            self.nodes[parent].child1
        };

        // Destroy the parent and connect the sibling to the grand parent.
        self.replace_child(grand_parent, parent, sibling);
        self.nodes[sibling].parent_or_next = grand_parent;
        self.free_node(parent);

        self.refit_from(grand_parent);
    }

    /// Points `parent`'s link to `old_child` at `new_child`, or makes `new_child`
    /// the root when `parent` is null.
    fn replace_child(&mut self, parent: usize, old_child: usize, new_child: usize) {
        if parent == NULL_NODE {
            self.root = new_child;
            return;
        }

        let parent = &mut self.nodes[parent];
        if parent.child1 == old_child {
            parent.child1 = new_child;
        } else {
            debug_assert_eq!(parent.child2, old_child);
            parent.child2 = new_child;
        }
    }

    /// Rebalances and refits every ancestor starting at `index`.
    fn refit_from(&mut self, mut index: usize) {
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index].child1;
            let child2 = self.nodes[index].child2;
            debug_assert_ne!(child1, NULL_NODE);
            debug_assert_ne!(child2, NULL_NODE);

            let height = 1 + self.nodes[child1].height.max(self.nodes[child2].height);
            let aabb = self.nodes[child1].aabb + self.nodes[child2].aabb;

            let node = &mut self.nodes[index];
            node.height = height;
            node.aabb = aabb;
            index = node.parent_or_next;
        }
    }

    /// Performs a left or right rotation if node A is imbalanced.
    /// Returns the new root index of the subtree.
    fn balance(&mut self, i_a: usize) -> usize {
        debug_assert_ne!(i_a, NULL_NODE);

        let a = &self.nodes[i_a];
        if a.is_leaf() || a.height < 2 {
            return i_a;
        }

        let i_b = a.child1;
        let i_c = a.child2;
        let balance = self.nodes[i_c].height - self.nodes[i_b].height;

        if balance > 1 {
            self.rotate_up(i_a, i_c, i_b, false)
        } else if balance < -1 {
            self.rotate_up(i_a, i_b, i_c, true)
        } else {
            i_a
        }
    }

    /// Promotes `i_up` (a child of `i_a`) above `i_a`. `i_other` is `i_a`'s other
    /// child; `up_was_child1` tells which slot of A the promoted node occupied.
    fn rotate_up(&mut self, i_a: usize, i_up: usize, i_other: usize, up_was_child1: bool) -> usize {
        let i_f = self.nodes[i_up].child1;
        let i_g = self.nodes[i_up].child2;
        debug_assert!(i_f < self.nodes.len());
        debug_assert!(i_g < self.nodes.len());

        // Swap A and the promoted node.
        let a_parent = self.nodes[i_a].parent_or_next;
        self.nodes[i_up].child1 = i_a;
        self.nodes[i_up].parent_or_next = a_parent;
        self.nodes[i_a].parent_or_next = i_up;
        self.replace_child(a_parent, i_a, i_up);

        // The taller grandchild stays with the promoted node, the other moves to A.
        let (i_keep, i_move) = if self.nodes[i_f].height > self.nodes[i_g].height {
            (i_f, i_g)
        } else {
            (i_g, i_f)
        };

        self.nodes[i_up].child2 = i_keep;
        if up_was_child1 {
            self.nodes[i_a].child1 = i_move;
        } else {
            self.nodes[i_a].child2 = i_move;
        }
        self.nodes[i_move].parent_or_next = i_a;

        let a_aabb = self.nodes[i_other].aabb + self.nodes[i_move].aabb;
        let a_height = 1 + self.nodes[i_other].height.max(self.nodes[i_move].height);
        self.nodes[i_a].aabb = a_aabb;
        self.nodes[i_a].height = a_height;

        self.nodes[i_up].aabb = a_aabb + self.nodes[i_keep].aabb;
        self.nodes[i_up].height = 1 + a_height.max(self.nodes[i_keep].height);

        i_up
    }

    /// Height of the root, computed in O(1).
    #[must_use]
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root].height
        }
    }

    /// Height of the tree, computed by walking it.
    #[must_use]
    pub fn compute_height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.compute_height_of(self.root)
        }
    }

    fn compute_height_of(&self, node_id: usize) -> i32 {
        let node = &self.nodes[node_id];
        if node.is_leaf() {
            return 0;
        }

        1 + self
            .compute_height_of(node.child1)
            .max(self.compute_height_of(node.child2))
    }

    /// Maximum height difference between the two children of any node.
    #[must_use]
    pub fn max_balance(&self) -> i32 {
        self.nodes
            .iter()
            .filter(|node| node.height > 1)
            .map(|node| (self.nodes[node.child2].height - self.nodes[node.child1].height).abs())
            .max()
            .unwrap_or(0)
    }

    /// Sum of all node perimeters over the root perimeter.
    #[must_use]
    pub fn area_ratio(&self) -> f32 {
        if self.root == NULL_NODE {
            return 0.0;
        }

        let root_area = self.nodes[self.root].aabb.perimeter();
        let total_area: f32 = self
            .nodes
            .iter()
            .filter(|node| node.height >= 0)
            .map(|node| node.aabb.perimeter())
            .sum();

        total_area / root_area
    }

    /// Checks the parent links, heights, AABBs and the free list.
    ///
    /// # Panics
    ///
    /// On the first broken invariant.
    pub fn validate(&self) {
        self.validate_structure(self.root);
        self.validate_metrics(self.root);

        let mut free_count = 0;
        let mut free_index = self.free_list;
        while free_index != NULL_NODE {
            assert!(free_index < self.nodes.len());
            free_index = self.nodes[free_index].parent_or_next;
            free_count += 1;
        }

        assert_eq!(self.height(), self.compute_height());
        assert_eq!(self.node_count + free_count, self.nodes.len());
    }

    fn validate_structure(&self, index: usize) {
        if index == NULL_NODE {
            return;
        }

        let node = &self.nodes[index];
        if index == self.root {
            assert_eq!(node.parent_or_next, NULL_NODE);
        }

        if node.is_leaf() {
            assert_eq!(node.child2, NULL_NODE);
            assert_eq!(node.height, 0);
            return;
        }

        assert!(node.child1 < self.nodes.len());
        assert!(node.child2 < self.nodes.len());
        assert_eq!(self.nodes[node.child1].parent_or_next, index);
        assert_eq!(self.nodes[node.child2].parent_or_next, index);

        self.validate_structure(node.child1);
        self.validate_structure(node.child2);
    }

    fn validate_metrics(&self, index: usize) {
        if index == NULL_NODE {
            return;
        }

        let node = &self.nodes[index];
        if node.is_leaf() {
            return;
        }

        let child1 = &self.nodes[node.child1];
        let child2 = &self.nodes[node.child2];

        assert_eq!(node.height, 1 + child1.height.max(child2.height));

        let aabb = child1.aabb + child2.aabb;
        assert_eq!(aabb.min, node.aabb.min);
        assert_eq!(aabb.max, node.aabb.max);

        self.validate_metrics(node.child1);
        self.validate_metrics(node.child2);
    }

    /// Builds an optimal tree from the current leaves. Very expensive, for testing.
    pub fn rebuild_bottom_up(&mut self) {
        let mut leaves = Vec::with_capacity(self.node_count);

        // Keep the leaves and free the internal nodes.
        for i in 0..self.nodes.len() {
            if self.nodes[i].height < 0 {
                continue;
            }

            if self.nodes[i].is_leaf() {
                self.nodes[i].parent_or_next = NULL_NODE;
                leaves.push(i);
            } else {
                self.free_node(i);
            }
        }

        while leaves.len() > 1 {
            let mut min_cost = f32::MAX;
            let (mut i_min, mut j_min) = (0, 1);
            for i in 0..leaves.len() {
                let aabb_i = self.nodes[leaves[i]].aabb;
                for j in i + 1..leaves.len() {
                    let cost = (aabb_i + self.nodes[leaves[j]].aabb).perimeter();
                    if cost < min_cost {
                        i_min = i;
                        j_min = j;
                        min_cost = cost;
                    }
                }
            }

            let index1 = leaves[i_min];
            let index2 = leaves[j_min];

            let parent_index = self.allocate_node();
            let aabb = self.nodes[index1].aabb + self.nodes[index2].aabb;
            let height = 1 + self.nodes[index1].height.max(self.nodes[index2].height);

            let parent = &mut self.nodes[parent_index];
            parent.child1 = index1;
            parent.child2 = index2;
            parent.height = height;
            parent.aabb = aabb;
            parent.parent_or_next = NULL_NODE;

            self.nodes[index1].parent_or_next = parent_index;
            self.nodes[index2].parent_or_next = parent_index;

            // j_min > i_min, so the swap does not disturb slot i_min.
            leaves.swap_remove(j_min);
            leaves[i_min] = parent_index;
        }

        self.root = leaves.first().copied().unwrap_or(NULL_NODE);
        self.validate();
    }

    /// Shifts every AABB by `-new_origin`, for large worlds re-centred on a new origin.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in &mut self.nodes {
            node.aabb.min -= new_origin;
            node.aabb.max -= new_origin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AABB_EXTENSION;

    fn unit_box_at(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(x + 1.0, y + 1.0))
    }

    #[test]
    fn stays_balanced_while_growing() {
        let mut tree = DynamicTree::new();
        let ids: Vec<_> = (0..100)
            .map(|i| tree.create_proxy(&unit_box_at(i as f32 * 2.0, 0.0), i))
            .collect();

        tree.validate();
        assert!(tree.max_balance() <= 1);
        // 100 leaves and 99 internal nodes, past the initial pool.
        assert_eq!(tree.node_count(), 199);
        assert!(tree.height() <= 12);

        for (i, &id) in ids.iter().enumerate().step_by(3) {
            assert_eq!(tree.destroy_proxy(id), Some(i));
        }
        tree.validate();
        assert!(tree.max_balance() <= 1);
    }

    #[test]
    fn move_within_fat_aabb_is_free() {
        let mut tree = DynamicTree::new();
        let id = tree.create_proxy(&unit_box_at(0.0, 0.0), ());

        let fat = tree.fat_aabb(id).unwrap();
        assert_eq!(fat.min, Vec2::splat(-AABB_EXTENSION));

        let nudged = unit_box_at(0.05, 0.0);
        assert!(!tree.move_proxy(id, &nudged, Vec2::new(0.05, 0.0)));

        let moved = unit_box_at(3.0, 0.0);
        assert!(tree.move_proxy(id, &moved, Vec2::new(3.0, 0.0)));
        let fat = tree.fat_aabb(id).unwrap();
        assert!(fat.contains(&moved));
        // Predicted along +x only.
        assert!((fat.max.x - (4.0 + AABB_EXTENSION + 6.0)).abs() < 1e-5);
        assert!((fat.min.x - (3.0 - AABB_EXTENSION)).abs() < 1e-5);
        tree.validate();
    }

    #[test]
    fn query_and_early_exit() {
        let mut tree = DynamicTree::new();
        for i in 0..10 {
            tree.create_proxy(&unit_box_at(i as f32 * 2.0, 0.0), i);
        }

        let mut hits = Vec::new();
        tree.query(&Aabb::new(Vec2::new(3.5, 0.0), Vec2::new(6.5, 1.0)), |id| {
            hits.push(*tree.user_data(id).unwrap());
            true
        });
        hits.sort_unstable();
        assert_eq!(hits, [2, 3]);

        let mut calls = 0;
        tree.query(&Aabb::new(Vec2::splat(-10.0), Vec2::splat(100.0)), |_| {
            calls += 1;
            false
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn ray_cast_clips_to_closest() {
        let mut tree = DynamicTree::new();
        for i in 0..5 {
            tree.create_proxy(&unit_box_at(i as f32 * 3.0, 0.0), i);
        }

        let input = RayCastInput::new(Vec2::new(-1.0, 0.5), Vec2::new(20.0, 0.5), 1.0);
        let mut closest = None;
        tree.ray_cast(&input, |sub_input, id| {
            let aabb = tree.fat_aabb(id).unwrap();
            match aabb.ray_cast(sub_input) {
                Some(output) => {
                    closest = Some(*tree.user_data(id).unwrap());
                    output.fraction
                }
                None => -1.0,
            }
        });
        assert_eq!(closest, Some(0));
    }

    #[test]
    #[should_panic(expected = "zero-length")]
    fn zero_length_ray_panics() {
        let mut tree = DynamicTree::new();
        tree.create_proxy(&unit_box_at(0.0, 0.0), 0);

        let input = RayCastInput::new(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.5), 1.0);
        tree.ray_cast(&input, |_, _| -1.0);
    }

    #[test]
    fn rebuild_and_shift() {
        let mut tree = DynamicTree::new();
        for i in 0..20 {
            tree.create_proxy(&unit_box_at((i % 5) as f32 * 2.0, (i / 5) as f32 * 2.0), i);
        }

        tree.rebuild_bottom_up();
        tree.validate();
        assert!(tree.area_ratio() >= 1.0);

        tree.shift_origin(Vec2::new(10.0, 0.0));
        let mut hits = 0;
        tree.query(&Aabb::new(Vec2::new(-10.0, 0.0), Vec2::new(-9.5, 0.5)), |_| {
            hits += 1;
            true
        });
        assert_eq!(hits, 1);
    }

    #[test]
    fn empty_after_removing_everything() {
        let mut tree = DynamicTree::new();
        let ids: Vec<_> = (0..40)
            .map(|i| tree.create_proxy(&unit_box_at(i as f32, i as f32), ()))
            .collect();
        for id in ids {
            tree.destroy_proxy(id);
        }

        tree.validate();
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.height(), 0);
        assert!(!tree.is_proxy(0));
    }
}
