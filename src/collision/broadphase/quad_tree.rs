use glam::Vec2;
use slab::Slab;

use crate::collision::aabb::{Aabb, RayCastInput};

const ROOT: usize = 0;

/// An item stored in a [`QuadTree`].
#[derive(Clone, Debug, PartialEq)]
pub struct Element<T> {
    pub span: Aabb,
    pub value: T,
    /// Node currently holding this element.
    node: usize,
}

#[derive(Clone, Debug)]
struct QuadNode {
    span: Aabb,
    /// Levels of subdivision still allowed below this node.
    depth: usize,
    elements: Vec<usize>,
    children: Option<[usize; 4]>,
}

impl QuadNode {
    const fn new(span: Aabb, depth: usize) -> Self {
        Self {
            span,
            depth,
            elements: Vec::new(),
            children: None,
        }
    }

    /// The quadrant that fully contains `span`, if any.
    fn quadrant_of(&self, span: &Aabb) -> Option<usize> {
        self.span.quadrants().iter().position(|q| q.contains(span))
    }
}

/// A region quad-tree over a fixed world span.
///
/// A node keeps up to `max_bucket` elements before splitting into four
/// quadrants. An element lives in the deepest node whose quadrant fully
/// contains it, so straddling elements stay higher up. Elements outside the
/// world span live at the root.
#[derive(Clone, Debug)]
pub struct QuadTree<T> {
    nodes: Vec<QuadNode>,
    elements: Slab<Element<T>>,
    max_bucket: usize,
    max_depth: usize,
}

impl<T> QuadTree<T> {
    #[must_use]
    pub fn new(span: Aabb, max_depth: usize, max_bucket: usize) -> Self {
        Self {
            nodes: vec![QuadNode::new(span, max_depth)],
            elements: Slab::new(),
            max_bucket,
            max_depth,
        }
    }

    #[inline]
    #[must_use]
    pub fn span(&self) -> &Aabb {
        &self.nodes[ROOT].span
    }

    /// Number of stored elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of tree nodes, the root included.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest subdivision level currently in use.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| self.max_depth - node.depth)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn get(&self, key: usize) -> Option<&Element<T>> {
        self.elements.get(key)
    }

    #[must_use]
    pub fn get_mut(&mut self, key: usize) -> Option<&mut Element<T>> {
        self.elements.get_mut(key)
    }

    /// Stores `value` under `span` and returns its element key.
    pub fn insert(&mut self, span: Aabb, value: T) -> usize {
        let key = self.elements.insert(Element {
            span,
            value,
            node: ROOT,
        });
        self.place_from(ROOT, key);
        key
    }

    pub fn remove(&mut self, key: usize) -> Option<T> {
        if !self.elements.contains(key) {
            return None;
        }

        self.detach(key);
        Some(self.elements.remove(key).value)
    }

    /// Moves an element to a new span.
    ///
    /// # Panics
    ///
    /// If `key` is not stored in the tree.
    pub fn update(&mut self, key: usize, span: Aabb) {
        self.detach(key);
        self.elements[key].span = span;
        self.place_from(ROOT, key);
    }

    /// Drops the node structure and re-inserts every element from scratch.
    pub fn rebuild(&mut self) {
        self.reset_nodes();

        let keys: Vec<usize> = self.elements.iter().map(|(key, _)| key).collect();
        for key in keys {
            self.place_from(ROOT, key);
        }
    }

    /// Removes every element and subdivision.
    pub fn clear(&mut self) {
        self.reset_nodes();
        self.elements.clear();
    }

    fn reset_nodes(&mut self) {
        self.nodes.truncate(1);
        let root = &mut self.nodes[ROOT];
        root.elements.clear();
        root.children = None;
    }

    fn detach(&mut self, key: usize) {
        let node = self.elements[key].node;
        let elements = &mut self.nodes[node].elements;
        if let Some(pos) = elements.iter().position(|&k| k == key) {
            elements.swap_remove(pos);
        }
    }

    fn place_from(&mut self, mut node_id: usize, key: usize) {
        let span = self.elements[key].span;

        loop {
            let node = &self.nodes[node_id];
            if let Some(children) = node.children {
                match node.quadrant_of(&span) {
                    Some(q) => node_id = children[q],
                    None => break,
                }
            } else if node.elements.len() >= self.max_bucket && node.depth > 0 {
                self.partition(node_id);
            } else {
                break;
            }
        }

        self.nodes[node_id].elements.push(key);
        self.elements[key].node = node_id;
    }

    /// Splits a leaf node and pushes down the elements that fit a quadrant.
    fn partition(&mut self, node_id: usize) {
        let node = &self.nodes[node_id];
        debug_assert!(node.children.is_none());

        let depth = node.depth - 1;
        let quadrants = node.span.quadrants();
        let first = self.nodes.len();
        self.nodes
            .extend(quadrants.map(|span| QuadNode::new(span, depth)));
        self.nodes[node_id].children = Some([first, first + 1, first + 2, first + 3]);

        let keys = std::mem::take(&mut self.nodes[node_id].elements);
        for key in keys {
            match self.nodes[node_id].quadrant_of(&self.elements[key].span) {
                Some(q) => self.place_from(first + q, key),
                None => {
                    self.nodes[node_id].elements.push(key);
                }
            }
        }
    }

    /// Calls `callback` with each element overlapping `aabb` until it returns `false`.
    pub fn query<F: FnMut(usize, &Element<T>) -> bool>(&self, aabb: &Aabb, mut callback: F) {
        let mut stack = vec![ROOT];

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            // The root also holds elements outside its span.
            if node_id != ROOT && !aabb.test_overlap(&node.span) {
                continue;
            }

            for &key in &node.elements {
                let element = &self.elements[key];
                if aabb.test_overlap(&element.span) && !callback(key, element) {
                    return;
                }
            }

            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    /// Ray casts against the element spans with the same callback protocol as
    /// [`DynamicTree::ray_cast`](super::DynamicTree::ray_cast).
    pub fn ray_cast<F: FnMut(&RayCastInput, usize) -> f32>(
        &self,
        input: &RayCastInput,
        mut callback: F,
    ) {
        let p1 = input.p1;
        let mut max_fraction = input.max_fraction;
        let mut p2 = p1 + (input.p2 - input.p1) * max_fraction;

        let mut stack = vec![ROOT];
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            if node_id != ROOT && !segment_overlaps(&node.span, p1, p2) {
                continue;
            }

            for &key in &node.elements {
                if !segment_overlaps(&self.elements[key].span, p1, p2) {
                    continue;
                }

                let sub_input = RayCastInput::new(input.p1, input.p2, max_fraction);
                let value = callback(&sub_input, key);
                if value == 0.0 {
                    return;
                }

                if value > 0.0 {
                    max_fraction = value;
                    p2 = p1 + (input.p2 - input.p1) * max_fraction;
                }
            }

            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Element<T>)> {
        self.elements.iter()
    }
}

/// Whether the segment `p1..p2` touches `aabb`.
fn segment_overlaps(aabb: &Aabb, p1: Vec2, p2: Vec2) -> bool {
    let segment = Aabb::new(p1.min(p2), p1.max(p2));
    if !aabb.test_overlap(&segment) {
        return false;
    }

    // A point is decided by the box test alone.
    let Some(normal) = (p2 - p1).perp().try_normalize() else {
        return true;
    };

    let d_pos = p1.dot(normal);
    let (d_min, d_max) = aabb
        .vertices()
        .iter()
        .map(|v| v.dot(normal))
        .fold((f32::MAX, -f32::MAX), |(lo, hi), d| (lo.min(d), hi.max(d)));

    d_min <= d_pos && d_pos <= d_max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Aabb {
        Aabb::new(Vec2::splat(-100.0), Vec2::splat(100.0))
    }

    fn small_box(x: f32, y: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(x + 0.5, y + 0.5))
    }

    #[test]
    fn splits_when_bucket_overflows() {
        let mut qt = QuadTree::new(world(), 5, 10);
        for i in 0..10 {
            qt.insert(small_box(10.0 + i as f32, 10.0), i);
        }
        assert_eq!(qt.node_count(), 1);

        qt.insert(small_box(-50.0, -50.0), 10);
        assert_eq!(qt.node_count(), 5);
        assert!(qt.depth() >= 1);
        assert_eq!(qt.len(), 11);
    }

    #[test]
    fn straddling_element_stays_at_root() {
        let mut qt = QuadTree::new(world(), 5, 1);
        qt.insert(small_box(10.0, 10.0), "a");
        let center = qt.insert(Aabb::new(Vec2::splat(-1.0), Vec2::splat(1.0)), "center");
        assert_eq!(qt.get(center).unwrap().node, ROOT);
    }

    #[test]
    fn query_update_remove() {
        let mut qt = QuadTree::new(world(), 5, 2);
        let keys: Vec<_> = (0..20)
            .map(|i| qt.insert(small_box(i as f32 * 5.0 - 50.0, 0.0), i))
            .collect();

        let collect = |qt: &QuadTree<i32>, aabb: &Aabb| {
            let mut hits = Vec::new();
            qt.query(aabb, |_, e| {
                hits.push(e.value);
                true
            });
            hits.sort_unstable();
            hits
        };

        let region = Aabb::new(Vec2::new(-1.0, 0.0), Vec2::new(6.0, 1.0));
        assert_eq!(collect(&qt, &region), [10, 11]);

        qt.update(keys[11], small_box(80.0, 80.0));
        assert_eq!(collect(&qt, &region), [10]);

        assert_eq!(qt.remove(keys[10]), Some(10));
        assert_eq!(qt.remove(keys[10]), None);
        assert!(collect(&qt, &region).is_empty());

        qt.rebuild();
        assert_eq!(qt.len(), 18);
        assert_eq!(collect(&qt, &small_box(80.0, 80.0)), [11]);

        qt.clear();
        assert!(qt.is_empty());
        assert_eq!(qt.node_count(), 1);
    }

    #[test]
    fn elements_outside_span_are_found() {
        let mut qt = QuadTree::new(world(), 5, 1);
        qt.insert(small_box(500.0, 500.0), 1);
        qt.insert(small_box(10.0, 10.0), 2);
        qt.insert(small_box(-10.0, 10.0), 3);

        let mut hits = 0;
        qt.query(&small_box(500.0, 500.0), |_, _| {
            hits += 1;
            true
        });
        assert_eq!(hits, 1);
    }

    #[test]
    fn ray_cast_clips() {
        let mut qt = QuadTree::new(world(), 5, 2);
        for i in 0..8 {
            qt.insert(small_box(i as f32 * 10.0, 0.0), i);
        }

        let input = RayCastInput::new(Vec2::new(-5.0, 0.25), Vec2::new(95.0, 0.25), 1.0);
        let mut closest = None;
        qt.ray_cast(&input, |sub_input, key| {
            let element = qt.get(key).unwrap();
            match element.span.ray_cast(sub_input) {
                Some(output) => {
                    closest = Some(element.value);
                    output.fraction
                }
                None => -1.0,
            }
        });
        assert_eq!(closest, Some(0));

        let mut calls = 0;
        qt.ray_cast(&input, |_, _| {
            calls += 1;
            0.0
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn segment_test() {
        let aabb = Aabb::new(Vec2::ZERO, Vec2::ONE);
        assert!(segment_overlaps(&aabb, Vec2::new(-1.0, 0.5), Vec2::new(2.0, 0.5)));
        assert!(!segment_overlaps(&aabb, Vec2::new(-1.0, 1.5), Vec2::new(0.5, 3.0)));
        assert!(segment_overlaps(&aabb, Vec2::splat(0.5), Vec2::splat(0.5)));
    }
}
