use collide2d::{
    Aabb, Body, BodyHandle, BroadPhase, CircleShape, DynamicTreeBroadPhase, QuadTreeBroadPhase,
    Vec2, World,
};

pub fn world_span() -> Aabb {
    Aabb::new(Vec2::splat(-100.0), Vec2::splat(100.0))
}

pub fn quad_tree_world() -> World<QuadTreeBroadPhase> {
    World::new(world_span())
}

pub fn dynamic_tree_world() -> World<DynamicTreeBroadPhase> {
    World::with_broad_phase(DynamicTreeBroadPhase::new())
}

pub fn circle_at(x: f32, y: f32, radius: f32) -> Body {
    Body::new(CircleShape::new(radius)).with_transform(Vec2::new(x, y), 0.0)
}

/// Adds the body and touches its proxy, so it pairs on the next update with
/// either broad-phase.
pub fn place<B: BroadPhase>(world: &mut World<B>, body: Body) -> BodyHandle {
    let handle = world.add_body(body);
    world.refilter(handle).unwrap();
    handle
}

/// Small deterministic generator for shuffled scenarios.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * (self.next_u32() as f32 / u32::MAX as f32)
    }

    pub fn below(&mut self, n: usize) -> usize {
        self.next_u32() as usize % n
    }
}
