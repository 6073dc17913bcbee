//! Global tuning constants.

use std::f32::consts::PI;

use bitflags::bitflags;

pub const EPSILON: f32 = f32::EPSILON;

/// The maximum number of vertices on a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// The maximum number of contact points between two convex shapes.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Fattening margin applied to broad-phase AABBs.
pub const AABB_EXTENSION: f32 = 0.1;

/// Scales a proxy's displacement when predicting its fattened AABB.
pub const AABB_MULTIPLIER: f32 = 2.0;

pub const LINEAR_SLOP: f32 = 0.005;
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * PI;

/// Skin radius around polygons and edges.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

pub const MAX_GJK_ITERATIONS: usize = 20;

pub const QUAD_TREE_MAX_DEPTH: usize = 5;
pub const QUAD_TREE_MAX_BUCKET: usize = 10;
/// Incremental reinsertions before the quad-tree is rebuilt from scratch.
pub const QUAD_TREE_REBUILD_THRESHOLD: usize = 10_000;

bitflags! {
    /// Collision category bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        const NONE = 0;
        const CAT1 = 1;
        const CAT2 = 1 << 1;
        const CAT3 = 1 << 2;
        const CAT4 = 1 << 3;
        const CAT5 = 1 << 4;
        const CAT6 = 1 << 5;
        const CAT7 = 1 << 6;
        const CAT8 = 1 << 7;
        const CAT9 = 1 << 8;
        const CAT10 = 1 << 9;
        const CAT11 = 1 << 10;
        const CAT12 = 1 << 11;
        const CAT13 = 1 << 12;
        const CAT14 = 1 << 13;
        const CAT15 = 1 << 14;
        const CAT16 = 1 << 15;
        const CAT17 = 1 << 16;
        const CAT18 = 1 << 17;
        const CAT19 = 1 << 18;
        const CAT20 = 1 << 19;
        const CAT21 = 1 << 20;
        const CAT22 = 1 << 21;
        const CAT23 = 1 << 22;
        const CAT24 = 1 << 23;
        const CAT25 = 1 << 24;
        const CAT26 = 1 << 25;
        const CAT27 = 1 << 26;
        const CAT28 = 1 << 27;
        const CAT29 = 1 << 28;
        const CAT30 = 1 << 29;
        const CAT31 = 1 << 30;
        const ALL = i32::MAX as u32;
    }
}

impl Default for Category {
    fn default() -> Self {
        DEFAULT_COLLISION_CATEGORIES
    }
}

pub const DEFAULT_COLLISION_CATEGORIES: Category = Category::CAT1;
pub const DEFAULT_COLLIDES_WITH: Category = Category::ALL;
