pub mod aabb;
pub mod broadphase;
pub mod distance;
pub mod narrowphase;
pub mod shapes;

pub use aabb::{Aabb, RayCastInput, RayCastOutput};
