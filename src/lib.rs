//! 2D collision detection: shapes, GJK distance, SAT contact manifolds, two
//! broad-phase indices and a contact manager that tracks touching pairs across
//! steps.

pub mod collision;
pub mod dynamics;
pub mod error;
pub mod logging;
pub mod math;
pub mod settings;

pub use collision::{
    Aabb, RayCastInput, RayCastOutput,
    broadphase::{BroadPhase, DynamicTreeBroadPhase, FixtureProxy, ProxyId, QuadTreeBroadPhase},
    distance::{DistanceInput, DistanceOutput, DistanceProxy, SimplexCache, compute_distance},
    narrowphase::{Manifold, ManifoldPoint, ManifoldType, WorldManifold},
    shapes::{CircleShape, EdgeShape, PolygonShape, Shape, ShapeType},
};
pub use dynamics::{Body, BodyHandle, Contact, ContactHandle, ContactListener, World};
pub use error::{CollideError, Result};
pub use glam::Vec2;
pub use logging::try_init as init_logging;
pub use math::{Rot, Transform};
pub use settings::Category;
