use std::fmt;

use glam::Vec2;

use super::{Contact, ContactHandle};
use crate::{
    collision::{Aabb, broadphase::ProxyId, shapes::Shape},
    math::Transform,
    settings::{Category, DEFAULT_COLLIDES_WITH, DEFAULT_COLLISION_CATEGORIES},
};

/// Stable handle of a body inside a [`World`](super::World).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub usize);

/// Called with `(this, other, contact)` when the body starts touching another.
/// Returning `false` disables the contact for this step.
pub type CollisionHandler = Box<dyn FnMut(BodyHandle, BodyHandle, &Contact) -> bool>;

/// Called with `(this, other)` when a touching contact stops touching.
pub type SeparationHandler = Box<dyn FnMut(BodyHandle, BodyHandle)>;

/// A collidable entity: one shape placed by a transform.
pub struct Body {
    pub(crate) shape: Shape,
    pub(crate) xf: Transform,
    /// Contacts between two sleeping bodies are not re-evaluated.
    pub awake: bool,
    pub user_data: u64,
    pub(crate) categories: Category,
    pub(crate) collides_with: Category,
    pub(crate) proxy_id: ProxyId,
    /// Head of the intrusive list of incident contacts.
    pub(crate) contact_list: Option<ContactHandle>,
    pub on_collision: Option<CollisionHandler>,
    pub on_separation: Option<SeparationHandler>,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("shape", &self.shape)
            .field("xf", &self.xf)
            .field("awake", &self.awake)
            .field("user_data", &self.user_data)
            .field("categories", &self.categories)
            .field("collides_with", &self.collides_with)
            .field("proxy_id", &self.proxy_id)
            .field("contact_list", &self.contact_list)
            .field("on_collision", &self.on_collision.is_some())
            .field("on_separation", &self.on_separation.is_some())
            .finish()
    }
}

impl Body {
    #[must_use]
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            xf: Transform::IDENTITY,
            awake: true,
            user_data: 0,
            categories: DEFAULT_COLLISION_CATEGORIES,
            collides_with: DEFAULT_COLLIDES_WITH,
            proxy_id: usize::MAX,
            contact_list: None,
            on_collision: None,
            on_separation: None,
        }
    }

    #[must_use]
    pub fn with_transform(mut self, position: Vec2, angle: f32) -> Self {
        self.xf = Transform::new(position, angle);
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    #[must_use]
    pub fn with_collision_categories(mut self, categories: Category) -> Self {
        self.categories = categories;
        self
    }

    #[must_use]
    pub fn with_collides_with(mut self, collides_with: Category) -> Self {
        self.collides_with = collides_with;
        self
    }

    #[must_use]
    pub fn with_on_collision<F>(mut self, handler: F) -> Self
    where
        F: FnMut(BodyHandle, BodyHandle, &Contact) -> bool + 'static,
    {
        self.on_collision = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn with_on_separation<F>(mut self, handler: F) -> Self
    where
        F: FnMut(BodyHandle, BodyHandle) + 'static,
    {
        self.on_separation = Some(Box::new(handler));
        self
    }

    #[inline]
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        &self.xf
    }

    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.xf.p
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.xf.q.angle()
    }

    #[inline]
    #[must_use]
    pub const fn collision_categories(&self) -> Category {
        self.categories
    }

    #[inline]
    #[must_use]
    pub const fn collides_with(&self) -> Category {
        self.collides_with
    }

    #[inline]
    #[must_use]
    pub const fn proxy_id(&self) -> ProxyId {
        self.proxy_id
    }

    /// First contact in this body's contact list.
    #[inline]
    #[must_use]
    pub const fn contact_list(&self) -> Option<ContactHandle> {
        self.contact_list
    }

    /// Tight world-space bounds of the shape.
    #[must_use]
    pub fn compute_aabb(&self) -> Aabb {
        self.shape.compute_aabb(&self.xf)
    }

    /// Per-body veto hook. Every body pair is accepted.
    #[must_use]
    pub const fn should_collide(&self, _other: &Self) -> bool {
        true
    }

    /// Whether the category masks of the two bodies accept each other.
    #[must_use]
    pub fn categories_match(&self, other: &Self) -> bool {
        self.collides_with.intersects(other.categories)
            && self.categories.intersects(other.collides_with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::CircleShape;

    #[test]
    fn category_masks_work_both_ways() {
        let a = Body::new(CircleShape::new(1.0))
            .with_collision_categories(Category::CAT1)
            .with_collides_with(Category::CAT2);
        let b = Body::new(CircleShape::new(1.0))
            .with_collision_categories(Category::CAT2)
            .with_collides_with(Category::CAT1);
        let c = Body::new(CircleShape::new(1.0))
            .with_collision_categories(Category::CAT2)
            .with_collides_with(Category::CAT3);

        assert!(a.categories_match(&b));
        assert!(b.categories_match(&a));
        assert!(!a.categories_match(&c));
        assert!(!c.categories_match(&a));
    }

    #[test]
    fn defaults() {
        let body = Body::new(CircleShape::new(0.5)).with_transform(Vec2::new(1.0, 2.0), 0.0);
        assert!(body.awake);
        assert_eq!(body.collision_categories(), DEFAULT_COLLISION_CATEGORIES);
        assert_eq!(body.collides_with(), Category::ALL);
        assert_eq!(body.position(), Vec2::new(1.0, 2.0));
        assert!(body.contact_list().is_none());

        let aabb = body.compute_aabb();
        assert_eq!(aabb.min, Vec2::new(0.5, 1.5));
        assert_eq!(aabb.max, Vec2::new(1.5, 2.5));
    }
}
