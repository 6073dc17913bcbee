use glam::Vec2;
use log::{debug, trace};
use slab::Slab;

use super::{Body, BodyHandle, Contact, ContactHandle, ContactListener, ContactManager};
use crate::{
    collision::{
        Aabb, RayCastInput,
        broadphase::{BroadPhase, FixtureProxy, QuadTreeBroadPhase},
        narrowphase::{ContactType, Manifold, evaluate_any},
        shapes::Shape,
    },
    error::{CollideError, Result},
    math::Transform,
    settings::Category,
};

/// Bodies plus the contact manager that tracks which of them touch.
///
/// Removing a body is deferred to the next [`World::update`]; everything else
/// takes effect immediately.
#[derive(Debug)]
pub struct World<B: BroadPhase = QuadTreeBroadPhase> {
    contact_manager: ContactManager<B>,
    bodies: Slab<Body>,
    remove_list: Vec<BodyHandle>,
}

impl World {
    /// A world indexed by a quad-tree over `span`.
    #[must_use]
    pub fn new(span: Aabb) -> Self {
        Self::with_broad_phase(QuadTreeBroadPhase::new(span))
    }
}

impl<B: BroadPhase> World<B> {
    #[must_use]
    pub fn with_broad_phase(broad_phase: B) -> Self {
        Self {
            contact_manager: ContactManager::new(broad_phase),
            bodies: Slab::with_capacity(64),
            remove_list: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn contact_manager(&self) -> &ContactManager<B> {
        &self.contact_manager
    }

    #[inline]
    #[must_use]
    pub const fn broad_phase(&self) -> &B {
        self.contact_manager.broad_phase()
    }

    #[inline]
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter().map(|(key, body)| (BodyHandle(key), body))
    }

    pub fn contacts(&self) -> impl Iterator<Item = (ContactHandle, &Contact)> {
        self.contact_manager.contacts()
    }

    /// Contacts attached to one body, most recent first.
    pub fn body_contacts(
        &self,
        handle: BodyHandle,
    ) -> Result<impl Iterator<Item = (ContactHandle, &Contact)>> {
        let body = self.body(handle)?;
        Ok(self.contact_manager.body_contacts(handle, body))
    }

    /// Registers the body and creates its broad-phase proxy.
    ///
    /// Depending on the broad-phase, a freshly added proxy may only start
    /// pairing once it moves or is touched (see [`QuadTreeBroadPhase`]).
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let entry = self.bodies.vacant_entry();
        let handle = BodyHandle(entry.key());
        let body = entry.insert(body);

        let proxy = FixtureProxy::new(body.compute_aabb(), handle);
        body.proxy_id = self.contact_manager.broad_phase.add_proxy(proxy);
        body.contact_list = None;

        debug!("added body {} with proxy {}", handle.0, body.proxy_id);
        handle
    }

    /// Marks the body for removal at the start of the next [`World::update`].
    ///
    /// # Panics
    ///
    /// If the body is already marked for removal.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<()> {
        self.body(handle)?;

        assert!(
            !self.remove_list.contains(&handle),
            "body {} is already marked for removal",
            handle.0
        );
        self.remove_list.push(handle);
        Ok(())
    }

    pub fn body(&self, handle: BodyHandle) -> Result<&Body> {
        self.bodies
            .get(handle.0)
            .ok_or(CollideError::BodyNotFound { handle: handle.0 })
    }

    /// Mutable access to the user-facing fields. Placement and filtering go
    /// through the setters so the broad-phase stays in sync.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies
            .get_mut(handle.0)
            .ok_or(CollideError::BodyNotFound { handle: handle.0 })
    }

    /// Places the body and moves its proxy right away.
    pub fn set_transform(&mut self, handle: BodyHandle, position: Vec2, angle: f32) -> Result<()> {
        debug_assert!(position.is_finite() && angle.is_finite());

        let body = self
            .bodies
            .get_mut(handle.0)
            .ok_or(CollideError::BodyNotFound { handle: handle.0 })?;
        body.xf.set(position, angle);

        let aabb = body.compute_aabb();
        self.contact_manager
            .broad_phase
            .move_proxy(body.proxy_id, &aabb, Vec2::ZERO)?;
        Ok(())
    }

    /// Moves the body, keeping its rotation.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2) -> Result<()> {
        let angle = self.body(handle)?.rotation();
        self.set_transform(handle, position, angle)
    }

    pub fn set_collision_categories(
        &mut self,
        handle: BodyHandle,
        categories: Category,
    ) -> Result<()> {
        let body = self.body_mut(handle)?;
        if body.categories == categories {
            return Ok(());
        }

        body.categories = categories;
        self.refilter(handle)
    }

    pub fn set_collides_with(&mut self, handle: BodyHandle, collides_with: Category) -> Result<()> {
        let body = self.body_mut(handle)?;
        if body.collides_with == collides_with {
            return Ok(());
        }

        body.collides_with = collides_with;
        self.refilter(handle)
    }

    pub fn set_awake(&mut self, handle: BodyHandle, awake: bool) -> Result<()> {
        self.body_mut(handle)?.awake = awake;
        Ok(())
    }

    /// Flags every contact of the body for filtering and touches its proxy so
    /// that pairs rejected before get another chance. The category setters
    /// call this; use it directly after changing what the listener filters.
    pub fn refilter(&mut self, handle: BodyHandle) -> Result<()> {
        let body = self.body(handle)?;
        let proxy_id = body.proxy_id;

        let mut next = body.contact_list;
        while let Some(current) = next {
            let Some(contact) = self.contact_manager.contact_mut(current) else {
                break;
            };
            contact.flag_for_filtering();
            next = contact.edge(handle).next;
        }

        self.contact_manager.broad_phase.touch_proxy(proxy_id)
    }

    /// Bodies in `category` whose shapes overlap `shape` placed at `xf`.
    /// `out` is cleared first.
    pub fn query_shape(
        &self,
        shape: &Shape,
        xf: &Transform,
        category: Category,
        out: &mut Vec<FixtureProxy>,
    ) {
        let aabb = shape.compute_aabb(xf);
        out.clear();
        self.contact_manager.broad_phase.query_into(&aabb, out);

        let mut manifold = Manifold::default();
        out.retain(|proxy| {
            let Some(body) = self.bodies.get(proxy.body.0) else {
                return false;
            };
            if !body.categories.intersects(category) {
                return false;
            }

            let (type_a, type_b) = (shape.shape_type(), body.shape.shape_type());
            if ContactType::from_types(type_a, type_b)
                .or_else(|| ContactType::from_types(type_b, type_a))
                .is_none()
            {
                return false;
            }

            evaluate_any(&mut manifold, shape, xf, &body.shape, &body.xf);
            manifold.point_count() > 0
        });
    }

    /// Calls `callback` for each body the AABB query hits until it returns `false`.
    pub fn query_aabb<F: FnMut(BodyHandle) -> bool>(&self, aabb: &Aabb, mut callback: F) {
        let broad_phase = &self.contact_manager.broad_phase;
        broad_phase.query(aabb, |proxy_id| {
            broad_phase
                .get_proxy(proxy_id)
                .map_or(true, |proxy| callback(proxy.body))
        });
    }

    /// Casts a ray from `p1` to `p2` against the body shapes.
    ///
    /// `callback` receives the body, the hit point, the surface normal and the
    /// fraction along the ray. It returns `-1` to skip the body, `0` to stop,
    /// the fraction to clip the ray to this hit, or `1` to keep going.
    pub fn ray_cast<F>(&self, mut callback: F, p1: Vec2, p2: Vec2)
    where
        F: FnMut(BodyHandle, Vec2, Vec2, f32) -> f32,
    {
        let broad_phase = &self.contact_manager.broad_phase;
        let input = RayCastInput::new(p1, p2, 1.0);

        broad_phase.ray_cast(&input, |sub_input, proxy_id| {
            let Some((handle, body)) = broad_phase
                .get_proxy(proxy_id)
                .ok()
                .and_then(|proxy| Some((proxy.body, self.bodies.get(proxy.body.0)?)))
            else {
                return sub_input.max_fraction;
            };

            match body.shape.ray_cast(sub_input, &body.xf) {
                Some(output) => {
                    let fraction = output.fraction;
                    let point = (1.0 - fraction) * sub_input.p1 + fraction * sub_input.p2;
                    callback(handle, point, output.normal, fraction)
                }
                None => sub_input.max_fraction,
            }
        });
    }

    /// Removes pending bodies, creates contacts for new broad-phase pairs and
    /// re-evaluates every contact.
    pub fn update<L: ContactListener>(&mut self, listener: &mut L) -> Result<()> {
        self.process_removed_bodies(listener)?;
        self.contact_manager
            .find_new_contacts(&mut self.bodies, listener);
        self.contact_manager.collide(&mut self.bodies, listener)
    }

    fn process_removed_bodies<L: ContactListener>(&mut self, listener: &mut L) -> Result<()> {
        for handle in std::mem::take(&mut self.remove_list) {
            let Some(body) = self.bodies.get(handle.0) else {
                continue;
            };

            // Delete the attached contacts.
            let mut next = body.contact_list;
            while let Some(current) = next {
                next = self
                    .contact_manager
                    .contact(current)
                    .and_then(|contact| contact.edge(handle).next);
                self.contact_manager
                    .destroy(current, &mut self.bodies, listener);
            }

            let body = self.bodies.remove(handle.0);
            self.contact_manager.broad_phase.remove_proxy(body.proxy_id)?;
            trace!("removed proxy {}", body.proxy_id);
            debug!("removed body {}", handle.0);
        }

        Ok(())
    }
}
