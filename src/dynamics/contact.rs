use bitflags::bitflags;
use slab::Slab;

use super::{Body, BodyHandle, ContactListener};
use crate::collision::narrowphase::{ContactType, Manifold, WorldManifold, evaluate};

/// Stable handle of a contact inside the [`ContactManager`](super::ContactManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactHandle(pub usize);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContactFlags: u8 {
        /// Used when crawling the contact graph to form islands.
        const ISLAND = 1;
        /// The shapes touch.
        const TOUCHING = 1 << 1;
        /// The contact can be disabled for one step by a callback.
        const ENABLED = 1 << 2;
        /// The contact must be re-filtered before the next evaluation.
        const FILTER = 1 << 3;
        const BULLET_HIT = 1 << 4;
        /// The cached time of impact is valid.
        const TOI = 1 << 5;
    }
}

/// Links a contact into the contact list of one of its bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEdge {
    /// The body on the other side of the contact.
    pub other: BodyHandle,
    pub prev: Option<ContactHandle>,
    pub next: Option<ContactHandle>,
}

impl ContactEdge {
    const fn new(other: BodyHandle) -> Self {
        Self {
            other,
            prev: None,
            next: None,
        }
    }
}

/// A pair of bodies whose fat AABBs overlap. It may or may not be touching.
#[derive(Clone, Debug)]
pub struct Contact {
    pub(crate) flags: ContactFlags,
    pub(crate) manifold: Manifold,
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,
    pub(crate) contact_type: ContactType,
    pub(crate) node_a: ContactEdge,
    pub(crate) node_b: ContactEdge,
}

impl Contact {
    /// Creates the contact with the bodies in shape-type order. Returns `None`
    /// when no manifold routine exists for the pair (edge against edge).
    #[must_use]
    pub fn new(handle_a: BodyHandle, a: &Body, handle_b: BodyHandle, b: &Body) -> Option<Self> {
        let (type_a, type_b) = (a.shape.shape_type(), b.shape.shape_type());
        let ((body_a, type_a), (body_b, type_b)) = if ContactType::needs_swap(type_a, type_b) {
            ((handle_b, type_b), (handle_a, type_a))
        } else {
            ((handle_a, type_a), (handle_b, type_b))
        };

        let contact_type = ContactType::from_types(type_a, type_b)?;

        Some(Self {
            flags: ContactFlags::ENABLED,
            manifold: Manifold::default(),
            body_a,
            body_b,
            contact_type,
            node_a: ContactEdge::new(body_b),
            node_b: ContactEdge::new(body_a),
        })
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ContactFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    #[inline]
    #[must_use]
    pub const fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    #[inline]
    #[must_use]
    pub const fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    #[inline]
    #[must_use]
    pub const fn contact_type(&self) -> ContactType {
        self.contact_type
    }

    #[inline]
    #[must_use]
    pub const fn node_a(&self) -> &ContactEdge {
        &self.node_a
    }

    #[inline]
    #[must_use]
    pub const fn node_b(&self) -> &ContactEdge {
        &self.node_b
    }

    #[inline]
    #[must_use]
    pub const fn is_touching(&self) -> bool {
        self.flags.contains(ContactFlags::TOUCHING)
    }

    #[inline]
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.flags.contains(ContactFlags::ENABLED)
    }

    /// Re-enabled automatically on the next evaluation.
    pub fn disable(&mut self) {
        self.flags.remove(ContactFlags::ENABLED);
    }

    pub fn enable(&mut self) {
        self.flags.insert(ContactFlags::ENABLED);
    }

    pub fn flag_for_filtering(&mut self) {
        self.flags.insert(ContactFlags::FILTER);
    }

    /// Other body as seen from `body`.
    #[must_use]
    pub fn other(&self, body: BodyHandle) -> BodyHandle {
        self.edge(body).other
    }

    /// World-space normal and points of the current manifold.
    #[must_use]
    pub fn world_manifold(&self, body_a: &Body, body_b: &Body) -> WorldManifold {
        WorldManifold::new(
            &self.manifold,
            &body_a.xf,
            body_a.shape.radius(),
            &body_b.xf,
            body_b.shape.radius(),
        )
    }

    pub(crate) fn edge(&self, body: BodyHandle) -> &ContactEdge {
        debug_assert!(body == self.body_a || body == self.body_b);
        if body == self.body_a { &self.node_a } else { &self.node_b }
    }

    pub(crate) fn edge_mut(&mut self, body: BodyHandle) -> &mut ContactEdge {
        debug_assert!(body == self.body_a || body == self.body_b);
        if body == self.body_a {
            &mut self.node_a
        } else {
            &mut self.node_b
        }
    }

    /// Recomputes the manifold, carries impulses over from matching points of
    /// the previous manifold, and fires the begin/end callbacks on a change of
    /// the touching state.
    pub(crate) fn update<L: ContactListener>(&mut self, bodies: &mut Slab<Body>, listener: &mut L) {
        let old_manifold = self.manifold.clone();

        // Re-enable this contact.
        self.flags.insert(ContactFlags::ENABLED);

        let was_touching = self.is_touching();

        {
            let body_a = &bodies[self.body_a.0];
            let body_b = &bodies[self.body_b.0];
            evaluate(
                &mut self.manifold,
                &body_a.shape,
                &body_a.xf,
                &body_b.shape,
                &body_b.xf,
            );
        }

        let touching = self.manifold.point_count() > 0;

        // Match old contact ids to new contact ids and copy the impulses.
        for mp2 in &mut self.manifold.points {
            mp2.normal_impulse = 0.0;
            mp2.tangent_impulse = 0.0;

            if let Some(mp1) = old_manifold
                .points
                .iter()
                .find(|mp1| mp1.id.key() == mp2.id.key())
            {
                mp2.normal_impulse = mp1.normal_impulse;
                mp2.tangent_impulse = mp1.tangent_impulse;
            }
        }

        if touching != was_touching {
            bodies[self.body_a.0].awake = true;
            bodies[self.body_b.0].awake = true;
        }

        self.flags.set(ContactFlags::TOUCHING, touching);

        if !was_touching && touching {
            let enabled_a = report_collision(bodies, self.body_a, self.body_b, self);
            let enabled_b = report_collision(bodies, self.body_b, self.body_a, self);

            let mut enabled = enabled_a && enabled_b;
            if enabled {
                enabled = listener.begin_contact(self);
            }
            self.flags.set(ContactFlags::ENABLED, enabled);

            if !enabled {
                self.flags.remove(ContactFlags::TOUCHING);
            }
        } else if was_touching && !touching {
            report_separation(bodies, self.body_a, self.body_b);
            listener.end_contact(self);
        }
    }
}

/// Runs `this`'s collision handler, if any. Absent handlers accept.
fn report_collision(
    bodies: &mut Slab<Body>,
    this: BodyHandle,
    other: BodyHandle,
    contact: &Contact,
) -> bool {
    let Some(mut handler) = bodies[this.0].on_collision.take() else {
        return true;
    };

    let enabled = handler(this, other, contact);
    bodies[this.0].on_collision = Some(handler);
    enabled
}

/// Tells both bodies, A first, that they separated.
pub(crate) fn report_separation(bodies: &mut Slab<Body>, body_a: BodyHandle, body_b: BodyHandle) {
    for (this, other) in [(body_a, body_b), (body_b, body_a)] {
        let Some(body) = bodies.get_mut(this.0) else {
            continue;
        };
        let Some(mut handler) = body.on_separation.take() else {
            continue;
        };

        handler(this, other);
        bodies[this.0].on_separation = Some(handler);
    }
}
