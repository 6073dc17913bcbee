use log::{debug, trace};
use slab::Slab;

use super::{
    Body, BodyHandle, Contact, ContactFlags, ContactHandle, ContactListener,
    contact::report_separation,
};
use crate::{collision::broadphase::BroadPhase, error::Result};

/// Owns the broad-phase and every live contact. Contacts are created from new
/// broad-phase pairs and destroyed once their fat AABBs stop overlapping.
#[derive(Debug)]
pub struct ContactManager<B: BroadPhase> {
    pub(crate) broad_phase: B,
    contacts: Slab<Contact>,
    scratch: Vec<ContactHandle>,
}

impl<B: BroadPhase> ContactManager<B> {
    #[must_use]
    pub fn new(broad_phase: B) -> Self {
        Self {
            broad_phase,
            contacts: Slab::with_capacity(128),
            scratch: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn broad_phase(&self) -> &B {
        &self.broad_phase
    }

    #[inline]
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    #[must_use]
    pub fn contact(&self, handle: ContactHandle) -> Option<&Contact> {
        self.contacts.get(handle.0)
    }

    pub fn contact_mut(&mut self, handle: ContactHandle) -> Option<&mut Contact> {
        self.contacts.get_mut(handle.0)
    }

    pub fn contacts(&self) -> impl Iterator<Item = (ContactHandle, &Contact)> {
        self.contacts.iter().map(|(key, c)| (ContactHandle(key), c))
    }

    /// Walks the contact list of `body`.
    pub fn body_contacts<'a>(
        &'a self,
        handle: BodyHandle,
        body: &Body,
    ) -> impl Iterator<Item = (ContactHandle, &'a Contact)> + 'a {
        let mut next = body.contact_list;
        std::iter::from_fn(move || {
            let current = next?;
            let contact = self.contacts.get(current.0)?;
            next = contact.edge(handle).next;
            Some((current, contact))
        })
    }

    /// Creates contacts for the pairs the broad-phase found since the last call.
    pub fn find_new_contacts<L: ContactListener>(
        &mut self,
        bodies: &mut Slab<Body>,
        listener: &mut L,
    ) {
        let Self {
            broad_phase,
            contacts,
            ..
        } = self;

        broad_phase.update_pairs(|proxy_a, proxy_b| {
            add_pair(contacts, bodies, listener, proxy_a.body, proxy_b.body);
        });
    }

    /// Re-filters and re-evaluates every contact, destroying the ones whose
    /// fat AABBs no longer overlap.
    pub fn collide<L: ContactListener>(
        &mut self,
        bodies: &mut Slab<Body>,
        listener: &mut L,
    ) -> Result<()> {
        let mut handles = std::mem::take(&mut self.scratch);
        handles.clear();
        handles.extend(self.contacts.iter().map(|(key, _)| ContactHandle(key)));

        let result = handles
            .iter()
            .try_for_each(|&handle| self.collide_one(handle, bodies, listener));

        self.scratch = handles;
        result
    }

    fn collide_one<L: ContactListener>(
        &mut self,
        handle: ContactHandle,
        bodies: &mut Slab<Body>,
        listener: &mut L,
    ) -> Result<()> {
        let Some(contact) = self.contacts.get(handle.0) else {
            return Ok(());
        };
        let (handle_a, handle_b) = (contact.body_a, contact.body_b);
        let needs_filter = contact.flags.contains(ContactFlags::FILTER);

        let (Some(body_a), Some(body_b)) = (bodies.get(handle_a.0), bodies.get(handle_b.0)) else {
            return Ok(());
        };

        if !body_a.awake && !body_b.awake {
            return Ok(());
        }

        if needs_filter {
            if !passes_filters(body_a, body_b, listener) {
                trace!("contact {} failed re-filtering", handle.0);
                self.destroy(handle, bodies, listener);
                return Ok(());
            }

            self.contacts[handle.0].flags.remove(ContactFlags::FILTER);
        }

        let overlap = self
            .broad_phase
            .test_overlap(body_a.proxy_id, body_b.proxy_id)?;

        if overlap {
            self.contacts[handle.0].update(bodies, listener);
        } else {
            self.destroy(handle, bodies, listener);
        }

        Ok(())
    }

    /// Fires the end/remove callbacks, unlinks the contact from both bodies and
    /// frees its slot.
    pub fn destroy<L: ContactListener>(
        &mut self,
        handle: ContactHandle,
        bodies: &mut Slab<Body>,
        listener: &mut L,
    ) {
        let Some(contact) = self.contacts.get(handle.0) else {
            return;
        };
        let (body_a, body_b) = (contact.body_a, contact.body_b);
        let touching = contact.is_touching();

        if touching {
            listener.end_contact(contact);
        }
        listener.remove_contact(contact);
        if touching {
            report_separation(bodies, body_a, body_b);
        }

        unlink(&mut self.contacts, bodies, handle, body_a);
        unlink(&mut self.contacts, bodies, handle, body_b);
        self.contacts.remove(handle.0);

        debug!("destroyed contact {} between bodies {} and {}", handle.0, body_a.0, body_b.0);
    }
}

/// Per-body veto, category masks, then the global filter.
fn passes_filters<L: ContactListener>(body_a: &Body, body_b: &Body, listener: &mut L) -> bool {
    body_b.should_collide(body_a)
        && body_a.categories_match(body_b)
        && listener.should_collide(body_a, body_b)
}

fn add_pair<L: ContactListener>(
    contacts: &mut Slab<Contact>,
    bodies: &mut Slab<Body>,
    listener: &mut L,
    handle_a: BodyHandle,
    handle_b: BodyHandle,
) {
    // Both sides on the same body.
    if handle_a == handle_b {
        return;
    }

    let (Some(body_a), Some(body_b)) = (bodies.get(handle_a.0), bodies.get(handle_b.0)) else {
        return;
    };

    // Does a contact already exist?
    let mut edge = body_b.contact_list;
    while let Some(current) = edge {
        let node = contacts[current.0].edge(handle_b);
        if node.other == handle_a {
            return;
        }
        edge = node.next;
    }

    if !passes_filters(body_a, body_b, listener) {
        return;
    }

    let Some(contact) = Contact::new(handle_a, body_a, handle_b, body_b) else {
        trace!("no contact for bodies {} and {}", handle_a.0, handle_b.0);
        return;
    };

    let handle = ContactHandle(contacts.insert(contact));
    link(contacts, bodies, handle, handle_a);
    link(contacts, bodies, handle, handle_b);

    debug!("created contact {} between bodies {} and {}", handle.0, handle_a.0, handle_b.0);
}

/// Pushes the contact to the front of `body`'s contact list.
fn link(
    contacts: &mut Slab<Contact>,
    bodies: &mut Slab<Body>,
    handle: ContactHandle,
    body: BodyHandle,
) {
    let head = bodies[body.0].contact_list;
    if let Some(head) = head {
        contacts[head.0].edge_mut(body).prev = Some(handle);
    }

    let edge = contacts[handle.0].edge_mut(body);
    edge.prev = None;
    edge.next = head;
    bodies[body.0].contact_list = Some(handle);
}

fn unlink(
    contacts: &mut Slab<Contact>,
    bodies: &mut Slab<Body>,
    handle: ContactHandle,
    body: BodyHandle,
) {
    let edge = *contacts[handle.0].edge(body);

    if let Some(prev) = edge.prev {
        contacts[prev.0].edge_mut(body).next = edge.next;
    }
    if let Some(next) = edge.next {
        contacts[next.0].edge_mut(body).prev = edge.prev;
    }

    if let Some(b) = bodies.get_mut(body.0)
        && b.contact_list == Some(handle)
    {
        b.contact_list = edge.next;
    }
}
