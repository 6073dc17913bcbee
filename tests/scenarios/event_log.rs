use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use collide2d::{Body, BodyHandle, Contact, ContactListener};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Begin(BodyHandle, BodyHandle),
    End(BodyHandle, BodyHandle),
    Remove(BodyHandle, BodyHandle),
    Collision(BodyHandle, BodyHandle),
    Separation(BodyHandle, BodyHandle),
}

/// Records every callback together with the step it fired in. Clones share
/// the same log, so per-body handlers can write into it too.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    pub step: Rc<Cell<usize>>,
    pub events: Rc<RefCell<Vec<(usize, Event)>>>,
    /// `user_data` values the global filter rejects.
    pub rejected: Vec<u64>,
}

impl EventLog {
    pub fn set_step(&self, step: usize) {
        self.step.set(step);
    }

    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push((self.step.get(), event));
    }

    pub fn events(&self) -> Vec<(usize, Event)> {
        self.events.borrow().clone()
    }

    pub fn steps_of(&self, wanted: fn(&Event) -> bool) -> Vec<usize> {
        self.events
            .borrow()
            .iter()
            .filter(|(_, event)| wanted(event))
            .map(|&(step, _)| step)
            .collect()
    }

    pub fn begin_steps(&self) -> Vec<usize> {
        self.steps_of(|e| matches!(e, Event::Begin(..)))
    }

    pub fn end_steps(&self) -> Vec<usize> {
        self.steps_of(|e| matches!(e, Event::End(..)))
    }

    /// Hooks per-body handlers that log into this log.
    pub fn watch(&self, body: Body) -> Body {
        let on_collision = self.clone();
        let on_separation = self.clone();
        body.with_on_collision(move |this, other, _| {
            on_collision.push(Event::Collision(this, other));
            true
        })
        .with_on_separation(move |this, other| {
            on_separation.push(Event::Separation(this, other));
        })
    }
}

impl ContactListener for EventLog {
    fn should_collide(&mut self, body_a: &Body, body_b: &Body) -> bool {
        !self.rejected.contains(&body_a.user_data) && !self.rejected.contains(&body_b.user_data)
    }

    fn begin_contact(&mut self, contact: &Contact) -> bool {
        self.push(Event::Begin(contact.body_a(), contact.body_b()));
        true
    }

    fn end_contact(&mut self, contact: &Contact) {
        self.push(Event::End(contact.body_a(), contact.body_b()));
    }

    fn remove_contact(&mut self, contact: &Contact) {
        self.push(Event::Remove(contact.body_a(), contact.body_b()));
    }
}
