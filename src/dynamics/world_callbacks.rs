use super::{Body, Contact};

/// Manager-level contact callbacks. Every hook defaults to accepting the pair
/// and doing nothing, so listeners only override what they watch.
pub trait ContactListener {
    /// Global pair filter, consulted after the per-body and category checks.
    fn should_collide(&mut self, _body_a: &Body, _body_b: &Body) -> bool {
        true
    }

    /// The contact just started touching. Returning `false` disables it and
    /// keeps it marked as not touching.
    fn begin_contact(&mut self, _contact: &Contact) -> bool {
        true
    }

    /// The contact stopped touching, or was destroyed while touching.
    fn end_contact(&mut self, _contact: &Contact) {}

    /// The contact is about to be destroyed.
    fn remove_contact(&mut self, _contact: &Contact) {}
}

impl ContactListener for () {}
