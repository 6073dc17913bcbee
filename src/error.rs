use thiserror::Error;

use crate::collision::broadphase::ProxyId;

pub type Result<T> = std::result::Result<T, CollideError>;

/// Lookup failures surfaced to callers. Misuse is asserted instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CollideError {
    #[error("proxy id {proxy_id} not found in broad-phase")]
    ProxyNotFound { proxy_id: ProxyId },

    #[error("body {handle} not found in world")]
    BodyNotFound { handle: usize },
}
