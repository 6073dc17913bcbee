mod body;
mod contact;
mod contact_manager;
mod world;
mod world_callbacks;

pub use body::*;
pub use contact::{Contact, ContactEdge, ContactFlags, ContactHandle};
pub use contact_manager::*;
pub use world::*;
pub use world_callbacks::*;
