pub mod event_log;
pub mod setup;

pub use event_log::*;
pub use setup::*;
