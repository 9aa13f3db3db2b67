pub mod coordinator;
pub mod diff;
pub mod error;
pub mod poller;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::ChatCoordinator;
pub use error::{UserAction, UserFacingError};
pub use poller::{DEFAULT_POLL_INTERVAL, MessagePoller, PollerHandle};
