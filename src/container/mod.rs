//! Reactive state containers.
//!
//! A [`StateContainer`] owns a single state value that can be read
//! synchronously, replaced or patched, reset to a default, and observed
//! as an ordered stream of changes, including derived streams that only
//! emit when a selected projection actually changes.

mod container;
mod subscription;

pub use container::StateContainer;
pub use subscription::{StateEvent, Subscription};
