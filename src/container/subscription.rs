/// An event delivered to observers registered with
/// [`StateContainer::observe_events`](super::StateContainer::observe_events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent<T> {
    /// A newly published state value.
    Next(T),
    /// The container was completed; no further values will be published.
    Complete,
}

/// RAII guard for an active observer registration.
///
/// Dropping the subscription removes the observer from the container.
/// Call [`forget`](Subscription::forget) to keep observing for the
/// container's whole lifetime instead.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never registered (the container had
    /// already completed).
    pub(crate) fn empty() -> Self {
        Self { cancel: None }
    }

    /// Remove the observer now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Leave the observer registered until the container is completed.
    pub fn forget(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
