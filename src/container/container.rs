use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, trace};

use crate::error::{StateError, StateResult};

use super::{StateEvent, Subscription};

type Observer<T> = Arc<dyn Fn(StateEvent<&T>) + Send + Sync>;

struct Inner<T> {
    state: RwLock<T>,
    default_state: RwLock<T>,
    observers: RwLock<Vec<(usize, Observer<T>)>>,
    completed: AtomicBool,
    next_id: AtomicUsize,
}

/// A thread-safe container for a single reactive state value.
///
/// The container owns the current value; everything handed out by
/// [`snapshot`](StateContainer::snapshot) or delivered to observers is a
/// read-only snapshot. Every mutation path ([`patch`](StateContainer::patch),
/// [`reset`](StateContainer::reset)) funnels through a single
/// [`set`](StateContainer::set), which publishes the new value to all
/// active observers in call order.
///
/// Observers run synchronously on the publishing thread and must not
/// mutate the container or register new observers from within the
/// callback.
pub struct StateContainer<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> StateContainer<T> {
    /// Create a new container holding `default_state` as both the current
    /// value and the reset target.
    pub fn new(default_state: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(default_state.clone()),
                default_state: RwLock::new(default_state),
                observers: RwLock::new(Vec::new()),
                completed: AtomicBool::new(false),
                next_id: AtomicUsize::new(0),
            }),
        }
    }

    /// Get a snapshot of the current state.
    pub fn snapshot(&self) -> T {
        self.inner.state.read().unwrap().clone()
    }

    /// Get the default state used by the constructor or the most recent
    /// [`reset_with`](StateContainer::reset_with).
    pub fn default_state(&self) -> T {
        self.inner.default_state.read().unwrap().clone()
    }

    /// Set the next state and publish it to all active observers.
    ///
    /// The value is replaced unconditionally; no equality check is made.
    /// Fails with [`StateError::Completed`] once the container has been
    /// completed.
    pub fn set(&self, state: T) -> StateResult<()> {
        if self.is_completed() {
            return Err(StateError::Completed);
        }
        *self.inner.state.write().unwrap() = state;
        self.notify();
        Ok(())
    }

    /// Patch the state by applying `patch` to a copy of the current
    /// snapshot, then publishing the result.
    ///
    /// Exactly one value is published per call; observers never see an
    /// intermediate state.
    pub fn patch<F>(&self, patch: F) -> StateResult<()>
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.snapshot();
        patch(&mut state);
        self.set(state)
    }

    /// Reset the state to the default value.
    pub fn reset(&self) -> StateResult<()> {
        let default_state = self.default_state();
        self.set(default_state)
    }

    /// Replace the stored default for all future resets, then reset to it.
    pub fn reset_with(&self, new_default: T) -> StateResult<()> {
        self.replace_default(new_default.clone());
        self.set(new_default)
    }

    pub(crate) fn replace_default(&self, new_default: T) {
        *self.inner.default_state.write().unwrap() = new_default;
    }

    /// Subscribe to state changes.
    ///
    /// The observer is invoked immediately with the current value, then
    /// with every subsequently set value, in set order, until the
    /// container is completed or the returned [`Subscription`] is
    /// dropped. Observers on a completed container are never invoked.
    pub fn observe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.observe_events(move |event| {
            if let StateEvent::Next(state) = event {
                observer(state);
            }
        })
    }

    /// Subscribe to state changes and the completion signal.
    ///
    /// Same contract as [`observe`](StateContainer::observe), but the
    /// observer also receives [`StateEvent::Complete`] when the container
    /// is completed. Subscribing to an already-completed container
    /// delivers `Complete` immediately and nothing else.
    pub fn observe_events<F>(&self, observer: F) -> Subscription
    where
        F: Fn(StateEvent<&T>) + Send + Sync + 'static,
    {
        if self.is_completed() {
            observer(StateEvent::Complete);
            return Subscription::empty();
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let observer: Observer<T> = Arc::new(observer);
        self.inner
            .observers
            .write()
            .unwrap()
            .push((id, Arc::clone(&observer)));

        // Replay the current value to the new observer.
        {
            let state = self.inner.state.read().unwrap();
            observer(StateEvent::Next(&*state));
        }

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .observers
                    .write()
                    .unwrap()
                    .retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }

    /// Subscribe to changes of a single state field.
    ///
    /// `field` borrows the field out of the state; the observer receives
    /// the current field value immediately, then only values that differ
    /// from the most recently delivered one.
    pub fn select<U, P, F>(&self, field: P, observer: F) -> Subscription
    where
        U: Clone + PartialEq + Send + 'static,
        P: Fn(&T) -> &U + Send + Sync + 'static,
        F: Fn(&U) + Send + Sync + 'static,
    {
        self.selector(move |state| field(state).clone(), observer)
    }

    /// Subscribe to changes of a value computed from the state.
    ///
    /// The observer receives the current projected value immediately,
    /// then only projections that differ from the most recently delivered
    /// one. The comparison looks back exactly one step: a value that
    /// reappears after a different value is delivered again.
    pub fn selector<U, P, F>(&self, project: P, observer: F) -> Subscription
    where
        U: PartialEq + Send + 'static,
        P: Fn(&T) -> U + Send + Sync + 'static,
        F: Fn(&U) + Send + Sync + 'static,
    {
        let last: Mutex<Option<U>> = Mutex::new(None);
        self.observe_events(move |event| {
            if let StateEvent::Next(state) = event {
                let value = project(state);
                let mut last = last.lock().unwrap();
                if last.as_ref() != Some(&value) {
                    observer(&value);
                    *last = Some(value);
                }
            }
        })
    }

    /// Stop the emission of state changes.
    ///
    /// Active observers receive [`StateEvent::Complete`] and are removed;
    /// any later `set`, `patch` or `reset` fails with
    /// [`StateError::Completed`]. Idempotent.
    pub fn complete(&self) {
        if self.inner.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        let observers = std::mem::take(&mut *self.inner.observers.write().unwrap());
        debug!(observers = observers.len(), "state container completed");
        for (_, observer) in observers {
            observer(StateEvent::Complete);
        }
    }

    /// Whether the container has been completed.
    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Notify all observers of the current state.
    fn notify(&self) {
        let state = self.inner.state.read().unwrap();
        let observers = self.inner.observers.read().unwrap();
        trace!(observers = observers.len(), "state published");
        for (_, observer) in observers.iter() {
            observer(StateEvent::Next(&*state));
        }
    }
}

impl<T> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct AppState {
        count: usize,
        name: String,
    }

    fn app_state(count: usize, name: &str) -> AppState {
        AppState {
            count,
            name: name.to_string(),
        }
    }

    fn recorder<T: Clone + Send + 'static>(
    ) -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static) {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&recorded);
        (recorded, move |value: &T| {
            sink.lock().unwrap().push(value.clone())
        })
    }

    #[test]
    fn constructor_sets_initial_state() {
        let container = StateContainer::new(app_state(0, "Example"));
        assert_eq!(container.snapshot(), app_state(0, "Example"));
        assert_eq!(container.default_state(), app_state(0, "Example"));
    }

    #[test]
    fn observer_receives_current_value_immediately() {
        let container = StateContainer::new(app_state(0, "Example"));
        container.set(app_state(1, "Example")).unwrap();

        let (recorded, sink) = recorder();
        let _sub = container.observe(sink);

        assert_eq!(*recorded.lock().unwrap(), vec![app_state(1, "Example")]);
    }

    #[test]
    fn observer_receives_changes_in_set_order() {
        let container = StateContainer::new(0usize);
        let (recorded, sink) = recorder();
        let _sub = container.observe(sink);

        for n in 1..=300 {
            container.set(n).unwrap();
        }

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.len(), 301);
        assert!(recorded.iter().copied().eq(0..=300));
    }

    #[test]
    fn multiple_observers_each_see_full_sequence() {
        let container = StateContainer::new(0);
        let (first, first_sink) = recorder();
        let (second, second_sink) = recorder();
        let _a = container.observe(first_sink);
        let _b = container.observe(second_sink);

        container.set(1).unwrap();
        container.set(2).unwrap();

        assert_eq!(*first.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(*second.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn patch_publishes_exactly_once() {
        let container = StateContainer::new(app_state(0, "Example"));
        let (recorded, sink) = recorder();
        let _sub = container.observe(sink);

        container.patch(|state| state.name = "Other".to_string()).unwrap();

        let recorded = recorded.lock().unwrap();
        assert_eq!(
            *recorded,
            vec![app_state(0, "Example"), app_state(0, "Other")]
        );
    }

    #[test]
    fn reset_restores_default() {
        let container = StateContainer::new(app_state(0, "Example"));
        container.set(app_state(9, "Something")).unwrap();
        container.reset().unwrap();
        assert_eq!(container.snapshot(), app_state(0, "Example"));
    }

    #[test]
    fn reset_with_replaces_default_permanently() {
        let container = StateContainer::new(app_state(0, "Example"));
        let (recorded, sink) = recorder();
        let _sub = container.observe(sink);

        container.set(app_state(0, "Something")).unwrap();
        container.reset_with(app_state(0, "Other")).unwrap();
        container.set(app_state(0, "Something")).unwrap();
        container.reset().unwrap();

        assert_eq!(
            *recorded.lock().unwrap(),
            vec![
                app_state(0, "Example"),
                app_state(0, "Something"),
                app_state(0, "Other"),
                app_state(0, "Something"),
                app_state(0, "Other"),
            ]
        );
    }

    #[test]
    fn selector_skips_consecutive_duplicates() {
        let container = StateContainer::new(app_state(4, "Example"));
        let (recorded, sink) = recorder();
        let _sub = container.selector(|state| state.count, sink);

        container.set(app_state(4, "a")).unwrap();
        container.set(app_state(4, "b")).unwrap();
        container.set(app_state(5, "c")).unwrap();

        assert_eq!(*recorded.lock().unwrap(), vec![4, 5]);
    }

    #[test]
    fn selector_redelivers_value_after_a_gap() {
        let container = StateContainer::new(1usize);
        let (recorded, sink) = recorder();
        let _sub = container.selector(|n| *n, sink);

        container.set(2).unwrap();
        container.set(1).unwrap();

        // Dedup looks back exactly one step.
        assert_eq!(*recorded.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn select_tracks_a_single_field() {
        let container = StateContainer::new(app_state(0, "two"));
        let (recorded, sink) = recorder();
        let _sub = container.select(|state| &state.name, sink);

        container.patch(|state| state.name = "four".to_string()).unwrap();
        container.set(app_state(1, "four")).unwrap();
        container.patch(|state| state.count = 2).unwrap();

        assert_eq!(
            *recorded.lock().unwrap(),
            vec!["two".to_string(), "four".to_string()]
        );
    }

    #[test]
    fn complete_delivers_terminal_event() {
        let container = StateContainer::new(0);
        let completions = Arc::new(AtomicUsize::new(0));
        let completions_clone = Arc::clone(&completions);
        let _sub = container.observe_events(move |event| {
            if matches!(event, StateEvent::Complete) {
                completions_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        container.complete();
        container.complete();

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(container.is_completed());
    }

    #[test]
    fn set_after_complete_fails() {
        let container = StateContainer::new(0);
        container.complete();

        assert!(matches!(container.set(1), Err(StateError::Completed)));
        assert!(matches!(container.patch(|n| *n = 1), Err(StateError::Completed)));
        assert!(matches!(container.reset(), Err(StateError::Completed)));
        assert_eq!(container.snapshot(), 0);
    }

    #[test]
    fn observing_a_completed_container_yields_only_complete() {
        let container = StateContainer::new(0);
        container.complete();

        let (recorded, sink) = recorder();
        let sub = container.observe(sink);
        sub.unsubscribe();

        assert!(recorded.lock().unwrap().is_empty());
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let container = StateContainer::new(0);
        let (recorded, sink) = recorder();
        let sub = container.observe(sink);

        container.set(1).unwrap();
        drop(sub);
        container.set(2).unwrap();

        assert_eq!(*recorded.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn forgotten_subscription_keeps_receiving() {
        let container = StateContainer::new(0);
        let (recorded, sink) = recorder();
        container.observe(sink).forget();

        container.set(1).unwrap();

        assert_eq!(*recorded.lock().unwrap(), vec![0, 1]);
    }
}
