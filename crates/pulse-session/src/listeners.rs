//! Subscriber registries.
//!
//! Listeners are `Arc`-wrapped closures. Registering the same `Arc` twice
//! is a no-op that hands back the original [`SubscriptionId`], so a
//! listener is called at most once per event. Fan-out follows the order
//! of first registration.

use std::fmt;
use std::sync::Arc;

use crate::LogEntry;

/// Called with the new readiness whenever the transport reports a change.
pub type ReadyListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Called with every log entry the session produces.
pub type LogListener = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Handle returned by a subscribe call; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Ordered, duplicate-free list of one kind of listener.
struct Registry<L: ?Sized> {
    entries: Vec<(SubscriptionId, Arc<L>)>,
}

impl<L: ?Sized> Registry<L> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn find(&self, listener: &Arc<L>) -> Option<SubscriptionId> {
        self.entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, listener))
            .map(|(id, _)| *id)
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<L>> {
        self.entries.iter().map(|(_, listener)| listener)
    }
}

/// Both listener registries of a session, sharing one id space.
pub(crate) struct Listeners {
    next_id: u64,
    ready: Registry<dyn Fn(bool) + Send + Sync>,
    log: Registry<dyn Fn(&LogEntry) + Send + Sync>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            ready: Registry::new(),
            log: Registry::new(),
        }
    }

    fn allocate(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn subscribe_ready(
        &mut self,
        listener: ReadyListener,
    ) -> SubscriptionId {
        if let Some(id) = self.ready.find(&listener) {
            return id;
        }
        let id = self.allocate();
        self.ready.entries.push((id, listener));
        id
    }

    pub(crate) fn subscribe_log(
        &mut self,
        listener: LogListener,
    ) -> SubscriptionId {
        if let Some(id) = self.log.find(&listener) {
            return id;
        }
        let id = self.allocate();
        self.log.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.ready.remove(id) || self.log.remove(id)
    }

    /// Calls every ready listener. A panicking listener stops the fan-out.
    pub(crate) fn notify_ready(&self, ready: bool) {
        for listener in self.ready.iter() {
            listener(ready);
        }
    }

    /// Calls every log listener. A panicking listener stops the fan-out.
    pub(crate) fn notify_log(&self, entry: &LogEntry) {
        for listener in self.log.iter() {
            listener(entry);
        }
    }

    #[cfg(test)]
    pub(crate) fn counts(&self) -> (usize, usize) {
        (self.ready.entries.len(), self.log.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{EntryKind, PacketDetails};

    fn counting_ready(counter: &Arc<AtomicUsize>) -> ReadyListener {
        let counter = Arc::clone(counter);
        Arc::new(move |_: bool| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_subscribe_same_listener_twice_returns_same_id() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = counting_ready(&calls);

        let first = listeners.subscribe_ready(Arc::clone(&listener));
        let second = listeners.subscribe_ready(listener);
        listeners.notify_ready(true);

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.counts(), (1, 0));
    }

    #[test]
    fn test_distinct_closures_are_distinct_listeners() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));

        listeners.subscribe_ready(counting_ready(&calls));
        listeners.subscribe_ready(counting_ready(&calls));
        listeners.notify_ready(false);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_notify_follows_subscription_order() {
        let mut listeners = Listeners::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            listeners.subscribe_log(Arc::new(move |_: &LogEntry| {
                order.lock().push(tag);
            }));
        }
        listeners.notify_log(&LogEntry::outbound(
            EntryKind::SessionLeft,
            PacketDetails::default(),
        ));

        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_removes_listener() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let id = listeners.subscribe_ready(counting_ready(&calls));

        assert!(listeners.unsubscribe(id));
        listeners.notify_ready(true);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!listeners.unsubscribe(id), "second removal is a no-op");
    }

    #[test]
    fn test_ids_are_unique_across_registries() {
        let mut listeners = Listeners::new();
        let ready = listeners.subscribe_ready(Arc::new(|_: bool| {}));
        let log = listeners.subscribe_log(Arc::new(|_: &LogEntry| {}));

        assert_ne!(ready, log);
        assert!(listeners.unsubscribe(log));
        assert_eq!(listeners.counts(), (1, 0));
    }

    #[test]
    fn test_resubscribe_after_unsubscribe_gets_new_id() {
        let mut listeners = Listeners::new();
        let listener: ReadyListener = Arc::new(|_: bool| {});
        let first = listeners.subscribe_ready(Arc::clone(&listener));
        listeners.unsubscribe(first);

        let second = listeners.subscribe_ready(listener);

        assert_ne!(first, second);
    }

    fn failing_log(_: &LogEntry) {
        panic!("listener failed");
    }

    fn failing_ready(_: bool) {
        panic!("listener failed");
    }

    #[test]
    fn test_notify_log_panicking_listener_stops_fanout() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));
        listeners.subscribe_log(Arc::new(failing_log));
        let counter = Arc::clone(&calls);
        listeners.subscribe_log(Arc::new(move |_: &LogEntry| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let entry =
            LogEntry::outbound(EntryKind::BlankSent, PacketDetails::default());
        let result =
            catch_unwind(AssertUnwindSafe(|| listeners.notify_log(&entry)));

        assert!(result.is_err(), "the panic reaches the caller");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_notify_ready_panicking_listener_stops_fanout() {
        let mut listeners = Listeners::new();
        let calls = Arc::new(AtomicUsize::new(0));
        listeners.subscribe_ready(Arc::new(failing_ready));
        listeners.subscribe_ready(counting_ready(&calls));

        let result =
            catch_unwind(AssertUnwindSafe(|| listeners.notify_ready(true)));

        assert!(result.is_err(), "the panic reaches the caller");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
