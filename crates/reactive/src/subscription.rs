//! Subscription management for observable views.

use crate::change_set::ChangeSet;
use alloc::boxed::Box;
use hashbrown::HashMap;

/// Unique identifier for a subscription within one view.
pub type SubscriptionId = u64;

/// Callback type for change notifications.
pub type ChangeCallback = Box<dyn Fn(&ChangeSet)>;

/// Manages the subscriber list of one observable view.
///
/// Delivery is synchronous: `notify_all` invokes every callback before it
/// returns, inside the batch that caused the change.
pub struct SubscriptionManager {
    subscriptions: HashMap<SubscriptionId, ChangeCallback>,
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers a callback; returns the id used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeSet) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.insert(id, Box::new(callback));
        id
    }

    /// Removes a subscription; returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Notifies every subscriber of one batch's net changes.
    pub fn notify_all(&self, changes: &ChangeSet) {
        for callback in self.subscriptions.values() {
            callback(changes);
        }
    }

    /// Returns the number of active subscriptions.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    #[test]
    fn test_subscribe_and_notify() {
        let mut manager = SubscriptionManager::new();
        let count = Rc::new(RefCell::new(0));

        let c1 = count.clone();
        manager.subscribe(move |_| *c1.borrow_mut() += 1);
        let c2 = count.clone();
        manager.subscribe(move |_| *c2.borrow_mut() += 1);

        manager.notify_all(&ChangeSet::new());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut manager = SubscriptionManager::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let id = manager.subscribe(move |_| *c.borrow_mut() += 1);
        assert!(manager.unsubscribe(id));
        assert!(!manager.unsubscribe(id));

        manager.notify_all(&ChangeSet::new());
        assert_eq!(*count.borrow(), 0);
    }
}
