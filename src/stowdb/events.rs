//! Change notification: a registry of subscriber callbacks notified
//! with a resource name whenever a derived component reports a change.
//! Fan-out is synchronous and follows registration order.

use std::collections::HashMap;
use uuid::Uuid;

/// Handle returned by [`ChangeNotifier::subscribe`], used to
/// unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

type Listener = Box<dyn Fn(&str) + Send>;

#[derive(Default)]
pub struct ChangeNotifier {
    // Ordered list drives dispatch; the map only resolves handles for
    // unsubscribe.
    order: Vec<SubscriberId>,
    listeners: HashMap<SubscriberId, Listener>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriberId
    where
        F: Fn(&str) + Send + 'static,
    {
        let id = SubscriberId(Uuid::new_v4());
        self.order.push(id);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Returns false if the handle was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        if self.listeners.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|existing| *existing != id);
        true
    }

    /// Notify every subscriber, in registration order, that `name`
    /// changed.
    pub fn notify_changed(&self, name: &str) {
        for id in &self.order {
            if let Some(listener) = self.listeners.get(id) {
                listener(name);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.order.len()
    }
}
