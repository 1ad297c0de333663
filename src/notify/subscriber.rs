//! Subscriber-based notifications for settings changes.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
#[must_use = "dropping the handle unsubscribes the callback"]
pub struct SubscriptionHandle {
    id: usize,
    unsubscribe: Option<Box<dyn FnOnce(usize) + Send + Sync>>,
}

impl SubscriptionHandle {
    /// Keep the subscription for as long as the registry lives.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe(self.id);
        }
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner<A> {
    subscribers: Vec<(usize, Callback<A>)>,
    next_id: usize,
}

/// Registry of callbacks receiving a payload of type `A`.
///
/// Callbacks run synchronously on the notifying thread, in subscription
/// order. The registry lock is not held while they run, so a callback may
/// subscribe, unsubscribe or trigger another notification.
///
/// # Examples
///
/// ```rust
/// use roaming_settings::notify::SubscriberRegistry;
///
/// let registry: SubscriberRegistry<&'static str> = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|name: &&'static str| {
///     println!("{} changed", name);
/// });
///
/// registry.notify_all(&"CameraName");
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry<A> {
    inner: Arc<RwLock<SubscriberRegistryInner<A>>>,
}

impl<A: 'static> SubscriberRegistry<A> {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback. Returns a handle that can be dropped to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        let registry: Weak<RwLock<SubscriberRegistryInner<A>>> = Arc::downgrade(&self.inner);
        SubscriptionHandle {
            id,
            unsubscribe: Some(Box::new(move |id| {
                if let Some(registry) = registry.upgrade() {
                    registry.write().subscribers.retain(|(sub_id, _)| *sub_id != id);
                }
            })),
        }
    }

    /// Call every registered callback with `payload`.
    pub fn notify_all(&self, payload: &A) {
        let callbacks: Vec<Callback<A>> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(payload);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl<A: 'static> Default for SubscriberRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for SubscriberRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_notify() {
        let registry = SubscriberRegistry::<()>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.notify_all(&());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_payload_and_order() {
        let registry = SubscriberRegistry::<String>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen1 = Arc::clone(&seen);
        let _handle1 = registry.subscribe(move |name: &String| {
            seen1.lock().push(format!("first:{}", name));
        });
        let seen2 = Arc::clone(&seen);
        let _handle2 = registry.subscribe(move |name: &String| {
            seen2.lock().push(format!("second:{}", name));
        });

        registry.notify_all(&"CameraName".to_string());
        assert_eq!(
            *seen.lock(),
            vec!["first:CameraName".to_string(), "second:CameraName".to_string()]
        );
    }

    #[test]
    fn test_unsubscribe_is_immediate() {
        let registry = SubscriberRegistry::<()>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&());
        drop(handle);
        registry.notify_all(&());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_detach_keeps_subscription() {
        let registry = SubscriberRegistry::<()>::new();
        registry.subscribe(|_| {}).detach();
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_callback_may_subscribe() {
        let registry = SubscriberRegistry::<()>::new();
        let nested = registry.clone();
        let handles = Arc::new(Mutex::new(Vec::new()));

        let handles_clone = Arc::clone(&handles);
        let _handle = registry.subscribe(move |_| {
            handles_clone.lock().push(nested.subscribe(|_| {}));
        });

        registry.notify_all(&());
        assert_eq!(registry.subscriber_count(), 2);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = SubscriberRegistry::<()>::new();
        let handle = registry.subscribe(|_| {});
        drop(registry);
        drop(handle);
    }
}
