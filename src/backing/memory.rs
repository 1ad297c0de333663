//! In-process backing store.

use super::{BackingStore, ChangeListener};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A backing store held in memory.
///
/// Useful for tests and for hosts that bridge a platform store through their
/// own event loop. The `simulate_*` methods stand in for a sync from another
/// device: they change the contents and then fire the external-change
/// listeners, exactly as a roaming store would.
///
/// Clones share the same contents and listeners.
///
/// # Examples
///
/// ```rust
/// use roaming_settings::backing::{BackingStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("CameraName", "USB Camera".into()).unwrap();
/// assert!(store.contains_key("CameraName"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, config::Value>>>,
    listeners: Arc<RwLock<Vec<Arc<dyn Fn() + Send + Sync>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value without firing any listener.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<config::Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Store a value as if it arrived from another device, then fire the
    /// external-change listeners.
    pub fn simulate_remote_change(&self, key: impl Into<String>, value: impl Into<config::Value>) {
        self.insert_raw(key, value);
        self.fire_external_change();
    }

    /// Apply several remote values at once and fire the listeners a single time.
    pub fn simulate_remote_batch<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<config::Value>,
    {
        {
            let mut values = self.values.write();
            for (key, value) in entries {
                values.insert(key.into(), value.into());
            }
        }
        self.fire_external_change();
    }

    /// Clear the store as if another device did it, then fire the listeners.
    pub fn simulate_remote_clear(&self) {
        self.values.write().clear();
        self.fire_external_change();
    }

    /// Fire the external-change listeners without changing anything.
    pub fn fire_external_change(&self) {
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    /// The raw value stored under `key`.
    pub fn raw(&self, key: &str) -> Option<config::Value> {
        self.values.read().get(key).cloned()
    }

    /// Whether a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Number of registered external-change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl BackingStore for MemoryStore {
    fn get(&self, key: &str) -> Option<config::Value> {
        self.raw(key)
    }

    fn set(&self, key: &str, value: config::Value) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.write().clear();
        Ok(())
    }

    fn subscribe_external_changes(&self, listener: ChangeListener) -> Result<()> {
        self.listeners.write().push(Arc::from(listener));
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
