//! Backing store trait.

use crate::error::Result;

/// Callback invoked when the backing store's contents change from outside
/// this process. Carries no payload; the receiver re-reads everything.
pub type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// Trait for the persistent, possibly roaming, key-value store behind the
/// settings.
///
/// Values are untyped: whatever primitive or string the store preserves.
/// Converting them to and from the typed settings is the store's job, not
/// the backing store's.
///
/// Implement this trait to plug in a platform store (e.g. a roaming settings
/// container, a synced folder, a remote KV service).
pub trait BackingStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<config::Value>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: config::Value) -> Result<()>;

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleared state cannot be persisted.
    fn clear(&self) -> Result<()>;

    /// Register a listener for changes that arrive from elsewhere (another
    /// device, another process). Local `set` and `clear` calls must not
    /// trigger it.
    ///
    /// # Errors
    ///
    /// Returns an error if change tracking cannot be started.
    fn subscribe_external_changes(&self, listener: ChangeListener) -> Result<()>;

    /// Get a human-readable name for this store (for logging/debugging).
    fn name(&self) -> String;
}
