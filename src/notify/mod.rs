//! Settings change notification.
//!
//! Provides the subscriber registries behind the store's two notification
//! channels and, with the `file-store` feature, the watcher that turns edits
//! of a settings file into external-change events.

pub mod subscriber;

#[cfg(feature = "file-store")]
pub mod watcher;

pub use subscriber::{SubscriberRegistry, SubscriptionHandle};

#[cfg(feature = "file-store")]
pub use watcher::FileWatcher;
