//! # roaming-settings
//!
//! Typed, observable application settings mirrored into a roaming key-value store.
//!
//! ## Overview
//!
//! `roaming-settings` keeps a fixed set of typed settings in memory and mirrors
//! them into an untyped backing store that may be synced between devices:
//! - Lock-free reads of a complete, atomically published record (`arc-swap`)
//! - Write-through on every local change
//! - Reload on changes synced in from elsewhere
//! - Two notification channels: a coarse "settings changed" signal and a
//!   per-field "this setting changed" signal
//!
//! ## Quick Start
//!
//! ```rust
//! use roaming_settings::prelude::*;
//! use roaming_settings::backing::MemoryStore;
//!
//! # fn example() -> roaming_settings::error::Result<()> {
//! let settings = SettingsStore::builder()
//!     .with_backing_store(MemoryStore::new())
//!     .build()?;
//!
//! let _coarse = settings.on_settings_changed(|| println!("settings changed"));
//! let _per_field = settings.on_field_changed(|field| println!("{} changed", field));
//!
//! settings.set_face_api_key_region("westeurope");
//! assert_eq!(settings.face_api_key_region(), "westeurope");
//! # Ok(())
//! # }
//! ```
//!
//! ## Change semantics
//!
//! - A local write updates memory, writes the value through to the backing
//!   store, then notifies per-field subscribers followed by coarse subscribers.
//! - An external change reloads every field and notifies coarse subscribers
//!   only.
//! - Stored values that do not parse as the field's type are ignored and the
//!   field keeps its current value.
//!
//! ## Feature Flags
//!
//! - `file-store` (default): JSON-file backing store with change watching
//! - `metrics`: OpenTelemetry counters for writes, syncs and restores

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod backing;
pub mod core;
pub mod error;
pub mod notify;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::backing::{BackingStore, MemoryStore};
    pub use crate::core::{Field, FieldKind, SettingValue, Settings, SettingsStore, SettingsStoreBuilder};
    pub use crate::error::{ConfigError, Result};
    pub use crate::notify::SubscriptionHandle;

    #[cfg(feature = "file-store")]
    pub use crate::backing::FileStore;
}
