//! Backing stores the settings are mirrored into.

mod backing_store;
mod memory;

#[cfg(feature = "file-store")]
mod file;

pub use backing_store::{BackingStore, ChangeListener};
pub use memory::MemoryStore;

#[cfg(feature = "file-store")]
pub use file::{DEFAULT_SYNC_DEBOUNCE, FileStore};
