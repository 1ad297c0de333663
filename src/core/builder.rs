//! Builder for constructing SettingsStore instances.

use crate::backing::{BackingStore, MemoryStore};
use crate::core::SettingsStore;
use crate::core::store::StoreOptions;
use crate::error::{ConfigError, Result};
use std::sync::Arc;

#[cfg(feature = "file-store")]
use crate::backing::{DEFAULT_SYNC_DEBOUNCE, FileStore};
#[cfg(feature = "file-store")]
use std::path::PathBuf;
#[cfg(feature = "file-store")]
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::SettingsMetrics;

enum BackingChoice {
    Custom(Arc<dyn BackingStore>),
    Memory,
    #[cfg(feature = "file-store")]
    File(PathBuf),
}

/// Builder for constructing a `SettingsStore`.
///
/// # Examples
///
/// ```rust,no_run
/// use roaming_settings::prelude::*;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let settings = SettingsStore::builder()
///     .with_file_store("/home/kiosk/OneDrive/kiosk/settings.json")
///     .with_sync_debounce(Duration::from_millis(500))
///     .build()?;
///
/// println!("Camera: {}", settings.camera_name());
/// # Ok(())
/// # }
/// ```
pub struct SettingsStoreBuilder {
    backing: Option<BackingChoice>,
    initialize_on_build: bool,
    #[cfg(feature = "file-store")]
    sync_debounce: Duration,
    #[cfg(feature = "metrics")]
    metrics: Option<SettingsMetrics>,
}

impl SettingsStoreBuilder {
    /// Create a new builder with default settings.
    ///
    /// By default the store is initialized by [`build`](Self::build).
    pub fn new() -> Self {
        Self {
            backing: None,
            initialize_on_build: true,
            #[cfg(feature = "file-store")]
            sync_debounce: DEFAULT_SYNC_DEBOUNCE,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Use a custom backing store.
    pub fn with_backing_store<B: BackingStore + 'static>(mut self, backing: B) -> Self {
        self.backing = Some(BackingChoice::Custom(Arc::new(backing)));
        self
    }

    /// Use a fresh in-memory backing store.
    pub fn with_memory_store(mut self) -> Self {
        self.backing = Some(BackingChoice::Memory);
        self
    }

    /// Use a JSON file as the backing store, watching it for external edits.
    ///
    /// Watching requires a Tokio runtime when the store is initialized.
    #[cfg(feature = "file-store")]
    pub fn with_file_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.backing = Some(BackingChoice::File(path.into()));
        self
    }

    /// Quiet period used to coalesce bursts of external file edits.
    #[cfg(feature = "file-store")]
    pub fn with_sync_debounce(mut self, debounce: Duration) -> Self {
        self.sync_debounce = debounce;
        self
    }

    /// Record OpenTelemetry metrics with `meter`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(SettingsMetrics::new(meter));
        self
    }

    /// Whether [`build`](Self::build) calls
    /// [`SettingsStore::initialize`]. Defaults to `true`.
    pub fn initialize_on_build(mut self, initialize: bool) -> Self {
        self.initialize_on_build = initialize;
        self
    }

    /// Build the settings store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No backing store was chosen
    /// - The settings file cannot be opened or parsed
    /// - Initialization is enabled and change tracking cannot start
    pub fn build(self) -> Result<SettingsStore> {
        let backing: Arc<dyn BackingStore> = match self.backing {
            None => {
                return Err(ConfigError::Other(
                    "No backing store specified".to_string(),
                ));
            }
            Some(BackingChoice::Custom(backing)) => backing,
            Some(BackingChoice::Memory) => Arc::new(MemoryStore::new()),
            #[cfg(feature = "file-store")]
            Some(BackingChoice::File(path)) => {
                Arc::new(FileStore::open(path)?.with_debounce(self.sync_debounce))
            }
        };

        let options = StoreOptions {
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        };
        let store = SettingsStore::from_parts(backing, options);

        if self.initialize_on_build {
            store.initialize()?;
        }

        Ok(store)
    }
}

impl Default for SettingsStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
