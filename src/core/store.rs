//! The settings store: typed values, write-through persistence and change
//! notification.

use crate::backing::BackingStore;
use crate::core::regions::AVAILABLE_API_REGIONS;
use crate::core::schema::{SCHEMA, coerce, to_stored};
use crate::core::{Field, SettingValue, Settings, SettingsStoreBuilder};
use crate::error::Result;
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "metrics")]
use crate::metrics::SettingsMetrics;

/// The application's settings, mirrored into a backing store.
///
/// A `SettingsStore` starts with every field at its default. [`initialize`]
/// loads whatever the backing store holds and starts listening for changes
/// synced in from elsewhere. From then on:
///
/// - every local write updates memory, writes through to the backing store,
///   then fires the per-field notification followed by the coarse one;
/// - every external change reloads all fields and fires only the coarse
///   notification, since the event does not say which fields changed.
///
/// Handles are cheap to clone and all clones share the same state. Create one
/// at the composition root and pass it to whatever needs settings.
///
/// Reads are lock-free and always see a complete record: loads and writes
/// build a new [`Settings`] and swap it in atomically. Loads and writes are
/// serialized with each other; notifications run after the lock is released
/// so callbacks may read or write the store.
///
/// [`initialize`]: SettingsStore::initialize
///
/// # Examples
///
/// ```rust
/// use roaming_settings::prelude::*;
/// use roaming_settings::backing::MemoryStore;
///
/// # fn example() -> Result<()> {
/// let settings = SettingsStore::new(MemoryStore::new());
/// settings.initialize()?;
///
/// let _handle = settings.on_field_changed(|field| println!("{} changed", field));
/// settings.set_show_debug_info(true);
/// assert!(settings.show_debug_info());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    /// The published record, swapped whole on every change
    current: ArcSwap<Settings>,
    backing: Arc<dyn BackingStore>,
    /// Serializes loads and local writes
    write_lock: Mutex<()>,
    settings_changed: SubscriberRegistry<()>,
    field_changed: SubscriberRegistry<Field>,
    initialized: AtomicBool,
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    options: StoreOptions,
}

/// Optional collaborators supplied by the builder.
#[derive(Default)]
pub(crate) struct StoreOptions {
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<SettingsMetrics>,
}

macro_rules! text_accessors {
    ($($variant:ident => $getter:ident, $setter:ident;)*) => {
        $(
            #[doc = concat!("Current `", stringify!($variant), "`.")]
            pub fn $getter(&self) -> String {
                self.inner.current.load().$getter.clone()
            }

            #[doc = concat!("Set `", stringify!($variant), "`, write it through and notify subscribers.")]
            pub fn $setter(&self, value: impl Into<String>) {
                let value = value.into();
                let Ok(()) = self.inner.commit(Field::$variant, move |settings| {
                    settings.$getter = value;
                    Ok::<(), Infallible>(())
                });
            }
        )*
    };
}

macro_rules! value_accessors {
    ($($variant:ident => $getter:ident, $setter:ident: $ty:ty;)*) => {
        $(
            #[doc = concat!("Current `", stringify!($variant), "`.")]
            pub fn $getter(&self) -> $ty {
                self.inner.current.load().$getter
            }

            #[doc = concat!("Set `", stringify!($variant), "`, write it through and notify subscribers.")]
            pub fn $setter(&self, value: $ty) {
                let Ok(()) = self.inner.commit(Field::$variant, move |settings| {
                    settings.$getter = value;
                    Ok::<(), Infallible>(())
                });
            }
        )*
    };
}

impl SettingsStore {
    /// Create a store over `backing` with every field at its default.
    ///
    /// Nothing is read from the backing store until [`initialize`] runs.
    ///
    /// [`initialize`]: SettingsStore::initialize
    pub fn new<B: BackingStore + 'static>(backing: B) -> Self {
        Self::from_parts(Arc::new(backing), StoreOptions::default())
    }

    /// Create a new builder for constructing a settings store.
    pub fn builder() -> SettingsStoreBuilder {
        SettingsStoreBuilder::new()
    }

    pub(crate) fn from_parts(backing: Arc<dyn BackingStore>, options: StoreOptions) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: ArcSwap::from_pointee(Settings::default()),
                backing,
                write_lock: Mutex::new(()),
                settings_changed: SubscriberRegistry::new(),
                field_changed: SubscriberRegistry::new(),
                initialized: AtomicBool::new(false),
                options,
            }),
        }
    }

    /// Load from the backing store and start listening for external changes.
    ///
    /// The initial load fires no notifications. Calling this again reloads
    /// but does not attach a second listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot start change tracking.
    /// Values loaded before the failure are kept, and a later call retries
    /// the subscription.
    pub fn initialize(&self) -> Result<()> {
        let first = !self.inner.initialized.swap(true, Ordering::SeqCst);
        self.inner.load();

        if !first {
            tracing::debug!(store = %self.inner.backing.name(), "settings already initialized, reloaded");
            return Ok(());
        }

        let weak = Arc::downgrade(&self.inner);
        let subscribed = self
            .inner
            .backing
            .subscribe_external_changes(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_external_change();
                }
            }));

        if let Err(e) = subscribed {
            self.inner.initialized.store(false, Ordering::SeqCst);
            return Err(e);
        }

        tracing::info!(store = %self.inner.backing.name(), "settings initialized");
        Ok(())
    }

    /// Whether [`initialize`](SettingsStore::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    /// Name of the backing store, for diagnostics.
    pub fn backing_name(&self) -> String {
        self.inner.backing.name()
    }

    /// The current record. Lock-free.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.inner.current.load_full()
    }

    /// Current value of `field`.
    pub fn get(&self, field: Field) -> SettingValue {
        self.inner.current.load().value(field)
    }

    /// Current value of the field whose backing-store key is `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`](crate::error::ConfigError::UnknownField) if no field has that name.
    pub fn get_by_name(&self, name: &str) -> Result<SettingValue> {
        Ok(self.get(name.parse()?))
    }

    /// Set `field`, write it through to the backing store, then fire the
    /// per-field notification followed by the coarse one.
    ///
    /// A rejected write to the backing store is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`](crate::error::ConfigError::TypeMismatch) if `value` is not of the field's
    /// kind. Nothing is changed or notified in that case.
    pub fn set(&self, field: Field, value: impl Into<SettingValue>) -> Result<()> {
        let value = value.into();
        self.inner.commit(field, move |settings| settings.apply(field, value))
    }

    /// [`set`](SettingsStore::set) by backing-store key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownField`](crate::error::ConfigError::UnknownField) for an unknown name and
    /// [`ConfigError::TypeMismatch`](crate::error::ConfigError::TypeMismatch) for a value of the wrong kind.
    pub fn set_by_name(&self, name: &str, value: impl Into<SettingValue>) -> Result<()> {
        self.set(name.parse()?, value)
    }

    text_accessors! {
        FaceApiKey => face_api_key, set_face_api_key;
        FaceApiKeyRegion => face_api_key_region, set_face_api_key_region;
        VisionApiKey => vision_api_key, set_vision_api_key;
        VisionApiKeyRegion => vision_api_key_region, set_vision_api_key_region;
        WorkspaceKey => workspace_key, set_workspace_key;
        CameraName => camera_name, set_camera_name;
    }

    value_accessors! {
        MinDetectableFaceCoveragePercentage => min_detectable_face_coverage_percentage,
            set_min_detectable_face_coverage_percentage: u32;
        ShowDebugInfo => show_debug_info, set_show_debug_info: bool;
        DriverMonitoringSleepingThreshold => driver_monitoring_sleeping_threshold,
            set_driver_monitoring_sleeping_threshold: f64;
        DriverMonitoringYawningThreshold => driver_monitoring_yawning_threshold,
            set_driver_monitoring_yawning_threshold: f64;
    }

    /// Re-read every field from the backing store.
    ///
    /// Absent keys leave the field as it is. A stored value that does not
    /// parse as the field's type is skipped silently and the field keeps its
    /// current value. Fires no notifications.
    pub fn load_from_backing_store(&self) {
        self.inner.load();
    }

    /// Remove every entry from the backing store.
    ///
    /// In-memory values are left as they are and no notification fires, so
    /// readers keep seeing the old values until the next local write or
    /// external change. A rejected clear is logged and otherwise ignored.
    pub fn restore_all_settings(&self) {
        let _guard = self.inner.write_lock.lock();

        if let Err(e) = self.inner.backing.clear() {
            tracing::warn!(store = %self.inner.backing.name(), error = %e, "failed to clear backing store");
            #[cfg(feature = "metrics")]
            self.inner.with_metrics(|m| m.record_write_failure());
        }

        #[cfg(feature = "metrics")]
        self.inner.with_metrics(|m| m.record_restore());

        tracing::info!(store = %self.inner.backing.name(), "backing store cleared");
    }

    /// Reload everything and fire the coarse notification.
    ///
    /// The backing store calls this on its own when something is synced in.
    /// Hosts that receive platform change events through their own event loop
    /// can forward them here.
    pub fn handle_external_change(&self) {
        self.inner.handle_external_change();
    }

    /// Subscribe to the coarse "settings changed" signal.
    ///
    /// Fires after every local write and every external change. Returns a
    /// handle that unsubscribes when dropped.
    pub fn on_settings_changed<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let handle = self.inner.settings_changed.subscribe(move |_: &()| callback());
        self.inner.record_subscriber_count();
        handle
    }

    /// Subscribe to per-field change signals.
    ///
    /// Fires once per local write, with the written field, before the coarse
    /// signal. Never fires for external changes. Returns a handle that
    /// unsubscribes when dropped.
    pub fn on_field_changed<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(Field) + Send + Sync + 'static,
    {
        let handle = self.inner.field_changed.subscribe(move |field: &Field| callback(*field));
        self.inner.record_subscriber_count();
        handle
    }

    /// Number of subscribers on the coarse and per-field channels.
    pub fn subscriber_count(&self) -> (usize, usize) {
        (
            self.inner.settings_changed.subscriber_count(),
            self.inner.field_changed.subscriber_count(),
        )
    }

    /// Regions selectable for the API region settings.
    pub fn available_api_regions(&self) -> &'static [&'static str] {
        &AVAILABLE_API_REGIONS
    }
}

impl StoreInner {
    fn load(&self) {
        let _guard = self.write_lock.lock();
        let mut next = Settings::clone(&self.current.load());
        let mut applied = 0usize;

        for spec in SCHEMA.iter() {
            let Some(raw) = self.backing.get(spec.name) else {
                continue;
            };
            // Unparseable values keep the current value
            if let Ok(Some(value)) = coerce(spec.field, &raw) {
                if next.apply(spec.field, value).is_ok() {
                    applied += 1;
                }
            }
        }

        self.current.store(Arc::new(next));
        tracing::debug!(store = %self.backing.name(), applied, "loaded settings from backing store");
    }

    /// Apply `update` to a copy of the record, publish it, write the field
    /// through and notify. A failed update publishes and notifies nothing.
    fn commit<F, E>(&self, field: Field, update: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&mut Settings) -> std::result::Result<(), E>,
    {
        {
            let _guard = self.write_lock.lock();
            let mut next = Settings::clone(&self.current.load());
            update(&mut next)?;
            let stored = to_stored(&next.value(field));
            self.current.store(Arc::new(next));

            if let Err(e) = self.backing.set(field.name(), stored) {
                tracing::warn!(
                    store = %self.backing.name(),
                    field = field.name(),
                    error = %e,
                    "failed to write setting through to backing store"
                );
                #[cfg(feature = "metrics")]
                self.with_metrics(|m| m.record_write_failure());
            }
        }

        #[cfg(feature = "metrics")]
        self.with_metrics(|m| m.record_write(field.name()));
        tracing::debug!(field = field.name(), "setting changed locally");

        self.field_changed.notify_all(&field);
        self.settings_changed.notify_all(&());
        Ok(())
    }

    fn handle_external_change(&self) {
        self.load();

        #[cfg(feature = "metrics")]
        self.with_metrics(|m| m.record_sync());
        tracing::debug!(store = %self.backing.name(), "settings synced from backing store");

        self.settings_changed.notify_all(&());
    }

    #[cfg(feature = "metrics")]
    fn with_metrics(&self, record: impl FnOnce(&SettingsMetrics)) {
        if let Some(metrics) = &self.options.metrics {
            record(metrics);
        }
    }

    fn record_subscriber_count(&self) {
        #[cfg(feature = "metrics")]
        self.with_metrics(|m| {
            let total = self.settings_changed.subscriber_count() + self.field_changed.subscriber_count();
            m.update_subscriber_count(total as i64);
        });
    }
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("backing", &self.inner.backing.name())
            .field("initialized", &self.is_initialized())
            .field("settings", &*self.inner.current.load())
            .finish()
    }
}
