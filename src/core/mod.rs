//! Core settings types: the schema, the typed record and the store.

mod builder;
pub mod regions;
pub mod schema;
mod settings;
mod store;

pub use builder::SettingsStoreBuilder;
pub use regions::{AVAILABLE_API_REGIONS, is_known_region};
pub use schema::{
    DEFAULT_SLEEPING_APERTURE_THRESHOLD, DEFAULT_YAWNING_APERTURE_THRESHOLD, Field, FieldKind,
    FieldSpec, SCHEMA, SettingValue,
};
pub use settings::Settings;
pub use store::SettingsStore;
