//! Built-in metrics for settings operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Local writes and write failures
//! - External sync reloads
//! - Restores
//! - Active subscribers
//!
//! # Examples
//!
//! ```rust,no_run
//! use roaming_settings::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("kiosk");
//!
//! let settings = SettingsStore::builder()
//!     .with_memory_store()
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod settings_metrics;

pub use settings_metrics::SettingsMetrics;
