//! Settings metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Meter};

/// Metrics collector for settings operations.
///
/// # Examples
///
/// ```rust,no_run
/// use roaming_settings::metrics::SettingsMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("roaming-settings");
/// let metrics = SettingsMetrics::new(meter);
///
/// metrics.record_write("CameraName");
/// ```
#[derive(Clone)]
pub struct SettingsMetrics {
    writes: Counter<u64>,
    write_failures: Counter<u64>,
    syncs: Counter<u64>,
    restores: Counter<u64>,
    active_subscribers: Gauge<i64>,
}

impl SettingsMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let writes = meter
            .u64_counter("roaming_settings.writes")
            .with_description("Number of local setting writes")
            .build();

        let write_failures = meter
            .u64_counter("roaming_settings.write.failures")
            .with_description("Number of writes the backing store rejected")
            .build();

        let syncs = meter
            .u64_counter("roaming_settings.syncs")
            .with_description("Number of reloads triggered by external changes")
            .build();

        let restores = meter
            .u64_counter("roaming_settings.restores")
            .with_description("Number of restore-all-settings calls")
            .build();

        let active_subscribers = meter
            .i64_gauge("roaming_settings.subscribers.active")
            .with_description("Number of active subscribers across both channels")
            .build();

        Self {
            writes,
            write_failures,
            syncs,
            restores,
            active_subscribers,
        }
    }

    /// Record a local write of `field`.
    pub fn record_write(&self, field: &'static str) {
        self.writes.add(1, &[KeyValue::new("field", field)]);
    }

    /// Record a write or clear the backing store rejected.
    pub fn record_write_failure(&self) {
        self.write_failures.add(1, &[]);
    }

    /// Record a reload triggered by an external change.
    pub fn record_sync(&self) {
        self.syncs.add(1, &[]);
    }

    /// Record a restore-all-settings call.
    pub fn record_restore(&self) {
        self.restores.add(1, &[]);
    }

    /// Update the number of active subscribers.
    pub fn update_subscriber_count(&self, count: i64) {
        self.active_subscribers.record(count, &[]);
    }
}
