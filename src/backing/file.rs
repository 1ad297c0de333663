//! JSON-file backing store.

use super::{BackingStore, ChangeListener};
use crate::error::{ConfigError, Result};
use crate::notify::FileWatcher;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Default quiet period before a burst of file edits counts as one change.
pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_millis(250);

/// Backing store persisted as a flat JSON object in a single file.
///
/// Point it at a file inside a synced folder and it behaves like a roaming
/// store: every `set` rewrites the file, and edits made by the sync agent
/// (or any other process) are picked up by a file watcher and reported as
/// external changes. The store remembers the last content it wrote so its
/// own writes are never reported back as external.
///
/// Keys are kept exactly as given (case-sensitive).
///
/// # Examples
///
/// ```rust,no_run
/// use roaming_settings::backing::{BackingStore, FileStore};
///
/// # fn example() -> roaming_settings::error::Result<()> {
/// let store = FileStore::open("/home/kiosk/OneDrive/kiosk/settings.json")?;
/// store.set("CameraName", "USB Camera".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
    debounce: Duration,
}

struct FileStoreInner {
    path: PathBuf,
    state: RwLock<FileState>,
    listeners: RwLock<Vec<Arc<dyn Fn() + Send + Sync>>>,
    watcher: Mutex<Option<FileWatcher>>,
}

struct FileState {
    values: HashMap<String, config::Value>,
    /// Content most recently written or accepted, used to drop echo events.
    last_seen: Option<String>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or read, or if it does
    /// not contain a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "{}")?;
        }

        let content = fs::read_to_string(&path)?;
        let values = parse_settings_file(&content)?;
        tracing::debug!(path = %path.display(), entries = values.len(), "opened settings file");

        Ok(Self {
            inner: Arc::new(FileStoreInner {
                path,
                state: RwLock::new(FileState {
                    values,
                    last_seen: Some(content),
                }),
                listeners: RwLock::new(Vec::new()),
                watcher: Mutex::new(None),
            }),
            debounce: DEFAULT_SYNC_DEBOUNCE,
        })
    }

    /// Set the quiet period used to coalesce bursts of external edits.
    ///
    /// Takes effect for watching started after this call.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Whether the file watcher is running.
    pub fn is_watching(&self) -> bool {
        self.inner.watcher.lock().is_some()
    }

    /// Re-read the file now, firing the listeners if it changed externally.
    ///
    /// The watcher calls this on every settled burst of edits. Returns
    /// whether an external change was applied.
    pub fn refresh(&self) -> bool {
        self.inner.refresh()
    }
}

impl FileStoreInner {
    fn persist(&self, state: &mut FileState) -> Result<()> {
        let object: JsonMap<String, JsonValue> = state
            .values
            .iter()
            .map(|(key, value)| (key.clone(), config_value_to_json(value)))
            .collect();
        let content = serde_json::to_string_pretty(&JsonValue::Object(object))
            .map_err(|e| ConfigError::ParseError(format!("Failed to encode settings: {}", e)))?;

        fs::write(&self.path, &content).map_err(|e| {
            ConfigError::Backing(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        state.last_seen = Some(content);
        Ok(())
    }

    fn refresh(&self) -> bool {
        {
            // Held across the read so a local write cannot land in between
            let mut state = self.state.write();
            let content = match fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to read settings file");
                    return false;
                }
            };

            if state.last_seen.as_deref() == Some(content.as_str()) {
                return false;
            }

            match parse_settings_file(&content) {
                Ok(values) => {
                    state.values = values;
                    state.last_seen = Some(content);
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings file");
                    return false;
                }
            }
        }

        tracing::debug!(path = %self.path.display(), "settings file changed externally");
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener();
        }
        true
    }

    fn start_watching(self: &Arc<Self>, debounce: Duration) -> Result<()> {
        let mut slot = self.watcher.lock();
        if slot.is_some() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::WatchError(format!("No Tokio runtime available: {}", e)))?;
        let (watcher, mut rx) = FileWatcher::new(&self.path, debounce)?;

        let weak: Weak<FileStoreInner> = Arc::downgrade(self);
        runtime.spawn(async move {
            while rx.recv().await.is_some() {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.refresh();
            }
        });

        *slot = Some(watcher);
        Ok(())
    }
}

impl BackingStore for FileStore {
    fn get(&self, key: &str) -> Option<config::Value> {
        self.inner.state.read().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: config::Value) -> Result<()> {
        let mut state = self.inner.state.write();
        state.values.insert(key.to_string(), value);
        self.inner.persist(&mut state)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.inner.state.write();
        state.values.clear();
        self.inner.persist(&mut state)
    }

    fn subscribe_external_changes(&self, listener: ChangeListener) -> Result<()> {
        self.inner.start_watching(self.debounce)?;
        self.inner.listeners.write().push(Arc::from(listener));
        Ok(())
    }

    fn name(&self) -> String {
        format!("file:{}", self.inner.path.display())
    }
}

/// Parse a settings file into raw values. The root must be a JSON object.
fn parse_settings_file(content: &str) -> Result<HashMap<String, config::Value>> {
    let json: JsonValue = serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("Invalid JSON: {}", e)))?;

    match json {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, json_value_to_config_value(value)))
            .collect()),
        _ => Err(ConfigError::ParseError(
            "Expected JSON object at root level".to_string(),
        )),
    }
}

/// Convert a serde_json::Value to a config::Value.
fn json_value_to_config_value(value: JsonValue) -> config::Value {
    let kind = match value {
        JsonValue::Null => config::ValueKind::Nil,
        JsonValue::Bool(b) => config::ValueKind::Boolean(b),
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                config::ValueKind::U64(u)
            } else if let Some(i) = n.as_i64() {
                config::ValueKind::I64(i)
            } else {
                config::ValueKind::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => config::ValueKind::String(s),
        JsonValue::Array(arr) => {
            config::ValueKind::Array(arr.into_iter().map(json_value_to_config_value).collect())
        }
        JsonValue::Object(map) => config::ValueKind::Table(
            map.into_iter()
                .map(|(key, val)| (key, json_value_to_config_value(val)))
                .collect(),
        ),
    };
    config::Value::new(None, kind)
}

/// Convert a config::Value to JSON. Numbers JSON cannot hold are written as
/// strings, which the settings coercion reads back unchanged.
fn config_value_to_json(value: &config::Value) -> JsonValue {
    match &value.kind {
        config::ValueKind::Nil => JsonValue::Null,
        config::ValueKind::Boolean(b) => JsonValue::Bool(*b),
        config::ValueKind::I64(i) => JsonValue::Number(Number::from(*i)),
        config::ValueKind::U64(u) => JsonValue::Number(Number::from(*u)),
        config::ValueKind::I128(i) => i64::try_from(*i)
            .map(|i| JsonValue::Number(Number::from(i)))
            .unwrap_or_else(|_| JsonValue::String(i.to_string())),
        config::ValueKind::U128(u) => u64::try_from(*u)
            .map(|u| JsonValue::Number(Number::from(u)))
            .unwrap_or_else(|_| JsonValue::String(u.to_string())),
        config::ValueKind::Float(x) => Number::from_f64(*x)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(x.to_string())),
        config::ValueKind::String(s) => JsonValue::String(s.clone()),
        config::ValueKind::Array(arr) => JsonValue::Array(arr.iter().map(config_value_to_json).collect()),
        config::ValueKind::Table(map) => JsonValue::Object(
            map.iter()
                .map(|(key, val)| (key.clone(), config_value_to_json(val)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn counting_listener(store: &FileStore) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        store
            .subscribe_external_changes(Box::new(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        counter
    }

    #[test]
    fn test_open_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let store = FileStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.get("FaceApiKey").is_none());
        assert_eq!(store.name(), format!("file:{}", path.display()));
    }

    #[test]
    fn test_open_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(FileStore::open(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_set_persists_and_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("ShowDebugInfo", true.into()).unwrap();
        store.set("MinDetectableFaceCoveragePercentage", 12u64.into()).unwrap();
        store.set("CameraName", "Front Cam".into()).unwrap();

        let json: JsonValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["ShowDebugInfo"], JsonValue::Bool(true));
        assert_eq!(json["MinDetectableFaceCoveragePercentage"], JsonValue::from(12));

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("CameraName").unwrap().into_string().unwrap(),
            "Front Cam"
        );
        assert!(reopened.get("ShowDebugInfo").unwrap().into_bool().unwrap());
    }

    #[test]
    fn test_non_finite_float_written_as_string() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store
            .set("DriverMonitoringSleepingThreshold", f64::INFINITY.into())
            .unwrap();

        let json: JsonValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["DriverMonitoringSleepingThreshold"], JsonValue::from("inf"));
    }

    #[test]
    fn test_clear_empties_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("WorkspaceKey", "ws".into()).unwrap();
        store.clear().unwrap();

        assert!(store.get("WorkspaceKey").is_none());
        let json: JsonValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_refresh_ignores_own_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("CameraName", "cam".into()).unwrap();
        assert!(!store.refresh());
    }

    #[test]
    fn test_refresh_applies_external_edit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        fs::write(&path, r#"{"CameraName": "synced"}"#).unwrap();

        assert!(store.refresh());
        assert_eq!(store.get("CameraName").unwrap().into_string().unwrap(), "synced");
        // Same content again is not a new change
        assert!(!store.refresh());
    }

    #[test]
    fn test_refresh_keeps_cache_on_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path).unwrap();
        store.set("CameraName", "cam".into()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(!store.refresh());
        assert_eq!(store.get("CameraName").unwrap().into_string().unwrap(), "cam");
    }

    #[test]
    fn test_refresh_racing_local_writes_keeps_latest_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = FileStore::open(&path).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let refresher = {
            let store = store.clone();
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut applied = 0;
                while !done.load(Ordering::SeqCst) {
                    if store.refresh() {
                        applied += 1;
                    }
                }
                applied
            })
        };

        for i in 0..200 {
            store.set("CameraName", format!("cam-{}", i).into()).unwrap();
        }
        done.store(true, Ordering::SeqCst);

        assert_eq!(refresher.join().unwrap(), 0);
        assert_eq!(store.get("CameraName").unwrap().into_string().unwrap(), "cam-199");
    }

    #[test]
    fn test_failed_write_reports_backing_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = FileStore::open(&path).unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.set("CameraName", "cam".into()),
            Err(ConfigError::Backing(_))
        ));
        assert!(matches!(store.clear(), Err(ConfigError::Backing(_))));
    }

    #[test]
    fn test_subscribe_requires_runtime() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("settings.json")).unwrap();

        let result = store.subscribe_external_changes(Box::new(|| {}));
        assert!(matches!(result, Err(ConfigError::WatchError(_))));
        assert!(!store.is_watching());
    }

    #[tokio::test]
    async fn test_external_edit_fires_listener() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path)
            .unwrap()
            .with_debounce(Duration::from_millis(50));
        let counter = counting_listener(&store);
        assert!(store.is_watching());

        tokio::time::sleep(Duration::from_millis(50)).await;
        fs::write(&path, r#"{"ShowDebugInfo": true}"#).unwrap();

        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(store.get("ShowDebugInfo").unwrap().into_bool().unwrap());
    }

    #[tokio::test]
    async fn test_own_write_does_not_fire_listener() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let store = FileStore::open(&path)
            .unwrap()
            .with_debounce(Duration::from_millis(50));
        let counter = counting_listener(&store);

        store.set("CameraName", "local".into()).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
