//! Integration tests for settings mirrored into a watched JSON file.

#![cfg(feature = "file-store")]

use parking_lot::Mutex;
use roaming_settings::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

const DEBOUNCE: Duration = Duration::from_millis(50);

async fn build(path: &Path) -> SettingsStore {
    SettingsStore::builder()
        .with_file_store(path)
        .with_sync_debounce(DEBOUNCE)
        .build()
        .unwrap()
}

async fn wait_for(counter: &AtomicUsize, at_least: usize) {
    for _ in 0..150 {
        if counter.load(Ordering::SeqCst) >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_initial_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(
        &path,
        json!({
            "FaceApiKey": "face",
            "FaceApiKeyRegion": "westus2",
            "MinDetectableFaceCoveragePercentage": "9",
            "ShowDebugInfo": "False",
            "DriverMonitoringSleepingThreshold": 0.3,
            "DriverMonitoringYawningThreshold": "not a number",
            "SomethingElse": [1, 2]
        })
        .to_string(),
    )
    .unwrap();

    let settings = build(&path).await;

    assert_eq!(settings.face_api_key(), "face");
    assert_eq!(settings.face_api_key_region(), "westus2");
    assert_eq!(settings.min_detectable_face_coverage_percentage(), 9);
    assert!(!settings.show_debug_info());
    assert_eq!(settings.driver_monitoring_sleeping_threshold(), 0.3);
    assert_eq!(
        settings.driver_monitoring_yawning_threshold(),
        roaming_settings::core::DEFAULT_YAWNING_APERTURE_THRESHOLD
    );
}

#[tokio::test]
async fn test_local_write_persists_without_sync_echo() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    let settings = build(&path).await;

    let coarse = Arc::new(AtomicUsize::new(0));
    let coarse_clone = Arc::clone(&coarse);
    let _handle = settings.on_settings_changed(move || {
        coarse_clone.fetch_add(1, Ordering::SeqCst);
    });

    settings.set_show_debug_info(true);
    settings.set_camera_name("Kiosk Cam");
    settings.set_min_detectable_face_coverage_percentage(11);

    let json = read_json(&path);
    assert_eq!(json["ShowDebugInfo"], json!(true));
    assert_eq!(json["CameraName"], json!("Kiosk Cam"));
    assert_eq!(json["MinDetectableFaceCoveragePercentage"], json!(11));

    // Give the watcher time to (not) report our own writes
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(coarse.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_synced_file_reloads_and_fires_coarse_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    let settings = build(&path).await;

    let coarse = Arc::new(AtomicUsize::new(0));
    let fields = Arc::new(Mutex::new(Vec::new()));

    let coarse_clone = Arc::clone(&coarse);
    let _coarse_handle = settings.on_settings_changed(move || {
        coarse_clone.fetch_add(1, Ordering::SeqCst);
    });
    let fields_clone = Arc::clone(&fields);
    let _field_handle = settings.on_field_changed(move |field| {
        fields_clone.lock().push(field);
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    fs::write(
        &path,
        json!({
            "CameraName": "Synced Cam",
            "ShowDebugInfo": true,
            "VisionApiKeyRegion": "australiaeast"
        })
        .to_string(),
    )
    .unwrap();

    wait_for(&coarse, 1).await;
    assert_eq!(coarse.load(Ordering::SeqCst), 1);
    assert!(fields.lock().is_empty());
    assert_eq!(settings.camera_name(), "Synced Cam");
    assert!(settings.show_debug_info());
    assert_eq!(settings.vision_api_key_region(), "australiaeast");
}

#[tokio::test]
async fn test_restore_clears_file_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    let settings = build(&path).await;

    settings.set_workspace_key("ws-9");
    settings.restore_all_settings();

    assert_eq!(read_json(&path), json!({}));
    assert_eq!(settings.workspace_key(), "ws-9");

    let reopened = SettingsStore::builder()
        .with_file_store(&path)
        .initialize_on_build(false)
        .build()
        .unwrap();
    reopened.load_from_backing_store();
    assert_eq!(reopened.workspace_key(), "");
}

#[tokio::test]
async fn test_two_devices_sharing_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    let device_a = build(&path).await;
    let device_b = build(&path).await;

    let synced = Arc::new(AtomicUsize::new(0));
    let synced_clone = Arc::clone(&synced);
    let _handle = device_b.on_settings_changed(move || {
        synced_clone.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    device_a.set_face_api_key("shared-key");

    wait_for(&synced, 1).await;
    assert_eq!(device_b.face_api_key(), "shared-key");
}
