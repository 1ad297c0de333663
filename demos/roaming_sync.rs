//! Example demonstrating settings mirrored into a synced JSON file.
//!
//! This example shows how to:
//! - Build a store over a file that a sync agent may rewrite
//! - Subscribe to coarse and per-field notifications
//! - Observe an external edit arriving as a coarse-only change
//!
//! Run with: cargo run --example roaming_sync

use roaming_settings::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Roaming Settings Example ===\n");

    let dir = std::env::temp_dir().join("roaming-settings-demo");
    let path = dir.join("settings.json");
    println!("Settings file: {}\n", path.display());

    let settings = SettingsStore::builder()
        .with_file_store(&path)
        .with_sync_debounce(Duration::from_millis(100))
        .build()?;

    let _coarse = settings.on_settings_changed(|| {
        println!("[coarse] settings changed");
    });
    let reader = settings.clone();
    let _per_field = settings.on_field_changed(move |field| {
        println!("[field]  {} = {}", field, reader.get(field));
    });

    println!("Current settings:");
    for field in Field::ALL {
        println!("  {:<38} {}", field.name(), settings.get(field));
    }

    println!("\nWriting locally...");
    settings.set_camera_name("Lobby Camera");
    settings.set_face_api_key_region(settings.available_api_regions()[6]);
    settings.set_show_debug_info(true);

    println!("\nSimulating a sync from another device...");
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(
        &path,
        r#"{ "CameraName": "Synced Camera", "ShowDebugInfo": "False", "MinDetectableFaceCoveragePercentage": "oops" }"#,
    )?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\nAfter sync:");
    println!("  CameraName: {}", settings.camera_name());
    println!("  ShowDebugInfo: {}", settings.show_debug_info());
    println!(
        "  MinDetectableFaceCoveragePercentage: {} (unparseable value ignored)",
        settings.min_detectable_face_coverage_percentage()
    );

    println!("\nRestoring all settings (clears the file, keeps memory)...");
    settings.restore_all_settings();
    println!("  CameraName still reads: {}", settings.camera_name());

    println!("\n=== Example Complete ===");
    Ok(())
}
