//! The typed settings record.

use crate::core::schema::{Field, SettingValue};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// One complete set of setting values.
///
/// A `Settings` value is immutable once published by the store; loads and
/// writes build a new record and swap it in whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Settings {
    /// Face API subscription key
    pub face_api_key: String,
    /// Face API region
    pub face_api_key_region: String,
    /// Vision API subscription key
    pub vision_api_key: String,
    /// Vision API region
    pub vision_api_key_region: String,
    /// Workspace key
    pub workspace_key: String,
    /// Camera device name
    pub camera_name: String,
    /// Minimum detectable face coverage, in percent
    pub min_detectable_face_coverage_percentage: u32,
    /// Show debug overlays
    pub show_debug_info: bool,
    /// Sleep detection threshold
    pub driver_monitoring_sleeping_threshold: f64,
    /// Yawn detection threshold
    pub driver_monitoring_yawning_threshold: f64,
}

impl Default for Settings {
    /// Every field at the default declared in the schema table.
    fn default() -> Self {
        let mut settings = Self {
            face_api_key: String::new(),
            face_api_key_region: String::new(),
            vision_api_key: String::new(),
            vision_api_key_region: String::new(),
            workspace_key: String::new(),
            camera_name: String::new(),
            min_detectable_face_coverage_percentage: 0,
            show_debug_info: false,
            driver_monitoring_sleeping_threshold: 0.0,
            driver_monitoring_yawning_threshold: 0.0,
        };
        for field in Field::ALL {
            let applied = settings.apply(field, field.default_value());
            debug_assert!(applied.is_ok(), "schema default for {} has the wrong kind", field);
        }
        settings
    }
}

impl Settings {
    /// Read one field as a tagged value.
    pub fn value(&self, field: Field) -> SettingValue {
        match field {
            Field::FaceApiKey => SettingValue::Text(self.face_api_key.clone()),
            Field::FaceApiKeyRegion => SettingValue::Text(self.face_api_key_region.clone()),
            Field::VisionApiKey => SettingValue::Text(self.vision_api_key.clone()),
            Field::VisionApiKeyRegion => SettingValue::Text(self.vision_api_key_region.clone()),
            Field::WorkspaceKey => SettingValue::Text(self.workspace_key.clone()),
            Field::CameraName => SettingValue::Text(self.camera_name.clone()),
            Field::MinDetectableFaceCoveragePercentage => {
                SettingValue::UnsignedInteger(self.min_detectable_face_coverage_percentage)
            }
            Field::ShowDebugInfo => SettingValue::Boolean(self.show_debug_info),
            Field::DriverMonitoringSleepingThreshold => {
                SettingValue::Float(self.driver_monitoring_sleeping_threshold)
            }
            Field::DriverMonitoringYawningThreshold => {
                SettingValue::Float(self.driver_monitoring_yawning_threshold)
            }
        }
    }

    /// Write one field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] if `value` is not of the field's
    /// declared kind. The record is left untouched in that case.
    pub fn apply(&mut self, field: Field, value: SettingValue) -> Result<()> {
        let expected = field.kind();
        let found = value.kind();

        match (field, value) {
            (Field::FaceApiKey, SettingValue::Text(s)) => self.face_api_key = s,
            (Field::FaceApiKeyRegion, SettingValue::Text(s)) => self.face_api_key_region = s,
            (Field::VisionApiKey, SettingValue::Text(s)) => self.vision_api_key = s,
            (Field::VisionApiKeyRegion, SettingValue::Text(s)) => self.vision_api_key_region = s,
            (Field::WorkspaceKey, SettingValue::Text(s)) => self.workspace_key = s,
            (Field::CameraName, SettingValue::Text(s)) => self.camera_name = s,
            (Field::MinDetectableFaceCoveragePercentage, SettingValue::UnsignedInteger(n)) => {
                self.min_detectable_face_coverage_percentage = n
            }
            (Field::ShowDebugInfo, SettingValue::Boolean(b)) => self.show_debug_info = b,
            (Field::DriverMonitoringSleepingThreshold, SettingValue::Float(x)) => {
                self.driver_monitoring_sleeping_threshold = x
            }
            (Field::DriverMonitoringYawningThreshold, SettingValue::Float(x)) => {
                self.driver_monitoring_yawning_threshold = x
            }
            (field, _) => {
                return Err(ConfigError::TypeMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }

        Ok(())
    }
}
