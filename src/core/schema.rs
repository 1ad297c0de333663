//! The fixed settings schema and the coercion rules for untyped stored values.
//!
//! Every setting is described by one row of [`SCHEMA`]: its backing-store key,
//! its declared kind, its default and the parser used to read it back from the
//! backing store. Loading is driven entirely by this table.

use crate::error::{CoercionError, ConfigError};
use config::ValueKind;
use std::fmt;
use std::str::FromStr;

/// Default eye-aperture ratio below which a driver is considered asleep.
pub const DEFAULT_SLEEPING_APERTURE_THRESHOLD: f64 = 0.2;

/// Default mouth-aperture ratio above which a driver is considered yawning.
pub const DEFAULT_YAWNING_APERTURE_THRESHOLD: f64 = 0.35;

/// The declared type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UTF-8 string
    Text,
    /// 32-bit unsigned integer
    UnsignedInteger,
    /// Boolean flag
    Boolean,
    /// 64-bit float
    Float,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "string",
            Self::UnsignedInteger => "unsigned integer",
            Self::Boolean => "boolean",
            Self::Float => "floating-point",
        };
        f.write_str(name)
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// A string value
    Text(String),
    /// An unsigned integer value
    UnsignedInteger(u32),
    /// A boolean value
    Boolean(bool),
    /// A floating-point value
    Float(f64),
}

impl SettingValue {
    /// The kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::UnsignedInteger(_) => FieldKind::UnsignedInteger,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Float(_) => FieldKind::Float,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::UnsignedInteger(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        Self::UnsignedInteger(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A named setting. The name doubles as the backing-store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Face API subscription key
    FaceApiKey,
    /// Region of the Face API endpoint
    FaceApiKeyRegion,
    /// Vision API subscription key
    VisionApiKey,
    /// Region of the Vision API endpoint
    VisionApiKeyRegion,
    /// Workspace key used to group uploaded data
    WorkspaceKey,
    /// Preferred camera device name
    CameraName,
    /// Smallest face, as a percentage of the frame, worth detecting
    MinDetectableFaceCoveragePercentage,
    /// Whether debug overlays are shown
    ShowDebugInfo,
    /// Eye-aperture threshold for sleep detection
    DriverMonitoringSleepingThreshold,
    /// Mouth-aperture threshold for yawn detection
    DriverMonitoringYawningThreshold,
}

impl Field {
    /// Every field, in schema order.
    pub const ALL: [Field; 10] = [
        Field::FaceApiKey,
        Field::FaceApiKeyRegion,
        Field::VisionApiKey,
        Field::VisionApiKeyRegion,
        Field::WorkspaceKey,
        Field::CameraName,
        Field::MinDetectableFaceCoveragePercentage,
        Field::ShowDebugInfo,
        Field::DriverMonitoringSleepingThreshold,
        Field::DriverMonitoringYawningThreshold,
    ];

    /// The schema row describing this field.
    pub fn spec(self) -> &'static FieldSpec {
        &SCHEMA[self as usize]
    }

    /// The backing-store key of this field.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// The declared kind of this field.
    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    /// The value this field holds before anything is loaded or set.
    pub fn default_value(self) -> SettingValue {
        self.spec().default.clone()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SCHEMA
            .iter()
            .find(|spec| spec.name == s)
            .map(|spec| spec.field)
            .ok_or_else(|| ConfigError::UnknownField(s.to_string()))
    }
}

/// One row of the settings schema.
pub struct FieldSpec {
    /// The field this row describes
    pub field: Field,
    /// Backing-store key
    pub name: &'static str,
    /// Declared kind
    pub kind: FieldKind,
    /// Value used until something is loaded or set
    pub default: SettingValue,
    /// Strict parser applied to the display form of a stored value
    pub parse: fn(&str) -> Option<SettingValue>,
}

/// The settings schema. Rows are indexed by `Field as usize`.
pub static SCHEMA: [FieldSpec; 10] = [
    text(Field::FaceApiKey, "FaceApiKey"),
    text(Field::FaceApiKeyRegion, "FaceApiKeyRegion"),
    text(Field::VisionApiKey, "VisionApiKey"),
    text(Field::VisionApiKeyRegion, "VisionApiKeyRegion"),
    text(Field::WorkspaceKey, "WorkspaceKey"),
    text(Field::CameraName, "CameraName"),
    FieldSpec {
        field: Field::MinDetectableFaceCoveragePercentage,
        name: "MinDetectableFaceCoveragePercentage",
        kind: FieldKind::UnsignedInteger,
        default: SettingValue::UnsignedInteger(7),
        parse: parse_unsigned,
    },
    FieldSpec {
        field: Field::ShowDebugInfo,
        name: "ShowDebugInfo",
        kind: FieldKind::Boolean,
        default: SettingValue::Boolean(false),
        parse: parse_boolean,
    },
    FieldSpec {
        field: Field::DriverMonitoringSleepingThreshold,
        name: "DriverMonitoringSleepingThreshold",
        kind: FieldKind::Float,
        default: SettingValue::Float(DEFAULT_SLEEPING_APERTURE_THRESHOLD),
        parse: parse_float,
    },
    FieldSpec {
        field: Field::DriverMonitoringYawningThreshold,
        name: "DriverMonitoringYawningThreshold",
        kind: FieldKind::Float,
        default: SettingValue::Float(DEFAULT_YAWNING_APERTURE_THRESHOLD),
        parse: parse_float,
    },
];

const fn text(field: Field, name: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        name,
        kind: FieldKind::Text,
        default: SettingValue::Text(String::new()),
        parse: parse_text,
    }
}

fn parse_text(s: &str) -> Option<SettingValue> {
    Some(SettingValue::Text(s.to_string()))
}

fn parse_unsigned(s: &str) -> Option<SettingValue> {
    s.trim().parse::<u32>().ok().map(SettingValue::UnsignedInteger)
}

fn parse_boolean(s: &str) -> Option<SettingValue> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(SettingValue::Boolean(true))
    } else if s.eq_ignore_ascii_case("false") {
        Some(SettingValue::Boolean(false))
    } else {
        None
    }
}

fn parse_float(s: &str) -> Option<SettingValue> {
    s.trim().parse::<f64>().ok().map(SettingValue::Float)
}

/// Render a stored scalar the way the backing store would print it.
///
/// Returns `Ok(None)` for `Nil` (treated as absent) and `Err(())` for tables
/// and arrays, which no field can hold.
fn display_form(raw: &config::Value) -> Result<Option<String>, ()> {
    let rendered = match &raw.kind {
        ValueKind::Nil => return Ok(None),
        ValueKind::Boolean(b) => b.to_string(),
        ValueKind::I64(n) => n.to_string(),
        ValueKind::I128(n) => n.to_string(),
        ValueKind::U64(n) => n.to_string(),
        ValueKind::U128(n) => n.to_string(),
        ValueKind::Float(x) => x.to_string(),
        ValueKind::String(s) => s.clone(),
        ValueKind::Table(_) | ValueKind::Array(_) => return Err(()),
    };
    Ok(Some(rendered))
}

/// Read a stored value as `field`'s declared type.
///
/// `Ok(None)` means the stored value counts as absent.
pub fn coerce(field: Field, raw: &config::Value) -> Result<Option<SettingValue>, CoercionError> {
    match display_form(raw) {
        Ok(None) => Ok(None),
        Ok(Some(text)) => match (field.spec().parse)(&text) {
            Some(value) => Ok(Some(value)),
            None => Err(CoercionError::new(field, text)),
        },
        Err(()) => Err(CoercionError::new(field, format!("{:?}", raw.kind))),
    }
}

/// The primitive representation written to the backing store.
pub fn to_stored(value: &SettingValue) -> config::Value {
    let kind = match value {
        SettingValue::Text(s) => ValueKind::String(s.clone()),
        SettingValue::UnsignedInteger(n) => ValueKind::U64(u64::from(*n)),
        SettingValue::Boolean(b) => ValueKind::Boolean(*b),
        SettingValue::Float(x) => ValueKind::Float(*x),
    };
    config::Value::new(None, kind)
}
