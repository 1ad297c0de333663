//! Region identifiers accepted by the cognitive service endpoints.

/// Regions offered for `FaceApiKeyRegion` and `VisionApiKeyRegion`.
///
/// The store does not enforce membership; callers use this list to populate
/// pickers and validate input.
pub const AVAILABLE_API_REGIONS: [&str; 13] = [
    "westus",
    "westus2",
    "eastus",
    "eastus2",
    "westcentralus",
    "southcentralus",
    "westeurope",
    "northeurope",
    "southeastasia",
    "eastasia",
    "japaneast",
    "australiaeast",
    "brazilsouth",
];

/// Whether `region` is one of [`AVAILABLE_API_REGIONS`]. Exact match.
pub fn is_known_region(region: &str) -> bool {
    AVAILABLE_API_REGIONS.contains(&region)
}
