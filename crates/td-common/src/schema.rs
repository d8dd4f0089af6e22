//! Schema versioning for dashboard JSON documents.

/// Current schema version for dashboard JSON and settings files.
///
/// Bump MAJOR when a field is removed or changes type; MINOR for additions.
pub const SCHEMA_VERSION: &str = "1.0.0";

fn major(version: &str) -> Option<u32> {
    version.split('.').next().and_then(|s| s.trim().parse().ok())
}

/// Check whether a document written with `version` can be read by this build.
///
/// Only the major component is compared; unparseable versions are rejected.
pub fn is_compatible(version: &str) -> bool {
    match (major(SCHEMA_VERSION), major(version)) {
        (Some(current), Some(other)) => current == other,
        _ => false,
    }
}
