//! Version comparison for configuration document compatibility

use semver::Version;

/// Newest document format this build understands
pub const SUPPORTED_DOCUMENT_VERSION: &str = "1.0.0";

/// Compare a document's declared version against the supported format
/// Returns a warning message if the document targets a newer major version
pub fn check_compatibility(kind: &str, document_version: &str) -> Option<String> {
    let supported = parse_version(SUPPORTED_DOCUMENT_VERSION)?;
    // Unparseable versions are not compared
    let document = parse_version(document_version)?;

    if document.major > supported.major {
        Some(format!(
            "The {} configuration declares version {}, but this generator supports {}.x.\n\
             Some settings may be ignored.",
            kind, document_version, supported.major
        ))
    } else {
        None
    }
}

/// Parse version string, tolerating a leading 'v'
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.strip_prefix('v').unwrap_or(version_str);
    Version::parse(cleaned).ok()
}
