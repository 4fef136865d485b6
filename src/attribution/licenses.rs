//! License metadata for common icon licenses
//!
//! Small lookup used by hosts to decide whether an import needs an
//! attribution notice. Unknown licenses default to the conservative side:
//! attribution required, commercial use not assumed.

/// What is known about one license.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    pub name: String,
    pub url: String,
    /// `None` when the license is unrecognized
    pub commercial_use: Option<bool>,
    pub attribution_required: Option<bool>,
}

/// Look up metadata for a license by its short name.
pub fn license_info(license: &str) -> LicenseInfo {
    match license {
        "CC0" | "CC0 1.0 Universal" => LicenseInfo {
            name: "Creative Commons Zero v1.0 Universal".to_string(),
            url: "https://creativecommons.org/publicdomain/zero/1.0/".to_string(),
            commercial_use: Some(true),
            attribution_required: Some(false),
        },
        "CC BY 4.0" => LicenseInfo {
            name: "Creative Commons Attribution 4.0 International".to_string(),
            url: "https://creativecommons.org/licenses/by/4.0/".to_string(),
            commercial_use: Some(true),
            attribution_required: Some(true),
        },
        "MIT" => LicenseInfo {
            name: "MIT License".to_string(),
            url: "https://opensource.org/licenses/MIT".to_string(),
            commercial_use: Some(true),
            attribution_required: Some(true),
        },
        "Apache 2.0" | "Apache License 2.0" => LicenseInfo {
            name: "Apache License 2.0".to_string(),
            url: "https://www.apache.org/licenses/LICENSE-2.0".to_string(),
            commercial_use: Some(true),
            attribution_required: Some(true),
        },
        other => LicenseInfo {
            name: other.to_string(),
            url: String::new(),
            commercial_use: None,
            attribution_required: None,
        },
    }
}

/// Whether imports under this license need an attribution notice.
/// Defaults to `true` for unrecognized licenses.
pub fn requires_attribution(license: &str) -> bool {
    license_info(license).attribution_required.unwrap_or(true)
}

/// Whether this license is known to allow commercial use.
/// Defaults to `false` for unrecognized licenses.
pub fn allows_commercial_use(license: &str) -> bool {
    license_info(license).commercial_use.unwrap_or(false)
}
