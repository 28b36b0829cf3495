//! Error code catalog and lookup.
//!
//! Maps error codes (like "A-1-2") to their metadata: subsystem, title and
//! the default problem statement.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name, such as "markup"
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default problem statement; `{field}` is replaced by the offending
    /// field name
    pub message_template: String,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON")
});

/// Look up error code information.
///
/// # Example
///
/// ```
/// use apidoc_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("A-1-2").unwrap();
/// assert_eq!(info.title, "End Tag Not Found");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

/// Render the problem statement of `code` for `field`.
pub fn render_message(code: &str, field: &str) -> Option<String> {
    ERROR_CATALOG
        .get(code)
        .map(|info| info.message_template.replace("{field}", field))
}
