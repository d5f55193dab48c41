//! General engine configuration.

use serde::{Deserialize, Serialize};
use tk_core::entities::DEFAULT_PROJECT_NAME;

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// Default page size for `find`.
const fn default_page_size() -> u32 {
    10
}

/// Upper bound on a requested page size.
const fn default_max_page_size() -> u32 {
    500
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Project a trace lands in when the request names none.
    #[serde(default = "default_project_name")]
    pub default_project_name: String,

    /// Page size used when the caller passes zero.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Requested page sizes are clamped to this.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_project_name: default_project_name(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}
