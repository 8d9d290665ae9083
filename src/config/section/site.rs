//! `[site]` section configuration.
//!
//! ```toml
//! [site]
//! title = "Field Notes"
//! ```

use serde::{Deserialize, Serialize};

/// Site metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Site title, used in page `<title>` elements.
    pub title: String,
}
