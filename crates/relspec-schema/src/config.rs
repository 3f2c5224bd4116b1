//! # Engine Configuration
//!
//! Switches that change how strict the whole-document entry points are.
//! Both default to `true`. Values can come from serde (any format the
//! caller loads) or from the environment via [`EngineConfig::from_env`].

use serde::{Deserialize, Serialize};

/// Environment variable backing [`EngineConfig::require_constructable`].
pub const REQUIRE_CONSTRUCTABLE_ENV: &str = "RELSPEC_REQUIRE_CONSTRUCTABLE";
/// Environment variable backing [`EngineConfig::include_unmanaged_report`].
pub const UNMANAGED_REPORT_ENV: &str = "RELSPEC_UNMANAGED_REPORT";

/// Configuration of the whole-document check and pre-processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fail documents that contain no constructable schema.
    pub require_constructable: bool,
    /// Produce the `models` breakdown for schemas without a table.
    pub include_unmanaged_report: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            require_constructable: true,
            include_unmanaged_report: true,
        }
    }
}

impl EngineConfig {
    /// Read the configuration from the environment.
    ///
    /// A switch is on when its variable is absent or set to anything other
    /// than `"false"`.
    pub fn from_env() -> Self {
        Self {
            require_constructable: switch(std::env::var(REQUIRE_CONSTRUCTABLE_ENV).ok().as_deref()),
            include_unmanaged_report: switch(std::env::var(UNMANAGED_REPORT_ENV).ok().as_deref()),
        }
    }
}

fn switch(value: Option<&str>) -> bool {
    value.map(|v| v.to_lowercase() != "false").unwrap_or(true)
}
