use serde::{Deserialize, Serialize};

use crate::error::DEFAULT_REPORT_URL;

/// Environment switch consulted when `enabled` is not set explicitly.
pub const ENABLE_ENV_VAR: &str = "USE_NAMED_BLOCKS_POLYFILL";

const DISABLING_VALUES: &[&str] = &["false", "disable", "no", "off", "0"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolyfillOptions {
    /// Reported as the file of located diagnostics whose span has no source.
    pub module_name: Option<String>,
    pub enabled: Option<bool>,
    pub bug_report_url: String,
}

impl Default for PolyfillOptions {
    fn default() -> Self {
        PolyfillOptions {
            module_name: None,
            enabled: None,
            bug_report_url: DEFAULT_REPORT_URL.to_string(),
        }
    }
}

impl PolyfillOptions {
    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn resolve_enabled(&self) -> bool {
        match self.enabled {
            Some(enabled) => enabled,
            None => enabled_from_env(std::env::var(ENABLE_ENV_VAR).ok().as_deref()),
        }
    }
}

/// Any value outside the disabling set turns the pass on, as does leaving the
/// variable unset.
pub fn enabled_from_env(value: Option<&str>) -> bool {
    match value {
        Some(raw) => {
            let normalized = raw.trim().to_ascii_lowercase();
            !DISABLING_VALUES.contains(&normalized.as_str())
        }
        None => true,
    }
}
