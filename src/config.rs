/// Extension settings, stored alongside the rules in browser storage
use serde::{Deserialize, Serialize};

use crate::host::KeyValueStore;
use crate::matcher::FALLBACK_CATEGORY;

/// Storage key the settings themselves live under
pub const SETTINGS_KEY: &str = "grouperSettings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrouperConfig {
    /// Storage key for the persisted rule list
    #[serde(default = "default_rules_key")]
    pub rules_key: String,

    /// Storage key for the window/tab snapshot
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,

    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,

    /// Quiet period before a burst of tab events triggers one snapshot
    #[serde(default = "default_snapshot_debounce_ms")]
    pub snapshot_debounce_ms: u32,

    /// Forced snapshot period, independent of tab activity
    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u32,

    /// Delay before placing a freshly created tab, so its URL is known
    #[serde(default = "default_placement_delay_ms")]
    pub placement_delay_ms: u32,

    /// Seed the built-in categories on install when no rules are stored
    #[serde(default = "default_true")]
    pub seed_default_rules: bool,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            rules_key: default_rules_key(),
            snapshot_key: default_snapshot_key(),
            fallback_category: default_fallback_category(),
            snapshot_debounce_ms: default_snapshot_debounce_ms(),
            snapshot_interval_ms: default_snapshot_interval_ms(),
            placement_delay_ms: default_placement_delay_ms(),
            seed_default_rules: default_true(),
        }
    }
}

impl GrouperConfig {
    /// Load settings from storage, falling back to defaults on any problem
    pub async fn load<S: KeyValueStore>(storage: &S) -> GrouperConfig {
        match storage.get(SETTINGS_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings: {}", e);
                GrouperConfig::default()
            }),
            Ok(None) => GrouperConfig::default(),
            Err(e) => {
                log::error!("Failed to read settings: {}", e);
                GrouperConfig::default()
            }
        }
    }
}

fn default_rules_key() -> String {
    "groupConfigs".into()
}

fn default_snapshot_key() -> String {
    "savedWindows".into()
}

fn default_fallback_category() -> String {
    FALLBACK_CATEGORY.into()
}

fn default_snapshot_debounce_ms() -> u32 {
    1_000
}

fn default_snapshot_interval_ms() -> u32 {
    300_000 // 5 minutes
}

fn default_placement_delay_ms() -> u32 {
    500
}

fn default_true() -> bool {
    true
}
