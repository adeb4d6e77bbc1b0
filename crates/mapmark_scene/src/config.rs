use cap_std::fs_utf8::Dir;
use mapmark_core::init::load_json_or_default;
use serde::{Deserialize, Serialize};

use crate::EaseType;

pub const MANAGER_CONFIG_NAME: &str = "manager_config.json";

/// Defaults that the marker manager applies to new markers and animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// draw order of newly added markers
    pub default_draw_order: i32,
    /// curve used by [crate::MarkerManager::ease_to]
    pub default_ease: EaseType,
    /// seconds
    pub default_ease_duration: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_draw_order: 0,
            default_ease: EaseType::Cubic,
            default_ease_duration: 0.5,
        }
    }
}

impl ManagerConfig {
    /// loads `manager_config.json` from `dir`, or writes the defaults there if it's missing
    pub fn load(dir: &Dir) -> Self {
        load_json_or_default(dir, MANAGER_CONFIG_NAME)
    }
}
