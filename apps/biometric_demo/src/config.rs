use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use auth_core::OrchestratorConfig;
use biometric_integration::DeviceProfile;
use serde::Deserialize;
use shared::domain::TierOrder;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "biometric.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tier_order: TierOrder,
    pub debug_mode: bool,
    pub notification_capacity: usize,
    pub device: DeviceProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tier_order: TierOrder::StrongFirst,
            debug_mode: false,
            notification_capacity: OrchestratorConfig::default().notification_capacity,
            device: DeviceProfile::default(),
        }
    }
}

impl Settings {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            tier_order: self.tier_order,
            debug_mode: self.debug_mode,
            notification_capacity: self.notification_capacity,
        }
    }
}

/// Defaults, then the TOML file, then environment overrides.
///
/// A missing `biometric.toml` in the working directory is fine; a missing
/// file passed explicitly is not.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let settings = match fs::read_to_string(&path) {
        Ok(raw) => parse_settings(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if explicit_path.is_none() && err.kind() == std::io::ErrorKind::NotFound => {
            Settings::default()
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    Ok(apply_env_overrides(settings, |key| std::env::var(key).ok()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str::<Settings>(raw)?)
}

fn first_set(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter().rev().find_map(|key| lookup(*key))
}

pub fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = first_set(&lookup, &["BIOMETRIC_TIER_ORDER", "APP__TIER_ORDER"]) {
        match v.parse::<TierOrder>() {
            Ok(order) => settings.tier_order = order,
            Err(err) => warn!("ignoring tier order override: {err}"),
        }
    }

    if let Some(v) = first_set(&lookup, &["BIOMETRIC_DEBUG_MODE", "APP__DEBUG_MODE"]) {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => settings.debug_mode = true,
            "0" | "false" | "no" | "off" => settings.debug_mode = false,
            other => warn!("ignoring debug mode override: '{other}'"),
        }
    }

    if let Some(v) = first_set(&lookup, &["APP__NOTIFICATION_CAPACITY"]) {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.notification_capacity = parsed;
        }
    }

    if let Some(v) = first_set(&lookup, &["APP__PROMPT_LATENCY_MS"]) {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.device.prompt_latency_ms = parsed;
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
