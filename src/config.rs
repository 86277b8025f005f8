use std::time::Duration;

use qrcheck_macros::impl_default_for;
use qrcheck_util::result_ext::ResultExt as _;
use serde::Deserialize;

use crate::channel::DEFAULT_CHANNEL_NAME;

/// What to do with a scan requested while another is still pending
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Deserialize, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Respond with `SCAN_IN_PROGRESS` straight away
    #[default]
    Reject,
    /// Wait for the pending scan to finish, then start a new one
    Queue,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct BridgeConfig {
    pub channel_name: String,
    /// No timeout when unset, the scan stays pending until the scanner answers
    pub scan_timeout_ms: Option<u64>,
    pub busy_policy: BusyPolicy,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to parse config: {0}")]
    Parse(String),

    #[error("channel name must not be empty")]
    EmptyChannelName,

    #[error("scan timeout must be greater than zero")]
    ZeroTimeout,
}

impl_default_for!(BridgeConfig);
impl BridgeConfig {
    pub fn new() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            scan_timeout_ms: None,
            busy_policy: BusyPolicy::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err_str(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_name.trim().is_empty() {
            return Err(ConfigError::EmptyChannelName);
        }

        if self.scan_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_ms.map(Duration::from_millis)
    }
}

mod ffi {
    use super::*;

    #[uniffi::export]
    fn default_bridge_config() -> BridgeConfig {
        BridgeConfig::new()
    }

    #[uniffi::export]
    fn bridge_config_from_json(json: String) -> Result<BridgeConfig, ConfigError> {
        BridgeConfig::from_json(&json)
    }
}
