//! Scan bridge as seen by the frontend

use std::sync::Arc;

use tracing::debug;

use crate::{
    bridge::{SCAN_CODE_METHOD, ScanBridge},
    channel::{ChannelError, MethodChannel, MethodResponse},
    config::{BridgeConfig, ConfigError},
    outcome::ScanOutcome,
    scanner::CodeScanner,
};

/// Owns the channel binding for the scan bridge, created once when the host activity starts
#[derive(Debug, uniffi::Object)]
pub struct FfiScanBridge {
    channel: Arc<MethodChannel>,
    bridge: Arc<ScanBridge>,
}

#[uniffi::export(async_runtime = "tokio")]
impl FfiScanBridge {
    /// Bind the scan bridge to its channel, uses [`BridgeConfig::default`] when `config` is `None`
    #[uniffi::constructor]
    pub fn new(
        scanner: Box<dyn CodeScanner>,
        config: Option<BridgeConfig>,
    ) -> Result<Self, ConfigError> {
        crate::logging::init();

        let config = config.unwrap_or_default();
        config.validate()?;

        let bridge = Arc::new(ScanBridge::new(Arc::from(scanner), config));
        let channel = MethodChannel::bind(bridge.config().channel_name.as_str(), bridge.clone());

        debug!("scan bridge ready on channel {}", channel.name());
        Ok(Self { channel, bridge })
    }

    /// Dispatch a command by name over this bridge's channel
    pub async fn invoke_method(&self, method: String) -> Result<MethodResponse, ChannelError> {
        MethodChannel::invoke(self.channel.name(), &method).await
    }

    pub async fn scan_code(&self) -> Result<MethodResponse, ChannelError> {
        self.invoke_method(SCAN_CODE_METHOD.to_string()).await
    }

    pub fn channel_name(&self) -> String {
        self.channel.name().to_string()
    }

    pub fn is_scanning(&self) -> bool {
        self.bridge.is_scanning()
    }

    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.bridge.last_outcome()
    }

    /// Tear down the channel binding, later calls fail with [`ChannelError::NotBound`]
    ///
    /// Does nothing once a newer bridge has been bound under the same name
    pub fn unbind(&self) -> bool {
        MethodChannel::unbind(&self.channel)
    }
}
