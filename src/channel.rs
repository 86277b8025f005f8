//! Named command channel between the frontend and the Rust core
//!
//! A [`MethodChannel`] pairs a [`ChannelName`] with a [`MethodCallHandler`]. Channels are
//! bound once at startup into a process-wide registry and unbound on teardown.

use std::sync::{Arc, LazyLock};

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use qrcheck_macros::new_type;
use tracing::{debug, warn};

new_type!(ChannelName, String);

/// Channel the frontend uses to reach the native code scanner
pub const DEFAULT_CHANNEL_NAME: &str = "google_code_scanner";

static CHANNELS: LazyLock<RwLock<AHashMap<ChannelName, Arc<MethodChannel>>>> =
    LazyLock::new(|| RwLock::new(AHashMap::new()));

/// A command received over a channel, the method name is its identity
#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Record)]
pub struct MethodCall {
    pub method: String,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into() }
    }
}

/// The single resolution of a [`MethodCall`]
#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Enum)]
pub enum MethodResponse {
    Success {
        value: Option<String>,
    },
    Error {
        code: String,
        message: Option<String>,
        details: Option<String>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success(value: Option<String>) -> Self {
        Self::Success { value }
    }

    pub fn error(code: impl Into<String>, message: Option<String>) -> Self {
        Self::Error { code: code.into(), message, details: None }
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum ChannelError {
    #[error("no handler bound to channel {name}")]
    NotBound { name: String },
}

#[async_trait]
pub trait MethodCallHandler: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve one call, must always produce a response
    async fn on_method_call(&self, call: MethodCall) -> MethodResponse;
}

#[derive(Debug)]
pub struct MethodChannel {
    name: ChannelName,
    handler: Arc<dyn MethodCallHandler>,
}

impl MethodChannel {
    /// Bind `handler` to `name` until [`MethodChannel::unbind`]
    ///
    /// Binding a name that is already bound replaces the previous handler
    pub fn bind(name: impl Into<ChannelName>, handler: Arc<dyn MethodCallHandler>) -> Arc<Self> {
        let name = name.into();
        let channel = Arc::new(Self { name: name.clone(), handler });

        if CHANNELS.write().insert(name.clone(), channel.clone()).is_some() {
            warn!("channel {name} was already bound, replacing its handler");
        } else {
            debug!("binding channel {name}");
        }

        channel
    }

    pub fn bound(name: &str) -> Option<Arc<Self>> {
        CHANNELS.read().get(name).cloned()
    }

    /// Remove the binding only if `channel` is still the one bound under its name
    pub fn unbind(channel: &Arc<Self>) -> bool {
        let mut channels = CHANNELS.write();

        match channels.get(&channel.name) {
            Some(bound) if Arc::ptr_eq(bound, channel) => {
                channels.remove(&channel.name);
                debug!("unbound channel {}", channel.name);
                true
            }
            Some(_) => {
                debug!("channel {} was rebound, leaving the newer handler", channel.name);
                false
            }
            None => false,
        }
    }

    /// Dispatch `method` to whatever is bound under `name`
    pub async fn invoke(name: &str, method: &str) -> Result<MethodResponse, ChannelError> {
        let channel =
            Self::bound(name).ok_or_else(|| ChannelError::NotBound { name: name.to_string() })?;

        Ok(channel.invoke_method(method).await)
    }

    pub async fn invoke_method(&self, method: &str) -> MethodResponse {
        debug!("[{}] method call: {method}", self.name);
        self.handler.on_method_call(MethodCall::new(method)).await
    }

    pub fn name(&self) -> &ChannelName {
        &self.name
    }
}
