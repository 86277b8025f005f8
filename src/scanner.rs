//! The native code scanner, implemented by the frontend
//!
//! Rust hands the frontend a [`ScanOptions`] and a fresh [`ScanSession`]. The frontend
//! presents its scanner UI and reports back through exactly one of the session's
//! completion methods.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::outcome::ScanSignal;

#[uniffi::export(callback_interface)]
pub trait CodeScanner: Send + Sync + std::fmt::Debug + 'static {
    /// Present the scanner, then complete `session` once with the result
    fn start_scan(&self, options: ScanOptions, session: Arc<ScanSession>);
}

/// Symbologies the platform scanner can recognize
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumIter,
    uniffi::Enum,
)]
#[strum(serialize_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Itf,
    Pdf417,
    UpcA,
    UpcE,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Record)]
pub struct ScanOptions {
    /// The scanner must ignore any code not in this list
    pub formats: Vec<BarcodeFormat>,
}

impl ScanOptions {
    pub fn qr_code_only() -> Self {
        Self { formats: vec![BarcodeFormat::QrCode] }
    }

    pub fn is_qr_code_only(&self) -> bool {
        self.formats == [BarcodeFormat::QrCode]
    }
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle for one scan, resolved at most once
#[derive(Debug, uniffi::Object)]
pub struct ScanSession {
    id: u64,
    sender: Mutex<Option<oneshot::Sender<ScanSignal>>>,
}

impl ScanSession {
    pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<ScanSignal>) {
        let (sender, receiver) = oneshot::channel();
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);

        let session = Self { id, sender: Mutex::new(Some(sender)) };
        (Arc::new(session), receiver)
    }

    fn resolve(&self, signal: ScanSignal) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            warn!("scan session {} already resolved, ignoring {signal:?}", self.id);
            return false;
        };

        debug!("scan session {} resolved with {signal:?}", self.id);
        if let Err(signal) = sender.send(signal) {
            debug!("scan session {} is no longer awaited, dropping {signal:?}", self.id);
        }

        true
    }
}

#[uniffi::export]
impl ScanSession {
    /// A code was recognized, `raw_value` is `None` when it carried no content
    pub fn on_success(&self, raw_value: Option<String>) -> bool {
        self.resolve(ScanSignal::Success(raw_value))
    }

    /// The user closed the scanner without scanning anything
    pub fn on_canceled(&self) -> bool {
        self.resolve(ScanSignal::Canceled)
    }

    pub fn on_failure(&self, message: Option<String>) -> bool {
        self.resolve(ScanSignal::Failure(message))
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}
