use tracing::debug;

use crate::channel::MethodResponse;

/// Error code for any failure reported by the scanner
pub const SCAN_FAILED: &str = "SCAN_FAILED";

/// Error code for a scan requested while another one is still pending
pub const SCAN_IN_PROGRESS: &str = "SCAN_IN_PROGRESS";

/// Raw terminal signal reported by the frontend scanner
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum ScanSignal {
    Success(Option<String>),
    Canceled,
    Failure(Option<String>),
}

/// What a single scan produced
#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Enum)]
pub enum ScanOutcome {
    Decoded { value: String },
    NoResult,
    Failed { code: String, message: Option<String> },
}

impl ScanOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { code: SCAN_FAILED.to_string(), message: Some(message.into()) }
    }
}

impl From<ScanSignal> for ScanOutcome {
    fn from(signal: ScanSignal) -> Self {
        match signal {
            ScanSignal::Success(raw_value) => match qrcheck_util::non_empty(raw_value) {
                Some(value) => Self::Decoded { value },
                None => {
                    debug!("scan matched a code with no content");
                    Self::NoResult
                }
            },

            ScanSignal::Canceled => {
                debug!("scan canceled by user");
                Self::NoResult
            }

            ScanSignal::Failure(message) => {
                Self::Failed { code: SCAN_FAILED.to_string(), message }
            }
        }
    }
}

impl From<ScanOutcome> for MethodResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Decoded { value } => Self::success(Some(value)),
            ScanOutcome::NoResult => Self::success(None),
            ScanOutcome::Failed { code, message } => Self::error(code, message),
        }
    }
}
