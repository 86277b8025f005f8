//! Bridges the `scanCode` command to the frontend's native code scanner
//!
//! Each call builds a QR-only [`ScanOptions`], hands the scanner a fresh [`ScanSession`]
//! and waits for that session's single signal. The signal is mapped to a [`ScanOutcome`]
//! and then to the channel's [`MethodResponse`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    channel::{MethodCall, MethodCallHandler, MethodResponse},
    config::{BridgeConfig, BusyPolicy},
    outcome::{SCAN_IN_PROGRESS, ScanOutcome},
    scanner::{CodeScanner, ScanOptions, ScanSession},
};

/// The only command this bridge understands
pub const SCAN_CODE_METHOD: &str = "scanCode";

#[derive(Debug, Clone, Hash, Eq, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("a scan is already in progress")]
    InProgress,
}

impl From<ScanError> for MethodResponse {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::InProgress => Self::error(SCAN_IN_PROGRESS, Some(error.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct ScanBridge {
    scanner: Arc<dyn CodeScanner>,
    config: BridgeConfig,
    scan_lock: Mutex<()>,
    last_outcome: RwLock<Option<ScanOutcome>>,
}

impl ScanBridge {
    pub fn new(scanner: Arc<dyn CodeScanner>, config: BridgeConfig) -> Self {
        Self { scanner, config, scan_lock: Mutex::new(()), last_outcome: RwLock::new(None) }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Whether a scan session is currently waiting on the scanner
    pub fn is_scanning(&self) -> bool {
        self.scan_lock.try_lock().is_err()
    }

    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.last_outcome.read().clone()
    }

    /// Run one scan session and wait for its outcome
    pub async fn scan(&self) -> Result<ScanOutcome, ScanError> {
        let _guard = self.acquire().await?;

        let options = ScanOptions::qr_code_only();
        let (session, receiver) = ScanSession::new();
        let session_id = session.id();

        debug!("starting scan session {session_id} for {:?}", options.formats);
        self.scanner.start_scan(options, session);

        let timeout = self.config.scan_timeout();
        let outcome = match qrcheck_tokio::optional_timeout(timeout, receiver).await {
            Ok(Ok(signal)) => ScanOutcome::from(signal),
            Ok(Err(_)) => {
                warn!("scan session {session_id} was dropped without a result");
                ScanOutcome::failed("scan session ended without a result")
            }
            Err(_) => {
                let millis = timeout.map(|timeout| timeout.as_millis()).unwrap_or_default();
                warn!("scan session {session_id} timed out after {millis}ms");
                ScanOutcome::failed(format!("scan timed out after {millis}ms"))
            }
        };

        info!("scan session {session_id} finished: {outcome:?}");
        *self.last_outcome.write() = Some(outcome.clone());

        Ok(outcome)
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, ()>, ScanError> {
        match self.config.busy_policy {
            BusyPolicy::Reject => self.scan_lock.try_lock().map_err(|_| {
                debug!("rejecting scan, another scan is in progress");
                ScanError::InProgress
            }),

            BusyPolicy::Queue => {
                if self.is_scanning() {
                    debug!("queueing scan behind the pending one");
                }

                Ok(self.scan_lock.lock().await)
            }
        }
    }
}

#[async_trait]
impl MethodCallHandler for ScanBridge {
    async fn on_method_call(&self, call: MethodCall) -> MethodResponse {
        if call.method != SCAN_CODE_METHOD {
            debug!("method not implemented: {}", call.method);
            return MethodResponse::NotImplemented;
        }

        match self.scan().await {
            Ok(outcome) => outcome.into(),
            Err(error) => error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use qrcheck_tokio::FutureTimeoutExt as _;

    use super::*;
    use crate::outcome::ScanSignal;

    #[derive(Debug)]
    enum Behavior {
        Respond(ScanSignal),
        RespondLater(ScanSignal),
        Hold,
        DropSession,
    }

    #[derive(Debug)]
    struct FakeScanner {
        behavior: Behavior,
        calls: Mutex<Vec<ScanOptions>>,
        held: Mutex<Vec<Arc<ScanSession>>>,
    }

    impl FakeScanner {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self { behavior, calls: Mutex::new(vec![]), held: Mutex::new(vec![]) })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn held_session(&self, index: usize) -> Arc<ScanSession> {
            self.held.lock()[index].clone()
        }

        async fn wait_for_calls(&self, count: usize) {
            while self.call_count() < count {
                tokio::task::yield_now().await;
            }
        }
    }

    fn complete(session: &ScanSession, signal: ScanSignal) {
        match signal {
            ScanSignal::Success(raw_value) => session.on_success(raw_value),
            ScanSignal::Canceled => session.on_canceled(),
            ScanSignal::Failure(message) => session.on_failure(message),
        };
    }

    impl CodeScanner for FakeScanner {
        fn start_scan(&self, options: ScanOptions, session: Arc<ScanSession>) {
            self.calls.lock().push(options);

            match &self.behavior {
                Behavior::Respond(signal) => complete(&session, signal.clone()),
                Behavior::RespondLater(signal) => {
                    let signal = signal.clone();
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        complete(&session, signal);
                    });
                }
                Behavior::Hold => self.held.lock().push(session),
                Behavior::DropSession => drop(session),
            }
        }
    }

    fn bridge_with(scanner: Arc<FakeScanner>, config: BridgeConfig) -> Arc<ScanBridge> {
        Arc::new(ScanBridge::new(scanner, config))
    }

    fn bridge(scanner: Arc<FakeScanner>) -> Arc<ScanBridge> {
        bridge_with(scanner, BridgeConfig::default())
    }

    fn scan_code() -> MethodCall {
        MethodCall::new(SCAN_CODE_METHOD)
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_implemented() {
        let scanner = FakeScanner::new(Behavior::Respond(ScanSignal::Canceled));
        let bridge = bridge(scanner.clone());

        for method in ["scan", "scancode", "ScanCode", "", "scanCode "] {
            let response = bridge.on_method_call(MethodCall::new(method)).await;
            assert_eq!(response, MethodResponse::NotImplemented);
        }

        assert_eq!(scanner.call_count(), 0);
        assert_eq!(bridge.last_outcome(), None);
    }

    #[tokio::test]
    async fn test_decoded_value() {
        let signal = ScanSignal::Success(Some("https://example.com".to_string()));
        let scanner = FakeScanner::new(Behavior::Respond(signal));
        let bridge = bridge(scanner.clone());

        let response = bridge.on_method_call(scan_code()).await;

        assert_eq!(response, MethodResponse::success(Some("https://example.com".to_string())));
        assert_eq!(scanner.call_count(), 1);
        assert_eq!(
            bridge.last_outcome(),
            Some(ScanOutcome::Decoded { value: "https://example.com".to_string() })
        );
    }

    #[tokio::test]
    async fn test_decoded_value_reported_asynchronously() {
        let signal = ScanSignal::Success(Some("WIFI:S:home;T:WPA;P:secret;;".to_string()));
        let scanner = FakeScanner::new(Behavior::RespondLater(signal));
        let bridge = bridge(scanner.clone());

        let response = bridge.on_method_call(scan_code()).await;

        assert_eq!(
            response,
            MethodResponse::success(Some("WIFI:S:home;T:WPA;P:secret;;".to_string()))
        );
        assert_eq!(scanner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_payload_is_absent_value() {
        let scanner = FakeScanner::new(Behavior::Respond(ScanSignal::Success(None)));
        let response = bridge(scanner.clone()).on_method_call(scan_code()).await;

        assert_eq!(response, MethodResponse::success(None));
        assert_eq!(scanner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_is_absent_value() {
        let scanner = FakeScanner::new(Behavior::RespondLater(ScanSignal::Canceled));
        let bridge = bridge(scanner.clone());

        let response = bridge.on_method_call(scan_code()).await;

        assert_eq!(response, MethodResponse::success(None));
        assert_eq!(bridge.last_outcome(), Some(ScanOutcome::NoResult));
        assert_eq!(scanner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_structured_error() {
        let signal = ScanSignal::Failure(Some("Camera unavailable".to_string()));
        let scanner = FakeScanner::new(Behavior::Respond(signal));

        let response = bridge(scanner.clone()).on_method_call(scan_code()).await;

        assert_eq!(
            response,
            MethodResponse::Error {
                code: "SCAN_FAILED".to_string(),
                message: Some("Camera unavailable".to_string()),
                details: None,
            }
        );
        assert_eq!(scanner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_every_scan_is_qr_code_only() {
        let scanner = FakeScanner::new(Behavior::Respond(ScanSignal::Canceled));
        let bridge = bridge(scanner.clone());

        for _ in 0..3 {
            bridge.on_method_call(scan_code()).await;
        }

        let calls = scanner.calls.lock().clone();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(ScanOptions::is_qr_code_only));
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_next_scan() {
        let failing = FakeScanner::new(Behavior::DropSession);
        let bridge = bridge(failing.clone());

        let response = bridge.on_method_call(scan_code()).await;
        assert_eq!(
            response,
            MethodResponse::error(
                "SCAN_FAILED",
                Some("scan session ended without a result".to_string())
            )
        );

        assert!(!bridge.is_scanning());
        let response = bridge.on_method_call(scan_code()).await;
        assert!(matches!(response, MethodResponse::Error { .. }));
        assert_eq!(failing.call_count(), 2);
    }

    #[tokio::test]
    async fn test_second_scan_rejected_while_pending() {
        let scanner = FakeScanner::new(Behavior::Hold);
        let bridge = bridge(scanner.clone());

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.on_method_call(scan_code()).await }
        });

        scanner.wait_for_calls(1).await;
        assert!(bridge.is_scanning());

        let second = bridge.on_method_call(scan_code()).await;
        assert_eq!(
            second,
            MethodResponse::error("SCAN_IN_PROGRESS", Some("a scan is already in progress".into()))
        );
        assert_eq!(scanner.call_count(), 1);

        assert!(scanner.held_session(0).on_success(Some("first".to_string())));
        let first = first.await.unwrap();

        assert_eq!(first, MethodResponse::success(Some("first".to_string())));
        assert!(!bridge.is_scanning());
    }

    #[tokio::test]
    async fn test_second_scan_queued_while_pending() {
        let scanner = FakeScanner::new(Behavior::Hold);
        let config = BridgeConfig { busy_policy: BusyPolicy::Queue, ..BridgeConfig::default() };
        let bridge = bridge_with(scanner.clone(), config);

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.on_method_call(scan_code()).await }
        });

        scanner.wait_for_calls(1).await;

        let second = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.on_method_call(scan_code()).await }
        });

        // the queued scan must not reach the scanner yet
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(scanner.call_count(), 1);

        scanner.held_session(0).on_canceled();
        assert_eq!(first.await.unwrap(), MethodResponse::success(None));

        scanner.wait_for_calls(2).await;
        scanner.held_session(1).on_success(Some("second".to_string()));
        assert_eq!(second.await.unwrap(), MethodResponse::success(Some("second".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_times_out_when_configured() {
        let scanner = FakeScanner::new(Behavior::Hold);
        let config = BridgeConfig { scan_timeout_ms: Some(1_000), ..BridgeConfig::default() };
        let bridge = bridge_with(scanner.clone(), config);

        let response = bridge.on_method_call(scan_code()).await;
        assert_eq!(
            response,
            MethodResponse::error("SCAN_FAILED", Some("scan timed out after 1000ms".to_string()))
        );

        // a late answer is accepted by the session but goes nowhere
        let session = scanner.held_session(0);
        assert!(session.on_success(Some("late".to_string())));
        assert_eq!(bridge.last_outcome(), Some(ScanOutcome::failed("scan timed out after 1000ms")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_stays_pending_without_timeout() {
        let scanner = FakeScanner::new(Behavior::Hold);
        let bridge = bridge(scanner.clone());

        let result = bridge.on_method_call(scan_code()).with_timeout(Duration::from_secs(3600)).await;

        assert!(result.is_err());
        assert_eq!(scanner.call_count(), 1);
        assert!(!scanner.held_session(0).is_resolved());
    }
}
