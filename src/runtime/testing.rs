//! Mock implementations for testing
//!
//! These mocks enable runtime testing without a real backend.

use super::Notification;
use crate::classifier::RawResponse;
use crate::transport::{OutgoingRequest, RemoteCall, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

/// Upper bound on how long a test waits for the widget to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued results
pub struct MockTransport {
    results: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    /// Record of all calls made
    pub requests: Mutex<Vec<(String, OutgoingRequest)>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a structured payload
    pub fn queue_response(&self, response: RawResponse) {
        self.results.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: TransportError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded calls as `(method, request)`
    pub fn recorded_requests(&self) -> Vec<(String, OutgoingRequest)> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, method: &str, request: &OutgoingRequest) {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), request.clone()));
    }

    fn pop_result(&self) -> Result<RawResponse, TransportError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connect("No mock response queued")))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteCall for MockTransport {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError> {
        self.record(method, request);
        self.pop_result()
    }
}

// ============================================================================
// Delayed Mock Transport (for pending, timeout and shutdown testing)
// ============================================================================

/// Mock transport that answers after a fixed delay
pub struct DelayedMockTransport {
    inner: MockTransport,
    delay: Duration,
    /// Notified when a call starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_response(&self, response: RawResponse) {
        self.inner.queue_response(response);
    }

    pub fn recorded_requests(&self) -> Vec<(String, OutgoingRequest)> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl RemoteCall for DelayedMockTransport {
    async fn call(
        &self,
        method: &str,
        request: &OutgoingRequest,
    ) -> Result<RawResponse, TransportError> {
        self.inner.record(method, request);
        // notify_one keeps a permit if the test is not waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.pop_result()
    }
}

// ============================================================================
// Notification helpers
// ============================================================================

/// Wait for the next notification
pub async fn next_notification(rx: &mut broadcast::Receiver<Notification>) -> Notification {
    tokio::time::timeout(SETTLE_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("notification channel closed")
}

/// Collect notifications until the pending indicator is hidden, plus
/// whatever the same transition broadcast after it
pub async fn collect_until_idle(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        let notification = next_notification(rx).await;
        let idle = notification == Notification::PendingChanged { visible: false };
        seen.push(notification);
        if idle {
            break;
        }
    }
    // Effects of one transition are applied without yielding, so the rest
    // of it is already in the channel
    while let Ok(notification) = rx.try_recv() {
        seen.push(notification);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> OutgoingRequest {
        OutgoingRequest::from_input(text).unwrap()
    }

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_response(RawResponse::reply("Hello"));

        let response = mock.call("m", &request("hi")).await.unwrap();
        assert_eq!(response, RawResponse::reply("Hello"));

        // Second call should fail (no more responses)
        assert!(mock.call("m", &request("again")).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_mock_transport() {
        let mock = DelayedMockTransport::new(Duration::from_secs(3));
        mock.queue_response(RawResponse::reply("later"));

        let start = tokio::time::Instant::now();
        let response = mock.call("m", &request("hi")).await.unwrap();

        assert_eq!(response, RawResponse::reply("later"));
        assert!(start.elapsed() >= Duration::from_secs(3));
        // Permit left by the call is still available
        mock.request_started.notified().await;
    }
}
