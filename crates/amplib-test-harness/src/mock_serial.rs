//! Scripted transport for deterministic testing of protocol engines.
//!
//! [`MockTransport`] implements [`Transport`] over an ordered script of
//! request/response pairs. Each `send()` must match the next scripted
//! request exactly; its response is then queued for `receive()`. An empty
//! response models a device that stays silent, so the next read times out.
//!
//! Clones share one script, so a test can hand a boxed clone to the code
//! under test and keep another to inspect afterwards.
//!
//! # Example
//!
//! ```
//! use amplib_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // Status request answered with an ack-shaped frame.
//! mock.expect(&[0x55, 0x55, 0x55, 0x01, 0x90, 0x90],
//!             &[0xAA, 0xAA, 0xAA, 0x01, 0x90, 0x90]);
//! assert_eq!(mock.remaining_expectations(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use amplib_core::error::{Error, Result};
use amplib_core::helpers::hex_dump;
use amplib_core::transport::Transport;
use amplib_core::types::ControlLine;

#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be returned by `receive()`.
    inbound: VecDeque<u8>,
    connected: bool,
    control_lines_supported: bool,
    /// Returned by the next `send()` in place of scripted handling.
    send_failure: Option<Error>,
    sent_log: Vec<Vec<u8>>,
    line_events: Vec<(ControlLine, bool)>,
    discard_count: usize,
    discarded_bytes: usize,
}

/// A scripted [`Transport`] for testing without hardware.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a connected mock with an empty script and working control lines.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                inbound: VecDeque::new(),
                connected: true,
                control_lines_supported: true,
                send_failure: None,
                sent_log: Vec::new(),
                line_events: Vec::new(),
                discard_count: 0,
                discarded_bytes: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread poisons the lock; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Script the next exchange: when `request` is sent, `response` becomes
    /// readable.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Script a request the device never answers.
    pub fn expect_silence(&self, request: &[u8]) {
        self.expect(request, &[]);
    }

    /// Make bytes readable without a request, as if left over from an
    /// earlier exchange.
    pub fn inject_stale(&self, bytes: &[u8]) {
        self.state().inbound.extend(bytes.iter().copied());
    }

    /// Every `send()` payload so far, in order.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Scripted exchanges not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Every control line change so far, as `(line, asserted)`.
    pub fn control_line_events(&self) -> Vec<(ControlLine, bool)> {
        self.state().line_events.clone()
    }

    /// How many times `discard_input()` has been called.
    pub fn discard_count(&self) -> usize {
        self.state().discard_count
    }

    /// Total bytes thrown away by `discard_input()`.
    pub fn discarded_bytes(&self) -> usize {
        self.state().discarded_bytes
    }

    /// Simulate a link without modem control lines.
    pub fn set_control_lines_supported(&self, supported: bool) {
        self.state().control_lines_supported = supported;
    }

    /// Make the next `send()` fail with `error`. The attempt is still
    /// recorded in [`sent_data`](Self::sent_data) and no expectation is
    /// consumed.
    pub fn fail_next_send(&self, error: Error) {
        self.state().send_failure = Some(error);
    }

    /// Force the connected state; when `false`, I/O returns
    /// [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());
        if let Some(error) = state.send_failure.take() {
            return Err(error);
        }

        let expectation = state.expectations.pop_front().ok_or_else(|| {
            Error::Transport(format!("unscripted send: [{}]", hex_dump(data)))
        })?;
        if data != expectation.request.as_slice() {
            return Err(Error::Transport(format!(
                "unexpected send: expected [{}], got [{}]",
                hex_dump(&expectation.request),
                hex_dump(data)
            )));
        }
        state.inbound.extend(expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.inbound.is_empty() {
            return Err(Error::Timeout);
        }

        let n = state.inbound.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn discard_input(&mut self) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.discard_count += 1;
        state.discarded_bytes += state.inbound.len();
        state.inbound.clear();
        Ok(())
    }

    async fn set_control_line(&mut self, line: ControlLine, asserted: bool) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if !state.control_lines_supported {
            return Err(Error::Unsupported(format!(
                "{line} control line not available on this transport"
            )));
        }
        state.line_events.push((line, asserted));
        Ok(())
    }

    fn has_control_lines(&self) -> bool {
        self.state().control_lines_supported
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.inbound.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS_REQ: &[u8] = &[0x55, 0x55, 0x55, 0x01, 0x90, 0x90];

    #[tokio::test]
    async fn scripted_exchange() {
        let mut mock = MockTransport::new();
        mock.expect(STATUS_REQ, &[0xAA, 0xAA, 0xAA, 0x01]);

        mock.send(STATUS_REQ).await.unwrap();

        let mut buf = [0u8; 16];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xAA, 0xAA, 0x01]);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn receive_honours_buffer_size() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[1, 2, 3, 4, 5]);
        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(mock.receive(&mut buf, Duration::ZERO).await.unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        let mut rest = [0u8; 8];
        assert_eq!(mock.receive(&mut rest, Duration::ZERO).await.unwrap(), 3);
        assert_eq!(&rest[..3], &[3, 4, 5]);
        assert!(matches!(
            mock.receive(&mut rest, Duration::ZERO).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn clones_share_the_script() {
        let observer = MockTransport::new();
        observer.expect(&[0x0D], &[]);

        let mut boxed: Box<dyn Transport> = Box::new(observer.clone());
        boxed.send(&[0x0D]).await.unwrap();

        assert_eq!(observer.sent_data(), vec![vec![0x0Du8]]);
        assert_eq!(observer.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mismatched_send_is_transport_error() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let err = mock.send(&[0x99]).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("expected [01], got [99]"));
    }

    #[tokio::test]
    async fn unscripted_send_is_transport_error() {
        let mut mock = MockTransport::new();
        assert!(matches!(
            mock.send(&[0x01]).await,
            Err(Error::Transport(_))
        ));
    }

    #[tokio::test]
    async fn injected_send_failure_is_returned_once() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);
        mock.fail_next_send(Error::ConnectionLost);

        assert!(matches!(
            mock.send(&[0x01]).await,
            Err(Error::ConnectionLost)
        ));
        assert_eq!(mock.remaining_expectations(), 1);

        mock.send(&[0x01]).await.unwrap();
        assert_eq!(mock.sent_data().len(), 2);
    }

    #[tokio::test]
    async fn silence_times_out() {
        let mut mock = MockTransport::new();
        mock.expect_silence(STATUS_REQ);
        mock.send(STATUS_REQ).await.unwrap();

        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, Duration::from_millis(10)).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn discard_drops_stale_bytes() {
        let mut mock = MockTransport::new();
        mock.inject_stale(&[0xAA, 0xAA]);
        mock.discard_input().await.unwrap();

        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, Duration::ZERO).await,
            Err(Error::Timeout)
        ));
        assert_eq!(mock.discard_count(), 1);
        assert_eq!(mock.discarded_bytes(), 2);
    }

    #[tokio::test]
    async fn control_lines_are_recorded() {
        let mut mock = MockTransport::new();
        mock.set_control_line(ControlLine::Dtr, true).await.unwrap();
        mock.set_control_line(ControlLine::Dtr, false).await.unwrap();
        assert_eq!(
            mock.control_line_events(),
            vec![(ControlLine::Dtr, true), (ControlLine::Dtr, false)]
        );

        mock.set_control_lines_supported(false);
        assert!(!mock.has_control_lines());
        assert!(matches!(
            mock.set_control_line(ControlLine::Rts, true).await,
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn closed_mock_rejects_io() {
        let mut mock = MockTransport::new();
        mock.close().await.unwrap();
        assert!(!mock.is_connected());
        assert!(matches!(mock.send(&[0x01]).await, Err(Error::NotConnected)));
        assert!(matches!(
            mock.discard_input().await,
            Err(Error::NotConnected)
        ));
    }
}
