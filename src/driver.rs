//! Blocking drive loop
//!
//! A [`ScanSession`] never sleeps or reads the clock on its own.
//! [`ScanDriver`] wraps one in a wall-clock loop for hosts without a
//! scheduler of their own: tick, hand queued events to a callback,
//! sleep, repeat. An optional [`OpenFlag`] stands in for the host
//! dialog, stopping the session the moment the flag closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::camera::CameraAccess;
use crate::decode::FrameDecoder;
use crate::session::{ScanResult, ScanSession, ScanState, SessionEvent};

/// Shared open/closed flag between a host UI and a running driver.
///
/// Clones observe the same flag. Closing is one-way for the lifetime of
/// a run, matching a scanner dialog that stops its camera on close.
#[derive(Debug, Clone)]
pub struct OpenFlag(Arc<AtomicBool>);

impl OpenFlag {
    /// A flag in the open position.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Close the flag. Every driver watching it stops on its next pass.
    pub fn close(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Current position.
    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for OpenFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a session to completion on the current thread.
pub struct ScanDriver<A: CameraAccess, D: FrameDecoder> {
    session: ScanSession<A, D>,
    open: Option<OpenFlag>,
}

impl<A: CameraAccess, D: FrameDecoder> ScanDriver<A, D> {
    /// Wrap a session for blocking use.
    pub fn new(session: ScanSession<A, D>) -> Self {
        Self {
            session,
            open: None,
        }
    }

    /// Watch an [`OpenFlag`] while running.
    pub fn with_open_flag(mut self, flag: OpenFlag) -> Self {
        self.open = Some(flag);
        self
    }

    /// Start the session and pump it until it returns to idle.
    ///
    /// Every queued [`SessionEvent`] is handed to `on_event` in order.
    /// The run ends when the session closes itself after a find, when
    /// the open flag closes, when a fatal error idles the session, or
    /// when `timeout` elapses, whichever comes first. Returns the
    /// decoded result if the cycle produced one.
    pub fn run(
        mut self,
        timeout: Duration,
        mut on_event: impl FnMut(&SessionEvent),
    ) -> Option<ScanResult> {
        let deadline = Instant::now() + timeout;
        self.session.start();

        loop {
            while let Some(event) = self.session.poll_event() {
                on_event(&event);
            }
            if self.session.state() == ScanState::Idle {
                break;
            }

            if self.open.as_ref().is_some_and(|flag| !flag.is_open()) {
                debug!("scanner closed by host, stopping");
                self.session.stop();
                continue;
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("scan timeout elapsed, stopping");
                self.session.stop();
                continue;
            }

            self.session.tick(now);
            if self.session.state() != ScanState::Idle {
                thread::sleep(self.session.config().tick_interval);
            }
        }

        self.session.last_result().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::sources::{BlankCamera, StillCamera};
    use crate::config::ScanConfig;
    use crate::decode::{DecodeFault, FrameDecoder};
    use crate::frame::Frame;

    /// Decodes its payload on the first frame, then nothing.
    struct OneShotDecoder(Option<&'static str>);

    impl FrameDecoder for OneShotDecoder {
        fn decode(&mut self, _frame: Frame<'_>) -> Result<Option<String>, DecodeFault> {
            Ok(self.0.take().map(str::to_string))
        }
    }

    fn fast_config() -> ScanConfig {
        ScanConfig::new()
            .with_tick_interval(Duration::from_millis(1))
            .with_found_linger(Duration::ZERO)
    }

    #[test]
    fn test_run_returns_the_decoded_payload() {
        let camera = StillCamera::from_rgba(8, 8, vec![0; 8 * 8 * 4]);
        let session = ScanSession::new(camera, OneShotDecoder(Some("ticket-42")), fast_config());

        let mut saw_result = false;
        let result = ScanDriver::new(session).run(Duration::from_secs(2), |event| {
            if matches!(event, SessionEvent::ResultReady(_)) {
                saw_result = true;
            }
        });

        assert_eq!(result.unwrap().payload, "ticket-42");
        assert!(saw_result);
    }

    #[test]
    fn test_run_times_out_without_a_code() {
        let session = ScanSession::new(BlankCamera::new(8, 8), OneShotDecoder(None), fast_config());
        let result = ScanDriver::new(session).run(Duration::from_millis(30), |_| {});
        assert!(result.is_none());
    }

    #[test]
    fn test_closed_flag_ends_the_run() {
        let flag = OpenFlag::new();
        flag.close();

        let session = ScanSession::new(BlankCamera::new(8, 8), OneShotDecoder(None), fast_config());
        let mut idled = false;
        let result = ScanDriver::new(session)
            .with_open_flag(flag)
            .run(Duration::from_secs(5), |event| {
                if matches!(event, SessionEvent::StateChanged(ScanState::Idle)) {
                    idled = true;
                }
            });

        assert!(result.is_none());
        assert!(idled);
    }
}
