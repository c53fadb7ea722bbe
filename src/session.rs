//! Scan session state machine
//!
//! [`ScanSession`] owns one camera scan attempt from the host pressing
//! "scan" to the device being released. It is a synchronous state
//! machine pumped by [`tick`](ScanSession::tick): camera acquisition
//! completes through a [`PendingAcquire`] polled on ticks, frames are
//! sampled and decoded on ticks, and the found-result linger is measured
//! against the timestamp passed into ticks. Nothing here blocks, spawns,
//! or reads a clock, which keeps every lifecycle path replayable in
//! tests. [`ScanDriver`](crate::driver::ScanDriver) adds the wall-clock
//! loop on top.

use std::collections::VecDeque;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::camera::{CameraAccess, CameraError, CameraStream, FrameReadiness, PendingAcquire};
use crate::config::ScanConfig;
use crate::decode::FrameDecoder;
use crate::frame::PixelBuffer;

/// Sampled frames between "still scanning" progress logs.
const PROGRESS_LOG_EVERY: u64 = 30;

/// Lifecycle phase of a [`ScanSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No scan in progress, no device held.
    #[default]
    Idle,
    /// Waiting for the camera backend to deliver a stream.
    Acquiring,
    /// Stream open, sampling and decoding frames.
    Scanning,
    /// A payload was decoded; the result lingers before auto-close.
    Found,
    /// Tearing down. Transient inside `stop`, never observed on ticks.
    Stopping,
}

impl ScanState {
    /// True for states that hold or are waiting on a camera.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Acquiring | Self::Scanning | Self::Found)
    }
}

/// Errors surfaced to the host through [`SessionEvent::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Camera access was refused. Retriable once the user changes the
    /// permission.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No usable camera device.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// The stream died mid-scan; the session has shut itself down.
    #[error("camera stream lost: {0}")]
    StreamLost(String),
    /// A frame failed to decode. Diagnostic only, the scan continues.
    #[error("frame decode fault: {0}")]
    DecodeFault(String),
}

impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => Self::PermissionDenied,
            CameraError::Unavailable(msg) => Self::DeviceUnavailable(msg),
            CameraError::StreamLost(msg) => Self::StreamLost(msg),
        }
    }
}

/// A successfully decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    /// Decoded text content of the code.
    pub payload: String,
    /// Tick timestamp at which the decode happened.
    pub at: Instant,
}

/// Notifications queued for the host, drained with
/// [`ScanSession::poll_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session moved to a new state.
    StateChanged(ScanState),
    /// A payload was decoded. Emitted at most once per scan cycle, and
    /// always before the device release that ends the cycle.
    ResultReady(ScanResult),
    /// An error occurred. Fatal ones are followed by a transition to
    /// `Idle`; decode faults are not.
    Error(ScanError),
}

/// One camera scan attempt, from `start` to device release.
///
/// The session owns its camera source and decoder for its whole life.
/// `start` and `stop` are safe to call in any state; repeated or
/// out-of-order calls degrade to logged no-ops rather than errors.
/// Dropping an active session runs the same teardown as `stop`.
pub struct ScanSession<A: CameraAccess, D: FrameDecoder> {
    camera: A,
    decoder: D,
    config: ScanConfig,
    state: ScanState,
    pending: Option<PendingAcquire<A::Stream>>,
    stream: Option<A::Stream>,
    frame_buf: PixelBuffer,
    events: VecDeque<SessionEvent>,
    last_result: Option<ScanResult>,
    found_at: Option<Instant>,
    frames_sampled: u64,
    decode_faults: u64,
}

impl<A: CameraAccess, D: FrameDecoder> ScanSession<A, D> {
    /// Create an idle session around a camera source and a decoder.
    pub fn new(camera: A, decoder: D, config: ScanConfig) -> Self {
        Self {
            camera,
            decoder,
            config,
            state: ScanState::Idle,
            pending: None,
            stream: None,
            frame_buf: PixelBuffer::new(),
            events: VecDeque::new(),
            last_result: None,
            found_at: None,
            frames_sampled: 0,
            decode_faults: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// The configuration this session was built with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Result of the current cycle, if one was decoded. Cleared by the
    /// next `start`.
    pub fn last_result(&self) -> Option<&ScanResult> {
        self.last_result.as_ref()
    }

    /// Frames actually handed to the decoder this cycle. Ticks where the
    /// source had no frame ready do not count.
    pub fn frames_sampled(&self) -> u64 {
        self.frames_sampled
    }

    /// Decode faults suppressed this cycle.
    pub fn decode_faults(&self) -> u64 {
        self.decode_faults
    }

    /// Take the next queued event, if any.
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Begin a scan cycle.
    ///
    /// Resets per-cycle state and requests a camera stream. Ignored with
    /// a log when a cycle is already underway.
    pub fn start(&mut self) {
        if self.state != ScanState::Idle {
            debug!(state = ?self.state, "start ignored, session not idle");
            return;
        }
        self.last_result = None;
        self.found_at = None;
        self.frames_sampled = 0;
        self.decode_faults = 0;

        self.enter(ScanState::Acquiring);
        self.pending = Some(self.camera.request_stream(&self.config.constraints));
    }

    /// End the current cycle and release the camera.
    ///
    /// Safe in every state: idle sessions ignore it, an in-flight
    /// acquisition is cancelled, an open stream is dropped. The session
    /// ends in `Idle`, ready for another `start`.
    pub fn stop(&mut self) {
        if self.state == ScanState::Idle {
            debug!("stop ignored, session already idle");
            return;
        }
        self.enter(ScanState::Stopping);

        if let Some(mut pending) = self.pending.take() {
            match pending.try_take() {
                Some(Ok(stream)) => {
                    warn!("acquisition completed during stop; releasing unused stream");
                    drop(stream);
                }
                Some(Err(err)) => {
                    debug!(error = %err, "acquisition had already failed at stop");
                }
                None => {
                    debug!("cancelling in-flight camera acquisition");
                }
            }
        }
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!(frames = self.frames_sampled, "camera stream released");
        }
        self.found_at = None;
        self.enter(ScanState::Idle);
    }

    /// Advance the session one step at the given timestamp.
    ///
    /// Polls the pending acquisition while `Acquiring`, samples and
    /// decodes one frame while `Scanning`, and checks the linger
    /// deadline while `Found`. Does nothing in `Idle`.
    pub fn tick(&mut self, now: Instant) {
        match self.state {
            ScanState::Idle => trace!("tick in idle ignored"),
            ScanState::Acquiring => self.tick_acquiring(),
            ScanState::Scanning => self.tick_scanning(now),
            ScanState::Found => self.tick_found(now),
            // stop() never returns while in Stopping.
            ScanState::Stopping => trace!("tick during teardown ignored"),
        }
    }

    fn tick_acquiring(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            error!("acquiring with no pending request; resetting");
            self.enter(ScanState::Idle);
            return;
        };
        match pending.try_take() {
            None => trace!("camera acquisition still pending"),
            Some(Ok(stream)) => {
                self.pending = None;
                let (width, height) = stream.resolution();
                self.frame_buf.resize_for(width, height);
                self.stream = Some(stream);
                info!(width, height, "camera stream ready");
                self.enter(ScanState::Scanning);
            }
            Some(Err(err)) => {
                self.pending = None;
                error!(error = %err, "camera acquisition failed");
                self.push_error(err.into());
                self.enter(ScanState::Idle);
            }
        }
    }

    fn tick_scanning(&mut self, now: Instant) {
        let Some(stream) = self.stream.as_mut() else {
            error!("scanning with no stream; resetting");
            self.enter(ScanState::Idle);
            return;
        };
        match stream.sample_into(&mut self.frame_buf) {
            Ok(FrameReadiness::NotReady) => {
                trace!("no frame ready, skipping tick");
            }
            Ok(FrameReadiness::Ready) => {
                self.frames_sampled += 1;
                match self.decoder.decode(self.frame_buf.as_frame()) {
                    Ok(None) => {
                        if self.frames_sampled % PROGRESS_LOG_EVERY == 0 {
                            debug!(frames = self.frames_sampled, "still scanning");
                        }
                    }
                    Ok(Some(payload)) => {
                        self.finish_scan(payload, now);
                    }
                    Err(fault) => {
                        self.decode_faults += 1;
                        warn!(
                            error = %fault,
                            frame = self.frames_sampled,
                            "decode fault, continuing scan"
                        );
                        self.events
                            .push_back(SessionEvent::Error(ScanError::DecodeFault(
                                fault.to_string(),
                            )));
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "camera stream failed mid-scan");
                self.push_error(err.into());
                self.stop();
            }
        }
    }

    fn tick_found(&mut self, now: Instant) {
        let Some(found_at) = self.found_at else {
            error!("found with no timestamp; stopping");
            self.stop();
            return;
        };
        if now.duration_since(found_at) >= self.config.found_linger {
            debug!("found result linger elapsed, closing session");
            self.stop();
        }
    }

    fn finish_scan(&mut self, payload: String, now: Instant) {
        let result = ScanResult { payload, at: now };
        info!(
            payload_len = result.payload.len(),
            frames = self.frames_sampled,
            "scan succeeded"
        );
        self.last_result = Some(result.clone());
        self.found_at = Some(now);
        self.enter(ScanState::Found);
        self.events.push_back(SessionEvent::ResultReady(result));
    }

    fn enter(&mut self, state: ScanState) {
        debug!(from = ?self.state, to = ?state, "scan state changed");
        self.state = state;
        self.events.push_back(SessionEvent::StateChanged(state));
    }

    fn push_error(&mut self, err: ScanError) {
        self.events.push_back(SessionEvent::Error(err));
    }
}

impl<A: CameraAccess, D: FrameDecoder> Drop for ScanSession<A, D> {
    /// A dropped session tears down exactly like `stop`.
    fn drop(&mut self) {
        if self.state != ScanState::Idle {
            debug!(state = ?self.state, "session dropped while active");
            self.stop();
        }
    }
}
