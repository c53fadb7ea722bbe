//! Camera capability boundary
//!
//! The session never talks to a device directly. A host hands it a
//! [`CameraAccess`] implementation; acquisition completes through a
//! [`PendingAcquire`] handle so slow permission prompts and device opens
//! never block a tick. Streams release their device when dropped, which
//! makes double release unrepresentable and lets a cancelled acquisition
//! clean up at the completion site.

pub mod sources;

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;
use tracing::{debug, warn};

use crate::frame::PixelBuffer;

/// Which way the requested camera should face.
///
/// Scanning UIs nearly always want the rear camera, so that is the
/// default preference. Sources without a physical facing treat this as
/// a hint and may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear (environment-facing) camera.
    #[default]
    Rear,
    /// Front (user-facing) camera.
    Front,
    /// No preference.
    Any,
}

/// Constraints passed to [`CameraAccess::request_stream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Preferred camera facing.
    pub facing: FacingMode,
    /// Preferred resolution. A hint, not a demand: sources deliver their
    /// closest supported mode and report the actual size via
    /// [`CameraStream::resolution`].
    pub ideal_resolution: Option<(u32, u32)>,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Rear,
            ideal_resolution: Some((1280, 720)),
        }
    }
}

/// Errors surfaced by camera sources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user or platform refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No usable device, or the device could not be opened.
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// An open stream stopped delivering frames.
    #[error("camera stream lost: {0}")]
    StreamLost(String),
}

/// Whether a sample produced a frame.
///
/// Capture pipelines need a warm-up period before the first full frame;
/// a `NotReady` tick is normal, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReadiness {
    /// The source has no complete frame buffered yet.
    NotReady,
    /// A frame was copied into the buffer.
    Ready,
}

/// An open camera stream.
///
/// Dropping the stream releases the underlying device. Implementations
/// put their teardown in `Drop` rather than exposing a close method.
pub trait CameraStream {
    /// Native resolution of delivered frames, in pixels.
    fn resolution(&self) -> (u32, u32);

    /// Copy the current frame into `buf` without blocking.
    ///
    /// Resizes `buf` to the native resolution on success. Returns
    /// [`FrameReadiness::NotReady`] while the pipeline is still warming
    /// up, and an error only when the stream is beyond recovery.
    fn sample_into(&mut self, buf: &mut PixelBuffer) -> Result<FrameReadiness, CameraError>;
}

/// Entry point for acquiring camera streams.
pub trait CameraAccess {
    /// The stream type this source produces.
    type Stream: CameraStream;

    /// Begin an asynchronous stream request.
    ///
    /// Must not block. The outcome is delivered through the returned
    /// handle, possibly before this call returns for sources that can
    /// open synchronously.
    fn request_stream(&mut self, constraints: &StreamConstraints) -> PendingAcquire<Self::Stream>;
}

/// Receiving half of an in-flight acquisition.
///
/// The session polls this once per tick while acquiring. Dropping it
/// cancels the request: a completion that arrives afterwards fails to
/// send and the stream is released on the spot.
#[derive(Debug)]
pub struct PendingAcquire<S> {
    rx: Receiver<Result<S, CameraError>>,
}

/// Sending half of an in-flight acquisition, held by the camera backend.
#[derive(Debug)]
pub struct AcquireDone<S> {
    tx: Sender<Result<S, CameraError>>,
}

impl<S> PendingAcquire<S> {
    /// Create a linked completion pair. The backend keeps the
    /// [`AcquireDone`] and resolves it whenever the device open finishes.
    pub fn channel() -> (AcquireDone<S>, PendingAcquire<S>) {
        let (tx, rx) = mpsc::channel();
        (AcquireDone { tx }, PendingAcquire { rx })
    }

    /// An already-successful acquisition, for sources that open inline.
    pub fn ready(stream: S) -> Self {
        let (done, pending) = Self::channel();
        done.complete(Ok(stream));
        pending
    }

    /// An already-failed acquisition.
    pub fn failed(err: CameraError) -> Self {
        let (done, pending) = Self::channel();
        done.complete(Err(err));
        pending
    }

    /// Take the outcome if it has arrived.
    ///
    /// Returns `None` while the request is still in flight. A backend
    /// that drops its [`AcquireDone`] without resolving counts as an
    /// unavailable device.
    pub fn try_take(&mut self) -> Option<Result<S, CameraError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CameraError::Unavailable(
                "acquisition abandoned by camera backend".into(),
            ))),
        }
    }
}

impl<S> AcquireDone<S> {
    /// Resolve the acquisition.
    ///
    /// If the requesting side has already given up, a delivered stream is
    /// dropped here, releasing its device immediately.
    pub fn complete(self, outcome: Result<S, CameraError>) {
        if let Err(unsent) = self.tx.send(outcome) {
            match unsent.0 {
                Ok(_stream) => {
                    warn!("camera stream arrived after cancellation; releasing it");
                }
                Err(err) => {
                    debug!(error = %err, "camera failure arrived after cancellation");
                }
            }
        }
    }
}
