//! qrscan - camera-based QR scan sessions
//!
//! A [`ScanSession`] owns one scan attempt end to end: asynchronous
//! camera acquisition, frame sampling, decoding, and guaranteed device
//! release, modeled as a synchronous state machine pumped by `tick`.
//! Camera sources and decoders plug in through the [`CameraAccess`] and
//! [`FrameDecoder`] traits; [`QrFrameDecoder`] is the production QR
//! decoder and [`ScanDriver`] a ready-made blocking loop.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Camera capability traits, acquisition handles and built-in sources
pub mod camera;
/// Session configuration and its environment overrides
pub mod config;
/// Frame decoding trait and the production QR decoder
pub mod decode;
/// Blocking drive loop and the host open flag
pub mod driver;
/// Frame views and reusable pixel storage
pub mod frame;
/// RGBA to luminance conversion
pub mod luma;
/// The scan session state machine
pub mod session;

pub use camera::{
    AcquireDone, CameraAccess, CameraError, CameraStream, FacingMode, FrameReadiness,
    PendingAcquire, StreamConstraints,
};
pub use config::ScanConfig;
pub use decode::{DecodeFault, FrameDecoder, QrFrameDecoder};
pub use driver::{OpenFlag, ScanDriver};
pub use frame::{Frame, PixelBuffer};
pub use session::{ScanError, ScanResult, ScanSession, ScanState, SessionEvent};

use std::path::Path;
use std::time::Duration;

/// Scan a still image file through the full session path.
///
/// Loads the image, runs a session over it with the production decoder,
/// and returns the decoded result if one was found before `timeout`.
/// The found result does not linger; the session closes as soon as the
/// code is read.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use qrscan::ScanConfig;
///
/// let found = qrscan::scan_still("ticket.png", ScanConfig::default(), Duration::from_secs(2))?;
/// if let Some(result) = found {
///     println!("{}", result.payload);
/// }
/// # Ok::<(), qrscan::CameraError>(())
/// ```
pub fn scan_still(
    path: impl AsRef<Path>,
    config: ScanConfig,
    timeout: Duration,
) -> Result<Option<ScanResult>, CameraError> {
    let camera = camera::sources::StillCamera::from_path(path)?;
    let session = ScanSession::new(
        camera,
        QrFrameDecoder::new(),
        config.with_found_linger(Duration::ZERO),
    );
    Ok(ScanDriver::new(session).run(timeout, |_| {}))
}
