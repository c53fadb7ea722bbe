//! Frame decoding
//!
//! [`FrameDecoder`] is the seam between the scan loop and the QR
//! symbology. The production implementation, [`QrFrameDecoder`], converts
//! each frame to luminance and runs the `rqrr` detector over it.

use thiserror::Error;
use tracing::{debug, trace};

use crate::frame::Frame;
use crate::luma;

/// A non-fatal decode failure.
///
/// Faults mean malformed content: a grid was detected but failed error
/// correction or parsing. A frame with no code in it is not a fault, it
/// is a clean `Ok(None)`. The scan loop records faults and keeps
/// sampling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("frame decode fault: {message}")]
pub struct DecodeFault {
    message: String,
}

impl DecodeFault {
    /// A fault with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Decodes scan payloads out of RGBA frames.
///
/// Implementations must be deterministic: identical pixels produce the
/// identical outcome, with no hidden clock or randomness. The `&mut
/// self` receiver exists for scratch buffer reuse, not for observable
/// state.
pub trait FrameDecoder {
    /// Attempt to decode one frame.
    ///
    /// `Ok(Some(payload))` for the first code found, `Ok(None)` when the
    /// frame contains no code, `Err` when content was present but could
    /// not be decoded.
    fn decode(&mut self, frame: Frame<'_>) -> Result<Option<String>, DecodeFault>;
}

/// Production decoder backed by `rqrr`.
///
/// Keeps a luminance scratch buffer reused across frames, so a steady
/// stream of same-size frames does not allocate per tick.
#[derive(Debug, Default)]
pub struct QrFrameDecoder {
    luma: Vec<u8>,
}

impl QrFrameDecoder {
    /// New decoder with an empty scratch buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDecoder for QrFrameDecoder {
    fn decode(&mut self, frame: Frame<'_>) -> Result<Option<String>, DecodeFault> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        if width == 0 || height == 0 {
            return Ok(None);
        }

        luma::rgba_to_luma_into(frame.pixels(), width, height, &mut self.luma);

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            self.luma[y * width + x]
        });
        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Ok(None);
        }
        trace!(grids = grids.len(), "candidate grids detected");

        // First grid that survives error correction wins; detection order
        // is deterministic for identical input.
        let mut fault = DecodeFault::new("undecodable grid");
        for grid in &grids {
            match grid.decode() {
                Ok((meta, content)) => {
                    debug!(
                        version = meta.version.0,
                        ecc_level = meta.ecc_level,
                        "grid decoded"
                    );
                    return Ok(Some(content));
                }
                Err(e) => {
                    fault = DecodeFault::new(e.to_string());
                }
            }
        }
        Err(fault)
    }
}
