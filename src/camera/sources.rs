//! Built-in camera sources
//!
//! Real deployments implement [`CameraAccess`] over a platform capture
//! API. These sources cover the rest: [`StillCamera`] pushes one image
//! through the full session path, which is what the `scan_image` tool
//! and the regression tests use, and [`BlankCamera`] drives benches and
//! soak runs with synthetic frames that never decode.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::camera::{
    CameraAccess, CameraError, CameraStream, FrameReadiness, PendingAcquire, StreamConstraints,
};
use crate::frame::PixelBuffer;

/// A camera that serves one still image as an endless stream.
#[derive(Debug, Clone)]
pub struct StillCamera {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
    warmup: u32,
}

impl StillCamera {
    /// Load a still source from an image file.
    ///
    /// Any format the `image` crate can read is accepted; pixels are
    /// converted to RGBA.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| CameraError::Unavailable(format!("{}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        debug!(path = %path.display(), width, height, "loaded still image source");
        Ok(Self::from_rgba(width, height, img.into_raw()))
    }

    /// Build a still source from raw RGBA pixels.
    ///
    /// # Panics
    ///
    /// Panics when `rgba.len() != width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        assert_eq!(
            rgba.len(),
            width as usize * height as usize * 4,
            "RGBA buffer size mismatch"
        );
        Self {
            width,
            height,
            rgba: rgba.into(),
            warmup: 0,
        }
    }

    /// Report `NotReady` for the first `ticks` samples of each stream,
    /// like a real pipeline warming up.
    pub fn with_warmup(mut self, ticks: u32) -> Self {
        self.warmup = ticks;
        self
    }
}

impl CameraAccess for StillCamera {
    type Stream = StillStream;

    fn request_stream(&mut self, constraints: &StreamConstraints) -> PendingAcquire<Self::Stream> {
        debug!(facing = ?constraints.facing, "still camera opening inline");
        PendingAcquire::ready(StillStream {
            width: self.width,
            height: self.height,
            rgba: Arc::clone(&self.rgba),
            warmup_left: self.warmup,
        })
    }
}

/// Stream handle produced by [`StillCamera`].
#[derive(Debug)]
pub struct StillStream {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
    warmup_left: u32,
}

impl CameraStream for StillStream {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn sample_into(&mut self, buf: &mut PixelBuffer) -> Result<FrameReadiness, CameraError> {
        if self.warmup_left > 0 {
            self.warmup_left -= 1;
            return Ok(FrameReadiness::NotReady);
        }
        buf.copy_from(self.width, self.height, &self.rgba);
        Ok(FrameReadiness::Ready)
    }
}

/// A camera that delivers black frames forever. Nothing ever decodes.
#[derive(Debug, Clone, Copy)]
pub struct BlankCamera {
    width: u32,
    height: u32,
}

impl BlankCamera {
    /// A blank source at the given resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl CameraAccess for BlankCamera {
    type Stream = BlankStream;

    fn request_stream(&mut self, _constraints: &StreamConstraints) -> PendingAcquire<Self::Stream> {
        PendingAcquire::ready(BlankStream {
            width: self.width,
            height: self.height,
        })
    }
}

/// Stream handle produced by [`BlankCamera`].
#[derive(Debug)]
pub struct BlankStream {
    width: u32,
    height: u32,
}

impl CameraStream for BlankStream {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn sample_into(&mut self, buf: &mut PixelBuffer) -> Result<FrameReadiness, CameraError> {
        buf.resize_for(self.width, self.height);
        buf.pixels_mut().fill(0);
        Ok(FrameReadiness::Ready)
    }
}
