//! Frame views and the reusable pixel storage behind them
//!
//! Capture sources copy each sampled frame into a session-owned
//! [`PixelBuffer`], and decoders receive a borrowed [`Frame`] view of it.
//! The buffer grows to the largest resolution seen and is reused across
//! ticks, so steady-state scanning does not allocate.

/// A borrowed view of one video frame in tightly packed RGBA order.
///
/// The layout is row-major, 4 bytes per pixel (`R, G, B, A`), no padding
/// between rows. Alpha is carried but ignored by decoding.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap a raw RGBA buffer.
    ///
    /// # Panics
    ///
    /// Panics when `pixels.len() != width * height * 4`. A mismatched
    /// buffer at the capture boundary is a programming error, not a
    /// recoverable condition.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        let expected = width as usize * height as usize * 4;
        assert_eq!(
            pixels.len(),
            expected,
            "RGBA buffer is {} bytes, expected {} for {}x{}",
            pixels.len(),
            expected,
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The raw RGBA bytes, length `width * height * 4`.
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }
}

/// Reusable RGBA frame storage.
///
/// Holds the most recent sampled frame. Resizing for a new resolution
/// keeps the underlying allocation when it is already large enough.
#[derive(Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create an empty 0x0 buffer. No allocation until the first frame.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    /// Create a zeroed buffer sized for the given resolution.
    pub fn with_resolution(width: u32, height: u32) -> Self {
        let mut buf = Self::new();
        buf.resize_for(width, height);
        buf
    }

    /// Resize for a new resolution, zero-filling any newly exposed bytes.
    ///
    /// Capacity only grows. Shrinking the logical size keeps the old
    /// allocation so the next larger frame reuses it.
    pub fn resize_for(&mut self, width: u32, height: u32) {
        let len = width as usize * height as usize * 4;
        self.data.resize(len, 0);
        self.width = width;
        self.height = height;
    }

    /// Replace the contents with a full frame copied from `rgba`.
    ///
    /// # Panics
    ///
    /// Panics when `rgba.len() != width * height * 4`.
    pub fn copy_from(&mut self, width: u32, height: u32, rgba: &[u8]) {
        let expected = width as usize * height as usize * 4;
        assert_eq!(rgba.len(), expected, "source buffer size mismatch");
        self.resize_for(width, height);
        self.data.copy_from_slice(rgba);
    }

    /// `(width, height)` of the stored frame.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Byte capacity of the underlying allocation.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// True when no frame has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Mutable access to the stored bytes, for sources that write in place.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Borrow the stored frame as a [`Frame`] view.
    pub fn as_frame(&self) -> Frame<'_> {
        Frame::new(self.width, self.height, &self.data)
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_accessors() {
        let pixels = vec![0u8; 2 * 3 * 4];
        let frame = Frame::new(2, 3, &pixels);
        assert_eq!(frame.dimensions(), (2, 3));
        assert_eq!(frame.pixel_count(), 6);
        assert_eq!(frame.pixels().len(), 24);
    }

    #[test]
    #[should_panic(expected = "RGBA buffer")]
    fn test_frame_rejects_mismatched_buffer() {
        let pixels = vec![0u8; 10];
        let _ = Frame::new(2, 2, &pixels);
    }

    #[test]
    fn test_buffer_grows_and_reuses() {
        let mut buf = PixelBuffer::new();
        assert!(buf.is_empty());

        buf.resize_for(4, 4);
        assert_eq!(buf.dimensions(), (4, 4));
        let cap_after_grow = buf.capacity();
        assert!(cap_after_grow >= 4 * 4 * 4);

        // Shrinking keeps the allocation
        buf.resize_for(2, 2);
        assert_eq!(buf.dimensions(), (2, 2));
        assert_eq!(buf.capacity(), cap_after_grow);
        assert_eq!(buf.as_frame().pixels().len(), 2 * 2 * 4);
    }

    #[test]
    fn test_copy_from_replaces_contents() {
        let mut buf = PixelBuffer::with_resolution(1, 1);
        let src = vec![1, 2, 3, 4, 5, 6, 7, 8];
        buf.copy_from(2, 1, &src);
        assert_eq!(buf.dimensions(), (2, 1));
        assert_eq!(buf.as_frame().pixels(), &src[..]);
    }

    #[test]
    #[should_panic(expected = "size mismatch")]
    fn test_copy_from_rejects_short_source() {
        let mut buf = PixelBuffer::new();
        buf.copy_from(2, 2, &[0u8; 3]);
    }
}
