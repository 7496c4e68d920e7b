//! Packed, row-padded pixel storage.
//!
//! [`PixelBuffer`] owns a contiguous byte buffer laid out row-major with an
//! explicit stride, the way image decoders and DIB sections hand pixels out.
//! Every byte address goes through one formula:
//!
//! ```text
//! index(x, y, c) = y * stride + x * bytes_per_pixel + c
//! ```
//!
//! Engines take a scoped lock on the buffer for the duration of a call via
//! [`PixelBuffer::lock`] / [`PixelBuffer::lock_mut`]. The guard releases the
//! lock when dropped, so early returns and unwinding panics both leave the
//! buffer unlocked.

use std::cell::Cell;
use std::ops::{Deref, DerefMut};

use crate::error::{FilterError, Result};

/// Byte order of the three color channels inside a pixel.
///
/// Engines work on channel indices `0..3` and never look at the order. It
/// only matters when a pixel is read or written as an RGB triple, which the
/// [`ColorQuantizer`](crate::ColorQuantizer) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Blue, green, red (Windows DIB layout)
    #[default]
    Bgr,
    /// Red, green, blue (PNG layout)
    Rgb,
}

impl ChannelOrder {
    /// Byte offsets of red, green and blue within a pixel.
    #[inline]
    pub const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        }
    }
}

/// Number of color channels every engine processes.
pub const COLOR_CHANNELS: usize = 3;

/// Row-major pixel storage with stride and channel order.
///
/// Pixels are 3 bytes (color only) or 4 bytes (color plus alpha). The alpha
/// byte is carried along but never modified by an engine. Rows may be padded
/// past `width * bytes_per_pixel`; padding bytes are preserved as-is.
///
/// # Example
///
/// ```
/// use rasterfx_core::{ChannelOrder, PixelBuffer};
///
/// let mut buffer = PixelBuffer::with_alignment(3, 2, 3, ChannelOrder::Rgb, 4).unwrap();
/// assert_eq!(buffer.stride(), 12); // 9 bytes of pixels, padded to 12
///
/// buffer.set_pixel(2, 1, [10, 20, 30]);
/// assert_eq!(buffer.pixel(2, 1), [10, 20, 30]);
/// assert_eq!(buffer.index(2, 1, 0), 12 + 2 * 3);
/// ```
#[derive(Debug)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
    order: ChannelOrder,
    data: Vec<u8>,
    locked: Cell<bool>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer without row padding.
    pub fn new(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        order: ChannelOrder,
    ) -> Result<Self> {
        Self::with_alignment(width, height, bytes_per_pixel, order, 1)
    }

    /// Create a zero-filled buffer whose stride is rounded up to `alignment` bytes.
    pub fn with_alignment(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        order: ChannelOrder,
        alignment: usize,
    ) -> Result<Self> {
        if alignment == 0 {
            return Err(FilterError::invalid("alignment", "must be at least 1"));
        }
        let row_bytes = width * bytes_per_pixel;
        let stride = row_bytes.div_ceil(alignment) * alignment;
        Self::from_raw(
            width,
            height,
            stride,
            bytes_per_pixel,
            order,
            vec![0; stride * height],
        )
    }

    /// Wrap existing pixel memory.
    ///
    /// Validates `bytes_per_pixel` (3 or 4), `stride >= width * bytes_per_pixel`
    /// and `data.len() >= stride * height`.
    pub fn from_raw(
        width: usize,
        height: usize,
        stride: usize,
        bytes_per_pixel: usize,
        order: ChannelOrder,
        data: Vec<u8>,
    ) -> Result<Self> {
        if bytes_per_pixel != 3 && bytes_per_pixel != 4 {
            return Err(FilterError::invalid(
                "bytes_per_pixel",
                format!("expected 3 or 4, got {bytes_per_pixel}"),
            ));
        }
        if stride < width * bytes_per_pixel {
            return Err(FilterError::invalid(
                "stride",
                format!(
                    "{stride} is smaller than {width} pixels * {bytes_per_pixel} bytes"
                ),
            ));
        }
        if data.len() < stride * height {
            return Err(FilterError::invalid(
                "data",
                format!(
                    "{} bytes cannot hold {height} rows of stride {stride}",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            stride,
            bytes_per_pixel,
            order,
            data,
            locked: Cell::new(false),
        })
    }

    /// Build an unpadded 3-channel buffer from pixel triples in row-major order.
    ///
    /// Each triple is stored as-is in channel index order, so its meaning
    /// follows `order`.
    pub fn from_pixels(
        width: usize,
        height: usize,
        order: ChannelOrder,
        pixels: &[[u8; 3]],
    ) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(FilterError::invalid(
                "pixels",
                format!("expected {} pixels, got {}", width * height, pixels.len()),
            ));
        }
        let data = pixels.iter().flatten().copied().collect();
        Self::from_raw(width, height, width * 3, 3, order, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row, including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    #[inline]
    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.bytes_per_pixel == 4
    }

    /// True when there is nothing to process.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// True while an engine holds a lock guard on this buffer.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Raw storage, padding included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw storage, padding included.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Byte index of channel `c` of pixel `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, c: usize) -> usize {
        debug_assert!(x < self.width && y < self.height && c < self.bytes_per_pixel);
        y * self.stride + x * self.bytes_per_pixel + c
    }

    /// Bounds-checked channel read.
    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<u8> {
        if x < self.width && y < self.height && c < self.bytes_per_pixel {
            Some(self.data[self.index(x, y, c)])
        } else {
            None
        }
    }

    /// Channel read; panics when `(x, y, c)` is out of range.
    #[inline]
    pub fn channel(&self, x: usize, y: usize, c: usize) -> u8 {
        assert!(
            x < self.width && y < self.height && c < self.bytes_per_pixel,
            "pixel ({x}, {y}) channel {c} out of range for {}x{}x{}",
            self.width,
            self.height,
            self.bytes_per_pixel
        );
        self.data[self.index(x, y, c)]
    }

    /// Channel write; panics when `(x, y, c)` is out of range.
    #[inline]
    pub fn set_channel(&mut self, x: usize, y: usize, c: usize, value: u8) {
        assert!(
            x < self.width && y < self.height && c < self.bytes_per_pixel,
            "pixel ({x}, {y}) channel {c} out of range for {}x{}x{}",
            self.width,
            self.height,
            self.bytes_per_pixel
        );
        let idx = self.index(x, y, c);
        self.data[idx] = value;
    }

    /// The three color channels of a pixel, in storage order.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let row = self.row(y);
        let start = x * self.bytes_per_pixel;
        [row[start], row[start + 1], row[start + 2]]
    }

    /// Overwrite the three color channels of a pixel, in storage order.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, value: [u8; 3]) {
        let bpp = self.bytes_per_pixel;
        let row = self.row_mut(y);
        row[x * bpp..x * bpp + 3].copy_from_slice(&value);
    }

    /// A pixel as `[r, g, b]`, regardless of storage order.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let p = self.pixel(x, y);
        let [r, g, b] = self.order.rgb_offsets();
        [p[r], p[g], p[b]]
    }

    /// Write a pixel given as `[r, g, b]`, regardless of storage order.
    #[inline]
    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let [r, g, b] = self.order.rgb_offsets();
        let mut p = [0u8; 3];
        p[r] = rgb[0];
        p[g] = rgb[1];
        p[b] = rgb[2];
        self.set_pixel(x, y, p);
    }

    /// Pixel bytes of row `y`, without padding.
    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row {y} out of range for height {}", self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width * self.bytes_per_pixel]
    }

    /// Mutable pixel bytes of row `y`, without padding.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of range for height {}", self.height);
        let start = y * self.stride;
        let len = self.width * self.bytes_per_pixel;
        &mut self.data[start..start + len]
    }

    /// Iterate over rows, padding excluded.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Fail with [`FilterError::NullBuffer`] when there is nothing to process.
    pub(crate) fn ensure_present(&self) -> Result<()> {
        if self.is_empty() {
            Err(FilterError::NullBuffer)
        } else {
            Ok(())
        }
    }

    /// Take a shared lock for the duration of a read-only engine call.
    pub fn lock(&self) -> PixelLock<'_> {
        debug_assert!(!self.locked.get(), "buffer is already locked");
        self.locked.set(true);
        tracing::trace!(width = self.width, height = self.height, "buffer locked");
        PixelLock { buffer: self }
    }

    /// Take an exclusive lock for the duration of an in-place engine call.
    pub fn lock_mut(&mut self) -> PixelLockMut<'_> {
        debug_assert!(!self.locked.get(), "buffer is already locked");
        self.locked.set(true);
        tracing::trace!(width = self.width, height = self.height, "buffer locked");
        PixelLockMut { buffer: self }
    }
}

impl Clone for PixelBuffer {
    /// Clones are always unlocked, even when taken inside an engine call.
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            bytes_per_pixel: self.bytes_per_pixel,
            order: self.order,
            data: self.data.clone(),
            locked: Cell::new(false),
        }
    }
}

impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.stride == other.stride
            && self.bytes_per_pixel == other.bytes_per_pixel
            && self.order == other.order
            && self.data == other.data
    }
}

impl Eq for PixelBuffer {}

/// Shared lock guard returned by [`PixelBuffer::lock`].
#[derive(Debug)]
pub struct PixelLock<'a> {
    buffer: &'a PixelBuffer,
}

impl Deref for PixelLock<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        self.buffer
    }
}

impl Drop for PixelLock<'_> {
    fn drop(&mut self) {
        self.buffer.locked.set(false);
        tracing::trace!("buffer released");
    }
}

/// Exclusive lock guard returned by [`PixelBuffer::lock_mut`].
#[derive(Debug)]
pub struct PixelLockMut<'a> {
    buffer: &'a mut PixelBuffer,
}

impl Deref for PixelLockMut<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        self.buffer
    }
}

impl DerefMut for PixelLockMut<'_> {
    fn deref_mut(&mut self) -> &mut PixelBuffer {
        self.buffer
    }
}

impl Drop for PixelLockMut<'_> {
    fn drop(&mut self) {
        self.buffer.locked.set(false);
        tracing::trace!("buffer released");
    }
}
