//! Spatial convolution.
//!
//! [`ConvolutionEngine`] applies a [`Kernel`] to every pixel of a
//! [`PixelBuffer`] and returns a new buffer. Samples are always read from
//! the untouched input, so a pass never sees its own output.
//!
//! For output pixel `(x, y)` and kernel cell `(i, j)` the sampled source
//! pixel is `(x + j - anchor_col, y + i - anchor_row)`. Samples that fall
//! outside the image are resolved by the [`EdgePolicy`]:
//!
//! ```text
//!   Wrap (default)     Clamp              Skip
//!   x = -1  ->  w-1    x = -1  ->  0      x = -1  ->  no contribution
//!   x =  w  ->  0      x =  w  ->  w-1    x =  w  ->  no contribution
//! ```
//!
//! Each color channel accumulates `sum(weight * sample)` in `f64` and is
//! written as `clamp(offset + sum / divisor, 0, 255)` truncated to `u8`.

use crate::buffer::{PixelBuffer, COLOR_CHANNELS};
use crate::error::{FilterError, Result};
use crate::kernel::Kernel;

/// Distance from an integer below which a result counts as that integer.
const SNAP_EPSILON: f64 = 1e-4;

/// How samples outside the image are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Coordinates wrap toroidally (`coord mod dimension`).
    #[default]
    Wrap,
    /// Coordinates are clamped to the nearest edge pixel.
    Clamp,
    /// Out-of-range samples contribute nothing; the divisor is unchanged.
    Skip,
}

impl EdgePolicy {
    /// Map a possibly out-of-range coordinate into `0..len`.
    #[inline]
    pub fn resolve(self, coord: isize, len: usize) -> Option<usize> {
        let len = len as isize;
        match self {
            EdgePolicy::Wrap => Some(coord.rem_euclid(len) as usize),
            EdgePolicy::Clamp => Some(coord.clamp(0, len - 1) as usize),
            EdgePolicy::Skip => (0..len).contains(&coord).then_some(coord as usize),
        }
    }
}

/// Where the kernel offset is added relative to the division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetOrder {
    /// `offset + sum / divisor`
    #[default]
    AfterDivision,
    /// `(offset + sum) / divisor`
    BeforeDivision,
}

/// Configuration for [`ConvolutionEngine`].
///
/// # Defaults
///
/// - Edge policy: [`EdgePolicy::Wrap`]
/// - Offset order: [`OffsetOrder::AfterDivision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvolutionOptions {
    pub edge_policy: EdgePolicy,
    pub offset_order: OffsetOrder,
}

impl ConvolutionOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    #[inline]
    pub fn offset_order(mut self, order: OffsetOrder) -> Self {
        self.offset_order = order;
        self
    }
}

/// One non-zero kernel cell, expressed as a displacement from the output pixel.
#[derive(Debug, Clone, Copy)]
struct Tap {
    dx: isize,
    dy: isize,
    weight: f64,
}

/// Applies a convolution kernel to a pixel buffer.
///
/// # Example
///
/// ```
/// use rasterfx_core::{ChannelOrder, ConvolutionEngine, EdgePolicy, Kernel, PixelBuffer};
///
/// let image = PixelBuffer::from_pixels(2, 1, ChannelOrder::Rgb, &[[0, 0, 0], [90, 90, 90]]).unwrap();
/// let blurred = ConvolutionEngine::new(Kernel::blur())
///     .edge_policy(EdgePolicy::Wrap)
///     .apply(&image)
///     .unwrap();
///
/// // On a 2x1 torus pixel 0 has the bright pixel on both sides:
/// // 6 * 90 / 9 = 60. Pixel 1 sees itself 3 times: 3 * 90 / 9 = 30.
/// assert_eq!(blurred.pixel(0, 0), [60, 60, 60]);
/// assert_eq!(blurred.pixel(1, 0), [30, 30, 30]);
/// assert_eq!(image.pixel(1, 0), [90, 90, 90]); // input untouched
/// ```
#[derive(Debug, Clone)]
pub struct ConvolutionEngine {
    kernel: Kernel,
    options: ConvolutionOptions,
}

impl ConvolutionEngine {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            options: ConvolutionOptions::default(),
        }
    }

    #[inline]
    pub fn options(mut self, options: ConvolutionOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.options = self.options.edge_policy(policy);
        self
    }

    #[inline]
    pub fn offset_order(mut self, order: OffsetOrder) -> Self {
        self.options = self.options.offset_order(order);
        self
    }

    #[inline]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Convolve `buffer` into a freshly allocated buffer of the same layout.
    ///
    /// Alpha bytes and row padding are copied from the input unchanged.
    ///
    /// # Errors
    ///
    /// - [`FilterError::NullBuffer`] if `buffer` holds no pixels
    /// - [`FilterError::InvalidParameter`] if the kernel divisor is zero
    pub fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        buffer.ensure_present()?;
        let kernel = &self.kernel;
        if kernel.divisor() == 0.0 {
            return Err(FilterError::invalid("divisor", "must not be zero"));
        }

        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            kernel = %format_args!("{}x{}", kernel.size_y(), kernel.size_x()),
            edge_policy = ?self.options.edge_policy,
            offset_order = ?self.options.offset_order,
            "convolving"
        );

        let source = buffer.lock();
        let mut output = source.clone();

        let taps = self.taps();
        let width = source.width();
        let height = source.height();
        let bpp = source.bytes_per_pixel();
        let edge = self.options.edge_policy;
        let src = source.as_bytes();

        for y in 0..height {
            let out_row = output.row_mut(y);
            for x in 0..width {
                let mut sums = [0.0f64; COLOR_CHANNELS];
                for tap in &taps {
                    let Some(sx) = edge.resolve(x as isize + tap.dx, width) else {
                        continue;
                    };
                    let Some(sy) = edge.resolve(y as isize + tap.dy, height) else {
                        continue;
                    };
                    let base = source.index(sx, sy, 0);
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum += tap.weight * f64::from(src[base + c]);
                    }
                }
                for (c, sum) in sums.into_iter().enumerate() {
                    out_row[x * bpp + c] = self.finish(sum);
                }
            }
        }

        Ok(output)
    }

    /// Non-zero cells in row-major order, the order the sums accumulate in.
    fn taps(&self) -> Vec<Tap> {
        let kernel = &self.kernel;
        let (anchor_row, anchor_col) = kernel.anchor();
        let mut taps = Vec::with_capacity(kernel.weights().len());
        for i in 0..kernel.size_y() {
            for j in 0..kernel.size_x() {
                let weight = kernel.weight(i, j);
                if weight != 0.0 {
                    taps.push(Tap {
                        dx: j as isize - anchor_col as isize,
                        dy: i as isize - anchor_row as isize,
                        weight: f64::from(weight),
                    });
                }
            }
        }
        taps
    }

    /// Divide, offset, clamp and truncate one channel sum.
    ///
    /// Results within [`SNAP_EPSILON`] of an integer are taken as that
    /// integer: normalized f32 weights sum to 1 only up to rounding.
    #[inline]
    fn finish(&self, sum: f64) -> u8 {
        let divisor = f64::from(self.kernel.divisor());
        let offset = f64::from(self.kernel.offset());
        let value = match self.options.offset_order {
            OffsetOrder::AfterDivision => offset + sum / divisor,
            OffsetOrder::BeforeDivision => (offset + sum) / divisor,
        };
        let nearest = value.round();
        let value = if (value - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            value
        };
        value.clamp(0.0, 255.0) as u8
    }
}

/// Convolve with the default options (wraparound edges, offset after division).
pub fn convolve(buffer: &PixelBuffer, kernel: &Kernel) -> Result<PixelBuffer> {
    ConvolutionEngine::new(kernel.clone()).apply(buffer)
}
