//! Error diffusion dithering.
//!
//! [`ErrorDiffusionEngine`] reduces every color channel to `N` evenly
//! spaced levels, in place, while pushing each pixel's quantization error
//! onto its not-yet-visited neighbors through an [`ErrorKernel`].
//!
//! # Algorithm
//!
//! Pixels are visited in raster order (left to right, top to bottom). For
//! each pixel and each of the three color channels:
//!
//! 1. Pick the nearest [`QuantizationLevels`] value (ties to the lower level)
//! 2. Write it back immediately, so later pixels read quantized neighbors
//! 3. Compute `error = current - quantized`
//! 4. For every causal kernel cell, update the neighbor to
//!    `clamp(round(neighbor + error * weight / divisor), 0, 255)`
//!
//! The clamp happens at every accumulation, not once at the end. Neighbors
//! outside the image are skipped: unlike [`ConvolutionEngine`](crate::ConvolutionEngine),
//! error never wraps around to the opposite edge.

mod kernel;
mod levels;

pub use kernel::ErrorKernel;
pub use levels::QuantizationLevels;

use crate::buffer::{PixelBuffer, COLOR_CHANNELS};
use crate::error::{FilterError, Result};

/// Named error diffusion kernels.
///
/// # Example
///
/// ```
/// use rasterfx_core::DiffusionAlgorithm;
///
/// let kernel = DiffusionAlgorithm::Atkinson.kernel();
/// assert_eq!(kernel.divisor(), 8.0);
/// assert_eq!("floyd-steinberg".parse::<DiffusionAlgorithm>().unwrap(), DiffusionAlgorithm::FloydSteinberg);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffusionAlgorithm {
    /// Classic 4-neighbor kernel, 100% propagation.
    #[default]
    FloydSteinberg,
    /// 2-row kernel, 100% propagation.
    Burkes,
    /// 3-row kernel with strong center weights, 100% propagation.
    Stucky,
    /// 3-row kernel, 100% propagation.
    Sierra,
    /// 6-neighbor kernel, 75% propagation.
    Atkinson,
}

impl DiffusionAlgorithm {
    pub const ALL: [DiffusionAlgorithm; 5] = [
        DiffusionAlgorithm::FloydSteinberg,
        DiffusionAlgorithm::Burkes,
        DiffusionAlgorithm::Stucky,
        DiffusionAlgorithm::Sierra,
        DiffusionAlgorithm::Atkinson,
    ];

    pub fn kernel(self) -> ErrorKernel {
        match self {
            DiffusionAlgorithm::FloydSteinberg => ErrorKernel::floyd_steinberg(),
            DiffusionAlgorithm::Burkes => ErrorKernel::burkes(),
            DiffusionAlgorithm::Stucky => ErrorKernel::stucky(),
            DiffusionAlgorithm::Sierra => ErrorKernel::sierra(),
            DiffusionAlgorithm::Atkinson => ErrorKernel::atkinson(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiffusionAlgorithm::FloydSteinberg => "floyd-steinberg",
            DiffusionAlgorithm::Burkes => "burkes",
            DiffusionAlgorithm::Stucky => "stucky",
            DiffusionAlgorithm::Sierra => "sierra",
            DiffusionAlgorithm::Atkinson => "atkinson",
        }
    }
}

impl std::str::FromStr for DiffusionAlgorithm {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        DiffusionAlgorithm::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| FilterError::invalid("algorithm", format!("unknown kernel `{s}`")))
    }
}

/// Applies error diffusion dithering in place.
///
/// # Example
///
/// ```
/// use rasterfx_core::{ChannelOrder, ErrorDiffusionEngine, ErrorKernel, PixelBuffer};
///
/// let mut image = PixelBuffer::from_pixels(3, 1, ChannelOrder::Bgr, &[[100; 3]; 3]).unwrap();
/// ErrorDiffusionEngine::new(ErrorKernel::floyd_steinberg(), 2)
///     .apply(&mut image)
///     .unwrap();
///
/// assert_eq!(image.pixel(0, 0), [0, 0, 0]);
/// assert_eq!(image.pixel(1, 0), [255, 255, 255]);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorDiffusionEngine {
    kernel: ErrorKernel,
    level_count: usize,
}

impl ErrorDiffusionEngine {
    pub fn new(kernel: ErrorKernel, level_count: usize) -> Self {
        Self {
            kernel,
            level_count,
        }
    }

    #[inline]
    pub fn kernel(&self) -> &ErrorKernel {
        &self.kernel
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Dither `buffer` in place.
    ///
    /// No rollback: callers that need to revert must keep a copy.
    ///
    /// # Errors
    ///
    /// - [`FilterError::NullBuffer`] if `buffer` holds no pixels
    /// - [`FilterError::InvalidParameter`] if the level count is below 2
    ///   or the kernel divisor is zero
    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<()> {
        buffer.ensure_present()?;
        let levels = QuantizationLevels::new(self.level_count)?;
        let divisor = self.kernel.divisor();
        if divisor == 0.0 {
            return Err(FilterError::invalid("divisor", "must not be zero"));
        }

        let entries = self.kernel.entries();
        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            levels = self.level_count,
            neighbors = entries.len(),
            "diffusing error"
        );

        let mut image = buffer.lock_mut();
        let width = image.width() as i64;
        let height = image.height() as i64;

        for y in 0..height {
            for x in 0..width {
                for c in 0..COLOR_CHANNELS {
                    let idx = image.index(x as usize, y as usize, c);
                    let current = image.as_bytes()[idx];
                    let quantized = levels.nearest(current);
                    image.as_bytes_mut()[idx] = quantized;

                    let error = current as f32 - quantized as f32;
                    if error == 0.0 {
                        continue;
                    }

                    for &(dx, dy, weight) in &entries {
                        let nx = x + dx as i64;
                        let ny = y + dy as i64;
                        if nx < 0 || nx >= width || ny >= height {
                            continue;
                        }
                        let n_idx = image.index(nx as usize, ny as usize, c);
                        let bytes = image.as_bytes_mut();
                        let value = bytes[n_idx] as f32 + error * weight / divisor;
                        bytes[n_idx] = value.round().clamp(0.0, 255.0) as u8;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Dither in place with a named kernel.
pub fn diffuse(
    buffer: &mut PixelBuffer,
    algorithm: DiffusionAlgorithm,
    level_count: usize,
) -> Result<()> {
    ErrorDiffusionEngine::new(algorithm.kernel(), level_count).apply(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ChannelOrder;
    use pretty_assertions::assert_eq;

    fn gray_image(width: usize, height: usize, value: u8) -> PixelBuffer {
        PixelBuffer::from_pixels(width, height, ChannelOrder::Bgr, &vec![[value; 3]; width * height])
            .unwrap()
    }

    fn channel_values(buffer: &PixelBuffer, c: usize) -> Vec<u8> {
        (0..buffer.height())
            .flat_map(|y| (0..buffer.width()).map(move |x| (x, y)))
            .map(|(x, y)| buffer.channel(x, y, c))
            .collect()
    }

    #[test]
    fn test_single_row_floyd_steinberg() {
        let mut image = gray_image(3, 1, 100);
        diffuse(&mut image, DiffusionAlgorithm::FloydSteinberg, 2).unwrap();
        // pixel0: 100 -> 0, error 100, 7/16 * 100 = 43.75 -> pixel1 = 144
        // pixel1: 144 -> 255, error -111, -48.56 -> pixel2 = 51
        // pixel2: 51 -> 0
        assert_eq!(channel_values(&image, 0), vec![0, 255, 0]);
        assert_eq!(channel_values(&image, 1), vec![0, 255, 0]);
        assert_eq!(channel_values(&image, 2), vec![0, 255, 0]);
    }

    #[test]
    fn test_error_reaches_next_row() {
        let pixels = [[30, 30, 30], [0, 0, 0], [20, 20, 20], [0, 0, 0]];
        let mut image = PixelBuffer::from_pixels(2, 2, ChannelOrder::Bgr, &pixels).unwrap();
        let kernel = ErrorKernel::from_rows(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 16.0, 0.0]])
            .unwrap()
            .with_divisor(16.0);
        ErrorDiffusionEngine::new(kernel, 5).apply(&mut image).unwrap();
        // 30 -> 0 pushes +30 straight down: 20 + 30 = 50 -> 64
        assert_eq!(image.pixel(0, 0), [0, 0, 0]);
        assert_eq!(image.pixel(0, 1), [64, 64, 64]);
    }

    #[test]
    fn test_negative_error_clamps_at_zero() {
        let pixels = [[40, 40, 40], [0, 0, 0], [0, 0, 0], [0, 0, 0]];
        let mut image = PixelBuffer::from_pixels(2, 2, ChannelOrder::Bgr, &pixels).unwrap();
        let kernel = ErrorKernel::from_rows(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .unwrap();
        ErrorDiffusionEngine::new(kernel, 5).apply(&mut image).unwrap();
        // 40 -> 64, error -24 -> below 0 clamps to 0
        assert_eq!(image.pixel(0, 0), [64, 64, 64]);
        assert_eq!(image.pixel(0, 1), [0, 0, 0]);
    }

    #[test]
    fn test_two_levels_produce_only_extremes() {
        for algorithm in DiffusionAlgorithm::ALL {
            let mut image = PixelBuffer::new(16, 9, 3, ChannelOrder::Rgb).unwrap();
            for y in 0..9 {
                for x in 0..16 {
                    image.set_pixel(x, y, [(x * 16) as u8, (y * 28) as u8, 128]);
                }
            }
            diffuse(&mut image, algorithm, 2).unwrap();
            assert!(
                image.as_bytes().iter().all(|&b| b == 0 || b == 255),
                "{} produced an intermediate value",
                algorithm.name()
            );
        }
    }

    #[test]
    fn test_output_values_are_levels() {
        let levels = QuantizationLevels::new(4).unwrap();
        let mut image = PixelBuffer::new(10, 10, 3, ChannelOrder::Bgr).unwrap();
        for y in 0..10 {
            for x in 0..10 {
                let v = (x * 25 + y) as u8;
                image.set_pixel(x, y, [v, 255 - v, v / 2]);
            }
        }
        diffuse(&mut image, DiffusionAlgorithm::Sierra, 4).unwrap();
        assert!(image.as_bytes().iter().all(|b| levels.levels().contains(b)));
    }

    #[test]
    fn test_mid_gray_mixes_black_and_white() {
        let mut image = gray_image(16, 16, 128);
        diffuse(&mut image, DiffusionAlgorithm::FloydSteinberg, 2).unwrap();
        let white = channel_values(&image, 0).iter().filter(|&&v| v == 255).count();
        let ratio = white as f32 / 256.0;
        assert!((ratio - 0.5).abs() < 0.15, "white ratio {ratio}");
    }

    #[test]
    fn test_exact_levels_are_untouched() {
        let mut image = gray_image(5, 5, 170);
        diffuse(&mut image, DiffusionAlgorithm::Burkes, 4).unwrap();
        assert!(image.as_bytes().iter().all(|&b| b == 170));
    }

    #[test]
    fn test_huge_level_count_keeps_every_value() {
        let pixels: Vec<[u8; 3]> = (0..12u8).map(|i| [i * 21, 255 - i * 7, i]).collect();
        let mut image = PixelBuffer::from_pixels(4, 3, ChannelOrder::Bgr, &pixels).unwrap();
        let before = image.clone();
        diffuse(&mut image, DiffusionAlgorithm::Stucky, usize::MAX).unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn test_no_wraparound_at_edges() {
        // Error pushed right from the last column must not land on the next row.
        let pixels = [[0, 0, 0], [0, 0, 0], [50, 50, 50], [40, 40, 40], [0, 0, 0], [0, 0, 0]];
        let mut image = PixelBuffer::from_pixels(3, 2, ChannelOrder::Bgr, &pixels).unwrap();
        let kernel = ErrorKernel::from_rows(&[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]])
            .unwrap();
        ErrorDiffusionEngine::new(kernel, 3).apply(&mut image).unwrap();
        // 50 -> 0 leaves +50 with nowhere to go; 40 alone quantizes to 0
        assert_eq!(channel_values(&image, 0), vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_alpha_and_padding_untouched() {
        let mut image = PixelBuffer::with_alignment(3, 2, 4, ChannelOrder::Rgb, 16).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                image.set_pixel(x, y, [100, 150, 200]);
                image.set_channel(x, y, 3, 77);
            }
        }
        image.as_bytes_mut()[12] = 5; // first padding byte of row 0
        diffuse(&mut image, DiffusionAlgorithm::Atkinson, 2).unwrap();
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(image.channel(x, y, 3), 77);
            }
        }
        assert_eq!(image.as_bytes()[12], 5);
        assert!(!image.is_locked());
    }

    #[test]
    fn test_rejects_single_level() {
        let mut image = gray_image(2, 2, 10);
        let before = image.clone();
        let err = diffuse(&mut image, DiffusionAlgorithm::FloydSteinberg, 1).unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameter { name: "levels", .. }));
        assert_eq!(image, before);
    }

    #[test]
    fn test_rejects_zero_divisor() {
        let mut image = gray_image(2, 2, 10);
        let kernel = ErrorKernel::floyd_steinberg().with_divisor(0.0);
        let err = ErrorDiffusionEngine::new(kernel, 2).apply(&mut image).unwrap_err();
        assert!(matches!(err, FilterError::InvalidParameter { name: "divisor", .. }));
    }

    #[test]
    fn test_rejects_empty_buffer() {
        let mut image = PixelBuffer::new(4, 0, 3, ChannelOrder::Bgr).unwrap();
        assert_eq!(
            diffuse(&mut image, DiffusionAlgorithm::Atkinson, 2).unwrap_err(),
            FilterError::NullBuffer
        );
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "Floyd_Steinberg".parse::<DiffusionAlgorithm>().unwrap(),
            DiffusionAlgorithm::FloydSteinberg
        );
        assert_eq!("stucky".parse::<DiffusionAlgorithm>().unwrap(), DiffusionAlgorithm::Stucky);
        assert!("jjn".parse::<DiffusionAlgorithm>().is_err());
    }
}
