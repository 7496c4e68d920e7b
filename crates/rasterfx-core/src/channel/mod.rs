//! Per-channel functional filters.
//!
//! A functional filter maps every selected channel byte through a pure
//! `u8 -> u8` function. [`ChannelFilterEngine`] tabulates the function into
//! a [`ChannelLut`] first, so the function runs 256 times regardless of the
//! image size.
//!
//! The predefined functions are plain `fn`s so they compose with closures:
//!
//! ```
//! use rasterfx_core::channel::{brightness, invert};
//! use rasterfx_core::{ChannelFilterEngine, ChannelOrder, ChannelSelector, PixelBuffer};
//!
//! let mut image = PixelBuffer::from_pixels(1, 1, ChannelOrder::Rgb, &[[10, 20, 30]]).unwrap();
//! ChannelFilterEngine::apply(&mut image, |v| invert(brightness(v, 5)), ChannelSelector::All).unwrap();
//! assert_eq!(image.pixel(0, 0), [240, 230, 220]);
//! ```

mod lut;

pub use lut::ChannelLut;

use crate::buffer::{PixelBuffer, COLOR_CHANNELS};
use crate::error::{FilterError, Result};

/// Which color channels a functional filter touches.
///
/// Channels are storage indices, so `Channel0` is blue in a
/// [`Bgr`](crate::ChannelOrder::Bgr) buffer and red in an `Rgb` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelSelector {
    #[default]
    All,
    Channel0,
    Channel1,
    Channel2,
}

impl ChannelSelector {
    /// Storage indices covered by the selector.
    pub fn channels(self) -> &'static [usize] {
        match self {
            ChannelSelector::All => &[0, 1, 2],
            ChannelSelector::Channel0 => &[0],
            ChannelSelector::Channel1 => &[1],
            ChannelSelector::Channel2 => &[2],
        }
    }
}

impl std::str::FromStr for ChannelSelector {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ChannelSelector::All),
            "0" => Ok(ChannelSelector::Channel0),
            "1" => Ok(ChannelSelector::Channel1),
            "2" => Ok(ChannelSelector::Channel2),
            other => Err(FilterError::invalid(
                "channel",
                format!("expected all, 0, 1 or 2, got `{other}`"),
            )),
        }
    }
}

/// `255 - v`.
#[inline]
pub fn invert(value: u8) -> u8 {
    255 - value
}

/// `v + delta`, saturated to `0..=255`.
#[inline]
pub fn brightness(value: u8, delta: i16) -> u8 {
    (value as i32 + delta as i32).clamp(0, 255) as u8
}

/// Stretch values away from mid-gray by `percent`.
///
/// The factor is `((percent + 100) / 100)^2`; values are normalized to
/// `0..=1`, scaled around 0.5, clamped and truncated.
#[inline]
pub fn contrast(value: u8, percent: f32) -> u8 {
    let mut factor = (percent + 100.0) / 100.0;
    factor *= factor;
    let normalized = value as f32 / 255.0;
    let stretched = ((normalized - 0.5) * factor + 0.5) * 255.0;
    stretched.clamp(0.0, 255.0) as u8
}

/// `c * (v / 255)^gamma * 255`, clamped and truncated.
#[inline]
pub fn gamma(value: u8, gamma: f32, c: f32) -> u8 {
    let base = (value as f32 / 255.0) as f64;
    let corrected = c as f64 * base.powf(gamma as f64) * 255.0;
    corrected.clamp(0.0, 255.0) as u8
}

/// The predefined functional filters as data.
///
/// Used where a filter has to be named in configuration rather than
/// passed as a closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelFunction {
    Invert,
    Brightness(i16),
    /// Contrast change in percent; negative values flatten.
    Contrast(f32),
    Gamma {
        gamma: f32,
        c: f32,
    },
}

impl ChannelFunction {
    /// Gamma correction with the usual `c = 1`.
    pub fn gamma(gamma: f32) -> Self {
        ChannelFunction::Gamma { gamma, c: 1.0 }
    }

    #[inline]
    pub fn apply(self, value: u8) -> u8 {
        match self {
            ChannelFunction::Invert => invert(value),
            ChannelFunction::Brightness(delta) => brightness(value, delta),
            ChannelFunction::Contrast(percent) => contrast(value, percent),
            ChannelFunction::Gamma { gamma: g, c } => gamma(value, g, c),
        }
    }

    pub fn lut(self) -> ChannelLut {
        ChannelLut::build(|v| self.apply(v))
    }

    pub fn name(self) -> &'static str {
        match self {
            ChannelFunction::Invert => "invert",
            ChannelFunction::Brightness(_) => "brightness",
            ChannelFunction::Contrast(_) => "contrast",
            ChannelFunction::Gamma { .. } => "gamma",
        }
    }

    fn validate(self) -> Result<()> {
        match self {
            ChannelFunction::Contrast(percent) if !percent.is_finite() => {
                Err(FilterError::invalid("contrast", "must be a finite number"))
            }
            ChannelFunction::Gamma { gamma, c } if !gamma.is_finite() || !c.is_finite() => {
                Err(FilterError::invalid("gamma", "must be a finite number"))
            }
            _ => Ok(()),
        }
    }
}

/// Applies functional filters in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelFilterEngine;

impl ChannelFilterEngine {
    /// Map the channels picked by `selector` through `function`, in place.
    ///
    /// Alpha bytes and row padding are never touched.
    pub fn apply(
        buffer: &mut PixelBuffer,
        function: impl Fn(u8) -> u8,
        selector: ChannelSelector,
    ) -> Result<()> {
        buffer.ensure_present()?;
        Self::apply_lut(buffer, &ChannelLut::build(function), selector)
    }

    /// Apply one of the predefined functions.
    pub fn apply_function(
        buffer: &mut PixelBuffer,
        function: ChannelFunction,
        selector: ChannelSelector,
    ) -> Result<()> {
        buffer.ensure_present()?;
        function.validate()?;
        tracing::debug!(filter = function.name(), ?selector, "functional filter");
        Self::apply_lut(buffer, &function.lut(), selector)
    }

    /// Map the selected channels through a prebuilt table.
    pub fn apply_lut(
        buffer: &mut PixelBuffer,
        lut: &ChannelLut,
        selector: ChannelSelector,
    ) -> Result<()> {
        buffer.ensure_present()?;
        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            ?selector,
            "mapping channels"
        );

        let channels = selector.channels();
        let mut image = buffer.lock_mut();
        let bpp = image.bytes_per_pixel();
        let width = image.width();
        for y in 0..image.height() {
            let row = image.row_mut(y);
            for pixel in row[..width * bpp].chunks_exact_mut(bpp) {
                for &c in channels {
                    debug_assert!(c < COLOR_CHANNELS);
                    pixel[c] = lut.get(pixel[c]);
                }
            }
        }
        Ok(())
    }
}
