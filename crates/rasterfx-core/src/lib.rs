#![allow(clippy::module_inception, clippy::needless_range_loop)]

//! rasterfx-core: raster filters over 24/32-bit pixel buffers
//!
//! The crate holds the image-processing engines behind the `rasterfx`
//! command line tool. Every engine works on a [`PixelBuffer`]: a strided,
//! byte-addressed image with 3 or 4 bytes per pixel in either
//! [`ChannelOrder::Bgr`] or [`ChannelOrder::Rgb`] layout.
//!
//! # Engines
//!
//! - [`ConvolutionEngine`]: weighted neighborhood sums with a [`Kernel`],
//!   writing to a fresh buffer
//! - [`ErrorDiffusionEngine`]: in-place reduction to N levels per channel,
//!   spreading quantization error through an [`ErrorKernel`]
//! - [`ColorQuantizer`]: popularity palettes and nearest-color remapping
//! - [`ChannelFilterEngine`]: in-place `u8 -> u8` functions per channel
//!
//! ```
//! use rasterfx_core::{
//!     convolve, diffuse, ChannelFilterEngine, ChannelFunction, ChannelOrder,
//!     ChannelSelector, DiffusionAlgorithm, Kernel, PixelBuffer,
//! };
//!
//! let mut image = PixelBuffer::new(8, 8, 3, ChannelOrder::Bgr).unwrap();
//! image.set_pixel(3, 3, [255, 255, 255]);
//!
//! let mut blurred = convolve(&image, &Kernel::blur()).unwrap();
//! ChannelFilterEngine::apply_function(&mut blurred, ChannelFunction::gamma(0.9), ChannelSelector::All)
//!     .unwrap();
//! diffuse(&mut blurred, DiffusionAlgorithm::FloydSteinberg, 2).unwrap();
//!
//! assert!(blurred.as_bytes().iter().all(|&b| b == 0 || b == 255));
//! ```
//!
//! # Channels
//!
//! Engines address channels by storage index: channel 0 is blue in a `Bgr`
//! buffer and red in an `Rgb` one. Only [`ColorQuantizer`] and [`Palette`]
//! reinterpret bytes as RGB colors. A fourth (alpha) byte and row padding
//! are never modified.
//!
//! # Errors
//!
//! All engines validate before writing. A [`FilterError`] means nothing was
//! changed; a success from an in-place engine means the whole buffer was
//! processed.

pub mod buffer;
pub mod channel;
pub mod convolution;
pub mod dither;
pub mod error;
pub mod kernel;
pub mod palette;

#[cfg(test)]
mod domain_tests;

pub use buffer::{ChannelOrder, PixelBuffer, PixelLock, PixelLockMut};
pub use channel::{ChannelFilterEngine, ChannelFunction, ChannelLut, ChannelSelector};
pub use convolution::{convolve, ConvolutionEngine, ConvolutionOptions, EdgePolicy, OffsetOrder};
pub use dither::{diffuse, DiffusionAlgorithm, ErrorDiffusionEngine, ErrorKernel, QuantizationLevels};
pub use error::{FilterError, Result};
pub use kernel::Kernel;
pub use palette::{ColorQuantizer, Palette, PaletteError, ParseColorError, Rgb};
