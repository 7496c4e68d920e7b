//! Palette types and popularity quantization
//!
//! [`Palette`] is an ordered set of distinct [`Rgb`] colors. Palettes come
//! either from explicit colors (hex strings on the command line) or from
//! [`ColorQuantizer::build_palette`], which keeps the most frequent colors of
//! an image.

mod error;
mod palette;
mod quantizer;

pub use error::{PaletteError, ParseColorError};
pub use palette::{Palette, Rgb};
pub use quantizer::ColorQuantizer;
