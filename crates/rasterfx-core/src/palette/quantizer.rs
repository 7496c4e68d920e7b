//! Popularity color quantization.

use std::collections::HashMap;

use super::palette::{Palette, Rgb};
use crate::buffer::PixelBuffer;
use crate::error::{FilterError, Result};

/// Builds popularity palettes and remaps images onto them.
///
/// The palette holds the `size` most frequent exact colors, most frequent
/// first. Colors with equal counts keep the order in which a raster scan
/// first meets them.
///
/// # Example
///
/// ```
/// use rasterfx_core::{ChannelOrder, ColorQuantizer, PixelBuffer, Rgb};
///
/// let pixels = [[10, 10, 10], [200, 0, 0], [200, 0, 0], [12, 10, 10]];
/// let image = PixelBuffer::from_pixels(2, 2, ChannelOrder::Rgb, &pixels).unwrap();
///
/// let palette = ColorQuantizer::build_palette(&image, 2).unwrap();
/// assert_eq!(palette.colors(), &[Rgb::new(200, 0, 0), Rgb::new(10, 10, 10)]);
///
/// let reduced = ColorQuantizer::remap(&image, &palette).unwrap();
/// assert_eq!(reduced.rgb(1, 1), [10, 10, 10]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorQuantizer;

impl ColorQuantizer {
    /// Count exact colors and keep the `size` most frequent ones.
    ///
    /// When the image has fewer distinct colors than `size`, the palette
    /// holds all of them.
    ///
    /// # Errors
    ///
    /// [`FilterError::NullBuffer`] for an empty buffer and
    /// [`FilterError::InvalidParameter`] when `size` is zero.
    pub fn build_palette(buffer: &PixelBuffer, size: usize) -> Result<Palette> {
        buffer.ensure_present()?;
        if size == 0 {
            return Err(FilterError::invalid("palette_size", "must be at least 1"));
        }

        let image = buffer.lock();
        // color -> (count, first seen)
        let mut histogram: HashMap<Rgb, (u64, usize)> = HashMap::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                let order = histogram.len();
                histogram
                    .entry(Rgb::from_array(image.rgb(x, y)))
                    .or_insert((0, order))
                    .0 += 1;
            }
        }

        let distinct = histogram.len();
        let mut ranked: Vec<(Rgb, u64, usize)> = histogram
            .into_iter()
            .map(|(color, (count, first))| (color, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(size);

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            distinct,
            requested = size,
            kept = ranked.len(),
            "built popularity palette"
        );

        Ok(Palette::from_distinct(
            ranked.into_iter().map(|(color, _, _)| color).collect(),
        ))
    }

    /// Replace every pixel with its nearest palette color.
    ///
    /// Writes into a fresh buffer with the same geometry and channel order;
    /// alpha bytes are carried over.
    pub fn remap(buffer: &PixelBuffer, palette: &Palette) -> Result<PixelBuffer> {
        buffer.ensure_present()?;
        if palette.is_empty() {
            return Err(FilterError::invalid("palette", "palette cannot be empty"));
        }

        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            colors = palette.len(),
            "remapping to palette"
        );

        let image = buffer.lock();
        let mut output = image.clone();
        let mut cache: HashMap<Rgb, Rgb> = HashMap::new();
        for y in 0..image.height() {
            for x in 0..image.width() {
                let color = Rgb::from_array(image.rgb(x, y));
                let mapped = *cache
                    .entry(color)
                    .or_insert_with(|| palette.nearest(color));
                output.set_rgb(x, y, mapped.to_array());
            }
        }
        Ok(output)
    }

    /// Build a palette of `size` colors from `buffer` and remap onto it.
    pub fn quantize(buffer: &PixelBuffer, size: usize) -> Result<PixelBuffer> {
        let palette = Self::build_palette(buffer, size)?;
        Self::remap(buffer, &palette)
    }
}
