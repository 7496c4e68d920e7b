//! PNG reading and writing.
//!
//! Decoded images are `Rgb`-ordered [`PixelBuffer`]s with rows padded to
//! 4 bytes. Palette and low-bit-depth images are expanded, 16-bit samples
//! are stripped to 8 bits and grayscale is widened to RGB. An alpha channel
//! survives as the fourth byte of each pixel.

use crate::error::AppError;
use rasterfx_core::{ChannelOrder, PixelBuffer};
use std::io::Cursor;
use std::path::Path;

/// Row alignment of decoded buffers, in bytes.
pub const ROW_ALIGNMENT: usize = 4;

/// Decode PNG bytes into a pixel buffer.
pub fn decode_png(bytes: &[u8]) -> Result<PixelBuffer, AppError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut raw = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut raw)?;

    if info.bit_depth != png::BitDepth::Eight {
        return Err(AppError::UnsupportedFormat(format!(
            "{:?} samples after expansion",
            info.bit_depth
        )));
    }

    let (source_channels, bpp) = match info.color_type {
        png::ColorType::Grayscale => (1, 3),
        png::ColorType::GrayscaleAlpha => (2, 4),
        png::ColorType::Rgb => (3, 3),
        png::ColorType::Rgba => (4, 4),
        other => {
            return Err(AppError::UnsupportedFormat(format!(
                "{other:?} color was not expanded"
            )))
        }
    };

    let width = info.width as usize;
    let height = info.height as usize;
    let mut buffer =
        PixelBuffer::with_alignment(width, height, bpp, ChannelOrder::Rgb, ROW_ALIGNMENT)?;

    for (y, line) in raw.chunks(info.line_size).take(height).enumerate() {
        let row = buffer.row_mut(y);
        for (src, dst) in line
            .chunks_exact(source_channels)
            .zip(row.chunks_exact_mut(bpp))
        {
            match source_channels {
                1 => dst.copy_from_slice(&[src[0]; 3]),
                2 => dst.copy_from_slice(&[src[0], src[0], src[0], src[1]]),
                _ => dst.copy_from_slice(src),
            }
        }
    }

    tracing::debug!(
        width,
        height,
        color_type = ?info.color_type,
        bytes_per_pixel = bpp,
        "decoded png"
    );
    Ok(buffer)
}

/// Read and decode a PNG file.
pub fn read_png(path: &Path) -> Result<PixelBuffer, AppError> {
    let bytes = std::fs::read(path)?;
    decode_png(&bytes)
}

/// Encode a pixel buffer as 8-bit RGB, or RGBA when it carries alpha.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, AppError> {
    let width = u32::try_from(buffer.width())
        .map_err(|_| AppError::UnsupportedFormat(format!("width {}", buffer.width())))?;
    let height = u32::try_from(buffer.height())
        .map_err(|_| AppError::UnsupportedFormat(format!("height {}", buffer.height())))?;

    let alpha = buffer.has_alpha();
    let channels = if alpha { 4 } else { 3 };
    let mut packed = Vec::with_capacity(buffer.width() * buffer.height() * channels);
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            packed.extend_from_slice(&buffer.rgb(x, y));
            if alpha {
                packed.push(buffer.channel(x, y, 3));
            }
        }
    }

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(if alpha {
            png::ColorType::Rgba
        } else {
            png::ColorType::Rgb
        });
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&packed)?;
    }
    Ok(buf.into_inner())
}

/// Encode and write a PNG file.
pub fn write_png(path: &Path, buffer: &PixelBuffer) -> Result<(), AppError> {
    let bytes = encode_png(buffer)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote png");
    Ok(())
}
