//! Test images and configs.

use rasterfx_core::{ChannelOrder, PixelBuffer};

/// Solid RGB image
pub fn solid(width: usize, height: usize, rgb: [u8; 3]) -> PixelBuffer {
    PixelBuffer::from_pixels(width, height, ChannelOrder::Rgb, &vec![rgb; width * height])
        .expect("valid fixture")
}

/// Horizontal gray ramp from 0 to 255
pub fn gray_ramp(width: usize, height: usize) -> PixelBuffer {
    let mut pixels = Vec::with_capacity(width * height);
    for _ in 0..height {
        for x in 0..width {
            let v = (x * 255 / (width - 1).max(1)) as u8;
            pixels.push([v, v, v]);
        }
    }
    PixelBuffer::from_pixels(width, height, ChannelOrder::Rgb, &pixels).expect("valid fixture")
}

/// RGBA image with a constant alpha of `alpha`
pub fn with_alpha(width: usize, height: usize, rgb: [u8; 3], alpha: u8) -> PixelBuffer {
    let mut buffer =
        PixelBuffer::with_alignment(width, height, 4, ChannelOrder::Rgb, 4).expect("valid fixture");
    for y in 0..height {
        for x in 0..width {
            buffer.set_rgb(x, y, rgb);
            buffer.set_channel(x, y, 3, alpha);
        }
    }
    buffer
}

/// Config with one custom kernel and a few pipelines
pub const CONFIG: &str = r#"
defaults:
  levels: 2
  colors: 4

kernels:
  halve-plus-ten:
    weights:
      - [0, 0, 0]
      - [0, 2, 0]
      - [0, 0, 0]
    divisor: 4
    offset: 10

pipelines:
  custom:
    - op: convolve
      kernel: halve-plus-ten
  negative:
    - op: filter
      function: invert
  red-only:
    - op: filter
      function: invert
      channel: 0
  print:
    - op: filter
      function: gamma
      value: 2.2
    - op: dither
      kernel: stucky
"#;
