//! Domain-critical regression tests for rasterfx-core.
//!
//! These tests are designed to catch specific classes of bugs, not just
//! confirm happy paths. Each test documents the regression it guards against.

#[cfg(test)]
mod domain_tests {
    use crate::buffer::{ChannelOrder, PixelBuffer};
    use crate::channel::{invert, ChannelFilterEngine, ChannelFunction, ChannelSelector};
    use crate::convolution::{convolve, ConvolutionEngine, EdgePolicy, OffsetOrder};
    use crate::dither::{diffuse, DiffusionAlgorithm, ErrorDiffusionEngine, ErrorKernel};
    use crate::error::FilterError;
    use crate::kernel::Kernel;
    use crate::palette::{ColorQuantizer, Palette};

    fn photo(width: usize, height: usize, bpp: usize, alignment: usize) -> PixelBuffer {
        let mut buffer =
            PixelBuffer::with_alignment(width, height, bpp, ChannelOrder::Bgr, alignment).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 53 + y * 29) % 256) as u8;
                buffer.set_pixel(x, y, [v, v.wrapping_add(85), 255 - v]);
                if bpp == 4 {
                    buffer.set_channel(x, y, 3, (x + y) as u8);
                }
            }
        }
        buffer
    }

    fn flat(width: usize, height: usize, color: [u8; 3]) -> PixelBuffer {
        PixelBuffer::from_pixels(width, height, ChannelOrder::Bgr, &vec![color; width * height])
            .unwrap()
    }

    // ========================================================================
    // Convolution
    // ========================================================================

    /// If this breaks, it means: the identity kernel alters pixels, so the
    /// anchor, edge addressing or the truncation step is off by one. Checked
    /// with padding and alpha to catch stride and bpp mix-ups.
    #[test]
    fn test_identity_kernel_preserves_every_byte() {
        for (bpp, alignment) in [(3, 1), (3, 4), (4, 1), (4, 16)] {
            let image = photo(11, 7, bpp, alignment);
            for size in [1, 3, 5, 7, 9] {
                let kernel = Kernel::identity(size, size).unwrap();
                for policy in [EdgePolicy::Wrap, EdgePolicy::Clamp, EdgePolicy::Skip] {
                    let result = ConvolutionEngine::new(kernel.clone())
                        .edge_policy(policy)
                        .apply(&image)
                        .unwrap();
                    assert_eq!(
                        result, image,
                        "REGRESSION: identity {size}x{size} with bpp {bpp}, alignment {alignment}, {policy:?}"
                    );
                }
            }
        }
    }

    /// If this breaks, it means: a kernel whose weights sum to its divisor
    /// changes a flat image. Wraparound guarantees every window is full, so
    /// edges must not darken.
    #[test]
    fn test_flat_image_unchanged_when_weights_sum_to_divisor() {
        let image = flat(6, 5, [13, 128, 250]);
        let kernels = [
            Kernel::blur(),
            Kernel::sharpen(),
            Kernel::emboss(),
            Kernel::gaussian_cross(),
            Kernel::gaussian(3, 1.5).unwrap(),
            Kernel::gaussian(5, 2.0).unwrap(),
            Kernel::gaussian(4, 1.0).unwrap(),
            Kernel::from_rows(&[[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]])
                .unwrap()
                .with_divisor(16.0),
        ];
        for kernel in kernels {
            assert_eq!(
                convolve(&image, &kernel).unwrap(),
                image,
                "REGRESSION: flat image changed by {kernel:?}"
            );
        }
    }

    /// If this breaks, it means: a zero-sum kernel on a flat image no longer
    /// collapses to the offset, i.e. the offset is applied in the wrong place.
    #[test]
    fn test_zero_sum_kernel_on_flat_image_yields_offset() {
        let image = flat(4, 4, [90, 90, 90]);
        let kernel = Kernel::edge_detection().with_offset(128.0);
        let result = convolve(&image, &kernel).unwrap();
        assert!(result.as_bytes().iter().all(|&b| b == 128));
    }

    /// If this breaks, it means: the engine reads from the output it is
    /// writing. A shift-right kernel would then smear pixel 0 over the row.
    #[test]
    fn test_convolution_reads_only_the_input() {
        let pixels: Vec<[u8; 3]> = (0..5).map(|i| [i * 50; 3]).collect();
        let image = PixelBuffer::from_pixels(5, 1, ChannelOrder::Bgr, &pixels).unwrap();
        let left = Kernel::new(vec![1.0, 0.0, 0.0], 3, 1).unwrap();
        let result = convolve(&image, &left).unwrap();
        let values: Vec<u8> = (0..5).map(|x| result.channel(x, 0, 0)).collect();
        assert_eq!(values, vec![200, 0, 50, 100, 150]);
    }

    /// If this breaks, it means: the two offset orders were swapped.
    #[test]
    fn test_offset_order_changes_result() {
        let image = flat(1, 1, [100, 100, 100]);
        let kernel = Kernel::identity(1, 1)
            .unwrap()
            .with_divisor(4.0)
            .with_offset(40.0);
        let after = convolve(&image, &kernel).unwrap();
        let before = ConvolutionEngine::new(kernel)
            .offset_order(OffsetOrder::BeforeDivision)
            .apply(&image)
            .unwrap();
        assert_eq!(after.pixel(0, 0), [65, 65, 65]); // 40 + 100 / 4
        assert_eq!(before.pixel(0, 0), [35, 35, 35]); // (40 + 100) / 4
    }

    /// If this breaks, it means: engines started interpreting channel order
    /// instead of working on storage indices.
    #[test]
    fn test_engines_are_channel_order_agnostic() {
        let bgr = photo(5, 4, 3, 1);
        let rgb = PixelBuffer::from_raw(
            5,
            4,
            bgr.stride(),
            3,
            ChannelOrder::Rgb,
            bgr.as_bytes().to_vec(),
        )
        .unwrap();

        let a = convolve(&bgr, &Kernel::sharpen()).unwrap();
        let b = convolve(&rgb, &Kernel::sharpen()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());

        let mut a = bgr.clone();
        let mut b = rgb.clone();
        diffuse(&mut a, DiffusionAlgorithm::Stucky, 3).unwrap();
        diffuse(&mut b, DiffusionAlgorithm::Stucky, 3).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    // ========================================================================
    // Error diffusion
    // ========================================================================

    /// If this breaks, it means: the accumulation rule (round and clamp at
    /// every step) or the causal kernel layout changed.
    #[test]
    fn test_floyd_steinberg_concrete_case() {
        let mut image = flat(3, 1, [100, 100, 100]);
        ErrorDiffusionEngine::new(ErrorKernel::floyd_steinberg(), 2)
            .apply(&mut image)
            .unwrap();
        assert_eq!(image.pixel(0, 0), [0, 0, 0]);
        assert_eq!(image.pixel(1, 0), [255, 255, 255]);
        assert_eq!(image.pixel(2, 0), [0, 0, 0]);
    }

    /// If this breaks, it means: some preset no longer maps every byte to a
    /// quantization level, or alpha is being dithered.
    #[test]
    fn test_two_levels_with_every_preset() {
        for algorithm in DiffusionAlgorithm::ALL {
            let mut image = photo(13, 9, 4, 8);
            let original = image.clone();
            diffuse(&mut image, algorithm, 2).unwrap();
            for y in 0..9 {
                for x in 0..13 {
                    for c in 0..3 {
                        let v = image.channel(x, y, c);
                        assert!(v == 0 || v == 255, "REGRESSION: {} left {v}", algorithm.name());
                    }
                    assert_eq!(image.channel(x, y, 3), original.channel(x, y, 3));
                }
            }
        }
    }

    /// If this breaks, it means: Atkinson lost its 75% propagation and now
    /// diffuses the full error like the other kernels.
    #[test]
    fn test_atkinson_propagates_three_quarters() {
        let kernel = ErrorKernel::atkinson();
        let total: f32 = kernel.entries().iter().map(|&(_, _, w)| w).sum();
        assert_eq!(total / kernel.divisor(), 0.75);
        for algorithm in [
            DiffusionAlgorithm::FloydSteinberg,
            DiffusionAlgorithm::Burkes,
            DiffusionAlgorithm::Stucky,
            DiffusionAlgorithm::Sierra,
        ] {
            let kernel = algorithm.kernel();
            let total: f32 = kernel.entries().iter().map(|&(_, _, w)| w).sum();
            assert_eq!(total, kernel.divisor(), "{}", algorithm.name());
        }
    }

    /// If this breaks, it means: a failed validation left the buffer locked
    /// or partially written.
    #[test]
    fn test_failed_calls_leave_buffer_untouched_and_unlocked() {
        let mut image = photo(4, 4, 3, 1);
        let before = image.clone();

        assert!(diffuse(&mut image, DiffusionAlgorithm::Sierra, 1).is_err());
        let zero = Kernel::blur().with_divisor(0.0);
        assert!(matches!(
            convolve(&image, &zero),
            Err(FilterError::InvalidParameter { name: "divisor", .. })
        ));
        assert!(ColorQuantizer::build_palette(&image, 0).is_err());

        assert_eq!(image, before);
        assert!(!image.is_locked());
    }

    // ========================================================================
    // Quantization
    // ========================================================================

    /// If this breaks, it means: remapping is not a projection. Once every
    /// pixel is a palette color, the nearest color is itself.
    #[test]
    fn test_remap_with_own_palette_is_idempotent() {
        let image = photo(16, 12, 3, 4);
        let palette = ColorQuantizer::build_palette(&image, 6).unwrap();
        let once = ColorQuantizer::remap(&image, &palette).unwrap();
        let twice = ColorQuantizer::remap(&once, &palette).unwrap();
        assert_eq!(once, twice);

        let fixed = Palette::from_hex(&["#000", "#f00", "#ff0", "#fff"]).unwrap();
        let once = ColorQuantizer::remap(&image, &fixed).unwrap();
        assert_eq!(ColorQuantizer::remap(&once, &fixed).unwrap(), once);
    }

    /// If this breaks, it means: the palette stopped honoring frequency
    /// order, so `quantize` would keep rare colors over common ones.
    #[test]
    fn test_quantize_keeps_dominant_colors() {
        let mut image = flat(10, 10, [0, 0, 200]);
        for x in 0..10 {
            image.set_pixel(x, 0, [0, 200, 0]);
        }
        image.set_pixel(5, 5, [255, 255, 255]);
        let palette = ColorQuantizer::build_palette(&image, 2).unwrap();
        assert_eq!(palette.len(), 2);
        let result = ColorQuantizer::quantize(&image, 2).unwrap();
        assert_eq!(result.pixel(0, 0), [0, 200, 0]);
        assert_eq!(result.pixel(3, 3), [0, 0, 200]);
        assert_ne!(result.pixel(5, 5), [255, 255, 255]);
    }

    // ========================================================================
    // Functional filters
    // ========================================================================

    /// If this breaks, it means: inversion is no longer an involution.
    #[test]
    fn test_invert_twice_is_identity() {
        let mut pixels = Vec::with_capacity(256);
        for v in 0..=255u8 {
            pixels.push([v, v.wrapping_add(1), v.wrapping_mul(7)]);
        }
        let original = PixelBuffer::from_pixels(16, 16, ChannelOrder::Rgb, &pixels).unwrap();
        let mut image = original.clone();
        ChannelFilterEngine::apply(&mut image, invert, ChannelSelector::All).unwrap();
        assert_ne!(image, original);
        ChannelFilterEngine::apply(&mut image, invert, ChannelSelector::All).unwrap();
        assert_eq!(image, original);
    }

    /// If this breaks, it means: a single-channel selector leaks into the
    /// other channels.
    #[test]
    fn test_channel1_isolation() {
        let original = photo(7, 3, 3, 4);
        let mut image = original.clone();
        ChannelFilterEngine::apply_function(
            &mut image,
            ChannelFunction::Brightness(40),
            ChannelSelector::Channel1,
        )
        .unwrap();
        for y in 0..3 {
            for x in 0..7 {
                let [a, b, c] = image.pixel(x, y);
                let [oa, ob, oc] = original.pixel(x, y);
                assert_eq!((a, c), (oa, oc));
                assert_eq!(b, ob.saturating_add(40));
            }
        }
    }

    /// If this breaks, it means: the 2x2 inversion example no longer holds.
    #[test]
    fn test_invert_two_by_two_concrete() {
        let mut image = PixelBuffer::from_pixels(
            2,
            2,
            ChannelOrder::Bgr,
            &[[0, 128, 255], [1, 2, 3], [255, 255, 255], [100, 0, 50]],
        )
        .unwrap();
        ChannelFilterEngine::apply_function(&mut image, ChannelFunction::Invert, ChannelSelector::All)
            .unwrap();
        assert_eq!(image.pixel(0, 0), [255, 127, 0]);
        assert_eq!(image.pixel(1, 0), [254, 253, 252]);
        assert_eq!(image.pixel(0, 1), [0, 0, 0]);
        assert_eq!(image.pixel(1, 1), [155, 255, 205]);
    }

    /// If this breaks, it means: an engine accepts a buffer with no pixels.
    #[test]
    fn test_every_engine_rejects_empty_buffers() {
        let empty = PixelBuffer::new(0, 4, 3, ChannelOrder::Bgr).unwrap();
        assert_eq!(convolve(&empty, &Kernel::blur()), Err(FilterError::NullBuffer));
        assert_eq!(
            ColorQuantizer::quantize(&empty, 4),
            Err(FilterError::NullBuffer)
        );
        let mut empty = empty;
        assert_eq!(
            diffuse(&mut empty, DiffusionAlgorithm::FloydSteinberg, 2),
            Err(FilterError::NullBuffer)
        );
        assert_eq!(
            ChannelFilterEngine::apply(&mut empty, invert, ChannelSelector::All),
            Err(FilterError::NullBuffer)
        );
    }
}
