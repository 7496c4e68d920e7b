//! Step execution.
//!
//! Every CLI command is expressed as a single [`StepConfig`], so `run` and
//! the one-shot commands share the same code path.

use crate::error::AppError;
use crate::models::{AppConfig, Defaults, FilterName, StepConfig};
use crate::presets;
use rasterfx_core::{
    ChannelFilterEngine, ChannelFunction, ColorQuantizer, ConvolutionEngine, ErrorDiffusionEngine,
    FilterError, Palette, PixelBuffer,
};
use std::time::Instant;

/// Turn a filter name and optional value into a channel function.
///
/// Missing values come from `defaults`. Brightness must be a whole number
/// in the `i16` range.
pub fn channel_function(
    function: FilterName,
    value: Option<f32>,
    defaults: &Defaults,
) -> Result<ChannelFunction, AppError> {
    Ok(match function {
        FilterName::Invert => {
            if value.is_some() {
                tracing::warn!("invert takes no value, ignoring it");
            }
            ChannelFunction::Invert
        }
        FilterName::Brightness => {
            let delta = match value {
                None => defaults.brightness,
                Some(v) if v.fract() == 0.0 && v >= i16::MIN as f32 && v <= i16::MAX as f32 => {
                    v as i16
                }
                Some(v) => {
                    return Err(FilterError::InvalidParameter {
                        name: "brightness",
                        reason: format!("expected a whole number, got {v}"),
                    }
                    .into())
                }
            };
            ChannelFunction::Brightness(delta)
        }
        FilterName::Contrast => ChannelFunction::Contrast(value.unwrap_or(defaults.contrast)),
        FilterName::Gamma => ChannelFunction::gamma(value.unwrap_or(defaults.gamma)),
    })
}

/// Apply one step, consuming the input buffer.
pub fn apply_step(
    mut buffer: PixelBuffer,
    step: &StepConfig,
    config: &AppConfig,
) -> Result<PixelBuffer, AppError> {
    let defaults = &config.defaults;
    match step {
        StepConfig::Convolve {
            kernel,
            size,
            sigma,
            edge,
            offset_first,
            offset,
            divisor,
        } => {
            let mut resolved = presets::convolution_kernel(kernel, *size, *sigma, config)?;
            if let Some(offset) = offset {
                resolved = resolved.with_offset(*offset);
            }
            if let Some(divisor) = divisor {
                resolved = resolved.with_divisor(*divisor);
            }
            let options = StepConfig::convolution_options(*edge, *offset_first, defaults);
            Ok(ConvolutionEngine::new(resolved)
                .options(options)
                .apply(&buffer)?)
        }
        StepConfig::Dither { kernel, levels } => {
            let kernel = presets::diffusion_kernel(kernel)?;
            ErrorDiffusionEngine::new(kernel, levels.unwrap_or(defaults.levels))
                .apply(&mut buffer)?;
            Ok(buffer)
        }
        StepConfig::Quantize { colors, palette } => match palette {
            Some(hex) => {
                let palette = Palette::from_hex(hex.as_slice()).map_err(FilterError::from)?;
                Ok(ColorQuantizer::remap(&buffer, &palette)?)
            }
            None => Ok(ColorQuantizer::quantize(
                &buffer,
                colors.unwrap_or(defaults.colors),
            )?),
        },
        StepConfig::Filter {
            function,
            value,
            channel,
        } => {
            let function = channel_function(*function, *value, defaults)?;
            ChannelFilterEngine::apply_function(&mut buffer, function, *channel)?;
            Ok(buffer)
        }
    }
}

/// Run every step of `steps` in order.
pub fn run_steps(
    mut buffer: PixelBuffer,
    steps: &[StepConfig],
    config: &AppConfig,
) -> Result<PixelBuffer, AppError> {
    for (index, step) in steps.iter().enumerate() {
        let start = Instant::now();
        buffer = apply_step(buffer, step, config)?;
        tracing::info!(
            step = index + 1,
            total = steps.len(),
            op = step.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Step complete"
        );
    }
    Ok(buffer)
}

/// Run a named pipeline from the config.
pub fn run_pipeline(
    buffer: PixelBuffer,
    name: &str,
    config: &AppConfig,
) -> Result<PixelBuffer, AppError> {
    let steps = config
        .get_pipeline(name)
        .ok_or_else(|| AppError::UnknownPipeline(name.to_string()))?;
    tracing::info!(pipeline = name, steps = steps.len(), "Running pipeline");
    run_steps(buffer, steps, config)
}
