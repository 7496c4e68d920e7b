//! Kernel lookup by name.
//!
//! Names are matched case-insensitively with `_` and spaces treated as `-`.
//! Kernels defined in the config file take precedence over built-ins of the
//! same name.

use crate::error::AppError;
use crate::models::AppConfig;
use rasterfx_core::{DiffusionAlgorithm, ErrorKernel, Kernel};

/// Default Gaussian size and standard deviation.
pub const GAUSSIAN_SIZE: usize = 3;
pub const GAUSSIAN_SIGMA: f32 = 1.5;

/// Built-in convolution kernels as `(name, description)`.
pub const CONVOLUTION_PRESETS: &[(&str, &str)] = &[
    ("blur", "3x3 box blur, divisor 9"),
    ("gaussian", "size x size Gaussian (default 3, sigma 1.5), normalized"),
    ("gaussian-cross", "4-neighbour Gaussian approximation, normalized"),
    ("sharpen", "3x3 sharpen, center 5"),
    ("edge-detection", "3x3 Laplacian edge detector"),
    ("emboss", "3x3 diagonal emboss"),
    ("identity", "single 1 at the center (default 3x3)"),
];

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Resolve a convolution kernel.
///
/// `size` applies to `gaussian` and `identity`; `sigma` only to `gaussian`.
pub fn convolution_kernel(
    name: &str,
    size: Option<usize>,
    sigma: Option<f32>,
    config: &AppConfig,
) -> Result<Kernel, AppError> {
    if let Some(custom) = config.get_kernel(name) {
        if size.is_some() || sigma.is_some() {
            tracing::warn!(kernel = name, "size and sigma are ignored for config kernels");
        }
        return custom.to_kernel();
    }

    let normalized = normalize(name);
    let fixed = match normalized.as_str() {
        "gaussian" | "gaussian-blur" => {
            return Ok(Kernel::gaussian(
                size.unwrap_or(GAUSSIAN_SIZE),
                sigma.unwrap_or(GAUSSIAN_SIGMA),
            )?);
        }
        "identity" | "generic" => {
            let size = size.unwrap_or(3);
            return Ok(Kernel::identity(size, size)?);
        }
        "blur" | "box-blur" => Kernel::blur(),
        "gaussian-cross" => Kernel::gaussian_cross(),
        "sharpen" => Kernel::sharpen(),
        "edge-detection" | "edge" | "edges" => Kernel::edge_detection(),
        "emboss" => Kernel::emboss(),
        _ => return Err(AppError::UnknownKernel(name.to_string())),
    };
    if size.is_some_and(|s| s != 3) {
        tracing::warn!(kernel = %normalized, "fixed 3x3 preset, size ignored");
    }
    Ok(fixed)
}

/// Resolve an error diffusion kernel by name.
pub fn diffusion_kernel(name: &str) -> Result<ErrorKernel, AppError> {
    name.parse::<DiffusionAlgorithm>()
        .map(DiffusionAlgorithm::kernel)
        .map_err(|_| AppError::UnknownKernel(name.to_string()))
}
