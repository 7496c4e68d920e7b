use crate::error::AppError;
use rasterfx_core::{ChannelSelector, ConvolutionOptions, EdgePolicy, Kernel, OffsetOrder};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "rasterfx.yaml";

/// Application configuration loaded from rasterfx.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Values used when a command or step leaves a parameter out
    #[serde(default)]
    pub defaults: Defaults,

    /// User-defined convolution kernels, by name
    #[serde(default)]
    pub kernels: HashMap<String, KernelConfig>,

    /// Named sequences of processing steps
    #[serde(default)]
    pub pipelines: HashMap<String, Vec<StepConfig>>,
}

/// Fallback parameter values
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Defaults {
    #[serde(default = "default_brightness")]
    pub brightness: i16,

    /// Contrast change in percent
    #[serde(default = "default_contrast")]
    pub contrast: f32,

    #[serde(default = "default_gamma")]
    pub gamma: f32,

    #[serde(default)]
    pub edge_policy: EdgeMode,

    /// Quantization levels per channel for dithering
    #[serde(default = "default_levels")]
    pub levels: usize,

    /// Palette size for popularity quantization
    #[serde(default = "default_colors")]
    pub colors: usize,
}

fn default_brightness() -> i16 {
    -5
}

fn default_contrast() -> f32 {
    10.0
}

fn default_gamma() -> f32 {
    0.9
}

fn default_levels() -> usize {
    2
}

fn default_colors() -> usize {
    16
}

fn default_dither_kernel() -> String {
    "floyd-steinberg".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            brightness: default_brightness(),
            contrast: default_contrast(),
            gamma: default_gamma(),
            edge_policy: EdgeMode::default(),
            levels: default_levels(),
            colors: default_colors(),
        }
    }
}

/// How convolution samples outside the image
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    #[default]
    Wrap,
    Clamp,
    Skip,
}

impl From<EdgeMode> for EdgePolicy {
    fn from(mode: EdgeMode) -> Self {
        match mode {
            EdgeMode::Wrap => EdgePolicy::Wrap,
            EdgeMode::Clamp => EdgePolicy::Clamp,
            EdgeMode::Skip => EdgePolicy::Skip,
        }
    }
}

/// A kernel defined in the config file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KernelConfig {
    /// Weight rows; every row must have the same length
    pub weights: Vec<Vec<f32>>,

    /// Defaults to the sum of the weights (1 when they cancel out)
    #[serde(default)]
    pub divisor: Option<f32>,

    #[serde(default)]
    pub offset: f32,

    /// `[row, col]`; defaults to the center cell
    #[serde(default)]
    pub anchor: Option<[usize; 2]>,
}

impl KernelConfig {
    pub fn to_kernel(&self) -> Result<Kernel, AppError> {
        let kernel = Kernel::from_rows(&self.weights)?;
        let divisor = self.divisor.unwrap_or_else(|| kernel.computed_divisor());
        let kernel = match self.anchor {
            Some([row, col]) => kernel.with_anchor(row, col)?,
            None => kernel,
        };
        Ok(kernel.with_divisor(divisor).with_offset(self.offset))
    }
}

/// Functional filters available to `filter` steps
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterName {
    Invert,
    Brightness,
    Contrast,
    Gamma,
}

/// One processing step of a pipeline
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepConfig {
    Convolve {
        /// Preset or config kernel name
        kernel: String,
        #[serde(default)]
        size: Option<usize>,
        #[serde(default)]
        sigma: Option<f32>,
        #[serde(default)]
        edge: Option<EdgeMode>,
        /// Add the offset before dividing
        #[serde(default)]
        offset_first: bool,
        #[serde(default)]
        offset: Option<f32>,
        #[serde(default)]
        divisor: Option<f32>,
    },
    Dither {
        #[serde(default = "default_dither_kernel")]
        kernel: String,
        #[serde(default)]
        levels: Option<usize>,
    },
    Quantize {
        #[serde(default)]
        colors: Option<usize>,
        /// Fixed palette as hex colors; overrides `colors`
        #[serde(default)]
        palette: Option<Vec<String>>,
    },
    Filter {
        function: FilterName,
        #[serde(default)]
        value: Option<f32>,
        #[serde(default, deserialize_with = "deserialize_channel")]
        channel: ChannelSelector,
    },
}

impl StepConfig {
    /// Short label for logs
    pub fn name(&self) -> &'static str {
        match self {
            StepConfig::Convolve { .. } => "convolve",
            StepConfig::Dither { .. } => "dither",
            StepConfig::Quantize { .. } => "quantize",
            StepConfig::Filter { .. } => "filter",
        }
    }

    /// Convolution options for a convolve step, falling back to `defaults`
    pub fn convolution_options(
        edge: Option<EdgeMode>,
        offset_first: bool,
        defaults: &Defaults,
    ) -> ConvolutionOptions {
        let order = if offset_first {
            OffsetOrder::BeforeDivision
        } else {
            OffsetOrder::AfterDivision
        };
        ConvolutionOptions::new()
            .edge_policy(edge.unwrap_or(defaults.edge_policy).into())
            .offset_order(order)
    }
}

/// Accepts `all`, `0`, `1`, `2` as either YAML strings or integers.
fn deserialize_channel<'de, D>(deserializer: D) -> Result<ChannelSelector, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Index(u8),
        Name(String),
    }

    let text = match Repr::deserialize(deserializer)? {
        Repr::Index(i) => i.to_string(),
        Repr::Name(name) => name,
    };
    text.parse().map_err(serde::de::Error::custom)
}

impl AppConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load configuration.
    ///
    /// With an explicit path, a missing file falls back to defaults with a
    /// warning and a malformed file is an error. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is tried and any problem with it falls back
    /// to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        match explicit {
            Some(path) => match std::fs::read_to_string(path) {
                Ok(content) => {
                    let config = Self::from_yaml(&content)?;
                    config.log_loaded(path);
                    Ok(config)
                }
                Err(e) => {
                    tracing::warn!(%e, path = %path.display(), "Failed to read config, using defaults");
                    Ok(Self::default())
                }
            },
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    tracing::debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
                match std::fs::read_to_string(path)
                    .map_err(AppError::from)
                    .and_then(|content| Self::from_yaml(&content))
                {
                    Ok(config) => {
                        config.log_loaded(path);
                        Ok(config)
                    }
                    Err(e) => {
                        tracing::warn!(%e, "Failed to load config, using defaults");
                        Ok(Self::default())
                    }
                }
            }
        }
    }

    fn log_loaded(&self, path: &Path) {
        tracing::info!(
            path = %path.display(),
            kernels = self.kernels.len(),
            pipelines = self.pipelines.len(),
            "Loaded configuration"
        );
    }

    /// Get a pipeline by name
    pub fn get_pipeline(&self, name: &str) -> Option<&[StepConfig]> {
        self.pipelines.get(name).map(Vec::as_slice)
    }

    /// Get a user-defined kernel by name
    pub fn get_kernel(&self, name: &str) -> Option<&KernelConfig> {
        self.kernels.get(name)
    }
}
