use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rasterfx::image_io;
use rasterfx::models::{AppConfig, EdgeMode, FilterName, StepConfig, DEFAULT_CONFIG_FILE};
use rasterfx::pipeline;
use rasterfx::presets;
use rasterfx_core::{ChannelSelector, DiffusionAlgorithm};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "RASTERFX_CONFIG";

#[derive(Parser)]
#[command(name = "rasterfx")]
#[command(about = "Raster image filters: convolution, error diffusion, color quantization")]
struct Cli {
    /// YAML config file (defaults to $RASTERFX_CONFIG, then ./rasterfx.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a convolution kernel
    Convolve {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// Built-in preset (blur, gaussian, gaussian-cross, sharpen, edge-detection, emboss, identity)
        #[arg(short, long, conflicts_with = "kernel")]
        preset: Option<String>,

        /// Kernel defined in the config file
        #[arg(short, long)]
        kernel: Option<String>,

        /// Kernel size for gaussian and identity
        #[arg(long)]
        size: Option<usize>,

        /// Gaussian standard deviation
        #[arg(long)]
        sigma: Option<f32>,

        /// Edge handling (defaults to the config value, then wrap)
        #[arg(long, value_enum)]
        edge: Option<EdgeMode>,

        /// Add the offset before dividing by the divisor
        #[arg(long)]
        offset_first: bool,

        /// Override the kernel offset
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<f32>,

        /// Override the kernel divisor
        #[arg(long, allow_hyphen_values = true)]
        divisor: Option<f32>,
    },
    /// Reduce each channel to N levels with error diffusion
    Dither {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// floyd-steinberg, burkes, stucky, sierra or atkinson
        #[arg(short, long, default_value = "floyd-steinberg")]
        kernel: String,

        /// Levels per channel (defaults to the config value, then 2)
        #[arg(short, long)]
        levels: Option<usize>,
    },
    /// Reduce the image to a popularity or fixed palette
    Quantize {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// Palette size (defaults to the config value, then 16)
        #[arg(short, long, conflicts_with = "palette")]
        colors: Option<usize>,

        /// Fixed palette as comma-separated hex colors (e.g. "#000,#fff,#f00")
        #[arg(long, value_delimiter = ',')]
        palette: Option<Vec<String>>,
    },
    /// Apply a per-channel function
    Filter {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        #[arg(value_enum)]
        function: FilterName,

        /// Brightness delta, contrast percent or gamma exponent
        #[arg(long, allow_hyphen_values = true)]
        value: Option<f32>,

        /// all, 0, 1 or 2 (storage order of the decoded image, i.e. R, G, B)
        #[arg(long, default_value = "all", value_parser = parse_channel)]
        channel: ChannelSelector,
    },
    /// Run a pipeline defined in the config file
    Run {
        /// Pipeline name
        pipeline: String,

        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,
    },
    /// List built-in and configured kernels
    Presets,
}

fn parse_channel(s: &str) -> Result<ChannelSelector, String> {
    s.parse().map_err(|e: rasterfx_core::FilterError| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let Some(command) = cli.command else {
        run_status_command(config_path.as_deref());
        return Ok(());
    };

    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rasterfx=info,rasterfx_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::load(config_path.as_deref()).context("Failed to load config")?;

    match command {
        Commands::Convolve {
            input,
            output,
            preset,
            kernel,
            size,
            sigma,
            edge,
            offset_first,
            offset,
            divisor,
        } => {
            let step = StepConfig::Convolve {
                kernel: kernel.clone().or(preset.clone()).unwrap_or_else(|| "blur".into()),
                size,
                sigma,
                edge,
                offset_first,
                offset,
                divisor,
            };
            // --preset never resolves to a config kernel
            if preset.is_some() {
                let builtin = AppConfig {
                    defaults: config.defaults.clone(),
                    ..Default::default()
                };
                run_single_step(&input, &output, &step, &builtin)
            } else {
                run_single_step(&input, &output, &step, &config)
            }
        }
        Commands::Dither {
            input,
            output,
            kernel,
            levels,
        } => run_single_step(
            &input,
            &output,
            &StepConfig::Dither { kernel, levels },
            &config,
        ),
        Commands::Quantize {
            input,
            output,
            colors,
            palette,
        } => run_single_step(
            &input,
            &output,
            &StepConfig::Quantize { colors, palette },
            &config,
        ),
        Commands::Filter {
            input,
            output,
            function,
            value,
            channel,
        } => run_single_step(
            &input,
            &output,
            &StepConfig::Filter {
                function,
                value,
                channel,
            },
            &config,
        ),
        Commands::Run {
            pipeline: name,
            input,
            output,
        } => {
            let buffer = read_input(&input)?;
            let result = pipeline::run_pipeline(buffer, &name, &config)
                .with_context(|| format!("Pipeline '{name}' failed"))?;
            write_output(&output, &result)
        }
        Commands::Presets => {
            run_presets_command(&config);
            Ok(())
        }
    }
}

fn read_input(input: &Path) -> anyhow::Result<rasterfx_core::PixelBuffer> {
    image_io::read_png(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn write_output(output: &Path, buffer: &rasterfx_core::PixelBuffer) -> anyhow::Result<()> {
    image_io::write_png(output, buffer)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} ({}x{})",
        output.display(),
        buffer.width(),
        buffer.height()
    );
    Ok(())
}

/// Read, apply one step, write
fn run_single_step(
    input: &Path,
    output: &Path,
    step: &StepConfig,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let buffer = read_input(input)?;
    let result = pipeline::run_steps(buffer, std::slice::from_ref(step), config)
        .with_context(|| format!("{} failed", step.name()))?;
    write_output(output, &result)
}

/// List built-in and configured kernels
fn run_presets_command(config: &AppConfig) {
    println!("Convolution presets:");
    for (name, description) in presets::CONVOLUTION_PRESETS {
        println!("  {name:<16} {description}");
    }

    println!("\nError diffusion kernels:");
    for algorithm in DiffusionAlgorithm::ALL {
        let kernel = algorithm.kernel();
        println!(
            "  {:<16} {}x{}, divisor {}",
            algorithm.name(),
            kernel.size_y(),
            kernel.size_x(),
            kernel.divisor()
        );
    }

    if !config.kernels.is_empty() {
        println!("\nConfig kernels:");
        let mut names: Vec<_> = config.kernels.keys().collect();
        names.sort();
        for name in names {
            let kernel = &config.kernels[name];
            let rows = kernel.weights.len();
            let cols = kernel.weights.first().map_or(0, Vec::len);
            println!("  {name:<16} {rows}x{cols}");
        }
    }

    if !config.pipelines.is_empty() {
        println!("\nPipelines:");
        let mut names: Vec<_> = config.pipelines.keys().collect();
        names.sort();
        for name in names {
            let ops: Vec<_> = config.pipelines[name].iter().map(StepConfig::name).collect();
            println!("  {name:<16} {}", ops.join(" -> "));
        }
    }
}

/// Display status and configuration information
fn run_status_command(config_path: Option<&Path>) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("rasterfx v{VERSION}");
    println!("Raster image filters for PNG files\n");

    println!("Environment Variables:");
    println!(
        "  {CONFIG_ENV} = {}",
        std::env::var(CONFIG_ENV).as_deref().unwrap_or("(not set)")
    );

    let config_source = match config_path {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("{} (file not found, using defaults)", path.display()),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => DEFAULT_CONFIG_FILE.to_string(),
        None => "built-in defaults".to_string(),
    };
    println!("\nConfig: {config_source}");

    println!("\nCommands:");
    println!("  rasterfx convolve   Apply a convolution kernel");
    println!("  rasterfx dither     Error diffusion to N levels per channel");
    println!("  rasterfx quantize   Popularity or fixed palette reduction");
    println!("  rasterfx filter     invert, brightness, contrast or gamma");
    println!("  rasterfx run        Run a pipeline from the config file");
    println!("  rasterfx presets    List available kernels and pipelines");
    println!("\nRun 'rasterfx --help' for more details.");
}
