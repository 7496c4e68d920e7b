pub mod config;

pub use config::{
    AppConfig, Defaults, EdgeMode, FilterName, KernelConfig, StepConfig, DEFAULT_CONFIG_FILE,
};
