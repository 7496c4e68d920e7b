//! Rasterfx - raster image filters
//!
//! PNG I/O, YAML config, kernel presets and pipelines on top of
//! `rasterfx-core`. This library exposes modules for the CLI and for
//! integration testing.

pub mod error;
pub mod image_io;
pub mod models;
pub mod pipeline;
pub mod presets;
