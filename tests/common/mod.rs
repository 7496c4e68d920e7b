//! Common test infrastructure for rasterfx integration tests.
//!
//! Each test file compiles its own copy of this module, so items may appear
//! unused from the perspective of a single test file even though they're
//! used elsewhere.

#![allow(dead_code)]

pub mod fixtures;

use rasterfx_core::PixelBuffer;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch directory holding input images, config files and outputs.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Encode `buffer` as `name` and return its path
    pub fn write_png(&self, name: &str, buffer: &PixelBuffer) -> PathBuf {
        let path = self.path(name);
        rasterfx::image_io::write_png(&path, buffer).expect("Failed to write fixture png");
        path
    }

    pub fn read_png(&self, name: &str) -> PixelBuffer {
        rasterfx::image_io::read_png(&self.path(name)).expect("Failed to read output png")
    }

    /// Write a config file and return its path
    pub fn write_config(&self, yaml: &str) -> PathBuf {
        let path = self.path("rasterfx.yaml");
        std::fs::write(&path, yaml).expect("Failed to write config");
        path
    }
}
