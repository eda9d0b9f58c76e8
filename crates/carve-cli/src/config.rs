//! `carve.toml` configuration.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use carve_kernel::KernelProfile;
use carve_pipeline::{ShapeParameter, SliderSpec};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "carve.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub kernel: KernelProfile,
    pub export: ExportConfig,
    pub slider: SliderConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Write ASCII instead of binary STL.
    pub ascii_stl: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliderConfig {
    /// Radius used when a command is given none.
    pub default_radius: Option<f64>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.kernel.validate()?;
        Ok(config)
    }

    /// Load `path`, or [`DEFAULT_CONFIG`] if present, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG).is_file() => Path::new(DEFAULT_CONFIG),
            None => return Ok(Self::default()),
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve a command-line radius against the slider.
    pub fn radius(&self, requested: Option<f64>) -> Result<ShapeParameter> {
        let spec = SliderSpec::RADIUS;
        match requested.or(self.slider.default_radius) {
            Some(raw) => spec
                .parse(raw)
                .with_context(|| format!("radius {raw} rejected")),
            None => Ok(spec.default_parameter()),
        }
    }
}
