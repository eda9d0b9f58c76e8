//! Kernel profile and payload loading.
//!
//! The kernel's payload is a TOML profile. Hosts tell the loader where to
//! find it through a [`PayloadSource`]; the built-in source needs no file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::csg::DEFAULT_EPSILON;
use crate::error::{KernelError, Result};

/// File name hosts are asked to resolve for the kernel payload.
pub const PAYLOAD_NAME: &str = "carve-kernel.toml";

/// Numeric settings of a loaded kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelProfile {
    /// Azimuthal divisions of faceted spheres (latitude bands are half this).
    pub sphere_segments: u32,
    /// Plane thickness for coplanarity tests.
    pub epsilon: f64,
    /// Boolean results at or below this volume are reported as degenerate.
    pub min_volume: f64,
}

impl Default for KernelProfile {
    fn default() -> Self {
        Self {
            sphere_segments: 16,
            epsilon: DEFAULT_EPSILON,
            min_volume: 1e-9,
        }
    }
}

impl KernelProfile {
    /// Parse a profile from TOML text and validate it.
    pub fn from_toml(text: &str) -> Result<Self> {
        let profile: KernelProfile =
            toml::from_str(text).map_err(|e| KernelError::InvalidProfile(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<()> {
        if !(8..=512).contains(&self.sphere_segments) {
            return Err(KernelError::InvalidProfile(format!(
                "sphere_segments must be in 8..=512, got {}",
                self.sphere_segments
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(KernelError::InvalidProfile(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if !(self.min_volume.is_finite() && self.min_volume >= 0.0) {
            return Err(KernelError::InvalidProfile(format!(
                "min_volume must be non-negative, got {}",
                self.min_volume
            )));
        }
        Ok(())
    }
}

/// Where the kernel payload comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// Compiled-in default profile.
    Builtin,
    /// TOML profile on disk.
    File(PathBuf),
    /// TOML profile text already fetched by the host.
    Inline(String),
}

impl PayloadSource {
    /// Human-readable location for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            PayloadSource::Builtin => "builtin".to_string(),
            PayloadSource::File(path) => path.display().to_string(),
            PayloadSource::Inline(_) => "inline".to_string(),
        }
    }

    /// Resolve the source into a validated profile.
    pub fn read_profile(&self) -> Result<KernelProfile> {
        match self {
            PayloadSource::Builtin => Ok(KernelProfile::default()),
            PayloadSource::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| KernelError::Load {
                    location: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                KernelProfile::from_toml(&text)
            }
            PayloadSource::Inline(text) => KernelProfile::from_toml(text),
        }
    }
}
