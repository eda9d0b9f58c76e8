//! Error types for the kernel.

use thiserror::Error;

/// Errors that can occur while loading the kernel or building solids.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The kernel payload could not be read.
    #[error("cannot load kernel payload from {location}: {reason}")]
    Load {
        /// Where the payload was looked up.
        location: String,
        /// Underlying failure.
        reason: String,
    },

    /// The kernel profile parsed but holds unusable values.
    #[error("invalid kernel profile: {0}")]
    InvalidProfile(String),

    /// A primitive was requested with unusable dimensions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation produced an empty or zero-volume solid.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
