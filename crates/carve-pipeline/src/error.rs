//! Error types for the model pipeline.

use thiserror::Error;

use crate::parameter::ParameterError;

/// Errors surfaced by the pipeline and session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The CAD engine could not be loaded. Terminal for the session.
    #[error("CAD engine failed to load: {0}")]
    EngineLoadFailure(String),

    /// A recompute was requested before the engine was ready.
    #[error("pipeline is not initialized")]
    NotInitialized,

    /// `initialize` was called a second time.
    #[error("pipeline is already initialized")]
    AlreadyInitialized,

    /// The engine could not build or cut the solid for this radius.
    #[error("degenerate geometry at radius {radius}: {reason}")]
    DegenerateGeometry {
        /// Radius that was rejected.
        radius: f64,
        /// Engine-reported reason.
        reason: String,
    },

    /// A raw input value was rejected at the input boundary.
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    /// Tessellation, encoding or publishing failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl PipelineError {
    /// Errors after which no further computation is possible.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::EngineLoadFailure(_))
    }

    /// Errors that leave the previously displayed model in place.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::DegenerateGeometry { .. }
                | PipelineError::InvalidParameter(_)
                | PipelineError::Export(_)
        )
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
