#![warn(missing_docs)]

//! Reactive model pipeline for carve.
//!
//! A single radius parameter drives a CAD engine that subtracts a sphere
//! from the unit cube. [`ModelPipeline`] owns the engine handle and turns a
//! radius into a [`RenderableReference`]; [`ModelSession`] serializes
//! recomputation, commits only the newest result to a [`DisplaySurface`],
//! and revokes superseded resources.
//!
//! # Example
//!
//! ```
//! use carve_export::MemoryStore;
//! use carve_pipeline::{BuiltinEngineFactory, LoadOptions, ModelPipeline, SliderSpec};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut pipeline = ModelPipeline::new(MemoryStore::new());
//! pipeline.initialize(&BuiltinEngineFactory, &LoadOptions::default()).await.unwrap();
//! let radius = SliderSpec::RADIUS.parse(0.65).unwrap();
//! let reference = pipeline.recompute(radius).unwrap();
//! assert!(reference.as_str().starts_with("blob:carve/"));
//! # });
//! ```

pub mod engine;
pub mod error;
pub mod parameter;
pub mod pipeline;
pub mod session;

pub use carve_export::{RenderableReference, ResourceStore};
pub use engine::{BuiltinEngineFactory, CadEngine, EngineFactory, LoadOptions};
pub use error::{PipelineError, Result};
pub use parameter::{
    ParameterError, ShapeParameter, SliderSpec, DEFAULT_RADIUS, MAX_RADIUS, MIN_RADIUS,
    RADIUS_STEP,
};
pub use pipeline::{build_cut_solid, export_for_display, ModelPipeline, PipelineStatus};
pub use session::{DisplaySurface, ModelSession, ParameterSender, SessionSummary};
