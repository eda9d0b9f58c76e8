#![warn(missing_docs)]

//! Export of carve solids for display and file output.
//!
//! - [`glb`]: binary glTF for viewers such as `<model-viewer>`
//! - [`stl`]: binary and ASCII STL for files
//! - [`store`]: locators handed to a display surface

pub mod error;
pub mod glb;
pub mod stl;
pub mod store;

pub use error::{ExportError, Result};
pub use glb::{to_glb, to_glb_with, GlbMaterial, GLB_MIME};
pub use stl::{to_stl_ascii, to_stl_binary};
pub use store::{MemoryStore, RenderableReference, Resource, ResourceStore};
