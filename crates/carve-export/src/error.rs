//! Error types for export.

use thiserror::Error;

/// Errors that can occur while serializing a mesh or storing a resource.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Mesh buffers are inconsistent.
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),

    /// glTF JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GLB container encoding failed.
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    /// The resource store refused the payload.
    #[error("resource store error: {0}")]
    Store(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
