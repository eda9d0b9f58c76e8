//! The CAD engine seam.
//!
//! The pipeline only talks to an engine through [`CadEngine`] and creates it
//! through an [`EngineFactory`]; the built-in kernel implements both.

use std::fmt;
use std::sync::Arc;

use carve_kernel::{Kernel, KernelError, PayloadSource, Point3, Solid, TriangleMesh, Vec3, PAYLOAD_NAME};

/// Primitive construction, boolean cut and tessellation.
pub trait CadEngine {
    /// Opaque solid value.
    type Shape;
    /// Engine-reported failure.
    type Error: std::error::Error;

    /// Axis-aligned box with minimum corner `origin`.
    fn make_box(&self, origin: Point3, size: Vec3) -> Result<Self::Shape, Self::Error>;

    /// Sphere of `radius` around `center`.
    fn make_sphere(&self, center: Point3, radius: f64) -> Result<Self::Shape, Self::Error>;

    /// `base − tool`.
    fn cut(&self, base: &Self::Shape, tool: &Self::Shape) -> Result<Self::Shape, Self::Error>;

    /// Triangulate a solid for display.
    fn tessellate(&self, shape: &Self::Shape) -> Result<TriangleMesh, Self::Error>;
}

/// Asynchronous one-time engine construction.
#[allow(async_fn_in_trait)]
pub trait EngineFactory {
    /// Engine produced by this factory.
    type Engine: CadEngine;
    /// Load failure.
    type Error: std::error::Error;

    /// Load the engine, resolving its payload through `options`.
    async fn create(&self, options: &LoadOptions) -> Result<Self::Engine, Self::Error>;
}

type LocateFn = dyn Fn(&str) -> Option<PayloadSource>;

/// Options passed to an [`EngineFactory`].
#[derive(Clone)]
pub struct LoadOptions {
    locate_file: Arc<LocateFn>,
}

impl LoadOptions {
    /// Options with a custom payload resolver.
    pub fn new(locate_file: impl Fn(&str) -> Option<PayloadSource> + 'static) -> Self {
        Self {
            locate_file: Arc::new(locate_file),
        }
    }

    /// Resolve a payload file name.
    pub fn locate(&self, name: &str) -> Option<PayloadSource> {
        (self.locate_file)(name)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(|_| Some(PayloadSource::Builtin))
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions").finish_non_exhaustive()
    }
}

impl CadEngine for Kernel {
    type Shape = Solid;
    type Error = KernelError;

    fn make_box(&self, origin: Point3, size: Vec3) -> Result<Solid, KernelError> {
        Kernel::make_box(self, origin, size)
    }

    fn make_sphere(&self, center: Point3, radius: f64) -> Result<Solid, KernelError> {
        Kernel::make_sphere(self, center, radius)
    }

    fn cut(&self, base: &Solid, tool: &Solid) -> Result<Solid, KernelError> {
        Kernel::cut(self, base, tool)
    }

    fn tessellate(&self, shape: &Solid) -> Result<TriangleMesh, KernelError> {
        Kernel::tessellate(self, shape)
    }
}

/// Factory for the built-in [`Kernel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngineFactory;

impl EngineFactory for BuiltinEngineFactory {
    type Engine = Kernel;
    type Error = KernelError;

    async fn create(&self, options: &LoadOptions) -> Result<Kernel, KernelError> {
        let source = options.locate(PAYLOAD_NAME).ok_or_else(|| KernelError::Load {
            location: PAYLOAD_NAME.to_string(),
            reason: "locate_file did not resolve the payload".to_string(),
        })?;
        Kernel::load(source).await
    }
}
