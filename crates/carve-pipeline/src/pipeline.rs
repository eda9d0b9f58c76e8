//! The model pipeline: engine lifecycle and radius → locator derivation.

use carve_export::{to_glb, RenderableReference, ResourceStore, GLB_MIME};
use carve_kernel::{Point3, Vec3};
use tracing::{debug, info, warn};

use crate::engine::{CadEngine, EngineFactory, LoadOptions};
use crate::error::{PipelineError, Result};
use crate::parameter::ShapeParameter;

/// Centre of the subtracted sphere.
pub const SPHERE_CENTER: [f64; 3] = [0.5, 0.5, 0.5];

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// No load attempted yet.
    Uninitialized,
    /// Engine load in progress.
    Initializing,
    /// Engine loaded; recompute is available.
    Ready,
    /// Engine load failed; terminal.
    Failed,
}

enum State<E> {
    Uninitialized,
    Initializing,
    Ready(E),
    Failed(PipelineError),
}

/// Owns the engine handle and the store that receives exported models.
pub struct ModelPipeline<E, S> {
    state: State<E>,
    store: S,
}

impl<E: CadEngine, S: ResourceStore> ModelPipeline<E, S> {
    /// Create an uninitialized pipeline publishing into `store`.
    pub fn new(store: S) -> Self {
        Self {
            state: State::Uninitialized,
            store,
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> PipelineStatus {
        match self.state {
            State::Uninitialized => PipelineStatus::Uninitialized,
            State::Initializing => PipelineStatus::Initializing,
            State::Ready(_) => PipelineStatus::Ready,
            State::Failed(_) => PipelineStatus::Failed,
        }
    }

    /// The engine, once ready.
    pub fn engine(&self) -> Option<&E> {
        match &self.state {
            State::Ready(engine) => Some(engine),
            _ => None,
        }
    }

    /// The resource store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the engine. May be called once; a failed load is terminal.
    pub async fn initialize<F>(&mut self, factory: &F, options: &LoadOptions) -> Result<()>
    where
        F: EngineFactory<Engine = E>,
    {
        if !matches!(self.state, State::Uninitialized) {
            return Err(PipelineError::AlreadyInitialized);
        }
        self.state = State::Initializing;
        match factory.create(options).await {
            Ok(engine) => {
                info!("CAD engine ready");
                self.state = State::Ready(engine);
                Ok(())
            }
            Err(e) => {
                let err = PipelineError::EngineLoadFailure(e.to_string());
                warn!(%err, "CAD engine failed to load");
                self.state = State::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Build the cut solid for `radius` and publish it for display.
    pub fn recompute(&mut self, radius: ShapeParameter) -> Result<RenderableReference> {
        let engine = match &self.state {
            State::Ready(engine) => engine,
            State::Failed(err) => return Err(err.clone()),
            State::Uninitialized | State::Initializing => {
                return Err(PipelineError::NotInitialized)
            }
        };
        debug!(%radius, "recompute");
        let shape = build_cut_solid(engine, radius)?;
        export_for_display(engine, &mut self.store, &shape)
    }

    /// Release a published model.
    pub fn revoke(&mut self, reference: &RenderableReference) -> bool {
        self.store.revoke(reference)
    }
}

/// Unit cube at the origin minus a sphere of `radius` centred in it.
pub fn build_cut_solid<E: CadEngine>(engine: &E, radius: ShapeParameter) -> Result<E::Shape> {
    let degenerate = |e: E::Error| PipelineError::DegenerateGeometry {
        radius: radius.get(),
        reason: e.to_string(),
    };
    let [cx, cy, cz] = SPHERE_CENTER;
    let cube = engine
        .make_box(Point3::origin(), Vec3::new(1.0, 1.0, 1.0))
        .map_err(degenerate)?;
    let sphere = engine
        .make_sphere(Point3::new(cx, cy, cz), radius.get())
        .map_err(degenerate)?;
    engine.cut(&cube, &sphere).map_err(degenerate)
}

/// Tessellate `shape`, encode it as GLB, and publish it to `store`.
///
/// Every call publishes a new resource with its own locator.
pub fn export_for_display<E: CadEngine, S: ResourceStore>(
    engine: &E,
    store: &mut S,
    shape: &E::Shape,
) -> Result<RenderableReference> {
    let mesh = engine
        .tessellate(shape)
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    let glb = to_glb(&mesh).map_err(|e| PipelineError::Export(e.to_string()))?;
    let reference = store
        .publish(glb, GLB_MIME)
        .map_err(|e| PipelineError::Export(e.to_string()))?;
    debug!(%reference, triangles = mesh.num_triangles(), "published model");
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuiltinEngineFactory;
    use carve_export::MemoryStore;
    use carve_kernel::{Kernel, KernelProfile};

    fn radius(r: f64) -> ShapeParameter {
        ShapeParameter::new(r).unwrap()
    }

    async fn ready() -> ModelPipeline<Kernel, MemoryStore> {
        let mut p = ModelPipeline::new(MemoryStore::new());
        p.initialize(&BuiltinEngineFactory, &LoadOptions::default())
            .await
            .unwrap();
        p
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut p: ModelPipeline<Kernel, MemoryStore> = ModelPipeline::new(MemoryStore::new());
        assert_eq!(p.status(), PipelineStatus::Uninitialized);
        p.initialize(&BuiltinEngineFactory, &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(p.status(), PipelineStatus::Ready);
        assert!(p.engine().is_some());
    }

    #[tokio::test]
    async fn test_initialize_twice_rejected() {
        let mut p = ready().await;
        let err = p
            .initialize(&BuiltinEngineFactory, &LoadOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::AlreadyInitialized);
        assert_eq!(p.status(), PipelineStatus::Ready);
    }

    #[tokio::test]
    async fn test_failed_load_is_terminal() {
        let mut p: ModelPipeline<Kernel, MemoryStore> = ModelPipeline::new(MemoryStore::new());
        let err = p
            .initialize(&BuiltinEngineFactory, &LoadOptions::new(|_| None))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(p.status(), PipelineStatus::Failed);
        assert_eq!(p.recompute(radius(0.65)).unwrap_err(), err);
        assert_eq!(
            p.initialize(&BuiltinEngineFactory, &LoadOptions::default())
                .await
                .unwrap_err(),
            PipelineError::AlreadyInitialized
        );
    }

    #[test]
    fn test_recompute_before_initialize() {
        let mut p: ModelPipeline<Kernel, MemoryStore> = ModelPipeline::new(MemoryStore::new());
        assert_eq!(
            p.recompute(radius(0.65)).unwrap_err(),
            PipelineError::NotInitialized
        );
        assert_eq!(p.store().live(), 0);
    }

    #[tokio::test]
    async fn test_recompute_publishes_glb() {
        let mut p = ready().await;
        let reference = p.recompute(radius(0.65)).unwrap();
        let resource = p.store().get(&reference).unwrap();
        assert_eq!(resource.mime, GLB_MIME);
        assert_eq!(&resource.bytes[0..4], b"glTF");
    }

    #[tokio::test]
    async fn test_recompute_same_radius_distinct_locators() {
        let mut p = ready().await;
        let a = p.recompute(radius(0.7)).unwrap();
        let b = p.recompute(radius(0.7)).unwrap();
        assert_ne!(a, b);
        assert_eq!(p.store().get(&a).unwrap(), p.store().get(&b).unwrap());
    }

    #[test]
    fn test_build_cut_solid_deterministic() {
        let kernel = Kernel::new(KernelProfile::default()).unwrap();
        for r in [0.5, 0.65, 0.87] {
            let a = build_cut_solid(&kernel, radius(r)).unwrap();
            let b = build_cut_solid(&kernel, radius(r)).unwrap();
            assert_eq!(a, b);
            assert!(a.volume() > 0.0);
        }
    }

    #[test]
    fn test_degenerate_reports_radius() {
        // A finer sphere hugs the cube corners at the upper bound.
        let profile = KernelProfile {
            sphere_segments: 64,
            ..KernelProfile::default()
        };
        let kernel = Kernel::new(profile).unwrap();
        match build_cut_solid(&kernel, radius(0.87)) {
            Err(PipelineError::DegenerateGeometry { radius, .. }) => assert_eq!(radius, 0.87),
            other => panic!("expected DegenerateGeometry, got {other:?}"),
        }
    }
}
