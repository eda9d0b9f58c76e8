//! Session ordering and resource lifecycle against an instrumented engine.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use carve_export::{MemoryStore, RenderableReference, ResourceStore};
use carve_kernel::{Kernel, KernelError, KernelProfile, Point3, Solid, TriangleMesh, Vec3};
use carve_pipeline::{
    CadEngine, DisplaySurface, EngineFactory, LoadOptions, ModelPipeline, ModelSession,
    ParameterSender, PipelineError, ShapeParameter,
};

fn radius(r: f64) -> ShapeParameter {
    ShapeParameter::new(r).unwrap()
}

/// Kernel wrapper counting calls, optionally failing one radius and firing a
/// hook during the first cut.
struct CountingEngine {
    kernel: Kernel,
    calls: Rc<Cell<usize>>,
    last_radius: Cell<f64>,
    fail_radius: Option<f64>,
    during_first_cut: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl CountingEngine {
    fn new(calls: Rc<Cell<usize>>) -> Self {
        Self {
            kernel: Kernel::new(KernelProfile::default()).unwrap(),
            calls,
            last_radius: Cell::new(0.0),
            fail_radius: None,
            during_first_cut: RefCell::new(None),
        }
    }

    fn tick(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl CadEngine for CountingEngine {
    type Shape = Solid;
    type Error = KernelError;

    fn make_box(&self, origin: Point3, size: Vec3) -> Result<Solid, KernelError> {
        self.tick();
        self.kernel.make_box(origin, size)
    }

    fn make_sphere(&self, center: Point3, r: f64) -> Result<Solid, KernelError> {
        self.tick();
        self.last_radius.set(r);
        self.kernel.make_sphere(center, r)
    }

    fn cut(&self, base: &Solid, tool: &Solid) -> Result<Solid, KernelError> {
        self.tick();
        if let Some(hook) = self.during_first_cut.borrow_mut().take() {
            hook();
        }
        if self.fail_radius == Some(self.last_radius.get()) {
            return Err(KernelError::Degenerate("scripted failure".into()));
        }
        self.kernel.cut(base, tool)
    }

    fn tessellate(&self, shape: &Solid) -> Result<TriangleMesh, KernelError> {
        self.tick();
        self.kernel.tessellate(shape)
    }
}

struct OnceFactory {
    engine: RefCell<Option<CountingEngine>>,
}

impl OnceFactory {
    fn new(engine: CountingEngine) -> Self {
        Self {
            engine: RefCell::new(Some(engine)),
        }
    }
}

impl EngineFactory for OnceFactory {
    type Engine = CountingEngine;
    type Error = KernelError;

    async fn create(&self, _options: &LoadOptions) -> Result<CountingEngine, KernelError> {
        self.engine.borrow_mut().take().ok_or(KernelError::Load {
            location: "once-factory".into(),
            reason: "already created".into(),
        })
    }
}

/// Display that plays the user: after each outcome it submits the next
/// scripted batch, and drops its sender when the script runs out.
struct ScriptedDisplay {
    script: VecDeque<Vec<f64>>,
    tx: Option<ParameterSender>,
    shown: Vec<(RenderableReference, ShapeParameter)>,
    errors: Vec<PipelineError>,
}

impl ScriptedDisplay {
    fn new(script: Vec<Vec<f64>>) -> Self {
        Self {
            script: script.into(),
            tx: None,
            shown: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn advance(&mut self) {
        match self.script.pop_front() {
            Some(batch) => {
                if let Some(tx) = &self.tx {
                    for r in batch {
                        tx.submit(radius(r));
                    }
                }
            }
            None => self.tx = None,
        }
    }

    fn shown_radii(&self) -> Vec<f64> {
        self.shown.iter().map(|(_, r)| r.get()).collect()
    }
}

impl DisplaySurface for ScriptedDisplay {
    fn show_model(&mut self, reference: &RenderableReference, r: ShapeParameter) {
        self.shown.push((reference.clone(), r));
        self.advance();
    }

    fn report(&mut self, error: &PipelineError) {
        self.errors.push(error.clone());
        self.advance();
    }
}

type CountingSession = ModelSession<CountingEngine, MemoryStore, ScriptedDisplay>;

/// Session whose display owns the only sender, primed with `first`.
fn scripted(first: f64, script: Vec<Vec<f64>>) -> CountingSession {
    let (mut session, tx) = ModelSession::new(
        ModelPipeline::new(MemoryStore::new()),
        ScriptedDisplay::new(script),
    );
    tx.submit(radius(first));
    session.display_mut().tx = Some(tx);
    session
}

#[tokio::test]
async fn test_in_flight_result_superseded() {
    let calls = Rc::new(Cell::new(0));
    let mut session = scripted(0.6, vec![]);
    let late = session.display().tx.clone().unwrap();
    let engine = CountingEngine::new(calls.clone());
    *engine.during_first_cut.borrow_mut() = Some(Box::new(move || late.submit(radius(0.7))));

    let summary = session
        .run(&OnceFactory::new(engine), &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.committed, 1);
    assert_eq!(summary.superseded, 1);
    assert_eq!(session.display().shown_radii(), vec![0.7]);
    assert_eq!(session.pipeline().store().live(), 1);
    assert_eq!(calls.get(), 8);
}

#[tokio::test]
async fn test_rapid_changes_compute_latest() {
    let calls = Rc::new(Cell::new(0));
    let burst = vec![0.51, 0.52, 0.53, 0.54, 0.55, 0.56, 0.57, 0.58, 0.59, 0.6];
    let mut session = scripted(0.5, vec![burst]);

    let summary = session
        .run(&OnceFactory::new(CountingEngine::new(calls.clone())), &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(session.display().shown_radii(), vec![0.5, 0.6]);
    assert_eq!(summary.committed, 2);
    assert_eq!(summary.superseded, 0);
    assert_eq!(calls.get(), 8);
}

#[tokio::test]
async fn test_degenerate_keeps_previous_model() {
    let mut engine = CountingEngine::new(Rc::new(Cell::new(0)));
    engine.fail_radius = Some(0.8);
    let mut session = scripted(0.6, vec![vec![0.8]]);

    let summary = session
        .run(&OnceFactory::new(engine), &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.committed, 1);
    assert_eq!(summary.rejected, 1);
    let errors = &session.display().errors;
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        PipelineError::DegenerateGeometry { radius, .. } => assert_eq!(*radius, 0.8),
        other => panic!("expected DegenerateGeometry, got {other:?}"),
    }
    assert!(errors[0].is_recoverable());

    let (reference, shown) = session.current().unwrap();
    assert_eq!(*shown, radius(0.6));
    assert!(session.pipeline().store().get(reference).is_some());
    assert_eq!(session.pipeline().store().live(), 1);
}

#[tokio::test]
async fn test_recovers_after_degenerate() {
    let mut engine = CountingEngine::new(Rc::new(Cell::new(0)));
    engine.fail_radius = Some(0.8);
    let mut session = scripted(0.6, vec![vec![0.8], vec![0.7]]);

    let summary = session
        .run(&OnceFactory::new(engine), &LoadOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.committed, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(session.display().shown_radii(), vec![0.6, 0.7]);
    let first = &session.display().shown[0].0;
    assert!(session.pipeline().store().get(first).is_none());
    assert_eq!(session.current().unwrap().1, radius(0.7));
}

#[tokio::test]
async fn test_replaced_models_are_revoked() {
    let script = [0.55, 0.6, 0.65, 0.7, 0.75].map(|r| vec![r]).to_vec();
    let mut session = scripted(0.5, script);

    session
        .run(
            &OnceFactory::new(CountingEngine::new(Rc::new(Cell::new(0)))),
            &LoadOptions::default(),
        )
        .await
        .unwrap();

    let shown = &session.display().shown;
    assert_eq!(shown.len(), 6);
    let store = session.pipeline().store();
    assert_eq!(store.live(), 1);
    let (last, replaced) = shown.split_last().unwrap();
    assert!(store.get(&last.0).is_some());
    for (reference, _) in replaced {
        assert!(store.get(reference).is_none(), "{reference} still live");
    }

    let locators: HashSet<_> = shown.iter().map(|(r, _)| r.as_str()).collect();
    assert_eq!(locators.len(), 6);
}

#[tokio::test]
async fn test_recompute_before_ready_touches_no_engine() {
    let calls = Rc::new(Cell::new(0));
    let factory = OnceFactory::new(CountingEngine::new(calls.clone()));
    let mut pipeline: ModelPipeline<CountingEngine, MemoryStore> =
        ModelPipeline::new(MemoryStore::new());

    assert_eq!(
        pipeline.recompute(radius(0.65)).unwrap_err(),
        PipelineError::NotInitialized
    );
    assert_eq!(calls.get(), 0);
    assert_eq!(pipeline.store().live(), 0);

    pipeline
        .initialize(&factory, &LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(calls.get(), 0);
    pipeline.recompute(radius(0.65)).unwrap();
    assert_eq!(calls.get(), 4);
}

#[tokio::test]
async fn test_failed_factory_stops_session() {
    let factory = OnceFactory {
        engine: RefCell::new(None),
    };
    let mut session = scripted(0.65, vec![]);

    let err = session
        .run(&factory, &LoadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EngineLoadFailure(_)));
    assert_eq!(session.display().errors, vec![err]);
    assert!(session.display().shown.is_empty());
    assert!(session.current().is_none());
}
