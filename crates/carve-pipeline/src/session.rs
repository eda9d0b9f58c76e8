//! Serialized, last-writer-wins recomputation driven by parameter changes.
//!
//! Parameter changes go into a watch channel that only keeps the newest
//! value. The session runs one recompute at a time; a result whose
//! parameter was superseded while it ran is discarded and its resource
//! revoked. Committing a new model revokes the one it replaces.

use std::sync::Arc;

use carve_export::{RenderableReference, ResourceStore};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::{CadEngine, EngineFactory, LoadOptions};
use crate::error::{PipelineError, Result};
use crate::parameter::ShapeParameter;
use crate::pipeline::{ModelPipeline, PipelineStatus};

/// Receives the current model and any surfaced failures.
pub trait DisplaySurface {
    /// Show a newly committed model.
    fn show_model(&mut self, reference: &RenderableReference, radius: ShapeParameter);

    /// Surface a failure. Recoverable errors leave the current model shown.
    fn report(&mut self, error: &PipelineError);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Submission {
    generation: u64,
    radius: ShapeParameter,
}

/// Handle for submitting parameter changes to a running session.
///
/// The session stops once every sender has been dropped.
#[derive(Debug, Clone)]
pub struct ParameterSender {
    tx: Arc<watch::Sender<Option<Submission>>>,
}

impl ParameterSender {
    /// Replace the pending parameter with `radius`.
    pub fn submit(&self, radius: ShapeParameter) {
        self.tx.send_modify(|slot| {
            let generation = slot.map_or(0, |s| s.generation) + 1;
            *slot = Some(Submission { generation, radius });
        });
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Models shown on the display.
    pub committed: usize,
    /// Completed results dropped because a newer parameter arrived.
    pub superseded: usize,
    /// Recomputes that failed with a recoverable error.
    pub rejected: usize,
}

/// Couples a [`ModelPipeline`] to a [`DisplaySurface`].
pub struct ModelSession<E, S, D> {
    pipeline: ModelPipeline<E, S>,
    display: D,
    rx: watch::Receiver<Option<Submission>>,
    current: Option<(RenderableReference, ShapeParameter)>,
}

impl<E, S, D> ModelSession<E, S, D>
where
    E: CadEngine,
    S: ResourceStore,
    D: DisplaySurface,
{
    /// Create a session and the first sender feeding it.
    pub fn new(pipeline: ModelPipeline<E, S>, display: D) -> (Self, ParameterSender) {
        let (tx, rx) = watch::channel(None);
        let session = Self {
            pipeline,
            display,
            rx,
            current: None,
        };
        (session, ParameterSender { tx: Arc::new(tx) })
    }

    /// The pipeline.
    pub fn pipeline(&self) -> &ModelPipeline<E, S> {
        &self.pipeline
    }

    /// The display surface.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutable access to the display surface.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// The committed model and its parameter.
    pub fn current(&self) -> Option<&(RenderableReference, ShapeParameter)> {
        self.current.as_ref()
    }

    /// Initialize the engine, then [`serve`](Self::serve) until every sender
    /// is dropped.
    ///
    /// Parameters submitted before the engine is ready are queued; only the
    /// newest one is computed. A failed load is reported to the display and
    /// returned.
    pub async fn run<F>(&mut self, factory: &F, options: &LoadOptions) -> Result<SessionSummary>
    where
        F: EngineFactory<Engine = E>,
    {
        if let Err(err) = self.pipeline.initialize(factory, options).await {
            self.display.report(&err);
            return Err(err);
        }
        self.serve().await
    }

    /// Process parameter changes on an already initialized pipeline until
    /// every sender is dropped.
    pub async fn serve(&mut self) -> Result<SessionSummary> {
        if self.pipeline.status() != PipelineStatus::Ready {
            return Err(PipelineError::NotInitialized);
        }
        let mut summary = SessionSummary::default();
        while self.rx.changed().await.is_ok() {
            let Some(submission) = *self.rx.borrow_and_update() else {
                continue;
            };
            self.process(submission, &mut summary);
        }
        info!(
            committed = summary.committed,
            superseded = summary.superseded,
            rejected = summary.rejected,
            "session finished"
        );
        Ok(summary)
    }

    fn process(&mut self, submission: Submission, summary: &mut SessionSummary) {
        let radius = submission.radius;
        match self.pipeline.recompute(radius) {
            Ok(reference) => {
                let latest = self.rx.borrow().map_or(submission.generation, |s| s.generation);
                if latest != submission.generation {
                    debug!(%radius, %reference, "result superseded");
                    self.pipeline.revoke(&reference);
                    summary.superseded += 1;
                    return;
                }
                self.display.show_model(&reference, radius);
                if let Some((previous, _)) = self.current.replace((reference, radius)) {
                    self.pipeline.revoke(&previous);
                }
                summary.committed += 1;
            }
            Err(err) => {
                warn!(%radius, %err, "recompute failed, keeping current model");
                self.display.report(&err);
                summary.rejected += 1;
            }
        }
    }
}
