//! WASM bindings for carve.
//!
//! [`CutModel`] runs a model session in the browser. Slider values go in
//! through [`CutModel::set_radius`]; each committed model comes back as a GLB
//! object URL passed to the `onModel(url, radius)` callback.

#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use carve_kernel::PayloadSource;
use carve_pipeline::{
    BuiltinEngineFactory, DisplaySurface, LoadOptions, ModelPipeline, ModelSession,
    ParameterSender, PipelineError, RenderableReference, ShapeParameter, SliderSpec,
};
use wasm_bindgen::prelude::*;

mod store;

pub use store::ObjectUrlStore;

/// Initialize panic hook and log the load marker.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"[WASM] carve-wasm loaded".into());
}

/// What the page currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
struct ViewState {
    url: Option<String>,
    radius: Option<f64>,
    error: Option<String>,
}

impl ViewState {
    fn commit(&mut self, reference: &RenderableReference, radius: ShapeParameter) {
        self.url = Some(reference.as_str().to_string());
        self.radius = Some(radius.get());
        self.error = None;
    }

    fn fail(&mut self, error: &PipelineError) {
        self.error = Some(error.to_string());
    }
}

struct CallbackDisplay {
    view: Rc<RefCell<ViewState>>,
    on_model: Option<js_sys::Function>,
}

impl DisplaySurface for CallbackDisplay {
    fn show_model(&mut self, reference: &RenderableReference, radius: ShapeParameter) {
        self.view.borrow_mut().commit(reference, radius);
        let Some(callback) = &self.on_model else {
            return;
        };
        let url = JsValue::from_str(reference.as_str());
        if let Err(err) = callback.call2(&JsValue::NULL, &url, &radius.get().into()) {
            web_sys::console::error_2(&"[WASM] onModel callback threw".into(), &err);
        }
    }

    fn report(&mut self, error: &PipelineError) {
        self.view.borrow_mut().fail(error);
        web_sys::console::warn_1(&format!("[WASM] {error}").into());
    }
}

/// Kernel payload for an optional profile override.
fn payload_source(profile_toml: Option<String>) -> PayloadSource {
    match profile_toml {
        Some(text) if !text.trim().is_empty() => PayloadSource::Inline(text),
        _ => PayloadSource::Builtin,
    }
}

/// A live cube-minus-sphere model driven by a radius slider.
#[wasm_bindgen]
pub struct CutModel {
    sender: ParameterSender,
    view: Rc<RefCell<ViewState>>,
}

#[wasm_bindgen]
impl CutModel {
    /// Load the kernel and start showing the model at the default radius.
    ///
    /// `profile_toml` overrides the kernel profile. Rejects if the kernel
    /// fails to load.
    pub async fn create(
        profile_toml: Option<String>,
        on_model: Option<js_sys::Function>,
    ) -> Result<CutModel, JsError> {
        let source = payload_source(profile_toml);
        let options = LoadOptions::new(move |_| Some(source.clone()));
        let mut pipeline = ModelPipeline::new(ObjectUrlStore::new());
        pipeline
            .initialize(&BuiltinEngineFactory, &options)
            .await
            .map_err(|e| JsError::new(&e.to_string()))?;

        let view = Rc::new(RefCell::new(ViewState::default()));
        let display = CallbackDisplay {
            view: view.clone(),
            on_model,
        };
        let (mut session, sender) = ModelSession::new(pipeline, display);
        sender.submit(SliderSpec::RADIUS.default_parameter());

        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = session.serve().await {
                web_sys::console::error_1(&format!("[WASM] session stopped: {err}").into());
            }
        });

        Ok(CutModel { sender, view })
    }

    /// Request the model at `radius`, snapped to the slider step.
    ///
    /// Returns the snapped radius. The model arrives through `onModel`;
    /// only the newest request is shown.
    #[wasm_bindgen(js_name = setRadius)]
    pub fn set_radius(&self, radius: f64) -> Result<f64, JsError> {
        let parameter = SliderSpec::RADIUS
            .parse(radius)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.sender.submit(parameter);
        Ok(parameter.get())
    }

    /// Object URL of the model on display.
    #[wasm_bindgen(getter, js_name = modelUrl)]
    pub fn model_url(&self) -> Option<String> {
        self.view.borrow().url.clone()
    }

    /// Radius of the model on display.
    #[wasm_bindgen(getter)]
    pub fn radius(&self) -> Option<f64> {
        self.view.borrow().radius
    }

    /// Message of the last failed recompute, cleared by the next commit.
    #[wasm_bindgen(getter, js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }

    /// Slider bounds as `{ min, max, step, default }`.
    pub fn slider() -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&SliderSpec::RADIUS).map_err(|e| JsError::new(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_source() {
        assert_eq!(payload_source(None), PayloadSource::Builtin);
        assert_eq!(payload_source(Some("  ".into())), PayloadSource::Builtin);
        assert_eq!(
            payload_source(Some("sphere_segments = 32".into())),
            PayloadSource::Inline("sphere_segments = 32".into())
        );
    }

    #[test]
    fn test_view_state_commit_clears_error() {
        let mut view = ViewState::default();
        view.fail(&PipelineError::DegenerateGeometry {
            radius: 0.8,
            reason: "empty".into(),
        });
        assert!(view.error.is_some());
        assert!(view.url.is_none());

        let radius = SliderSpec::RADIUS.parse(0.7).unwrap();
        view.commit(&RenderableReference::new("blob:test/1"), radius);
        assert_eq!(view.url.as_deref(), Some("blob:test/1"));
        assert_eq!(view.radius, Some(0.7));
        assert!(view.error.is_none());
    }

    #[test]
    fn test_failure_keeps_model() {
        let mut view = ViewState::default();
        let radius = SliderSpec::RADIUS.parse(0.6).unwrap();
        view.commit(&RenderableReference::new("blob:test/2"), radius);
        view.fail(&PipelineError::NotInitialized);
        assert_eq!(view.url.as_deref(), Some("blob:test/2"));
        assert_eq!(view.radius, Some(0.6));
    }
}
