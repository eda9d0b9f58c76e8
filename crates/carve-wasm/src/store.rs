//! Object-URL resource store backed by browser Blobs.

use std::collections::HashSet;

use carve_export::{ExportError, RenderableReference, ResourceStore, Result};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Publishes payloads as `blob:` object URLs.
///
/// URLs still live when the store is dropped are revoked.
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    live: HashSet<String>,
}

impl ObjectUrlStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn store_error(err: JsValue) -> ExportError {
    ExportError::Store(format!("{err:?}"))
}

impl ResourceStore for ObjectUrlStore {
    fn publish(&mut self, bytes: Vec<u8>, mime: &str) -> Result<RenderableReference> {
        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes.as_slice()));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob =
            Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(store_error)?;
        let url = Url::create_object_url_with_blob(&blob).map_err(store_error)?;
        self.live.insert(url.clone());
        Ok(RenderableReference::new(url))
    }

    fn revoke(&mut self, reference: &RenderableReference) -> bool {
        if !self.live.remove(reference.as_str()) {
            return false;
        }
        if let Err(err) = Url::revoke_object_url(reference.as_str()) {
            web_sys::console::warn_2(&"[WASM] revoke failed".into(), &err);
        }
        true
    }

    fn live(&self) -> usize {
        self.live.len()
    }
}

impl Drop for ObjectUrlStore {
    fn drop(&mut self) {
        for url in self.live.drain() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}
