//! Display resources and their locators.
//!
//! A [`ResourceStore`] turns encoded bytes into a [`RenderableReference`]
//! a viewer can load, and releases it again once the reference is stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::error::Result;

/// Locator of an exported resource, e.g. `blob:carve/7` or an object URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderableReference(String);

impl RenderableReference {
    /// Wrap a locator string issued by a store.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and revokes display resources.
pub trait ResourceStore {
    /// Store `bytes` and return a fresh locator. Never returns a locator
    /// that was issued before.
    fn publish(&mut self, bytes: Vec<u8>, mime: &str) -> Result<RenderableReference>;

    /// Release a resource. Returns false if the locator was not live.
    fn revoke(&mut self, reference: &RenderableReference) -> bool;

    /// Number of resources currently held.
    fn live(&self) -> usize;
}

/// A stored resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// MIME type.
    pub mime: String,
    /// Encoded payload.
    pub bytes: Vec<u8>,
}

/// Global counter for unique in-memory locators.
static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// In-memory store issuing `blob:carve/<n>` locators.
#[derive(Debug, Default)]
pub struct MemoryStore {
    resources: HashMap<RenderableReference, Resource>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live resource.
    pub fn get(&self, reference: &RenderableReference) -> Option<&Resource> {
        self.resources.get(reference)
    }
}

impl ResourceStore for MemoryStore {
    fn publish(&mut self, bytes: Vec<u8>, mime: &str) -> Result<RenderableReference> {
        let id = NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed);
        let reference = RenderableReference::new(format!("blob:carve/{id}"));
        trace!(%reference, len = bytes.len(), mime, "publish");
        self.resources.insert(
            reference.clone(),
            Resource {
                mime: mime.to_string(),
                bytes,
            },
        );
        Ok(reference)
    }

    fn revoke(&mut self, reference: &RenderableReference) -> bool {
        trace!(%reference, "revoke");
        self.resources.remove(reference).is_some()
    }

    fn live(&self) -> usize {
        self.resources.len()
    }
}
