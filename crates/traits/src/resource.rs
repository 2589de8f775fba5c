//! Access to resources produced outside the render thread.

use folio_types::{ResourceUri, Size, TextureId};
use std::collections::HashMap;
use std::fmt::Debug;

/// Whether an asynchronously produced resource can be drawn yet.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState {
    Ready { texture: TextureId, size: Size },
    Pending,
    Failed(String),
}

/// Lookup of already-decoded textures.
///
/// Implementations never block: work in flight reports `Pending` and the
/// engine substitutes a placeholder.
pub trait TextureSource: Debug {
    fn texture(&self, uri: &ResourceUri) -> ResourceState;
}

/// A texture source backed by a plain map, for tests and offline use.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTextures {
    entries: HashMap<ResourceUri, ResourceState>,
}

impl InMemoryTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<ResourceUri>, state: ResourceState) {
        self.entries.insert(uri.into(), state);
    }
}

impl TextureSource for InMemoryTextures {
    fn texture(&self, uri: &ResourceUri) -> ResourceState {
        self.entries.get(uri).cloned().unwrap_or(ResourceState::Pending)
    }
}
