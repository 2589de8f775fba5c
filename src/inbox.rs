//! Hand-over of decoded images from producer threads to the render thread.
//!
//! Producers decode off the render thread and push finished results through
//! an `async_channel`. The frame driver drains the queue at the start of each
//! frame; until a result lands, lookups report `Pending` and the image draws
//! a placeholder.

use crate::error::FolioError;
use folio_traits::{ResourceState, TextureSource};
use folio_types::{ResourceUri, Size, TextureId};
use std::collections::HashMap;

/// One finished (or failed) resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub uri: ResourceUri,
    pub state: ResourceState,
}

/// Producer end. Cheap to clone; one per decoding thread or task.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: async_channel::Sender<Delivery>,
}

impl InboxSender {
    /// Delivers from a plain thread, waiting while a bounded inbox is full.
    pub fn deliver(&self, uri: impl Into<ResourceUri>, texture: TextureId, size: Size) -> Result<(), FolioError> {
        self.send_blocking(Delivery {
            uri: uri.into(),
            state: ResourceState::Ready { texture, size },
        })
    }

    /// Reports a resource that will never arrive.
    pub fn fail(&self, uri: impl Into<ResourceUri>, reason: impl Into<String>) -> Result<(), FolioError> {
        self.send_blocking(Delivery {
            uri: uri.into(),
            state: ResourceState::Failed(reason.into()),
        })
    }

    /// Delivers from an async task.
    pub async fn send(&self, delivery: Delivery) -> Result<(), FolioError> {
        self.tx.send(delivery).await.map_err(|_| FolioError::InboxClosed)
    }

    fn send_blocking(&self, delivery: Delivery) -> Result<(), FolioError> {
        self.tx.send_blocking(delivery).map_err(|_| FolioError::InboxClosed)
    }
}

/// Consumer end, owned by the render thread. Doubles as the texture source
/// handed to every pass.
#[derive(Debug)]
pub struct ResourceInbox {
    rx: async_channel::Receiver<Delivery>,
    textures: HashMap<ResourceUri, ResourceState>,
}

impl ResourceInbox {
    pub fn unbounded() -> (Self, InboxSender) {
        Self::from_channel(async_channel::unbounded())
    }

    pub fn bounded(capacity: usize) -> (Self, InboxSender) {
        Self::from_channel(async_channel::bounded(capacity.max(1)))
    }

    fn from_channel(
        (tx, rx): (async_channel::Sender<Delivery>, async_channel::Receiver<Delivery>),
    ) -> (Self, InboxSender) {
        let inbox = Self {
            rx,
            textures: HashMap::new(),
        };
        (inbox, InboxSender { tx })
    }

    /// Moves everything delivered so far into the texture table. Returns
    /// how many deliveries landed.
    pub fn drain(&mut self) -> usize {
        let mut landed = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            match &delivery.state {
                ResourceState::Failed(reason) => {
                    log::warn!("Resource '{}' failed: {}", delivery.uri, reason)
                }
                _ => log::debug!("Resource '{}' landed", delivery.uri),
            }
            self.textures.insert(delivery.uri, delivery.state);
            landed += 1;
        }
        landed
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureSource for ResourceInbox {
    fn texture(&self, uri: &ResourceUri) -> ResourceState {
        self.textures.get(uri).cloned().unwrap_or(ResourceState::Pending)
    }
}
