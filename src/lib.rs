//! Folio: a retained-mode layout and rendering engine for live documents.
//!
//! The engine itself lives in `folio-layout`; this crate adds the pieces a
//! host needs around it: a frame driver, a selection-tracking display, a
//! thread-safe inbox for decoded images, JSON scenes and configuration.

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod inbox;
pub mod scene;

pub use config::{FrameConfig, PageConfig};
pub use display::{Display, Selection};
pub use driver::{FrameDriver, FrameReport};
pub use error::FolioError;
pub use inbox::{Delivery, InboxSender, ResourceInbox};
pub use scene::{Scene, SceneItem};

pub use folio_layout as layout;
pub use folio_render_core as render;
pub use folio_style as style;
pub use folio_traits as traits;
pub use folio_types as types;
