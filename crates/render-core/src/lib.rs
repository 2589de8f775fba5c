//! Core rendering abstractions.
//!
//! This crate provides the seam between the layout engine and a GPU:
//! - `GraphicsBackend`, the "bind state / submit vertices / identify / read
//!   back hits" contract
//! - mesh, state-change and selection-id types shared by both sides
//! - `SoftwareBackend`, a reference backend that records draw commands and
//!   rasterizes identify passes into an id+depth target on the CPU

mod error;
mod software;
mod traits;
mod types;

pub use error::RenderError;
pub use software::{DrawCommand, HitBuffer, SoftwareBackend};
pub use traits::GraphicsBackend;
pub use types::{HitRecord, Mesh, RenderMode, SelectionCategory, SelectionId, StateChange};
