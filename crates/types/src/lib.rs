pub mod color;
pub mod geometry;
pub mod ids;

pub use color::Color;
pub use geometry::{Box3, Point, Rect, Size, Transform};
pub use ids::{EventCategory, FlowName, NodeKey, RefreshName, ResourceUri, ShaderId, TextureId};
