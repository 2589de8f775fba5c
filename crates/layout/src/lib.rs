use folio_render_core::RenderError;
use folio_traits::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Drawable {0:?} no longer exists.")]
    StaleId(tree::DrawableId),
    #[error("Kind mismatch: Expected {expected} drawable, got {found}.")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("A {0} drawable cannot hold children.")]
    NotAContainer(&'static str),
    #[error("Table of {rows}x{columns} has no room for another cell.")]
    TableFull { rows: usize, columns: usize },
    #[error("The root layout cannot be removed.")]
    RootRemoval,
    #[error("Extension '{name}' failed: {message}")]
    Extension { name: String, message: String },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod cache;
pub mod config;
pub mod context;
pub mod drawable;
pub mod evaluate;
pub mod flow;
pub mod justify;
pub mod layout;
pub mod line;
pub mod measure;
pub mod page;
pub mod perf;
pub mod refresh;
pub mod render;
pub mod select;
pub mod shape;
pub mod table;
pub mod text;
pub mod tree;

pub use self::cache::{GlyphCache, LayoutCache, MeshCache};
pub use self::config::LayoutConfig;
pub use self::context::{Env, MeasureContext, RenderContext};
pub use self::drawable::{Drawable, Extension, Handle, Image};
pub use self::evaluate::EvaluateStats;
pub use self::flow::{FlowAnchor, TextFlow};
pub use self::justify::{BreakOrder, Justifiable, Justified, Justifier, Place, Split, UnitEnd};
pub use self::layout::{ContentSource, Layout};
pub use self::line::{LayoutLine, LineItem};
pub use self::page::{Column, PageLayout, PendingItem};
pub use self::perf::{CacheKind, DebugProfiler, NoOpProfiler, Profiler, SectionTiming};
pub use self::refresh::{FrameSchedule, RefreshInfo};
pub use self::render::{Pass, RenderStats};
pub use self::select::{apply_marquee, Corner, IdentifyEntry, IdentifyMap, MarqueeMode, PickResult, Picker};
pub use self::shape::Shape;
pub use self::table::{CellAlign, Table};
pub use self::text::{PieceKind, TextPiece, TextSpan};
pub use self::tree::{DrawableId, LayoutTree, Node};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod refresh_test;
#[cfg(test)]
mod render_test;
#[cfg(test)]
mod select_test;
#[cfg(test)]
mod table_test;
