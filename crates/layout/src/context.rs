use crate::cache::LayoutCache;
use crate::perf::Profiler;
use folio_render_core::GraphicsBackend;
use folio_traits::{DisplayHost, FontMetrics, TextureSource};

/// Read-only collaborators shared by every pass of a frame.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub metrics: &'a dyn FontMetrics,
    pub textures: &'a dyn TextureSource,
    pub profiler: &'a dyn Profiler,
    /// Display zoom times printer scaling; multiplies every font size.
    pub font_scaling: f32,
}

/// What sizing and pagination need: collaborators plus the mutable caches.
pub struct MeasureContext<'a> {
    pub env: Env<'a>,
    pub cache: &'a mut LayoutCache,
}

impl<'a> MeasureContext<'a> {
    pub fn new(env: Env<'a>, cache: &'a mut LayoutCache) -> Self {
        Self { env, cache }
    }
}

/// Everything a draw, selection or identify pass talks to.
pub struct RenderContext<'a> {
    pub env: Env<'a>,
    pub cache: &'a mut LayoutCache,
    pub backend: &'a mut dyn GraphicsBackend,
    pub display: &'a mut dyn DisplayHost,
}

impl<'a> RenderContext<'a> {
    pub fn measure(&mut self) -> MeasureContext<'_> {
        MeasureContext {
            env: self.env,
            cache: &mut *self.cache,
        }
    }
}
