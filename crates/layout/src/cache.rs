use crate::perf::{CacheKind, Profiler};
use crate::shape::{Shape, ShapeKey};
use folio_render_core::Mesh;
use folio_style::FontModel;
use folio_traits::{FontMetrics, ProviderError};
use std::collections::HashMap;
use std::sync::Arc;

/// Tessellated shapes keyed by geometry, in local coordinates.
#[derive(Debug, Default)]
pub struct MeshCache {
    meshes: HashMap<ShapeKey, Arc<Mesh>>,
    capacity: usize,
}

impl MeshCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            meshes: HashMap::new(),
            capacity,
        }
    }

    /// The fill mesh of `shape`, or its stroke when `stroke` carries a width.
    pub fn get(
        &mut self,
        shape: &Shape,
        segments: u32,
        stroke: Option<f32>,
        profiler: &dyn Profiler,
    ) -> Arc<Mesh> {
        let key = shape.cache_key(segments, stroke);
        if let Some(mesh) = self.meshes.get(&key) {
            profiler.count_hit(CacheKind::Mesh);
            return Arc::clone(mesh);
        }
        profiler.count_miss(CacheKind::Mesh);
        if self.capacity > 0 && self.meshes.len() >= self.capacity {
            log::debug!("Mesh cache reached {} entries; resetting", self.meshes.len());
            self.meshes.clear();
        }
        let mesh = Arc::new(match stroke {
            Some(width) => shape.stroke_mesh(segments, width),
            None => shape.fill_mesh(segments),
        });
        self.meshes.insert(key, Arc::clone(&mesh));
        mesh
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

/// Glyph advances per font, filled lazily from the metrics collaborator.
#[derive(Debug, Default)]
pub struct GlyphCache {
    advances: HashMap<FontModel, HashMap<char, f32>>,
    entries: usize,
    capacity: usize,
}

impl GlyphCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            advances: HashMap::new(),
            entries: 0,
            capacity,
        }
    }

    pub fn advance(
        &mut self,
        metrics: &dyn FontMetrics,
        font: &FontModel,
        ch: char,
        profiler: &dyn Profiler,
    ) -> Result<f32, ProviderError> {
        if ch == '\n' {
            return Ok(0.0);
        }
        if let Some(adv) = self.advances.get(font).and_then(|m| m.get(&ch)) {
            profiler.count_hit(CacheKind::Glyph);
            return Ok(*adv);
        }
        profiler.count_miss(CacheKind::Glyph);
        let adv = metrics.advance(font, ch)?;
        if self.capacity > 0 && self.entries >= self.capacity {
            log::debug!("Glyph cache reached {} entries; resetting", self.entries);
            self.clear();
        }
        self.advances.entry(font.clone()).or_default().insert(ch, adv);
        self.entries += 1;
        Ok(adv)
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn clear(&mut self) {
        self.advances.clear();
        self.entries = 0;
    }
}

/// Manages all long-lived caches for the layout engine. Owned by the frame
/// driver and lent to each pass.
#[derive(Debug, Default)]
pub struct LayoutCache {
    pub meshes: MeshCache,
    pub glyphs: GlyphCache,
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            meshes: MeshCache::new(capacity),
            glyphs: GlyphCache::new(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
        self.glyphs.clear();
    }
}
