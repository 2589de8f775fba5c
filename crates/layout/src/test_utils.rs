use crate::cache::LayoutCache;
use crate::context::{Env, MeasureContext, RenderContext};
use crate::perf::DebugProfiler;
use crate::tree::LayoutTree;
use folio_render_core::SoftwareBackend;
use folio_traits::{DisplayHost, FixedAdvanceMetrics, InMemoryTextures};
use folio_types::NodeKey;
use std::collections::BTreeSet;

/// Creates an empty tree with the default configuration.
pub fn create_test_tree() -> LayoutTree {
    LayoutTree::default()
}

/// A display whose selection is a plain set of keys.
#[derive(Debug, Default)]
pub struct TestDisplay {
    pub selection: BTreeSet<NodeKey>,
    pub focused: Option<NodeKey>,
}

impl DisplayHost for TestDisplay {
    fn selected(&self, key: NodeKey) -> u32 {
        u32::from(self.selection.contains(&key))
    }

    fn request_focus(&mut self, key: NodeKey) {
        self.focused = Some(key);
    }
}

/// Owns every collaborator a pass needs, so tests can hand out contexts
/// while the tree stays a separate local.
pub struct TestHarness {
    pub metrics: FixedAdvanceMetrics,
    pub textures: InMemoryTextures,
    pub profiler: DebugProfiler,
    pub cache: LayoutCache,
    pub backend: SoftwareBackend,
    pub display: TestDisplay,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_metrics(FixedAdvanceMetrics::default())
    }

    pub fn with_metrics(metrics: FixedAdvanceMetrics) -> Self {
        Self {
            metrics,
            textures: InMemoryTextures::new(),
            profiler: DebugProfiler::new(),
            cache: LayoutCache::new(1024),
            backend: SoftwareBackend::default(),
            display: TestDisplay::default(),
        }
    }

    pub fn with_missing_glyph(ch: char) -> Self {
        Self::with_metrics(FixedAdvanceMetrics::default().with_missing(ch))
    }

    pub fn measure(&mut self) -> MeasureContext<'_> {
        let env = Env {
            metrics: &self.metrics,
            textures: &self.textures,
            profiler: &self.profiler,
            font_scaling: 1.0,
        };
        MeasureContext::new(env, &mut self.cache)
    }

    pub fn render(&mut self) -> RenderContext<'_> {
        RenderContext {
            env: Env {
                metrics: &self.metrics,
                textures: &self.textures,
                profiler: &self.profiler,
                font_scaling: 1.0,
            },
            cache: &mut self.cache,
            backend: &mut self.backend,
            display: &mut self.display,
        }
    }
}
