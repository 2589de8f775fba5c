use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// The maximum number of entries kept in each of the layout caches
    /// (tessellated meshes, glyph advances) before the cache is reset.
    ///
    /// - **Higher values**: fewer re-tessellations and metric lookups, but
    ///   higher memory usage.
    /// - **Lower values**: lower memory usage, more work per frame.
    ///
    /// Defaults to `10000`.
    pub cache_capacity: usize,

    /// Number of segments used to tessellate a full ellipse. Rounded
    /// rectangle corners use a quarter of this each.
    pub ellipse_segments: u32,

    /// Edge length of the automatic corner handles drawn around selected
    /// drawables.
    pub handle_size: f32,

    /// How far in front of their owner automatic handles are placed.
    pub handle_depth_bias: f32,

    /// Extra room drawn around the selection highlight.
    pub highlight_inset: f32,

    /// Upper bound on how many named dependencies are followed when folding
    /// refresh metadata.
    pub max_dependency_depth: usize,

    /// When set, identify passes tag each text glyph with its own character
    /// id instead of one id for the whole span.
    pub identify_characters: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10000,
            ellipse_segments: 32,
            handle_size: 6.0,
            handle_depth_bias: 1e-3,
            highlight_inset: 2.0,
            max_dependency_depth: 16,
            identify_characters: true,
        }
    }
}
