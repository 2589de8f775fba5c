use folio_types::{Color, ShaderId, TextureId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Lighting {
    pub enabled: bool,
    pub ambient: f32,
}

/// Purely visual attributes. None of these matter for hit testing, so the
/// identify pass never forwards them to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintModel {
    pub fill: Color,
    pub line: Color,
    pub line_width: f32,
    pub texture: Option<TextureId>,
    pub shader: Option<ShaderId>,
    pub lighting: Lighting,
}

impl Default for PaintModel {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            line: Color::TRANSPARENT,
            line_width: 1.0,
            texture: None,
            shader: None,
            lighting: Lighting::default(),
        }
    }
}

impl PaintModel {
    pub fn has_outline(&self) -> bool {
        self.line.is_visible() && self.line_width > 0.0
    }
}
