use crate::{Justification, Lighting, Margins, TextWrap};
use crate::font::{FontStyle, FontWeight};
use folio_types::{Color, ShaderId, TextureId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single mutation of the ambient [`LayoutState`](crate::LayoutState).
///
/// Attribute drawables carry one of these; drawing them changes the running
/// state seen by later siblings instead of producing geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attr", rename_all = "kebab-case")]
pub enum Attribute {
    Translate { x: f32, y: f32, #[serde(default)] z: f32 },
    Scale { x: f32, y: f32, #[serde(default = "one")] z: f32 },
    Rotate { degrees: f32 },
    ResetTransform,
    FillColor { color: Color },
    LineColor { color: Color },
    LineWidth { width: f32 },
    FontFamily { family: Arc<str> },
    FontSize { size: f32 },
    FontWeight { weight: FontWeight },
    FontStyle { style: FontStyle },
    LineHeight { height: f32 },
    Texture { texture: Option<TextureId> },
    Shader { shader: Option<ShaderId> },
    Lighting { lighting: Lighting },
    Margins { margins: Margins },
    JustifyX { justification: Justification },
    JustifyY { justification: Justification },
    Wrap { wrap: TextWrap },
}

fn one() -> f32 {
    1.0
}

impl Attribute {
    /// True when the attribute only affects appearance (color, texture,
    /// shader, lighting) and never coverage or placement.
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            Attribute::FillColor { .. }
                | Attribute::LineColor { .. }
                | Attribute::Texture { .. }
                | Attribute::Shader { .. }
                | Attribute::Lighting { .. }
        )
    }

    /// True when the attribute changes how text is measured.
    pub fn affects_metrics(&self) -> bool {
        matches!(
            self,
            Attribute::FontFamily { .. }
                | Attribute::FontSize { .. }
                | Attribute::FontWeight { .. }
                | Attribute::FontStyle { .. }
                | Attribute::LineHeight { .. }
                | Attribute::Wrap { .. }
        )
    }
}
