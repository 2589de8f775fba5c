use crate::error::FolioError;
use folio_layout::{LayoutConfig, PageLayout};
use folio_style::{Margins, PageSize};
use folio_types::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry used for pages a scene does not size itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    pub margins: Margins,
    pub columns: usize,
    pub gap: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margins: Margins::all(36.0),
            columns: 1,
            gap: 18.0,
        }
    }
}

impl PageConfig {
    pub fn build(&self) -> PageLayout {
        let (width, height) = self.size.dimensions();
        PageLayout::new(Size::new(width, height))
            .with_margins(self.margins)
            .with_columns(self.columns.max(1), self.gap)
    }
}

/// Settings of the frame driver and the command line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Half the side of the square a point pick samples.
    pub pick_radius: f32,

    /// Glyph advance as a fraction of the font size, for hosts without a
    /// font stack.
    pub glyph_advance: f32,

    /// Space advance as a fraction of the font size.
    pub space_advance: f32,

    /// Screen zoom applied to every font size.
    pub zoom: f32,

    /// Collects pass timings and logs a summary after every frame.
    pub profiling: bool,

    pub page: PageConfig,

    pub layout: LayoutConfig,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            pick_radius: 2.0,
            glyph_advance: 0.5,
            space_advance: 0.25,
            zoom: 1.0,
            profiling: false,
            page: PageConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl FrameConfig {
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FolioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
