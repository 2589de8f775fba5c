//! Glyph metrics supplied by the host's font stack.

use crate::ProviderError;
use folio_style::FontModel;
use std::collections::HashSet;
use std::fmt::Debug;

/// Answers the few metric questions layout asks about a font.
///
/// Rasterization and shaping stay with the host; the engine only needs
/// advances to measure text and ascent/descent to place baselines.
pub trait FontMetrics: Debug {
    /// Horizontal advance of `ch` in `font`, in layout units.
    fn advance(&self, font: &FontModel, ch: char) -> Result<f32, ProviderError>;

    fn ascent(&self, font: &FontModel) -> f32 {
        font.size * 0.8
    }

    fn descent(&self, font: &FontModel) -> f32 {
        font.size * 0.2
    }
}

/// Metrics where every glyph advances by a fixed fraction of the font size.
///
/// Used by tests and the command line tool, where no real font stack exists.
#[derive(Debug, Clone)]
pub struct FixedAdvanceMetrics {
    pub glyph_ratio: f32,
    pub space_ratio: f32,
    missing: HashSet<char>,
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self {
            glyph_ratio: 0.5,
            space_ratio: 0.25,
            missing: HashSet::new(),
        }
    }
}

impl FixedAdvanceMetrics {
    pub fn new(glyph_ratio: f32, space_ratio: f32) -> Self {
        Self {
            glyph_ratio,
            space_ratio,
            missing: HashSet::new(),
        }
    }

    /// Makes the given character report a missing glyph.
    pub fn with_missing(mut self, ch: char) -> Self {
        self.missing.insert(ch);
        self
    }
}

impl FontMetrics for FixedAdvanceMetrics {
    fn advance(&self, font: &FontModel, ch: char) -> Result<f32, ProviderError> {
        if self.missing.contains(&ch) {
            return Err(ProviderError::MissingGlyph {
                family: font.family.to_string(),
                ch,
            });
        }
        let ratio = if ch.is_whitespace() { self.space_ratio } else { self.glyph_ratio };
        Ok(font.size * ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_advances_scale_with_size() {
        let metrics = FixedAdvanceMetrics::new(0.5, 0.25);
        let font = FontModel::default();
        assert_eq!(metrics.advance(&font, 'a').unwrap(), 6.0);
        assert_eq!(metrics.advance(&font, ' ').unwrap(), 3.0);
    }

    #[test]
    fn missing_glyph_is_an_error() {
        let metrics = FixedAdvanceMetrics::default().with_missing('x');
        assert!(metrics.advance(&FontModel::default(), 'x').is_err());
    }
}
