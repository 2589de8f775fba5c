//! Insets and page sizes, in points.
use crate::StyleParseError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Space kept free around content. Reserved by `Space` but not part of
/// `Bounds`; pages use it as the printable inset.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(try_from = "WrittenMargins")]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Hash for Margins {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for side in [self.top, self.right, self.bottom, self.left] {
            side.to_bits().hash(state);
        }
    }
}

impl Eq for Margins {}

impl Margins {
    pub fn all(value: f32) -> Self {
        Self::symmetric(value, value)
    }

    /// `x` left and right, `y` top and bottom.
    pub fn symmetric(x: f32, y: f32) -> Self {
        Self {
            top: y,
            right: x,
            bottom: y,
            left: x,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// A length in points, or with a `pt`, `px`, `in`, `cm` or `mm` suffix.
    pub fn parse_length(input: &str) -> Result<f32, StyleParseError> {
        const UNITS: [(&str, f32); 5] = [("pt", 1.0), ("px", 1.0), ("in", 72.0), ("cm", 72.0 / 2.54), ("mm", 72.0 / 25.4)];
        let input = input.trim();
        let (number, points_per_unit) = UNITS
            .iter()
            .find_map(|&(unit, factor)| input.strip_suffix(unit).map(|n| (n, factor)))
            .unwrap_or((input, 1.0));
        let value: f32 = number
            .trim()
            .parse()
            .map_err(|e: std::num::ParseFloatError| StyleParseError::Length(input.to_string(), e.to_string()))?;
        Ok(value * points_per_unit)
    }

    /// One, two or four lengths: all sides; vertical then horizontal; or
    /// top, right, bottom, left.
    pub fn parse_shorthand(input: &str) -> Result<Self, StyleParseError> {
        let lengths: Vec<f32> = input
            .split_whitespace()
            .map(Self::parse_length)
            .collect::<Result<_, _>>()?;
        match lengths[..] {
            [all] => Ok(Margins::all(all)),
            [y, x] => Ok(Margins::symmetric(x, y)),
            [top, right, bottom, left] => Ok(Margins {
                top,
                right,
                bottom,
                left,
            }),
            _ => Err(StyleParseError::MarginCount(lengths.len())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WrittenMargins {
    Uniform(f32),
    Shorthand(String),
    Sides {
        #[serde(default)]
        top: f32,
        #[serde(default)]
        right: f32,
        #[serde(default)]
        bottom: f32,
        #[serde(default)]
        left: f32,
    },
}

impl TryFrom<WrittenMargins> for Margins {
    type Error = StyleParseError;

    fn try_from(written: WrittenMargins) -> Result<Self, Self::Error> {
        match written {
            WrittenMargins::Uniform(value) => Ok(Margins::all(value)),
            WrittenMargins::Shorthand(text) => Margins::parse_shorthand(&text),
            WrittenMargins::Sides {
                top,
                right,
                bottom,
                left,
            } => Ok(Margins {
                top,
                right,
                bottom,
                left,
            }),
        }
    }
}

/// Named or explicit page dimensions. Named sizes may be followed by
/// `landscape`, e.g. `"a4 landscape"`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "WrittenPageSize")]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Landscape(NamedPage),
    Custom { width: f32, height: f32 },
}

/// The portrait sizes that can be turned on their side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NamedPage {
    A4,
    A5,
    Letter,
    Legal,
}

impl NamedPage {
    fn portrait(self) -> (f32, f32) {
        match self {
            NamedPage::A4 => (595.28, 841.89),
            NamedPage::A5 => (419.53, 595.28),
            NamedPage::Letter => (612.0, 792.0),
            NamedPage::Legal => (612.0, 1008.0),
        }
    }
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => NamedPage::A4.portrait(),
            PageSize::A5 => NamedPage::A5.portrait(),
            PageSize::Letter => NamedPage::Letter.portrait(),
            PageSize::Legal => NamedPage::Legal.portrait(),
            PageSize::Landscape(named) => {
                let (w, h) = named.portrait();
                (h, w)
            }
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WrittenPageSize {
    Named(String),
    Explicit { width: f32, height: f32 },
}

impl TryFrom<WrittenPageSize> for PageSize {
    type Error = StyleParseError;

    fn try_from(written: WrittenPageSize) -> Result<Self, Self::Error> {
        let text = match written {
            WrittenPageSize::Explicit { width, height } => return Ok(PageSize::Custom { width, height }),
            WrittenPageSize::Named(text) => text,
        };
        let lower = text.to_lowercase();
        let mut words = lower.split_whitespace();
        let named = match words.next() {
            Some("a4") => NamedPage::A4,
            Some("a5") => NamedPage::A5,
            Some("letter") => NamedPage::Letter,
            Some("legal") => NamedPage::Legal,
            _ => return Err(StyleParseError::UnknownKeyword("page size", text)),
        };
        match (words.next(), words.next()) {
            (None, _) | (Some("portrait"), None) => Ok(match named {
                NamedPage::A4 => PageSize::A4,
                NamedPage::A5 => PageSize::A5,
                NamedPage::Letter => PageSize::Letter,
                NamedPage::Legal => PageSize::Legal,
            }),
            (Some("landscape"), None) => Ok(PageSize::Landscape(named)),
            _ => Err(StyleParseError::UnknownKeyword("page orientation", text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lengths_with_units() {
        assert_eq!(Margins::parse_length("12").unwrap(), 12.0);
        assert_eq!(Margins::parse_length("1in").unwrap(), 72.0);
        assert!((Margins::parse_length("2.54cm").unwrap() - 72.0).abs() < 1e-3);
        assert!(Margins::parse_length("abc").is_err());
    }

    #[test]
    fn parses_shorthand() {
        assert_eq!(Margins::parse_shorthand("5 10").unwrap(), Margins::symmetric(10.0, 5.0));
        assert_eq!(
            Margins::parse_shorthand("1 2 3").unwrap_err(),
            StyleParseError::MarginCount(3)
        );
    }

    #[test]
    fn margins_accept_number_text_and_sides() {
        let uniform: Margins = serde_json::from_str("6").unwrap();
        assert_eq!(uniform, Margins::all(6.0));
        let text: Margins = serde_json::from_str(r#""1in 0""#).unwrap();
        assert_eq!(text, Margins::symmetric(0.0, 72.0));
        let sides: Margins = serde_json::from_str(r#"{ "left": 4 }"#).unwrap();
        assert_eq!(sides.horizontal(), 4.0);
        assert!(serde_json::from_str::<Margins>(r#""1 2 3""#).is_err());
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let size: PageSize = serde_json::from_str(r#""Letter landscape""#).unwrap();
        assert_eq!(size.dimensions(), (792.0, 612.0));
        let size: PageSize = serde_json::from_str(r#""a5""#).unwrap();
        assert_eq!(size, PageSize::A5);
        assert!(serde_json::from_str::<PageSize>(r#""a4 sideways""#).is_err());
        assert!(serde_json::from_str::<PageSize>(r#""tabloid""#).is_err());
    }
}
