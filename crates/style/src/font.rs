use crate::StyleParseError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Stroke weight on the usual 1..=1000 scale.
///
/// Written either as a number or as one of the common names
/// (`"thin"`, `"light"`, `"regular"`/`"normal"`, `"medium"`, `"bold"`,
/// `"black"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "WrittenWeight", into = "u16")]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: FontWeight = FontWeight(100);
    pub const LIGHT: FontWeight = FontWeight(300);
    pub const REGULAR: FontWeight = FontWeight(400);
    pub const MEDIUM: FontWeight = FontWeight(500);
    pub const BOLD: FontWeight = FontWeight(700);
    pub const BLACK: FontWeight = FontWeight(900);

    const NAMES: [(&'static str, FontWeight); 7] = [
        ("thin", Self::THIN),
        ("light", Self::LIGHT),
        ("regular", Self::REGULAR),
        ("normal", Self::REGULAR),
        ("medium", Self::MEDIUM),
        ("bold", Self::BOLD),
        ("black", Self::BLACK),
    ];

    pub fn is_bold(&self) -> bool {
        *self >= Self::BOLD
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::REGULAR
    }
}

impl From<FontWeight> for u16 {
    fn from(weight: FontWeight) -> u16 {
        weight.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WrittenWeight {
    Number(u16),
    Name(String),
}

impl TryFrom<WrittenWeight> for FontWeight {
    type Error = StyleParseError;

    fn try_from(written: WrittenWeight) -> Result<Self, Self::Error> {
        let weight = match written {
            WrittenWeight::Number(n) => FontWeight(n),
            WrittenWeight::Name(name) => {
                let lower = name.trim().to_lowercase();
                match Self::NAMES.iter().find(|(n, _)| *n == lower) {
                    Some(&(_, weight)) => weight,
                    None => lower
                        .parse()
                        .map(FontWeight)
                        .map_err(|_| StyleParseError::UnknownKeyword("font weight", name))?,
                }
            }
        };
        if (1..=1000).contains(&weight.0) {
            Ok(weight)
        } else {
            Err(StyleParseError::UnknownKeyword("font weight", weight.0.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// The font selection part of the ambient state.
///
/// `line_height` is the vertical advance reserved per line; it is kept
/// separately from `size` so content can tighten or loosen leading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontModel {
    pub family: Arc<str>,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub line_height: f32,
}

/// Leading applied when a size is set on a font without one.
const DEFAULT_LEADING: f32 = 1.2;

impl Default for FontModel {
    fn default() -> Self {
        Self {
            family: Arc::from("Sans"),
            size: 12.0,
            weight: FontWeight::REGULAR,
            style: FontStyle::Normal,
            line_height: 12.0 * DEFAULT_LEADING,
        }
    }
}

// Fonts key the glyph cache; sizes are compared bitwise.
impl Eq for FontModel {}

impl Hash for FontModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (&self.family, self.weight, self.style).hash(state);
        (self.size.to_bits(), self.line_height.to_bits()).hash(state);
    }
}

impl FontModel {
    /// Changes the size and rescales the line height by the same factor.
    pub fn set_size(&mut self, size: f32) {
        self.line_height = if self.size > 0.0 {
            self.line_height * size / self.size
        } else {
            size * DEFAULT_LEADING
        };
        self.size = size;
    }

    /// The same font under a display scaling factor (zoom times printer
    /// resolution).
    pub fn scaled(&self, factor: f32) -> FontModel {
        let mut scaled = self.clone();
        scaled.size *= factor;
        scaled.line_height *= factor;
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_size_keeps_leading_ratio() {
        let mut font = FontModel::default();
        font.set_size(24.0);
        assert!((font.line_height - 28.8).abs() < 1e-4);
    }

    #[test]
    fn weights_read_names_and_numbers() {
        let bold: FontWeight = serde_json::from_str(r#""Bold""#).unwrap();
        assert!(bold.is_bold());
        let numeric: FontWeight = serde_json::from_str(r#""650""#).unwrap();
        assert_eq!(numeric, FontWeight(650));
        assert_eq!(serde_json::from_str::<FontWeight>("300").unwrap(), FontWeight::LIGHT);
        assert!(serde_json::from_str::<FontWeight>("0").is_err());
        assert!(serde_json::from_str::<FontWeight>(r#""heavy-ish""#).is_err());
    }
}
