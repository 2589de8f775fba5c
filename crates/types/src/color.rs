use serde::{de, Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

fn opaque() -> f32 {
    1.0
}

fn is_opaque(alpha: &f32) -> bool {
    *alpha >= 1.0
}

/// An sRGB color with straight (non-premultiplied) alpha.
///
/// Scenes write colors as `#rgb`, `#rrggbb` or `#rrggbbaa`, or as a map
/// `{ "r": .., "g": .., "b": .., "a": .. }` with `a` in `0.0..=1.0`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(skip_serializing_if = "is_opaque", default = "opaque")]
    pub a: f32,
}

// Colors key the paint state of cached meshes.
impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        [self.r, self.g, self.b].hash(state);
        self.a.to_bits().hash(state);
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::gray_const(0);
    pub const WHITE: Color = Color::gray_const(255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };
    /// Highlight used for selection boxes and handles.
    pub const SELECTION: Color = Color { r: 30, g: 120, b: 255, a: 0.6 };

    const fn gray_const(value: u8) -> Self {
        Color {
            r: value,
            g: value,
            b: value,
            a: 1.0,
        }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn gray(value: u8) -> Self {
        Self::gray_const(value)
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0.0
    }

    /// Normalized `[r, g, b, a]` as a backend expects it.
    pub fn to_f32(&self) -> [f32; 4] {
        let unit = |c: u8| f32::from(c) / 255.0;
        [unit(self.r), unit(self.g), unit(self.b), self.a]
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(text: &str) -> Result<Color, String> {
        let text = text.trim();
        let digits = text
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{}' does not start with '#'", text))?;
        let nibbles = digits
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| format!("color '{}' has a non-hex digit", text))?;

        let channels: Vec<u8> = match nibbles.len() {
            3 => nibbles.iter().map(|n| n * 17).collect(),
            6 | 8 => nibbles.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
            n => return Err(format!("color '{}' has {} digits; expected 3, 6 or 8", text, n)),
        };
        let alpha = channels.get(3).map_or(1.0, |a| f32::from(*a) / 255.0);
        Ok(Color::rgba(channels[0], channels[1], channels[2], alpha))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Written {
            Hex(String),
            Channels {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: f32,
            },
        }

        match Written::deserialize(deserializer)? {
            Written::Hex(text) => Self::parse_hex(&text).map_err(de::Error::custom),
            Written::Channels { r, g, b, a } => Ok(Color::rgba(r, g, b, a)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_hex_form() {
        assert_eq!(Color::parse_hex("#f00").unwrap(), Color::rgba(255, 0, 0, 1.0));
        assert_eq!(Color::parse_hex("#00ff80").unwrap(), Color::rgba(0, 255, 128, 1.0));
        assert_eq!(Color::parse_hex("#00000000").unwrap(), Color::TRANSPARENT);
        assert!(Color::parse_hex("00ff80").is_err());
        assert!(Color::parse_hex("#12345").is_err());
        assert!(Color::parse_hex("#ggg").is_err());
    }

    #[test]
    fn map_form_clamps_alpha() {
        let color: Color = serde_json::from_str(r#"{ "r": 1, "g": 2, "b": 3, "a": 4.0 }"#).unwrap();
        assert_eq!(color, Color::rgba(1, 2, 3, 1.0));
    }
}
