use serde::{Deserialize, Serialize};

/// Where flowed text may be broken when a line overflows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextWrap {
    /// Break only between words.
    #[default]
    Word,
    /// Words additionally offer a break between every character.
    Character,
}
