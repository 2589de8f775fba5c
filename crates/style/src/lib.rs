pub mod attribute;
pub mod dimension;
pub mod font;
pub mod justification;
pub mod paint;
pub mod state;
pub mod text;

pub use attribute::Attribute;
pub use dimension::{Margins, NamedPage, PageSize};
pub use font::{FontModel, FontStyle, FontWeight};
pub use justification::Justification;
pub use paint::{Lighting, PaintModel};
pub use state::LayoutState;
pub use text::TextWrap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Invalid length '{0}': {1}")]
    Length(String, String),
    #[error("Expected 1, 2 or 4 margin values, got {0}")]
    MarginCount(usize),
    #[error("Unknown {0}: '{1}'")]
    UnknownKeyword(&'static str, String),
}
