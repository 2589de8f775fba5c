pub mod display;
pub mod font;
pub mod resource;

pub use display::{DisplayHost, NullDisplay};
pub use font::{FixedAdvanceMetrics, FontMetrics};
pub use resource::{InMemoryTextures, ResourceState, TextureSource};

use thiserror::Error;

/// Error type for failures reported by external collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("No glyph metrics for '{ch}' in font '{family}'")]
    MissingGlyph { family: String, ch: char },

    #[error("Font '{0}' is not available")]
    FontUnavailable(String),

    #[error("Resource '{0}' failed to load: {1}")]
    ResourceFailed(String, String),

    #[error("Collaborator failure: {0}")]
    Other(String),
}
