use folio_layout::LayoutError;
use folio_render_core::RenderError;
use folio_traits::ProviderError;
use thiserror::Error;

/// Everything that can go wrong driving frames, loading scenes or reading
/// configuration.
#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Collaborator failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scene is invalid: {0}")]
    Scene(String),

    #[error("Resource inbox is closed")]
    InboxClosed,
}
