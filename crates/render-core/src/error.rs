use thiserror::Error;

/// Failures raised by a backend while a pass is being submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The call is only meaningful in the named render mode.
    #[error("{expected} mode required for this call")]
    InvalidMode { expected: &'static str },
    #[error("Mesh rejected: {0}")]
    MalformedMesh(String),
}
