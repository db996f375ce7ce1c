use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    /// Input lacks the shape needed to render it. Message normalization turns
    /// this into the `none` display variant; it never reaches the renderer.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid view settings: {0}")]
    Settings(#[from] serde_json::Error),
}
