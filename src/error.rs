use std::path::PathBuf;

/// Fatal errors: any of these stops the run before remote playlists are touched.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("playlists file not found: {}", path.display())]
    InputMissing { path: PathBuf },
    #[error("failed to read playlists file {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid playlists file {}: {source}", path.display())]
    InputParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to initialize YouTube Music client: {0:#}")]
    Initialization(anyhow::Error),
    #[error("failed to list library playlists: {0:#}")]
    Library(anyhow::Error),
}

/// Failures reported by the remote service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// HTTP 409. Safe to retry.
    #[error("409 Conflict: {0}")]
    Conflict(String),
    #[error("request failed with HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request rejected by service: {0}")]
    Rejected(String),
    #[error("unexpected response shape: missing {0}")]
    Malformed(&'static str),
}

impl ApiError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

/// True when the error chain carries an [`ApiError::Conflict`].
pub fn is_conflict(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<ApiError>())
        .any(ApiError::is_conflict)
}
