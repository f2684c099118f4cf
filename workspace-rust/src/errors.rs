use thiserror::Error;
use visionprompt_sdk::GatewayError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Generation error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("History error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Image index {index} is out of range for {len} generated images")]
    InvalidIndex { index: usize, len: usize },
    #[error("The gallery already holds the maximum of {0} images")]
    GalleryFull(usize),
    #[error("Invalid reference image: {0}")]
    InvalidReferenceImage(String),
}

/// Failure to read or write history. Never fatal to the generation flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Local history error: {0}")]
    Local(String),
    #[error("Cloud history error: {0}")]
    Remote(String),
    #[error("Stored history is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(error: std::io::Error) -> Self {
        Self::Local(error.to_string())
    }
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
