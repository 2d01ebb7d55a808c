
use thiserror::Error;

/// Errors raised while building or training term vectors.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The corpus carries no term-position data, so no window can be rebuilt.
    #[error("term-term training requires a corpus with term position data; rebuild the index with positions")]
    MissingPositions,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A single document could not be read from the corpus.
    #[error("could not load document {doc_id}: {message}")]
    DocumentLoad { doc_id: usize, message: String },

    /// A window offset fell outside the precomputed encoding tables.
    #[error("window out of bounds in document {doc_id}: {message}")]
    Window { doc_id: usize, message: String },

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("npy error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

impl TrainError {

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn window(doc_id: usize, message: impl Into<String>) -> Self {
        Self::Window { doc_id, message: message.into() }
    }

    pub fn document_load(doc_id: usize, message: impl Into<String>) -> Self {
        Self::DocumentLoad { doc_id, message: message.into() }
    }

    /// Recoverable errors skip one document; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DocumentLoad { .. } | Self::Window { .. })
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
