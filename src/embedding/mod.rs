/// Embedding augmentation
///
/// A token-vector dictionary is compiled from a plain-text source into the
/// index directory, then an embedder folds document content into a single
/// unit-length vector by summing per-token vectors. Dot product over the
/// resulting vectors is the intended similarity function.
mod dict;
mod embedder;

pub use dict::{VectorDict, KNN_DICT_NAME};
pub use embedder::Embedder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Dictionary build failed: {0}")]
    BuildError(String),

    #[error("Dictionary not found: {0}")]
    DictNotFound(String),

    #[error("Malformed dictionary entry at line {line}: {message}")]
    MalformedEntry { line: usize, message: String },

    #[error("Dimension mismatch at line {line}: expected {expected}, got {actual}")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
