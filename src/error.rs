use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;

/// Main error type for findex operations
#[derive(Error, Debug)]
pub enum FindexError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// Index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Embedding errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Post-run dictionary-scale check tripped
    #[error(
        "indexed {doc_count} documents against a {dict_bytes}-byte vector dictionary; \
         this looks like a sample dictionary used at scale (set FINDEX_SMOKETEST to bypass)"
    )]
    ToyDictionary { doc_count: u64, dict_bytes: u64 },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for findex operations
pub type Result<T> = std::result::Result<T, FindexError>;
