//! Run configuration for the indexing pipeline
//!
//! Everything that governs one indexing run is carried explicitly in these
//! values; the pipeline holds no ambient or process-global state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Write discipline, fixed for the duration of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Fresh index; every document is a blind insert
    #[default]
    Create,
    /// Existing index; each write replaces any document with the same path
    Upsert,
}

/// Configuration for one indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding the index
    pub index_dir: PathBuf,
    /// Root of the document tree to index
    pub docs_root: PathBuf,
    /// Optional token-vector dictionary source enabling embedding augmentation
    pub dict_source: Option<PathBuf>,
    /// Write discipline applied to every document
    pub mode: WriteMode,
}

/// Index writer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Heap given to the index writer before it flushes a segment
    pub writer_heap_bytes: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            writer_heap_bytes: 50_000_000, // 50MB buffer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mode_defaults_to_create() {
        assert_eq!(WriteMode::default(), WriteMode::Create);
    }

    #[test]
    fn write_mode_serializes_lowercase() {
        let json = serde_json::to_string(&WriteMode::Upsert).unwrap();
        assert_eq!(json, "\"upsert\"");
    }
}
