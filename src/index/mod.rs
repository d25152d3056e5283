/// Tantivy-backed document index
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::TermQuery;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};
use thiserror::Error;

use crate::config::TuningConfig;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Commit failed: {0}")]
    CommitError(String),

    #[error("Lookup failed: {0}")]
    LookupError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Tantivy error: {0}")]
    TantivyError(#[from] TantivyError),
}

/// One file's worth of indexable attributes
///
/// Constructed fresh per file, consumed by the write call, never retained.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Filesystem path, doubling as the unique key in upsert mode
    pub path: String,
    /// Last modification time, milliseconds since epoch
    pub modified_ms: i64,
    /// Decoded text content; tokenized and indexed but not stored
    pub content: String,
    /// Fixed-length embedding, present only when an embedder is configured
    pub embedding: Option<Vec<f32>>,
}

/// Stored attributes read back from the index
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub path: String,
    pub modified_ms: i64,
    pub embedding: Option<Vec<f32>>,
}

/// Tantivy index wrapper
///
/// Exposes the write surface the pipeline needs: blind insert, keyed
/// replacement, and a commit that reports the resulting document count.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: IndexWriter,
    path_field: Field,
    modified_field: Field,
    content_field: Field,
    embedding_field: Field,
    #[allow(dead_code)]
    index_path: PathBuf,
}

impl SearchIndex {
    /// Open a fresh index, discarding any previous index at this path
    pub fn create(index_path: &Path, tuning: &TuningConfig) -> Result<Self, IndexError> {
        // Truncate-on-create: a prior index (and its dictionary artifact)
        // is removed wholesale
        if index_path.join("meta.json").exists() {
            std::fs::remove_dir_all(index_path)?;
        }
        std::fs::create_dir_all(index_path)?;

        let index = Index::create_in_dir(index_path, Self::build_schema())
            .map_err(|e| IndexError::InitializationError(e.to_string()))?;

        Self::with_index(index, index_path.to_path_buf(), tuning)
    }

    /// Open an existing index for keyed replacement, creating an empty one
    /// if none exists yet
    pub fn open_or_create(index_path: &Path, tuning: &TuningConfig) -> Result<Self, IndexError> {
        if index_path.join("meta.json").exists() {
            Self::load(index_path, tuning)
        } else {
            std::fs::create_dir_all(index_path)?;
            let index = Index::create_in_dir(index_path, Self::build_schema())
                .map_err(|e| IndexError::InitializationError(e.to_string()))?;
            Self::with_index(index, index_path.to_path_buf(), tuning)
        }
    }

    fn load(index_path: &Path, tuning: &TuningConfig) -> Result<Self, IndexError> {
        if !index_path.exists() {
            return Err(IndexError::IndexNotFound(
                index_path.display().to_string(),
            ));
        }

        let index = Index::open_in_dir(index_path)
            .map_err(|e| IndexError::InitializationError(e.to_string()))?;

        Self::with_index(index, index_path.to_path_buf(), tuning)
    }

    fn build_schema() -> Schema {
        let mut schema_builder = Schema::builder();

        // Raw (untokenized) path, stored so lookups can return it and
        // indexed so it can serve as the replacement key
        schema_builder.add_text_field("path", STRING | STORED);
        // Millisecond timestamp, range-filterable and stored verbatim
        schema_builder.add_i64_field("modified", INDEXED | STORED | FAST);
        // Tokenized content, searchable but not stored
        schema_builder.add_text_field("content", TEXT);
        // Little-endian f32 embedding bytes; dot-product similarity convention
        schema_builder.add_bytes_field("embedding", STORED);

        schema_builder.build()
    }

    fn with_index(
        index: Index,
        index_path: PathBuf,
        tuning: &TuningConfig,
    ) -> Result<Self, IndexError> {
        let schema = index.schema();

        let path_field = schema.get_field("path").map_err(|_| {
            IndexError::InitializationError("Missing 'path' field in schema".to_string())
        })?;
        let modified_field = schema.get_field("modified").map_err(|_| {
            IndexError::InitializationError("Missing 'modified' field in schema".to_string())
        })?;
        let content_field = schema.get_field("content").map_err(|_| {
            IndexError::InitializationError("Missing 'content' field in schema".to_string())
        })?;
        let embedding_field = schema.get_field("embedding").map_err(|_| {
            IndexError::InitializationError("Missing 'embedding' field in schema".to_string())
        })?;

        let writer = index
            .writer(tuning.writer_heap_bytes)
            .map_err(|e| IndexError::InitializationError(e.to_string()))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: TantivyError| IndexError::InitializationError(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer,
            path_field,
            modified_field,
            content_field,
            embedding_field,
            index_path,
        })
    }

    /// Insert a document without checking for a prior version
    pub fn insert(&mut self, record: DocumentRecord) -> Result<(), IndexError> {
        let mut doc = doc!(
            self.path_field => record.path,
            self.modified_field => record.modified_ms,
            self.content_field => record.content,
        );
        if let Some(embedding) = record.embedding {
            doc.add_bytes(self.embedding_field, embedding_to_bytes(&embedding));
        }

        self.writer
            .add_document(doc)
            .map_err(|e| IndexError::InsertError(e.to_string()))?;

        Ok(())
    }

    /// Replace any document whose path matches, then insert the new one
    pub fn replace_by_path(&mut self, record: DocumentRecord) -> Result<(), IndexError> {
        let term = Term::from_field_text(self.path_field, &record.path);
        self.writer.delete_term(term);
        self.insert(record)
    }

    /// Commit all pending changes and report the resulting document count
    pub fn commit(&mut self) -> Result<u64, IndexError> {
        self.writer
            .commit()
            .map_err(|e| IndexError::CommitError(e.to_string()))?;

        // Wait for reader to reload
        self.reader
            .reload()
            .map_err(|e| IndexError::CommitError(e.to_string()))?;

        Ok(self.num_docs())
    }

    /// Fetch the stored attributes of the document keyed by `path`
    pub fn doc_by_path(&self, path: &str) -> Result<Option<StoredDocument>, IndexError> {
        let searcher = self.reader.searcher();

        let term = Term::from_field_text(self.path_field, path);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| IndexError::LookupError(e.to_string()))?;

        let Some((_score, doc_address)) = top_docs.into_iter().next() else {
            return Ok(None);
        };

        let retrieved_doc: tantivy::TantivyDocument = searcher
            .doc(doc_address)
            .map_err(|e| IndexError::LookupError(e.to_string()))?;

        let path = retrieved_doc
            .get_first(self.path_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| IndexError::LookupError("Missing or invalid path field".to_string()))?
            .to_string();

        let modified_ms = retrieved_doc
            .get_first(self.modified_field)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| {
                IndexError::LookupError("Missing or invalid modified field".to_string())
            })?;

        let embedding = retrieved_doc
            .get_first(self.embedding_field)
            .and_then(|v| v.as_bytes())
            .map(bytes_to_embedding);

        Ok(Some(StoredDocument {
            path,
            modified_ms,
            embedding,
        }))
    }

    /// Get the number of documents in the index
    pub fn num_docs(&self) -> u64 {
        let searcher = self.reader.searcher();
        searcher.num_docs()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.num_docs() == 0
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(path: &str, modified_ms: i64, content: &str) -> DocumentRecord {
        DocumentRecord {
            path: path.to_string(),
            modified_ms,
            content: content.to_string(),
            embedding: None,
        }
    }

    #[test]
    fn test_index_creation() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        let index = SearchIndex::create(&index_path, &TuningConfig::default());
        assert!(index.is_ok());

        let index = index.unwrap();
        assert_eq!(index.num_docs(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_insert_and_count() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();

        index.insert(record("/docs/a.txt", 1_000, "alpha")).unwrap();
        index.insert(record("/docs/b.txt", 2_000, "beta")).unwrap();

        let count = index.commit().unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_roundtrip_path_and_modified() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
        index
            .insert(record("/docs/a.txt", 1_699_999_999_123, "alpha beta"))
            .unwrap();
        index.commit().unwrap();

        let stored = index.doc_by_path("/docs/a.txt").unwrap().unwrap();
        assert_eq!(stored.path, "/docs/a.txt");
        assert_eq!(stored.modified_ms, 1_699_999_999_123);
        assert!(stored.embedding.is_none());

        assert!(index.doc_by_path("/docs/missing.txt").unwrap().is_none());
    }

    #[test]
    fn test_replace_by_path_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
        index.insert(record("/docs/a.txt", 1_000, "old")).unwrap();
        index.commit().unwrap();

        index
            .replace_by_path(record("/docs/a.txt", 2_000, "new"))
            .unwrap();
        index
            .replace_by_path(record("/docs/a.txt", 3_000, "newer"))
            .unwrap();
        let count = index.commit().unwrap();

        assert_eq!(count, 1);
        let stored = index.doc_by_path("/docs/a.txt").unwrap().unwrap();
        assert_eq!(stored.modified_ms, 3_000);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
        let mut rec = record("/docs/a.txt", 1_000, "alpha");
        rec.embedding = Some(vec![0.5, -1.25, 3.0]);
        index.insert(rec).unwrap();
        index.commit().unwrap();

        let stored = index.doc_by_path("/docs/a.txt").unwrap().unwrap();
        assert_eq!(stored.embedding, Some(vec![0.5, -1.25, 3.0]));
    }

    #[test]
    fn test_create_truncates_previous_index() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        {
            let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
            index.insert(record("/docs/a.txt", 1_000, "alpha")).unwrap();
            index.insert(record("/docs/b.txt", 2_000, "beta")).unwrap();
            index.commit().unwrap();
        }

        let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
        assert_eq!(index.num_docs(), 0);
        index.insert(record("/docs/c.txt", 3_000, "gamma")).unwrap();
        assert_eq!(index.commit().unwrap(), 1);
    }

    #[test]
    fn test_open_or_create_reloads_existing() {
        let temp = TempDir::new().unwrap();
        let index_path = temp.path().join("test_index");

        {
            let mut index = SearchIndex::create(&index_path, &TuningConfig::default()).unwrap();
            index.insert(record("/docs/a.txt", 1_000, "alpha")).unwrap();
            index.commit().unwrap();
        }

        let index = SearchIndex::open_or_create(&index_path, &TuningConfig::default()).unwrap();
        assert_eq!(index.num_docs(), 1);
    }
}
