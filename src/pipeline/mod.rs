//! Indexing pipeline: traversal, document assembly, write-mode dispatch
//!
//! Strictly sequential: one file is fully assembled, embedded and written
//! before the next begins. Per-file failures are logged and skipped; only
//! failures touching the docs root or the index itself abort the run.

mod guard;

pub use guard::SanityGuard;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Instant, UNIX_EPOCH};
use walkdir::WalkDir;

use crate::config::{RunConfig, TuningConfig, WriteMode};
use crate::embedding::{Embedder, VectorDict, KNN_DICT_NAME};
use crate::error::{FindexError, Result};
use crate::index::{DocumentRecord, SearchIndex};

/// Counters reported after one indexing run
#[derive(Debug, Default, Clone)]
pub struct IndexStats {
    /// Files written to the index
    pub indexed: u64,
    /// Files skipped after a per-file failure
    pub skipped: u64,
    /// Document count reported by the index after commit
    pub doc_count: u64,
    /// Wall-clock duration of the run
    pub elapsed_ms: u128,
}

/// Sequential file indexer
pub struct Indexer {
    index: SearchIndex,
    embedder: Option<Embedder>,
    mode: WriteMode,
}

impl Indexer {
    pub fn new(index: SearchIndex, embedder: Option<Embedder>, mode: WriteMode) -> Self {
        Self {
            index,
            embedder,
            mode,
        }
    }

    /// Walk `root` depth-first and index every regular file under it
    ///
    /// A single non-directory root is treated as one file. Symbolic links
    /// are not followed, so link cycles cannot recurse. A failure reading
    /// the root itself aborts before any write; everything else is a
    /// per-file failure.
    pub fn index_tree(&mut self, root: &Path) -> Result<IndexStats> {
        let meta = std::fs::metadata(root).map_err(|e| FindexError::Io {
            source: e,
            context: format!("cannot read docs root {}", root.display()),
        })?;

        let mut stats = IndexStats::default();

        if meta.is_dir() {
            for entry in WalkDir::new(root).follow_links(false) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("skipping unreadable entry: {err}");
                        stats.skipped += 1;
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                self.process(entry.path(), &mut stats);
            }
        } else {
            self.process(root, &mut stats);
        }

        Ok(stats)
    }

    fn process(&mut self, path: &Path, stats: &mut IndexStats) {
        match self.index_file(path) {
            Ok(()) => stats.indexed += 1,
            Err(err) => {
                // don't index files that can't be read
                tracing::warn!("skipping {}: {err}", path.display());
                stats.skipped += 1;
            }
        }
    }

    /// Assemble one document record and hand it to the index under the
    /// run's write mode
    fn index_file(&mut self, path: &Path) -> Result<()> {
        let modified_ms = modified_millis(path)?;
        let content = read_content(path)?;

        let embedding = match &self.embedder {
            Some(embedder) => {
                // Second, independent stream over the same content; the
                // index and the embedder never share a cursor
                let file = File::open(path).map_err(|e| FindexError::Io {
                    source: e,
                    context: format!("reopening {} for embedding", path.display()),
                })?;
                Some(embedder.embed(BufReader::new(file))?)
            }
            None => None,
        };

        let record = DocumentRecord {
            path: path.display().to_string(),
            modified_ms,
            content,
            embedding,
        };

        match self.mode {
            WriteMode::Create => {
                // Fresh index, no prior document can be there
                tracing::info!("adding {}", path.display());
                self.index.insert(record)?;
            }
            WriteMode::Upsert => {
                // An old copy of this document may already be indexed
                tracing::info!("updating {}", path.display());
                self.index.replace_by_path(record)?;
            }
        }

        Ok(())
    }

    /// Commit pending writes and report the resulting document count
    pub fn commit(&mut self) -> Result<u64> {
        Ok(self.index.commit()?)
    }
}

/// Execute one full indexing run
///
/// Opens the index under the configured write mode, compiles and loads the
/// vector dictionary when one is configured, walks the docs tree, commits,
/// and applies the post-run dictionary-scale check.
pub fn run(config: &RunConfig, tuning: &TuningConfig) -> Result<IndexStats> {
    let start = Instant::now();

    tracing::info!("indexing to directory '{}'", config.index_dir.display());

    let index = match config.mode {
        WriteMode::Create => SearchIndex::create(&config.index_dir, tuning)?,
        WriteMode::Upsert => SearchIndex::open_or_create(&config.index_dir, tuning)?,
    };

    let mut dict_bytes = 0u64;
    let embedder = match &config.dict_source {
        Some(source) => {
            VectorDict::build(source, &config.index_dir, KNN_DICT_NAME)?;
            let dict = VectorDict::open(&config.index_dir, KNN_DICT_NAME)?;
            dict_bytes = dict.ram_bytes_used();
            tracing::info!(
                "loaded vector dictionary '{}' ({} tokens, {} bytes)",
                source.display(),
                dict.len(),
                dict_bytes
            );
            Some(Embedder::new(dict))
        }
        None => None,
    };

    let mut indexer = Indexer::new(index, embedder, config.mode);
    let mut stats = indexer.index_tree(&config.docs_root)?;
    stats.doc_count = indexer.commit()?;
    stats.elapsed_ms = start.elapsed().as_millis();

    SanityGuard::from_env().check(stats.doc_count, dict_bytes)?;

    tracing::info!(
        "indexed {} documents in {} ms ({} skipped)",
        stats.doc_count,
        stats.elapsed_ms,
        stats.skipped
    );

    Ok(stats)
}

fn modified_millis(path: &Path) -> Result<i64> {
    let meta = std::fs::metadata(path).map_err(|e| FindexError::Io {
        source: e,
        context: format!("reading metadata of {}", path.display()),
    })?;
    let modified = meta.modified().map_err(|e| FindexError::Io {
        source: e,
        context: format!("reading modification time of {}", path.display()),
    })?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);
    Ok(millis)
}

fn read_content(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| FindexError::Io {
        source: e,
        context: format!("opening {}", path.display()),
    })?;

    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| FindexError::Io {
            source: e,
            context: format!("reading {}", path.display()),
        })?;

    // Tolerate non-UTF-8 input; bad sequences tokenize as replacement
    // characters instead of aborting the file
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_modified_millis_matches_filesystem() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();

        let expected = std::fs::metadata(&file)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;

        assert_eq!(modified_millis(&file).unwrap(), expected);
    }

    #[test]
    fn test_read_content_decodes_lossily() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        let mut bytes = b"abc ".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b" def");
        std::fs::write(&file, bytes).unwrap();

        let content = read_content(&file).unwrap();
        assert!(content.starts_with("abc "));
        assert!(content.ends_with(" def"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let err = read_content(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, FindexError::Io { .. }));
    }
}
