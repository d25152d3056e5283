/// Token-vector dictionary compiled into the index directory
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use super::EmbeddingError;

/// Artifact name the compiled dictionary is stored under, inside the
/// index directory
pub const KNN_DICT_NAME: &str = "knn-dict";

#[derive(Serialize, Deserialize)]
struct DictFile {
    dimension: usize,
    entries: HashMap<String, Vec<f32>>,
}

/// Loaded token-vector dictionary
///
/// Owned for the lifetime of one indexing run; dropping the handle releases
/// it on every exit path.
#[derive(Debug)]
pub struct VectorDict {
    dimension: usize,
    entries: HashMap<String, Vec<f32>>,
    ram_bytes: u64,
}

impl VectorDict {
    /// Compile a plain-text dictionary source into `index_dir` under `name`
    ///
    /// Source format is one entry per line: `token v1 v2 ... vdim`,
    /// whitespace separated. Every entry must agree on dimension.
    pub fn build(source: &Path, index_dir: &Path, name: &str) -> Result<(), EmbeddingError> {
        let file = File::open(source)?;
        let reader = BufReader::new(file);

        let mut dimension = 0usize;
        let mut entries: HashMap<String, Vec<f32>> = HashMap::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| EmbeddingError::MalformedEntry {
                    line: lineno + 1,
                    message: "missing token".to_string(),
                })?
                .to_lowercase();

            let vector: Vec<f32> = parts
                .map(str::parse)
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| EmbeddingError::MalformedEntry {
                    line: lineno + 1,
                    message: e.to_string(),
                })?;

            if vector.is_empty() {
                return Err(EmbeddingError::MalformedEntry {
                    line: lineno + 1,
                    message: "no vector components".to_string(),
                });
            }

            if dimension == 0 {
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    line: lineno + 1,
                    expected: dimension,
                    actual: vector.len(),
                });
            }

            entries.insert(token, vector);
        }

        if entries.is_empty() {
            return Err(EmbeddingError::BuildError(format!(
                "dictionary source {} contains no entries",
                source.display()
            )));
        }

        std::fs::create_dir_all(index_dir)?;
        let out = File::create(index_dir.join(format!("{name}.json")))?;
        serde_json::to_writer(BufWriter::new(out), &DictFile { dimension, entries })?;

        Ok(())
    }

    /// Open a dictionary previously compiled by [`VectorDict::build`]
    pub fn open(index_dir: &Path, name: &str) -> Result<Self, EmbeddingError> {
        let path = index_dir.join(format!("{name}.json"));
        if !path.exists() {
            return Err(EmbeddingError::DictNotFound(path.display().to_string()));
        }

        let file = File::open(&path)?;
        let parsed: DictFile = serde_json::from_reader(BufReader::new(file))?;

        let ram_bytes = parsed
            .entries
            .iter()
            .map(|(token, vector)| (token.len() + vector.len() * 4) as u64)
            .sum();

        Ok(Self {
            dimension: parsed.dimension,
            entries: parsed.entries,
            ram_bytes,
        })
    }

    /// Vector length of every entry
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// In-memory footprint of the loaded dictionary
    pub fn ram_bytes_used(&self) -> u64 {
        self.ram_bytes
    }

    /// Look up the vector for a (lowercased) token
    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.entries.get(token).map(Vec::as_slice)
    }

    /// Number of tokens in the dictionary
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
