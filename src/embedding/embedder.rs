/// Word-vector embedder over a token dictionary
use std::io::BufRead;

use super::{EmbeddingError, VectorDict};

/// Folds a content stream into a single unit-length vector
///
/// Deterministic for identical input and side-effect-free: tokens are
/// lowercased whitespace-split words, in-dictionary vectors are summed and
/// the sum is normalized to unit length so dot product behaves as cosine
/// similarity.
pub struct Embedder {
    dict: VectorDict,
}

impl Embedder {
    pub fn new(dict: VectorDict) -> Self {
        Self { dict }
    }

    /// Embedding length, fixed by the dictionary
    pub fn dimension(&self) -> usize {
        self.dict.dimension()
    }

    /// Compute the embedding for the given content stream
    ///
    /// Reads line-wise; invalid UTF-8 decodes lossily rather than failing.
    /// Content with no in-dictionary token yields the zero vector.
    pub fn embed<R: BufRead>(&self, mut reader: R) -> Result<Vec<f32>, EmbeddingError> {
        let mut sum = vec![0f32; self.dict.dimension()];
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            for token in line.split_whitespace() {
                if let Some(vector) = self.dict.get(&token.to_lowercase()) {
                    for (acc, component) in sum.iter_mut().zip(vector) {
                        *acc += component;
                    }
                }
            }
        }

        let norm = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for component in &mut sum {
                *component /= norm;
            }
        }

        Ok(sum)
    }
}
