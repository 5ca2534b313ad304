//! Deterministic offline embeddings.
//!
//! Vectors are derived from a SHA-256 stream seeded by the input text. They
//! carry no semantic meaning; they only keep the service usable without a
//! remote provider (local development, tests).

use anyhow::Result;
use sha2::{Digest, Sha256};

use super::Embedder;

/// Hash-seeded unit vectors of a fixed dimension.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    /// Builds an embedder producing vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let seed = Sha256::digest(text.as_bytes());
        let mut vector = Vec::with_capacity(self.dimensions);
        let mut counter = 0u64;
        while vector.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(counter.to_le_bytes());
            let block = hasher.finalize();
            for word in block.chunks_exact(4) {
                if vector.len() == self.dimensions {
                    break;
                }
                let raw = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                vector.push(unit_interval(raw) * 2.0 - 1.0);
            }
            counter += 1;
        }
        normalize(&mut vector);
        vector
    }
}

impl Embedder for LocalEmbedder {
    fn name(&self) -> &str {
        "local"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|text| self.embed_text(text)).collect())
    }
}

fn unit_interval(raw: u32) -> f32 {
    (f64::from(raw) / f64::from(u32::MAX)) as f32
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm = if norm > 0.0 { norm } else { 1.0 };
    for value in vector.iter_mut() {
        *value /= norm;
    }
}
