//! Query embedders
//!
//! Maps query text to a unit vector in the same space as the catalog's
//! embedding table. The table's metadata names the model that produced it;
//! [`embedder_for_model`] resolves that name to an implementation.
//!
//! - [`HashingEmbedder`] - deterministic word + trigram feature hashing, no model files
//! - `FastEmbedder` - sentence-transformer inference, behind the `fastembed` feature

use crate::vector::normalize;
use crate::{Error, Result};
use std::sync::Arc;

/// Model identifier of [`HashingEmbedder`]
pub const HASHING_MODEL: &str = "hashing-trigram-v1";

/// Produces one unit-normalized vector per query
pub trait QueryEmbedder: Send + Sync {
    /// Identifier matching the `model_name` of the embedding metadata
    fn model_name(&self) -> &str;

    fn dim(&self) -> usize;

    /// May be slow; callers run it off the request loop
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Feature-hashing embedder.
///
/// Character trigrams of the lowercased text add 1.0 to their bucket and
/// whole words add 2.0, then the vector is L2-normalized. Buckets come from
/// FNV-1a, so vectors are stable across builds and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        Ok(Self { dim })
    }

    #[inline]
    fn bucket(feature: &str, dim: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in feature.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % dim as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();

        let padded: Vec<char> = format!("  {}  ", lowered).chars().collect();
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            vector[Self::bucket(&trigram, self.dim)] += 1.0;
        }

        for word in lowered.split_whitespace() {
            vector[Self::bucket(word, self.dim)] += 2.0;
        }

        normalize(&mut vector);
        vector
    }
}

impl QueryEmbedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        HASHING_MODEL
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

#[cfg(feature = "fastembed")]
pub use neural::FastEmbedder;

#[cfg(feature = "fastembed")]
mod neural {
    use super::QueryEmbedder;
    use crate::vector::normalize;
    use crate::{Error, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    /// all-MiniLM-L6-v2 through ONNX runtime
    pub struct FastEmbedder {
        model_name: String,
        dim: usize,
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        pub const DIM: usize = 384;

        pub fn load(model_name: &str) -> Result<Self> {
            tracing::info!("Loading embedding model {}", model_name);
            let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
                .map_err(|e| Error::Embedding(e.to_string()))?;
            Ok(Self {
                model_name: model_name.to_string(),
                dim: Self::DIM,
                model: Mutex::new(model),
            })
        }
    }

    impl QueryEmbedder for FastEmbedder {
        fn model_name(&self) -> &str {
            &self.model_name
        }

        fn dim(&self) -> usize {
            self.dim
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vectors = self
                .model
                .lock()
                .embed(vec![text], None)
                .map_err(|e| Error::Embedding(e.to_string()))?;
            let mut vector = vectors
                .pop()
                .ok_or_else(|| Error::Embedding("model returned no vector".to_string()))?;
            normalize(&mut vector);
            Ok(vector)
        }
    }
}

/// Whether `model_name` refers to all-MiniLM-L6-v2
fn is_minilm(model_name: &str) -> bool {
    matches!(
        model_name,
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2"
    )
}

/// Resolve the embedder for the model that produced the table
pub fn embedder_for_model(model_name: &str, dim: usize) -> Result<Arc<dyn QueryEmbedder>> {
    if model_name == HASHING_MODEL {
        return Ok(Arc::new(HashingEmbedder::new(dim)?));
    }

    if !is_minilm(model_name) {
        return Err(Error::UnknownModel(model_name.to_string()));
    }

    #[cfg(feature = "fastembed")]
    {
        let embedder = FastEmbedder::load(model_name)?;
        if embedder.dim() != dim {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: embedder.dim(),
            });
        }
        Ok(Arc::new(embedder))
    }
    #[cfg(not(feature = "fastembed"))]
    {
        Err(Error::UnknownModel(format!(
            "{} (rebuild with the `fastembed` feature)",
            model_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_embedder_is_unit_and_deterministic() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let a = embedder.embed("Yellow flower blooming").unwrap();
        let b = embedder.embed("yellow flower blooming").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_similar_texts_are_closer() {
        let embedder = HashingEmbedder::new(128).unwrap();
        let query = embedder.embed_text("red shoe");
        let near = embedder.embed_text("red shoes for running");
        let far = embedder.embed_text("green hat");
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[test]
    fn test_model_resolution() {
        assert_eq!(embedder_for_model(HASHING_MODEL, 32).unwrap().dim(), 32);
        assert!(matches!(
            embedder_for_model("word2vec", 32),
            Err(Error::UnknownModel(_))
        ));
    }
}
