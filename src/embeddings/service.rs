// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding service
//!
//! Holds the model loaded at startup and turns an ordered list of texts into
//! an ordered list of vectors. Request handlers receive the service through
//! axum state; nothing here is global.

use crate::embeddings::model::{EmbeddingModel, ModelInfo};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Encodes texts with a shared, read-only embedding model
#[derive(Clone)]
pub struct EmbeddingService {
    model: Arc<dyn EmbeddingModel>,
    batch_size: usize,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("model", &self.model.model_name())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl EmbeddingService {
    /// Creates a service over a loaded model
    ///
    /// `batch_size` is the number of texts handed to the model per call.
    /// With 1 every text is encoded on its own.
    pub fn new(model: Arc<dyn EmbeddingModel>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            anyhow::bail!("Batch size must be greater than 0");
        }
        Ok(Self { model, batch_size })
    }

    /// Embeds every text, returning one vector per text in input order
    ///
    /// An empty input returns an empty output without calling the model.
    /// Any failing text fails the whole call; no partial result is returned.
    pub async fn create_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        if texts.is_empty() {
            return Ok(embeddings);
        }

        let dimension = self.model.dimension();
        debug!(
            "Embedding {} texts with {} (batch size {})",
            texts.len(),
            self.model.model_name(),
            self.batch_size
        );

        for (chunk_index, chunk) in texts.chunks(self.batch_size).enumerate() {
            let offset = chunk_index * self.batch_size;

            let vectors = if let [text] = chunk {
                let vector = self
                    .model
                    .embed(text)
                    .await
                    .with_context(|| format!("Failed to embed text at index {}", offset))?;
                vec![vector]
            } else {
                self.model.embed_batch(chunk).await.with_context(|| {
                    format!(
                        "Failed to embed texts at indices {}..{}",
                        offset,
                        offset + chunk.len()
                    )
                })?
            };

            if vectors.len() != chunk.len() {
                anyhow::bail!(
                    "Model returned {} embeddings for {} texts",
                    vectors.len(),
                    chunk.len()
                );
            }

            for (i, vector) in vectors.into_iter().enumerate() {
                if vector.len() != dimension {
                    anyhow::bail!(
                        "Unexpected embedding dimension at index {}: {} (expected {})",
                        offset + i,
                        vector.len(),
                        dimension
                    );
                }
                embeddings.push(vector);
            }
        }

        Ok(embeddings)
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo::of(self.model.as_ref())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
