// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding model trait definition

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for text embedding models
///
/// A model turns a text into a fixed-length vector. Implementations are
/// loaded once and shared read-only between concurrent requests.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for several texts, preserving input order
    ///
    /// The default implementation encodes each text on its own.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Output dimension of every vector this model produces
    fn dimension(&self) -> usize;

    /// Model name for logging and the health endpoint
    fn model_name(&self) -> &str;
}

/// Information about the loaded embedding model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub dimension: usize,
}

impl ModelInfo {
    pub fn of(model: &dyn EmbeddingModel) -> Self {
        Self {
            name: model.model_name().to_string(),
            dimension: model.dimension(),
        }
    }
}
