// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response body for POST /embeddings/create

use serde::{Deserialize, Serialize};

/// Response body for POST /embeddings/create
///
/// One vector per input text, in input order.
///
/// # Example
/// ```json
/// {
///   "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

impl CreateEmbeddingsResponse {
    /// Returns the number of embeddings in the response
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Dimension shared by every vector, or `None` when empty or ragged
    pub fn dimension(&self) -> Option<usize> {
        let first = self.embeddings.first()?.len();
        self.embeddings
            .iter()
            .all(|e| e.len() == first)
            .then_some(first)
    }
}

impl From<Vec<Vec<f32>>> for CreateEmbeddingsResponse {
    fn from(embeddings: Vec<Vec<f32>>) -> Self {
        Self { embeddings }
    }
}
