// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request body for POST /embeddings/create

use serde::{Deserialize, Serialize};

/// Request body for POST /embeddings/create
///
/// `texts` is required and must be a list of strings. It may be empty and
/// no length limit is applied to the list or to any text. Unknown fields
/// are ignored.
///
/// # Example
/// ```json
/// {
///   "texts": ["Hello world", "Another text"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmbeddingsRequest {
    /// Texts to embed, in the order their vectors are returned
    pub texts: Vec<String>,
}

impl CreateEmbeddingsRequest {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
        }
    }
}
