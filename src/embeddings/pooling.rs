// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence pooling over token embeddings
//!
//! The ONNX export of a sentence transformer outputs one vector per token
//! (`[batch, seq_len, hidden]`). These helpers reduce a single item of that
//! tensor to one sentence vector the same way sentence-transformers does:
//! attention-masked mean pooling followed by optional L2 normalization.

use ndarray::ArrayView2;

/// Mean of the token embeddings whose attention mask is non-zero
///
/// `token_embeddings` is `[seq_len, hidden]`. Mask entries beyond `seq_len`
/// are ignored and missing entries count as padding.
pub fn mean_pool(token_embeddings: ArrayView2<'_, f32>, attention_mask: &[i64]) -> Vec<f32> {
    let seq_len = token_embeddings.shape()[0];
    let hidden_dim = token_embeddings.shape()[1];

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for i in 0..seq_len {
        let mask_value = attention_mask.get(i).copied().unwrap_or(0) as f32;
        if mask_value == 0.0 {
            continue;
        }
        sum_mask += mask_value;
        for (j, value) in pooled.iter_mut().enumerate() {
            *value += token_embeddings[[i, j]] * mask_value;
        }
    }

    for value in &mut pooled {
        *value /= sum_mask.max(1e-9);
    }

    pooled
}

/// Scale a vector to unit length in place. A zero vector is left unchanged.
pub fn l2_normalize(embedding: &mut [f32]) {
    let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }
}
