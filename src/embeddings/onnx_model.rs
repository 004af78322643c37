// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! a sentence transformer model exported to ONNX
//! (msmarco-MiniLM-L12-cos-v5 by default).
//!
//! Features:
//! - ONNX model loading from disk
//! - BERT tokenization with truncation to the model's max length
//! - Single and batch embedding generation
//! - Mean pooling over token embeddings
//! - Optional L2 normalization (the `-cos-` models expect it)
//! - Output dimension discovered from a validation inference

use crate::embeddings::model::EmbeddingModel;
use crate::embeddings::pooling::{l2_normalize, mean_pool};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Default model name
pub const DEFAULT_MODEL_NAME: &str = "msmarco-MiniLM-L12-cos-v5";

/// Default maximum sequence length in tokens
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Output dimension of the MiniLM family
pub const MINILM_DIMENSION: usize = 384;

const VALIDATION_TEXT: &str = "validation test";

/// Configuration for loading an ONNX embedding model
#[derive(Debug, Clone)]
pub struct EmbeddingModelConfig {
    /// Model name (e.g., "msmarco-MiniLM-L12-cos-v5")
    pub name: String,
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Path to tokenizer JSON file
    pub tokenizer_path: PathBuf,
    /// Longer inputs are truncated to this many tokens
    pub max_length: usize,
    /// Apply L2 normalization after pooling
    pub normalize: bool,
    /// Fail loading if the model outputs a different dimension
    pub expected_dimension: Option<usize>,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
}

impl EmbeddingModelConfig {
    /// Builds a config for a sentence-transformers ONNX export directory
    ///
    /// The model file is `model.onnx` at the top of the directory, or
    /// `onnx/model.onnx` when only the nested export exists. The tokenizer is
    /// `tokenizer.json`.
    pub fn from_model_dir(name: impl Into<String>, model_dir: impl AsRef<Path>) -> Self {
        let model_dir = model_dir.as_ref();
        let top_level = model_dir.join("model.onnx");
        let nested = model_dir.join("onnx").join("model.onnx");
        let model_path = if !top_level.exists() && nested.exists() {
            nested
        } else {
            top_level
        };

        Self {
            name: name.into(),
            model_path,
            tokenizer_path: model_dir.join("tokenizer.json"),
            max_length: DEFAULT_MAX_LENGTH,
            normalize: true,
            expected_dimension: Some(MINILM_DIMENSION),
            intra_threads: 4,
        }
    }
}

/// Session and tokenizer, shared with the blocking inference threads
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex held only for the inference call. The tokenizer is read-only.
struct InferenceEngine {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    normalize: bool,
    pad_id: i64,
    uses_token_type_ids: bool,
}

/// ONNX-based sentence embedding model
///
/// # Thread Safety
/// Inference is CPU-bound and runs on tokio's blocking pool, so the async
/// workers keep serving other requests while a batch is encoded.
pub struct OnnxEmbeddingModel {
    engine: Arc<InferenceEngine>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("normalize", &self.engine.normalize)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the ONNX session and tokenizer, then runs a validation inference
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - Model does not output `[batch, seq_len, hidden]` token embeddings
    /// - Output dimension differs from `expected_dimension`
    ///
    /// # Example
    /// ```ignore
    /// let config = EmbeddingModelConfig::from_model_dir(
    ///     "msmarco-MiniLM-L12-cos-v5",
    ///     "/src/app/msmarco-MiniLM-L12-cos-v5",
    /// );
    /// let model = OnnxEmbeddingModel::new(config).await?;
    /// assert_eq!(model.dimension(), 384);
    /// ```
    pub async fn new(config: EmbeddingModelConfig) -> Result<Self> {
        if !config.model_path.exists() {
            anyhow::bail!(
                "ONNX model file not found: {}",
                config.model_path.display()
            );
        }
        if !config.tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}",
                config.tokenizer_path.display()
            );
        }
        if config.max_length == 0 {
            anyhow::bail!("max_length must be greater than 0");
        }

        info!(
            "Loading ONNX embedding model {} from {}",
            config.name,
            config.model_path.display()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(&config.model_path)
            .with_context(|| {
                format!(
                    "Failed to load ONNX model from {}",
                    config.model_path.display()
                )
            })?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        // Batches are padded by hand to the longest item
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0) as i64;

        let mut model = Self {
            engine: Arc::new(InferenceEngine {
                session: Mutex::new(session),
                tokenizer,
                normalize: config.normalize,
                pad_id,
                uses_token_type_ids,
            }),
            model_name: config.name,
            dimension: 0,
        };

        let validation = model
            .infer(vec![VALIDATION_TEXT.to_string()])
            .await
            .context("Validation inference failed")?;
        let dimension = validation.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            anyhow::bail!("Model produced an empty embedding during validation");
        }
        if let Some(expected) = config.expected_dimension {
            if dimension != expected {
                anyhow::bail!(
                    "Model {} outputs {} dimensions (expected {})",
                    model.model_name,
                    dimension,
                    expected
                );
            }
        }
        model.dimension = dimension;

        info!(
            "✅ ONNX embedding model {} loaded ({} dimensions, token_type_ids: {})",
            model.model_name, model.dimension, model.engine.uses_token_type_ids
        );

        Ok(model)
    }

    /// Counts tokens in a text after truncation, including special tokens
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .engine
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        Ok(encoding.get_attention_mask().iter().map(|&m| m as usize).sum())
    }

    /// Runs inference for `texts` on the blocking thread pool
    async fn infer(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.infer(&texts))
            .await
            .context("Inference task panicked")?
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                embedding.len(),
                self.dimension
            );
        }
        Ok(())
    }
}

impl InferenceEngine {
    /// Tokenizes, runs the session once for all texts and pools each item
    fn infer(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = texts.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);
        let mut token_type_ids = Vec::with_capacity(batch * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding_needed = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(self.pad_id).take(padding_needed));

            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding_needed));

            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));
            token_type_ids.extend(std::iter::repeat(0i64).take(padding_needed));
        }

        let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array =
            Array2::from_shape_vec((batch, max_len), attention_mask.clone())
                .context("Failed to create attention_mask array")?;

        debug!(
            "Running ONNX inference: batch={}, seq_len={}",
            batch, max_len
        );

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids_array = Array2::from_shape_vec((batch, max_len), token_type_ids)
                .context("Failed to create token_type_ids array")?;
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids_array)?,
                "attention_mask" => Value::from_array(attention_mask_array)?,
                "token_type_ids" => Value::from_array(token_type_ids_array)?
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids_array)?,
                "attention_mask" => Value::from_array(attention_mask_array)?
            ])?
        };

        // Output names differ between exports; the token embeddings come first
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output.shape();
        if shape.len() != 3 || shape[0] != batch {
            anyhow::bail!(
                "Model outputs unexpected shape {:?} (expected [{}, seq_len, hidden])",
                shape,
                batch
            );
        }

        let mut embeddings = Vec::with_capacity(batch);
        for (index, mask) in attention_mask.chunks(max_len.max(1)).take(batch).enumerate() {
            let item = output
                .index_axis(Axis(0), index)
                .into_dimensionality::<Ix2>()
                .context("Failed to view token embeddings")?;
            let mut pooled = mean_pool(item, mask);
            if self.normalize {
                l2_normalize(&mut pooled);
            }
            embeddings.push(pooled);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingModel for OnnxEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .infer(vec![text.to_string()])
            .await?
            .pop()
            .context("Model returned no embedding")?;
        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.infer(texts.to_vec()).await?;
        for embedding in &embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
