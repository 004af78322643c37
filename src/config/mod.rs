// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Server configuration
//!
//! Every setting has a command-line flag and an environment variable
//! (a `.env` file is loaded by `main` before parsing). The defaults serve
//! the model from `/src/app/msmarco-MiniLM-L12-cos-v5` on port 80.

use crate::embeddings::onnx_model::{DEFAULT_MAX_LENGTH, DEFAULT_MODEL_NAME, MINILM_DIMENSION};
use crate::embeddings::EmbeddingModelConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_MODEL_DIR: &str = "/src/app/msmarco-MiniLM-L12-cos-v5";

/// Sentence embedding HTTP service
#[derive(Parser, Debug, Clone)]
#[command(name = "similarity-embeddings")]
#[command(version)]
#[command(about = "Serves sentence embeddings over HTTP", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "API_PORT", default_value_t = 80)]
    pub port: u16,

    /// Directory holding model.onnx (or onnx/model.onnx) and tokenizer.json
    #[arg(long, env = "MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Model name reported by /health (defaults to the model directory name)
    #[arg(long, env = "MODEL_NAME")]
    pub model_name: Option<String>,

    /// Maximum tokens per text; longer texts are truncated
    #[arg(long, env = "EMBED_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// Texts passed to the model per inference call
    #[arg(long, env = "EMBED_BATCH_SIZE", default_value_t = 1)]
    pub batch_size: usize,

    /// Expected output dimension, checked at startup (0 disables the check)
    #[arg(long, env = "EMBED_DIMENSION", default_value_t = MINILM_DIMENSION)]
    pub expected_dimension: usize,

    /// Skip L2 normalization of the pooled vectors
    #[arg(long, env = "EMBED_NO_NORMALIZE")]
    pub no_normalize: bool,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Enable a permissive CORS layer
    #[arg(long, env = "API_CORS")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }
        if self.max_length == 0 {
            anyhow::bail!("max_length must be greater than 0");
        }
        if self.intra_threads == 0 {
            anyhow::bail!("intra_threads must be greater than 0");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn resolved_model_name(&self) -> String {
        self.model_name
            .clone()
            .or_else(|| {
                self.model_dir
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string())
    }

    pub fn embedding_model_config(&self) -> EmbeddingModelConfig {
        let mut config =
            EmbeddingModelConfig::from_model_dir(self.resolved_model_name(), &self.model_dir);
        config.max_length = self.max_length;
        config.normalize = !self.no_normalize;
        config.expected_dimension = (self.expected_dimension > 0).then_some(self.expected_dimension);
        config.intra_threads = self.intra_threads;
        config
    }
}
