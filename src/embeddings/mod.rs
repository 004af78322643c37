// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Text embedding models and the service that drives them

pub mod model;
pub mod onnx_model;
pub mod pooling;
pub mod service;

pub use model::{EmbeddingModel, ModelInfo};
pub use onnx_model::{EmbeddingModelConfig, OnnxEmbeddingModel};
pub use service::EmbeddingService;
