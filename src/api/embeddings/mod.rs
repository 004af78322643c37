// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! This module provides the POST /embeddings/create endpoint, which turns a
//! list of texts into sentence embeddings with the model loaded at startup.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::create_embeddings_handler;
pub use request::CreateEmbeddingsRequest;
pub use response::CreateEmbeddingsResponse;
