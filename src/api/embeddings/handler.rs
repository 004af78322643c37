// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embeddings/create HTTP handler

use crate::api::embeddings::{CreateEmbeddingsRequest, CreateEmbeddingsResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;
use tracing::info;

/// POST /embeddings/create handler
///
/// # Request Body
/// ```json
/// { "texts": ["text1", "text2", ...] }
/// ```
///
/// # Response Body
/// ```json
/// { "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]] }
/// ```
///
/// A body that is not JSON, or JSON without a `texts` list of strings, is
/// rejected with the status axum's JSON extractor chooses (400, 415 or 422)
/// and a structured error body. A failing inference on any text returns 500.
pub async fn create_embeddings_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateEmbeddingsRequest>, JsonRejection>,
) -> Result<Json<CreateEmbeddingsResponse>, ApiError> {
    let Json(request) = payload?;

    let start = Instant::now();
    let embeddings = state
        .embedding_service
        .create_embeddings(&request.texts)
        .await?;

    info!(
        "Created {} embeddings in {:?}",
        embeddings.len(),
        start.elapsed()
    );

    Ok(Json(embeddings.into()))
}
