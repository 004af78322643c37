// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embeddings/create behaviour through the full router
//!
//! These tests verify that:
//! - N texts produce N vectors in input order
//! - An empty list produces an empty list
//! - Every vector has the model's dimension
//! - The same text always yields the same vector
//! - A failing inference fails the whole request with 500
//! - Request bodies larger than axum's default limit are accepted

use crate::common::{
    body_json, json_request, send, state_with, test_app, HashEmbeddingModel, TEST_DIMENSION,
};
use axum::http::{Method, StatusCode};
use similarity_embeddings::{create_app, CreateEmbeddingsResponse};
use std::sync::Arc;

async fn create(body: &str) -> (StatusCode, serde_json::Value) {
    let response = send(
        test_app(),
        json_request(Method::POST, "/embeddings/create", body),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_single_text() {
    let (status, body) = create(r#"{"texts": ["hello world"]}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: CreateEmbeddingsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.embedding_count(), 1);
    assert_eq!(response.embeddings[0].len(), TEST_DIMENSION);
}

#[tokio::test]
async fn test_response_has_only_embeddings_field() {
    let (_, body) = create(r#"{"texts": ["hello world"]}"#).await;

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(object["embeddings"].is_array());
}

#[tokio::test]
async fn test_order_is_preserved() {
    let texts = ["first", "second", "third", "fourth"];
    let (_, batch_body) = create(&serde_json::json!({ "texts": texts }).to_string()).await;
    let batch: CreateEmbeddingsResponse = serde_json::from_value(batch_body).unwrap();

    assert_eq!(batch.embedding_count(), texts.len());
    for (i, text) in texts.iter().enumerate() {
        let (_, single_body) = create(&serde_json::json!({ "texts": [text] }).to_string()).await;
        let single: CreateEmbeddingsResponse = serde_json::from_value(single_body).unwrap();
        assert_eq!(
            batch.embeddings[i], single.embeddings[0],
            "vector {} should belong to {:?}",
            i, text
        );
    }
}

#[tokio::test]
async fn test_empty_texts_returns_empty_embeddings() {
    let model = Arc::new(HashEmbeddingModel::new(TEST_DIMENSION));
    let app = create_app(state_with(model.clone(), 1));

    let response = send(
        app,
        json_request(Method::POST, "/embeddings/create", r#"{"texts": []}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "embeddings": [] }));
    assert_eq!(model.calls(), 0, "model should not run for an empty request");
}

#[tokio::test]
async fn test_all_vectors_share_dimension() {
    let (_, body) = create(r#"{"texts": ["a", "a much longer sentence about cats", ""]}"#).await;
    let response: CreateEmbeddingsResponse = serde_json::from_value(body).unwrap();

    assert_eq!(response.dimension(), Some(TEST_DIMENSION));
}

#[tokio::test]
async fn test_same_text_is_deterministic() {
    let (_, first) = create(r#"{"texts": ["repeat me"]}"#).await;
    let (_, second) = create(r#"{"texts": ["repeat me"]}"#).await;
    assert_eq!(first, second);

    let (_, pair) = create(r#"{"texts": ["repeat me", "repeat me"]}"#).await;
    assert_eq!(pair["embeddings"][0], pair["embeddings"][1]);
}

#[tokio::test]
async fn test_batched_service_matches_per_text() {
    let body = r#"{"texts": ["one", "two", "three", "four", "five"]}"#;

    let per_text = create_app(state_with(Arc::new(HashEmbeddingModel::new(8)), 1));
    let batched = create_app(state_with(Arc::new(HashEmbeddingModel::new(8)), 3));

    let a = body_json(send(per_text, json_request(Method::POST, "/embeddings/create", body)).await).await;
    let b = body_json(send(batched, json_request(Method::POST, "/embeddings/create", body)).await).await;

    assert_eq!(a, b);
}

#[tokio::test]
async fn test_large_body_is_accepted() {
    // 3 MiB, above axum's 2 MiB default body limit
    let long_text = "a".repeat(3 * 1024 * 1024);
    let body = serde_json::json!({ "texts": [long_text] }).to_string();

    let (status, body) = create(&body).await;

    assert_eq!(status, StatusCode::OK);
    let response: CreateEmbeddingsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.embedding_count(), 1);
    assert_eq!(response.embeddings[0].len(), TEST_DIMENSION);
}

#[tokio::test]
async fn test_inference_failure_returns_500_without_partial_results() {
    let model = Arc::new(HashEmbeddingModel::new(TEST_DIMENSION).failing_on("poison"));
    let app = create_app(state_with(model, 1));

    let response = send(
        app,
        json_request(
            Method::POST,
            "/embeddings/create",
            r#"{"texts": ["fine", "poison", "also fine"]}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error_type"], "internal_error");
    assert!(body.get("embeddings").is_none());
    assert!(body["message"].as_str().unwrap().contains("index 1"));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let app = test_app();

    let requests = (0..16).map(|i| {
        let app = app.clone();
        async move {
            let body = serde_json::json!({ "texts": [format!("text {}", i), "shared"] });
            let response = send(
                app,
                json_request(Method::POST, "/embeddings/create", &body.to_string()),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            body_json(response).await
        }
    });

    let results = futures_util::future::join_all(requests).await;

    assert_eq!(results.len(), 16);
    for body in &results {
        assert_eq!(body["embeddings"].as_array().unwrap().len(), 2);
        assert_eq!(body["embeddings"][1], results[0]["embeddings"][1]);
    }
}
