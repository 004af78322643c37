// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use similarity_embeddings::{
    api::{start_server, AppState},
    config::ServerConfig,
    embeddings::{EmbeddingModel, EmbeddingService, OnnxEmbeddingModel},
    version,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cwd = env::current_dir().context("Failed to read working directory")?;
    println!("{}", cwd.display());

    println!("🚀 Starting {}", version::get_version_string());

    let config = ServerConfig::parse();
    config.validate()?;

    // The service refuses to start without a working model
    println!("🧠 Loading embedding model from {}...", config.model_dir.display());
    let model = OnnxEmbeddingModel::new(config.embedding_model_config())
        .await
        .context("Failed to load embedding model")?;
    println!(
        "✅ Embedding model {} loaded ({} dimensions)",
        model.model_name(),
        model.dimension()
    );

    let service = EmbeddingService::new(Arc::new(model), config.batch_size)?;
    let state = AppState::new(service);

    let addr = config.socket_addr()?;
    println!("🌐 HTTP listening on http://{}", addr);
    println!("  Embeddings:   POST http://{}/embeddings/create", addr);
    println!("  Health:       GET  http://{}/health", addr);

    start_server(&config, state).await?;

    println!("👋 Goodbye!");
    Ok(())
}
