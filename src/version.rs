// Version information for the similarity embeddings service

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-19";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "embeddings-create",
    "onnx-runtime",
    "mean-pooling",
    "l2-normalization",
    "configurable-batching",
    "health-check",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("similarity-embeddings {} ({})", VERSION_NUMBER, BUILD_DATE)
}
