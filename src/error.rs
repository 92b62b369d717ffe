//! Error types for the blueprint compiler
//!
//! Only external preconditions are fatal. Everything the blueprint itself can get
//! wrong is recorded in [`crate::graph::Diagnostics`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Fatal compiler errors
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Blueprint not found: {0}")]
    MissingBlueprint(PathBuf),

    #[error("Invalid blueprint: {0}")]
    InvalidBlueprint(String),

    #[error("Invalid pre-generated sources: {0}")]
    InvalidPregenerated(String),

    #[error("Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    #[error("Artifact path escapes the output root: {0}")]
    InvalidArtifactPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
