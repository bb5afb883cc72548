//! Core error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cluster manifest root not found: {}", path.display())]
    ClusterRootNotFound { path: PathBuf },

    #[error("Invalid wave manifest {}: {message}", path.display())]
    InvalidWaveManifest { path: PathBuf, message: String },

    #[error("Malformed hook: {message}")]
    MalformedHook { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
