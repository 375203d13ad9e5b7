use std::path::PathBuf;

use thiserror::Error;

use cask_index::IndexError;
use cask_refs::RefError;
use cask_store::{BackendError, StoreError};
use cask_types::NamespaceId;

/// Errors from loading or validating a [`crate::StorageConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from namespace operations.
#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("namespace not found: {0}")]
    NamespaceNotFound(NamespaceId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Alias(#[from] IndexError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type NamespaceResult<T> = Result<T, NamespaceError>;
