//! Crate error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the detector.
///
/// The signature variants only occur while constructing a detector; a
/// detector that exists has both signature sets fully loaded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("signature file not found: {}", .0.display())]
    SignatureFileNotFound(PathBuf),
    #[error("container signature file not found: {}", .0.display())]
    ContainerSignatureFileNotFound(PathBuf),
    #[error("can't parse signature file {}: {source}", path.display())]
    SignatureParse {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("can't parse container signature file {}: {source}", path.display())]
    ContainerSignatureParse {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("configuration error: {0}")]
    Config(String),
}
