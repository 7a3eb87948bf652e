//! Seams to the external signature engine.
//!
//! The engine owns signature parsing, byte-pattern matching and container
//! matching. This crate only loads it, hands it requests and reads its
//! results back.

use std::path::Path;

use thiserror::Error;

use crate::format::IdentificationResult;

/// Errors reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse signature file: {0}")]
    Parse(String),
    #[error("matching failed: {0}")]
    Match(String),
}

/// Content and hints for one identification.
#[derive(Debug, Clone)]
pub struct IdentificationRequest {
    /// Resource name hint (e.g. a file name); empty when hidden or unknown.
    pub name: String,
    /// Full content of the resource.
    pub bytes: Vec<u8>,
}

impl IdentificationRequest {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Content length in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Binary signature matching.
pub trait BinarySignatureMatcher {
    /// Match the request content against the loaded binary signatures.
    /// Results are ranked, highest priority first.
    fn match_binary(
        &self,
        request: &IdentificationRequest,
    ) -> Result<Vec<IdentificationResult>, EngineError>;

    /// Version of the loaded binary signature file, as the engine reports it.
    fn signature_file_version(&self) -> String;
}

/// Container signature matching.
pub trait ContainerMatcher {
    /// Resolve container formats for the request, given the binary results.
    /// An empty result means the container step had nothing to add.
    fn match_container(
        &self,
        request: &IdentificationRequest,
        binary_results: &[IdentificationResult],
    ) -> Result<Vec<IdentificationResult>, EngineError>;
}

/// A loaded signature engine.
pub trait SignatureEngine: Sized {
    type Binary: BinarySignatureMatcher;
    type Container: ContainerMatcher;

    /// Parse the signature files and build the matchers.
    ///
    /// `max_bytes_to_scan` of `None` scans whole streams.
    fn load(
        signature_file: &Path,
        container_signature_file: Option<&Path>,
        max_bytes_to_scan: Option<u64>,
    ) -> Result<Self, LoadError>;

    fn binary(&self) -> &Self::Binary;

    /// Container matcher, when a container signature file was loaded.
    fn container(&self) -> Option<&Self::Container>;
}

/// Which signature file a load failure belongs to.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("binary signatures: {0}")]
    Binary(#[source] EngineError),
    #[error("container signatures: {0}")]
    Container(#[source] EngineError),
}
