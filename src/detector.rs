//! Detector: owns one loaded signature engine and answers media type requests.
//!
//! Construction is all-or-nothing. Both signature files are checked, digested
//! and handed to the engine loader; any failure aborts construction, so a
//! detector never runs with a partially loaded signature set.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::engine::{
    BinarySignatureMatcher, ContainerMatcher, IdentificationRequest, LoadError, SignatureEngine,
};
use crate::media_type::MediaType;
use crate::reconcile::{reconcile, reconcile_one};
use crate::{Error, Result};

/// Request metadata key holding the resource (file) name.
pub const RESOURCE_NAME_KEY: &str = "resourceName";

/// Request metadata supplied alongside a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata carrying only a resource name.
    pub fn with_resource_name(name: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.set(RESOURCE_NAME_KEY, name);
        metadata
    }

    /// Set `key`, replacing an earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn resource_name(&self) -> Option<&str> {
        self.get(RESOURCE_NAME_KEY)
    }
}

/// Where a loaded signature file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SignatureFileInfo {
    pub path: PathBuf,
    /// Lower-case hex SHA-256 of the file contents.
    pub sha256: String,
}

/// Provenance of the signature sets a detector was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Provenance {
    pub binary: SignatureFileInfo,
    /// Engine-reported version of the binary signature file.
    pub binary_version: String,
    pub container: Option<SignatureFileInfo>,
}

/// Media type detector backed by a signature engine.
pub struct Detector<E: SignatureEngine> {
    engine: E,
    provenance: Provenance,
    binary_signatures_only: bool,
    pass_filename: bool,
}

impl<E: SignatureEngine> Detector<E> {
    /// Check and digest the configured signature files, then load the engine.
    pub fn open(config: &DetectorConfig) -> Result<Self> {
        let binary = signature_file_info(&config.signature_file)
            .map_err(|e| missing_or_io(e, &config.signature_file, Error::SignatureFileNotFound))?;
        let container = config
            .container_signature_file
            .as_deref()
            .map(|path| {
                signature_file_info(path)
                    .map_err(|e| missing_or_io(e, path, Error::ContainerSignatureFileNotFound))
            })
            .transpose()?;

        let engine = E::load(
            &config.signature_file,
            config.container_signature_file.as_deref(),
            config.max_bytes_to_scan,
        )
        .map_err(|e| match e {
            LoadError::Binary(source) => Error::SignatureParse {
                path: config.signature_file.clone(),
                source,
            },
            LoadError::Container(source) => Error::ContainerSignatureParse {
                path: config.container_signature_file.clone().unwrap_or_default(),
                source,
            },
        })?;

        let binary_version = engine.binary().signature_file_version();
        info!(
            path = %binary.path.display(),
            version = %binary_version,
            sha256 = %binary.sha256,
            "loaded binary signatures"
        );
        if let Some(container) = &container {
            info!(
                path = %container.path.display(),
                sha256 = %container.sha256,
                "loaded container signatures"
            );
        }

        Ok(Self {
            engine,
            provenance: Provenance {
                binary,
                binary_version,
                container,
            },
            binary_signatures_only: config.binary_signatures_only,
            pass_filename: config.pass_filename,
        })
    }

    /// Version of the loaded binary signature file.
    #[must_use]
    pub fn binary_signature_version(&self) -> &str {
        &self.provenance.binary_version
    }

    #[must_use]
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Identify a stream. The resource name in `metadata`, if any, is passed
    /// to the engine as a hint unless filename passing is disabled.
    pub fn detect<R: Read>(&self, mut input: R, metadata: &Metadata) -> Result<MediaType> {
        let name = if self.pass_filename {
            metadata.resource_name().unwrap_or_default()
        } else {
            ""
        };
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        self.identify(&IdentificationRequest::new(name, bytes))
    }

    /// Identify a file, using its canonical path as the name hint.
    pub fn detect_path<P: AsRef<Path>>(&self, path: P) -> Result<MediaType> {
        let path = path.as_ref().canonicalize()?;
        let file = File::open(&path)?;
        let metadata = Metadata::with_resource_name(path.to_string_lossy());
        self.detect(BufReader::new(file), &metadata)
    }

    fn identify(&self, request: &IdentificationRequest) -> Result<MediaType> {
        let results = self.engine.binary().match_binary(request)?;
        debug!(
            name = %request.name,
            size = request.size(),
            candidates = results.len(),
            "binary signature match"
        );

        if !self.binary_signatures_only {
            if let Some(container) = self.engine.container() {
                let resolved = container.match_container(request, &results)?;
                if let Some(first) = resolved.first() {
                    debug!(puid = %first.puid, "container match resolved");
                    return Ok(reconcile_one(first));
                }
            }
        }

        Ok(reconcile(&results))
    }
}

fn missing_or_io(err: std::io::Error, path: &Path, missing: fn(PathBuf) -> Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        missing(path.to_path_buf())
    } else {
        Error::Io(err)
    }
}

/// Hash a signature file. Fails with `NotFound` if it does not exist.
fn signature_file_info(path: &Path) -> std::io::Result<SignatureFileInfo> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let sha256 = hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    Ok(SignatureFileInfo {
        path: path.to_path_buf(),
        sha256,
    })
}
