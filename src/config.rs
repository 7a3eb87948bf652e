//! Detector configuration.
//!
//! Loaded from a `.json` file (serde_json) or, for any other extension, TOML.
//!
//! ```toml
//! signature_file = "signatures/DROID_SignatureFile_V69.xml"
//! container_signature_file = "signatures/container-signature-20120828.xml"
//! binary_signatures_only = false
//! pass_filename = true
//! ```

use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use crate::{Error, Result};

/// Options for building a [`Detector`](crate::Detector).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct DetectorConfig {
    /// Binary signature file; must exist.
    pub signature_file: PathBuf,
    /// Container signature file; must exist when set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub container_signature_file: Option<PathBuf>,
    /// Bytes the engine scans per stream (`None` = whole stream).
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_bytes_to_scan: Option<u64>,
    /// Skip container matching and reconcile the binary results directly.
    #[cfg_attr(feature = "serde", serde(default))]
    pub binary_signatures_only: bool,
    /// Pass the caller's resource name to the engine as a format hint.
    #[cfg_attr(feature = "serde", serde(default = "default_pass_filename"))]
    pub pass_filename: bool,
}

#[cfg(feature = "serde")]
fn default_pass_filename() -> bool {
    true
}

impl DetectorConfig {
    /// Binary signatures only, every other option at its default.
    pub fn new(signature_file: impl Into<PathBuf>) -> Self {
        Self {
            signature_file: signature_file.into(),
            container_signature_file: None,
            max_bytes_to_scan: None,
            binary_signatures_only: false,
            pass_filename: true,
        }
    }

    #[must_use]
    pub fn with_container_signature_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.container_signature_file = Some(path.into());
        self
    }

    /// Resolve relative signature paths against `base`.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.signature_file.is_relative() {
            self.signature_file = base.join(&self.signature_file);
        }
        if let Some(container) = self.container_signature_file.take() {
            self.container_signature_file = Some(if container.is_relative() {
                base.join(container)
            } else {
                container
            });
        }
        self
    }
}

#[cfg(feature = "serde")]
impl DetectorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a config file; relative signature paths are taken relative to the
    /// file's directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        Ok(match path.parent() {
            Some(dir) => config.relative_to(dir),
            None => config,
        })
    }
}
