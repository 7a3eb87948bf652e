//! nanite — media type detection backed by an external file-format signature engine.
//!
//! This crate provides:
//! - **Result types** (`format`): engine identification results, normalized at the boundary.
//! - **Media types** (`media_type`): `type/subtype` plus parameters; parsing via `mime`.
//! - **Reconciler** (`reconcile`): ranked results → exactly one media type, never an error.
//! - **Engine seams** (`engine`): traits the signature engine implements.
//! - **Detector** (`detector`): `Detector::open(&config)` then `detect(reader, &metadata)`.
//! - **Config** (`config`): detector options from TOML or JSON.
//!
//! Signature parsing and matching are not implemented here; they belong to the engine.

pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod format;
pub mod media_type;
pub mod reconcile;

pub use config::DetectorConfig;
pub use detector::{Detector, Metadata, Provenance, SignatureFileInfo, RESOURCE_NAME_KEY};
pub use engine::{
    BinarySignatureMatcher, ContainerMatcher, EngineError, IdentificationRequest, LoadError,
    SignatureEngine,
};
pub use error::{Error, Result};
pub use format::IdentificationResult;
pub use media_type::{MediaType, MediaTypeError};
pub use reconcile::{reconcile, reconcile_one};
