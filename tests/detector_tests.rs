//! Detector tests: construction contract and request flow against a mock engine.
//!
//! The mock reads signature files of `puid|mime|name|version|magic` lines and
//! matches by content prefix. A file whose first line is `corrupt` fails to load.

use std::cell::Cell;
use std::io::{Cursor, Write};
use std::path::Path;

use nanite::{
    BinarySignatureMatcher, ContainerMatcher, Detector, DetectorConfig, EngineError, Error,
    IdentificationRequest, IdentificationResult, LoadError, Metadata, SignatureEngine,
};

struct Signature {
    result: IdentificationResult,
    magic: Vec<u8>,
}

fn parse_signatures(path: &Path) -> Result<Vec<Signature>, EngineError> {
    let text = std::fs::read_to_string(path)?;
    if text.starts_with("corrupt") {
        return Err(EngineError::Parse("corrupt signature file".into()));
    }
    text.lines()
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .map(|line| {
            let f: Vec<&str> = line.split('|').collect();
            if f.len() != 5 {
                return Err(EngineError::Parse(format!("bad line: {line}")));
            }
            let opt = |s: &str| if s == "-" { None } else { Some(s.to_string()) };
            Ok(Signature {
                result: IdentificationResult::from_engine(
                    f[0],
                    opt(f[1]).as_deref(),
                    opt(f[2]).as_deref(),
                    opt(f[3]).as_deref(),
                ),
                magic: f[4].as_bytes().to_vec(),
            })
        })
        .collect()
}

struct MockBinary {
    signatures: Vec<Signature>,
    max_bytes: Option<u64>,
    last_name: Cell<Option<String>>,
}

impl BinarySignatureMatcher for MockBinary {
    fn match_binary(
        &self,
        request: &IdentificationRequest,
    ) -> Result<Vec<IdentificationResult>, EngineError> {
        self.last_name.set(Some(request.name.clone()));
        let limit = self.max_bytes.map_or(request.bytes.len(), |m| m as usize);
        let scanned = &request.bytes[..request.bytes.len().min(limit)];
        if scanned.starts_with(b"ERR") {
            return Err(EngineError::Match("scan aborted".into()));
        }
        Ok(self
            .signatures
            .iter()
            .filter(|s| scanned.starts_with(&s.magic))
            .map(|s| s.result.clone())
            .collect())
    }

    fn signature_file_version(&self) -> String {
        "V69".to_string()
    }
}

struct MockContainer {
    signatures: Vec<Signature>,
    calls: Cell<usize>,
}

impl ContainerMatcher for MockContainer {
    fn match_container(
        &self,
        request: &IdentificationRequest,
        binary_results: &[IdentificationResult],
    ) -> Result<Vec<IdentificationResult>, EngineError> {
        self.calls.set(self.calls.get() + 1);
        // Container formats refine a zip match only.
        if !binary_results.iter().any(|r| r.puid == "x-fmt/263") {
            return Ok(Vec::new());
        }
        Ok(self
            .signatures
            .iter()
            .filter(|s| request.bytes.windows(s.magic.len()).any(|w| w == s.magic.as_slice()))
            .map(|s| s.result.clone())
            .collect())
    }
}

struct MockEngine {
    binary: MockBinary,
    container: Option<MockContainer>,
}

impl SignatureEngine for MockEngine {
    type Binary = MockBinary;
    type Container = MockContainer;

    fn load(
        signature_file: &Path,
        container_signature_file: Option<&Path>,
        max_bytes_to_scan: Option<u64>,
    ) -> Result<Self, LoadError> {
        let binary = MockBinary {
            signatures: parse_signatures(signature_file).map_err(LoadError::Binary)?,
            max_bytes: max_bytes_to_scan,
            last_name: Cell::new(None),
        };
        let container = container_signature_file
            .map(|p| parse_signatures(p).map_err(LoadError::Container))
            .transpose()?
            .map(|signatures| MockContainer {
                signatures,
                calls: Cell::new(0),
            });
        Ok(Self { binary, container })
    }

    fn binary(&self) -> &MockBinary {
        &self.binary
    }

    fn container(&self) -> Option<&MockContainer> {
        self.container.as_ref()
    }
}

const BINARY_SIGS: &str = "\
# puid|mime|name|version|magic
fmt/18|application/pdf|Acrobat PDF 1.4 - Portable Document Format|1.4|%PDF-1.4
x-fmt/263|application/zip|ZIP Format|2.0|PK
x-fmt/412|application/java-archive|Java Archive Format|-|PK
fmt/101|-|Signed \"XML\" Thing|null|<sig
fmt/353|image/tiff, image/tiff-fx|Tagged Image File Format|6|II*
";

const CONTAINER_SIGS: &str = "\
fmt/412|application/vnd.openxmlformats-officedocument.wordprocessingml.document|Microsoft Word for Windows|2007 onwards|word/document.xml
";

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

struct Fixture {
    _binary: tempfile::NamedTempFile,
    _container: tempfile::NamedTempFile,
    config: DetectorConfig,
}

fn fixture() -> Fixture {
    let binary = write_temp(BINARY_SIGS);
    let container = write_temp(CONTAINER_SIGS);
    let config = DetectorConfig::new(binary.path()).with_container_signature_file(container.path());
    Fixture {
        _binary: binary,
        _container: container,
        config,
    }
}

fn detect(detector: &Detector<MockEngine>, bytes: &[u8]) -> String {
    detector
        .detect(Cursor::new(bytes.to_vec()), &Metadata::new())
        .unwrap()
        .to_string()
}

#[test]
fn detects_single_match_with_version() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    assert_eq!(detect(&d, b"%PDF-1.4\n..."), "application/pdf; version=1.4");
}

#[test]
fn unknown_content_is_octet_stream() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    assert_eq!(detect(&d, b"\x00\x01\x02"), "application/octet-stream");
    assert_eq!(detect(&d, b""), "application/octet-stream");
}

#[test]
fn ambiguous_binary_match_drops_version() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    // Two zip-like candidates and no container match.
    assert_eq!(detect(&d, b"PK\x03\x04plain.txt"), "application/zip");
}

#[test]
fn container_result_replaces_binary_result() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    let m = d
        .detect(Cursor::new(b"PK\x03\x04word/document.xml".to_vec()), &Metadata::new())
        .unwrap();
    assert_eq!(
        m.essence(),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(m.parameter("version"), Some("2007 onwards"));
    assert_eq!(d.engine().container().unwrap().calls.get(), 1);
}

#[test]
fn binary_signatures_only_skips_container() {
    let f = fixture();
    let config = DetectorConfig {
        binary_signatures_only: true,
        ..f.config.clone()
    };
    let d = Detector::<MockEngine>::open(&config).unwrap();
    assert_eq!(detect(&d, b"PK\x03\x04word/document.xml"), "application/zip");
    assert_eq!(d.engine().container().unwrap().calls.get(), 0);
}

#[test]
fn synthetic_type_for_format_without_mime() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    assert_eq!(
        detect(&d, b"<sig>"),
        "application/x-puid-fmt-101; name=\"Signed 'XML' Thing\""
    );
}

#[test]
fn filename_hint_can_be_hidden() {
    let f = fixture();
    let metadata = Metadata::with_resource_name("report.pdf");

    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    d.detect(Cursor::new(b"%PDF".to_vec()), &metadata).unwrap();
    assert_eq!(d.engine().binary().last_name.take().as_deref(), Some("report.pdf"));

    let config = DetectorConfig {
        pass_filename: false,
        ..f.config.clone()
    };
    let d = Detector::<MockEngine>::open(&config).unwrap();
    d.detect(Cursor::new(b"%PDF".to_vec()), &metadata).unwrap();
    assert_eq!(d.engine().binary().last_name.take().as_deref(), Some(""));
}

#[test]
fn detect_path_uses_canonical_name() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.tif");
    std::fs::write(&path, b"II*\x00").unwrap();

    let m = d.detect_path(&path).unwrap();
    assert_eq!(m.to_string(), "image/tiff; version=6");
    let seen = d.engine().binary().last_name.take().unwrap();
    assert!(seen.ends_with("scan.tif"), "{seen}");
    assert!(Path::new(&seen).is_absolute());
}

#[test]
fn detect_path_missing_file_is_io_error() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = d.detect_path(dir.path().join("absent.bin")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}

#[test]
fn engine_failure_is_request_error() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    let err = d.detect(Cursor::new(b"ERR".to_vec()), &Metadata::new()).unwrap_err();
    assert!(matches!(err, Error::Engine(EngineError::Match(_))), "{err}");
}

#[test]
fn max_bytes_to_scan_reaches_engine() {
    let f = fixture();
    let config = DetectorConfig {
        max_bytes_to_scan: Some(4),
        ..f.config.clone()
    };
    let d = Detector::<MockEngine>::open(&config).unwrap();
    // The PDF magic is longer than the scan window.
    assert_eq!(detect(&d, b"%PDF-1.4"), "application/octet-stream");
}

#[test]
fn missing_signature_file_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = DetectorConfig::new(dir.path().join("DROID_SignatureFile_V69.xml"));
    match Detector::<MockEngine>::open(&config) {
        Ok(_) => panic!("expected missing signature file error"),
        Err(e) => {
            assert!(matches!(e, Error::SignatureFileNotFound(_)), "{e}");
            assert!(e.to_string().contains("DROID_SignatureFile_V69.xml"));
        }
    }
}

#[test]
fn missing_container_file_fails_construction() {
    let binary = write_temp(BINARY_SIGS);
    let dir = tempfile::tempdir().unwrap();
    let config = DetectorConfig::new(binary.path())
        .with_container_signature_file(dir.path().join("container-signature.xml"));
    let err = Detector::<MockEngine>::open(&config).err().unwrap();
    assert!(matches!(err, Error::ContainerSignatureFileNotFound(_)), "{err}");
}

#[test]
fn unparsable_signature_files_fail_construction() {
    let good = write_temp(BINARY_SIGS);
    let bad = write_temp("corrupt\n");

    let err = Detector::<MockEngine>::open(&DetectorConfig::new(bad.path())).err().unwrap();
    assert!(matches!(err, Error::SignatureParse { .. }), "{err}");

    let config = DetectorConfig::new(good.path()).with_container_signature_file(bad.path());
    let err = Detector::<MockEngine>::open(&config).err().unwrap();
    match err {
        Error::ContainerSignatureParse { path, source } => {
            assert_eq!(path, bad.path());
            assert!(matches!(source, EngineError::Parse(_)));
        }
        other => panic!("expected container parse error, got {other}"),
    }
}

#[test]
fn provenance_records_version_and_digests() {
    let f = fixture();
    let d = Detector::<MockEngine>::open(&f.config).unwrap();
    assert_eq!(d.binary_signature_version(), "V69");
    let p = d.provenance();
    assert_eq!(p.binary.path, f.config.signature_file);
    assert_eq!(p.binary.sha256.len(), 64);
    let container = p.container.as_ref().unwrap();
    assert_ne!(container.sha256, p.binary.sha256);
}

#[test]
fn detector_without_container_file() {
    let binary = write_temp(BINARY_SIGS);
    let d = Detector::<MockEngine>::open(&DetectorConfig::new(binary.path())).unwrap();
    assert!(d.provenance().container.is_none());
    assert_eq!(detect(&d, b"PK\x03\x04word/document.xml"), "application/zip");
}

#[cfg(feature = "serde")]
#[test]
fn opens_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("binary.sig"), BINARY_SIGS).unwrap();
    let config_path = dir.path().join("nanite.toml");
    std::fs::write(
        &config_path,
        "signature_file = \"binary.sig\"\nbinary_signatures_only = true\n",
    )
    .unwrap();

    let config = DetectorConfig::from_path(&config_path).unwrap();
    assert_eq!(config.signature_file, dir.path().join("binary.sig"));
    let d = Detector::<MockEngine>::open(&config).unwrap();
    assert_eq!(detect(&d, b"%PDF-1.4"), "application/pdf; version=1.4");
}
