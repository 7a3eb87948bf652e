//! Identification result types and constants.
//!
//! Defines the boundary type for results reported by the signature engine and
//! the constants the reconciler uses when building media types. The engine's
//! string-encoded fields (a `", "`-separated MIME list, `""`/`"null"` version
//! sentinels) are normalized once, in [`IdentificationResult::from_engine`].

/// Separator the engine uses between alternative MIME types in one field.
pub const MIME_TYPE_SEPARATOR: &str = ", ";

/// Text the engine reports instead of an absent version.
pub const NULL_VERSION: &str = "null";

/// Prefix of the subtype synthesized for results without a MIME type.
pub const PUID_SUBTYPE_PREFIX: &str = "x-puid-";

/// Parameter carrying the format version.
pub const VERSION_PARAM: &str = "version";

/// Parameter carrying the format display name on synthesized types.
pub const NAME_PARAM: &str = "name";

/// One candidate identification reported by the signature engine.
///
/// Candidates are ranked by the engine; the reconciler only ever looks at the
/// first one of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentificationResult {
    /// Opaque format identifier (e.g. `fmt/101`).
    pub puid: String,
    /// Alternative MIME types, highest priority first, as positioned by the
    /// engine (an entry may be blank). Empty when the engine gave no MIME field.
    pub mime_types: Vec<String>,
    /// Human-readable format name.
    pub name: Option<String>,
    /// Format version; never `Some("")` or `Some("null")`.
    pub version: Option<String>,
}

impl IdentificationResult {
    /// Build a result from the fields exactly as the engine reports them.
    ///
    /// `mime_type` may hold several types separated by `", "`; `version` may be
    /// empty or the literal `"null"`, both meaning "no version".
    pub fn from_engine(
        puid: impl Into<String>,
        mime_type: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
    ) -> Self {
        Self {
            puid: puid.into(),
            mime_types: split_mime_types(mime_type.unwrap_or_default()),
            name: name.map(str::to_owned),
            version: normalize_version(version),
        }
    }

    /// First (highest priority) MIME type. A blank first entry means none;
    /// later alternatives are never promoted.
    #[must_use]
    pub fn primary_mime_type(&self) -> Option<&str> {
        self.mime_types
            .first()
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }
}

/// Split the engine's MIME field into its ordered alternatives.
///
/// Entries keep their positions; a blank field yields no types.
pub fn split_mime_types(field: &str) -> Vec<String> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field
        .split(MIME_TYPE_SEPARATOR)
        .map(|s| s.trim().to_owned())
        .collect()
}

/// Map the engine's absent-version sentinels to `None`.
pub fn normalize_version(version: Option<&str>) -> Option<String> {
    match version {
        None | Some("") | Some(NULL_VERSION) => None,
        Some(v) => Some(v.to_owned()),
    }
}

/// Synthetic subtype for a format without a MIME type: `x-puid-` plus the
/// identifier with every `/` replaced by `-`.
///
/// Any other character a subtype name cannot hold is replaced by `-` too.
pub fn puid_subtype(puid: &str) -> String {
    let id: String = puid
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{PUID_SUBTYPE_PREFIX}{id}")
}

/// Display name made safe for a quoted parameter value: `"` becomes `'`.
pub fn sanitize_name(name: &str) -> String {
    name.replace('"', "'")
}
