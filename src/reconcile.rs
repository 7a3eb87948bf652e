//! Reconcile ranked identification results into one media type.
//!
//! The engine ranks its candidates; the first one is authoritative and the
//! rest are only used to decide whether the answer is ambiguous. Reconciling
//! never fails: content nothing matched is `application/octet-stream`.

use tracing::{debug, warn};

use crate::format::{puid_subtype, sanitize_name, IdentificationResult, NAME_PARAM, VERSION_PARAM};
use crate::media_type::MediaType;

/// Reduce ranked candidates to a single media type.
///
/// `results` must already be ordered by the engine's priority; no re-ranking
/// happens here. A version is only back-filled onto an engine-supplied MIME
/// type when there is exactly one candidate.
pub fn reconcile(results: &[IdentificationResult]) -> MediaType {
    let Some(first) = results.first() else {
        return MediaType::octet_stream();
    };

    let media_type = match first.primary_mime_type().and_then(|m| parse_engine_mime(first, m)) {
        Some(mut media_type) => {
            if media_type.parameter(VERSION_PARAM).is_none() && results.len() == 1 {
                if let Some(version) = &first.version {
                    media_type.set_parameter(VERSION_PARAM, version.as_str());
                }
            }
            media_type
        }
        None => synthesize(first),
    };

    debug!(
        candidates = results.len(),
        puid = %first.puid,
        media_type = %media_type,
        "reconciled identification results"
    );
    media_type
}

/// Reconcile a single result, as if it were the only candidate.
pub fn reconcile_one(result: &IdentificationResult) -> MediaType {
    reconcile(std::slice::from_ref(result))
}

fn parse_engine_mime(result: &IdentificationResult, mime: &str) -> Option<MediaType> {
    match MediaType::parse(mime) {
        Ok(media_type) => Some(media_type),
        Err(err) => {
            warn!(puid = %result.puid, error = %err, "unusable MIME type from engine");
            None
        }
    }
}

/// `application/x-puid-*` for a format the engine has no MIME type for.
/// `name` is left out when the engine gave no name.
fn synthesize(result: &IdentificationResult) -> MediaType {
    let mut media_type = MediaType::from_parts("application", &puid_subtype(&result.puid));
    if let Some(name) = &result.name {
        media_type.set_parameter(NAME_PARAM, &sanitize_name(name));
    }
    if let Some(version) = &result.version {
        media_type.set_parameter(VERSION_PARAM, version.as_str());
    }
    media_type
}
