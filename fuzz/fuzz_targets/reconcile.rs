#![no_main]

use libfuzzer_sys::fuzz_target;
use nanite::{reconcile, IdentificationResult, MediaType};

// Input is split on NUL into engine fields: puid, mime, name, version, repeated.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let fields: Vec<&str> = text.split('\0').collect();
    let results: Vec<IdentificationResult> = fields
        .chunks(4)
        .map(|f| {
            IdentificationResult::from_engine(
                f[0],
                f.get(1).copied(),
                f.get(2).copied(),
                f.get(3).copied(),
            )
        })
        .collect();

    let media_type = reconcile(&results);
    assert!(!media_type.type_().is_empty());
    assert!(!media_type.subtype().is_empty());

    let rendered = media_type.to_string();
    let reparsed = MediaType::parse(&rendered).expect("rendered media type must parse");
    assert_eq!(reparsed, media_type, "{rendered}");

    let _ = MediaType::parse(&text);
});
