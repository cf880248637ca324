//! Fuzz target for metadata carriage helpers.
//!
//! Tag validation, header scanning, and upload option assembly must never
//! panic on arbitrary metadata, and validated output must respect the
//! store-side caps.

#![no_main]

use libfuzzer_sys::fuzz_target;
use replicopy::copy::{content_encoding_of, encode_user_tags, upload_options_from};
use replicopy::store::{ObjectMeta, ReplicationStatus};
use std::collections::BTreeMap;

fuzz_target!(|data: (BTreeMap<String, String>, BTreeMap<String, Vec<String>>, String)| {
    let (tags, headers, etag) = data;

    // Tag validation never passes an invalid set through.
    if let Some(encoded) = encode_user_tags(&tags) {
        assert!(!encoded.is_empty());
        assert!(encoded.len() <= 10);
        for (key, value) in &encoded {
            assert!(!key.is_empty());
            assert!(key.chars().count() <= 128);
            assert!(value.chars().count() <= 256);
        }
        assert_eq!(encoded, tags);
    }

    // A header hit can only come from some spelling of content-encoding.
    if let Some(joined) = content_encoding_of(&headers) {
        let held = headers.iter().any(|(name, values)| {
            name.eq_ignore_ascii_case("content-encoding") && joined == values.join(",")
        });
        assert!(held, "encoding {:?} not sourced from the headers", joined);
    }

    // Option assembly always stamps the replication markers.
    let meta = ObjectMeta {
        etag,
        user_tags: tags,
        headers,
        ..ObjectMeta::default()
    };
    let options = upload_options_from(&meta);
    assert_eq!(options.replication_status, Some(ReplicationStatus::Replica));
    assert!(options.replication_request);
    if meta.etag.is_empty() {
        assert!(options.source_etag.is_none());
    } else {
        assert_eq!(options.source_etag.as_deref(), Some(meta.etag.as_str()));
    }
});
