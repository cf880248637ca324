//! Fuzz target for difference-list record parsing.
//!
//! Arbitrary bytes must never panic the parser, and any line that does
//! parse must survive a serialize/reparse round trip unchanged, since the
//! outcome logs replay as later inputs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use replicopy::record::DiffRecord;

fuzz_target!(|data: &[u8]| {
    let line = match std::str::from_utf8(data) {
        Ok(line) => line,
        Err(_) => return,
    };

    // Parsing must never panic, whatever the line holds.
    let record: DiffRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(_) => return,
    };

    // Whatever parsed must write back as a single log line and reparse to
    // the same record.
    let reserialized = serde_json::to_string(&record).expect("parsed record must serialize");
    assert!(!reserialized.contains('\n'));

    let reparsed: DiffRecord =
        serde_json::from_str(&reserialized).expect("own output must reparse");
    assert_eq!(record, reparsed);
});
