//! Fuzz target for manifest parsing and record interpretation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recordgen::manifest::io_manifest::from_manifest_slice;
use recordgen::manifest::LabelJobKey;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(records) = from_manifest_slice(data) {
        for record in &records {
            let _ = record.source_ref();
            let _ = record.annotations(&LabelJobKey::Discover);
        }
    }
});
