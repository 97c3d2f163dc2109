//! Fuzz target for records file decoding.
//!
//! Feeds arbitrary bytes to the framed reader and the `Example` decoder;
//! corrupt input must come back as an error, never a panic or a huge
//! allocation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use recordgen::tfrecord::from_records_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_records_slice(data);
});
