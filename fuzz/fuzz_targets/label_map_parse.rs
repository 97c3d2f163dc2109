#![no_main]

use libfuzzer_sys::fuzz_target;
use recordgen::manifest::io_label_map::from_label_map_str;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = from_label_map_str(text);
    }
});
