#![no_main]
use bson_core::extjson::{self, ExtJsonOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|buf: &[u8]| {
    if let Ok(text) = std::str::from_utf8(buf) {
        let _ = extjson::parse(text, &ExtJsonOptions::default());
        let _ = extjson::parse(text, &ExtJsonOptions::canonical());
    }
});
