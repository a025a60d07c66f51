#![no_main]
use bson_core::{de::DeserializerOptions, deserialize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|buf: &[u8]| {
    let _ = deserialize(buf, &DeserializerOptions::default());
    let _ = deserialize(buf, &DeserializerOptions::default().bson_regexp(true));
});
