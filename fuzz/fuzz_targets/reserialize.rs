#![no_main]
use bson_core::{calculate_object_size, de::DeserializerOptions, deserialize, ser::SerializerOptions, serialize};
use libfuzzer_sys::fuzz_target;

// Anything the decoder accepts must re-encode to exactly the size it reports.
fuzz_target!(|buf: &[u8]| {
    let options = DeserializerOptions::default()
        .promote_values(false)
        .promote_longs(false);
    if let Ok(doc) = deserialize(buf, &options) {
        let ser = SerializerOptions::default();
        if let Ok(bytes) = serialize(&doc, &ser) {
            assert_eq!(calculate_object_size(&doc, &ser).ok(), Some(bytes.len()));
        }
    }
});
