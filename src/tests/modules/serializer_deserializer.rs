use crate::{
    Binary,
    Bson,
    Code,
    DbPointer,
    DbRef,
    Decimal128,
    Document,
    Long,
    Regex,
    Timestamp,
    calculate_object_size,
    de::DeserializerOptions,
    deserialize,
    deserialize_stream,
    doc,
    error::ErrorKind,
    oid::ObjectId,
    ser::SerializerOptions,
    serialize,
    serialize_into,
    spec::BinarySubtype,
};
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

const HELLO_WORLD: [u8; 22] = [
    0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00, 0x00, 0x00, b'w',
    b'o', b'r', b'l', b'd', 0x00, 0x00,
];

/// Wraps element bytes in a document length prefix and terminator.
fn raw_document(elements: &[u8]) -> Vec<u8> {
    let len = (4 + elements.len() + 1) as i32;
    let mut bytes = len.to_le_bytes().to_vec();
    bytes.extend_from_slice(elements);
    bytes.push(0);
    bytes
}

fn exact() -> DeserializerOptions {
    DeserializerOptions::default()
        .promote_values(false)
        .promote_longs(false)
}

fn every_type() -> Document {
    let id = ObjectId::from_bytes(*b"thisismyname");
    doc! {
        "double": Bson::Double(1.5),
        "string": "hello",
        "doc": { "x": 1 },
        "array": [1, "two", [3]],
        "binary": Binary::from_bytes(b"thingies".to_vec(), BinarySubtype::Md5),
        "_id": id,
        "bool": true,
        "date": crate::DateTime::from_millis(1_500_000_000_000),
        "null": null,
        "regex": Regex::new("s[ao]d", "i").unwrap(),
        "pointer": Bson::DbPointer(DbPointer { namespace: "db.coll".into(), id }),
        "code": Code::new("function() {}"),
        "symbol": Bson::Symbol("sym".into()),
        "code_with_scope": Code::with_scope("x + y", doc! { "y": 1 }),
        "i32": 42,
        "timestamp": Timestamp::new(1, 2),
        "i64": 5i64,
        "decimal": "1.50".parse::<Decimal128>().unwrap(),
        "min": Bson::MinKey,
        "max": Bson::MaxKey,
        "ref": DbRef::new("coll", "some-id"),
    }
}

#[test]
fn hello_world_bytes() {
    let doc = doc! { "hello": "world" };
    let options = SerializerOptions::default();
    assert_eq!(serialize(&doc, &options).unwrap(), HELLO_WORLD);
    assert_eq!(calculate_object_size(&doc, &options).unwrap(), 22);
    assert_eq!(
        deserialize(&HELLO_WORLD, &DeserializerOptions::default()).unwrap(),
        doc
    );
}

#[test]
fn every_type_round_trips() {
    let doc = every_type();
    let options = SerializerOptions::default();
    let bytes = serialize(&doc, &options).unwrap();
    assert_eq!(bytes.len(), calculate_object_size(&doc, &options).unwrap());
    let decoded = deserialize(&bytes, &exact()).unwrap();
    let keys: Vec<_> = decoded.keys().collect();
    assert_eq!(keys, doc.keys().collect::<Vec<_>>());
    assert_eq!(serialize(&decoded, &options).unwrap(), bytes);
    assert_eq!(decoded, doc);
}

#[test]
fn lengths_count_their_own_prefix() {
    let options = DeserializerOptions::default();
    assert_eq!(deserialize(&[5, 0, 0, 0, 0], &options).unwrap(), Document::new());

    // { "d": {} }
    let nested = raw_document(&[0x03, b'd', 0x00, 5, 0, 0, 0, 0]);
    assert_eq!(deserialize(&nested, &options).unwrap(), doc! { "d": {} });

    // { "c": code "x" with scope {} }
    let code = raw_document(&[
        0x0F, b'c', 0x00, 15, 0, 0, 0, 2, 0, 0, 0, b'x', 0x00, 5, 0, 0, 0, 0,
    ]);
    assert_eq!(
        deserialize(&code, &exact()).unwrap().get("c"),
        Some(&Bson::JavaScriptCode(Code::new("x")))
    );

    // an inner length one byte past the end of the outer document
    let overrun = raw_document(&[0x03, b'd', 0x00, 7, 0, 0, 0, 0]);
    assert!(deserialize(&overrun, &options).unwrap_err().is_malformed_value());
}

#[test]
fn serialize_into_matches_serialize() {
    let doc = every_type();
    let options = SerializerOptions::default();
    let expected = serialize(&doc, &options).unwrap();

    let mut buf = vec![0xaau8; expected.len() + 5];
    let last = serialize_into(&doc, &mut buf, 3, &options).unwrap();
    assert_eq!(last, 3 + expected.len() - 1);
    assert_eq!(&buf[3..=last], expected.as_slice());
    assert_eq!(&buf[..3], &[0xaa; 3]);
    assert_eq!(&buf[last + 1..], &[0xaa; 2]);
}

#[test]
fn serialize_into_rejects_short_buffer() {
    let doc = doc! { "hello": "world" };
    let mut buf = [0u8; 21];
    let err = serialize_into(&doc, &mut buf, 0, &SerializerOptions::default()).unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(buf, [0u8; 21]);

    let mut buf = [0u8; 30];
    assert!(serialize_into(&doc, &mut buf, 10, &SerializerOptions::default()).is_err());
}

#[test]
fn number_width_on_the_wire() {
    let options = SerializerOptions::default();
    let tag = |value: f64| {
        let bytes = serialize(&doc! { "a": Bson::Number(value) }, &options).unwrap();
        (bytes[4], bytes.len())
    };

    assert_eq!(tag(2_147_483_647.0), (0x10, 12));
    assert_eq!(tag(-2_147_483_648.0), (0x10, 12));
    assert_eq!(tag(2_147_483_648.0), (0x12, 16));
    assert_eq!(tag(1.5), (0x01, 16));
    assert_eq!(tag(-0.0), (0x01, 16));
    assert_eq!(tag(f64::NAN), (0x01, 16));

    let bytes = serialize(&doc! { "a": Bson::Number(-0.0) }, &options).unwrap();
    let value = deserialize(&bytes, &DeserializerOptions::default())
        .unwrap()
        .get_f64("a")
        .unwrap();
    assert!(value == 0.0 && value.is_sign_negative());
}

#[test]
fn promotion_options() {
    let doc = doc! {
        "i32": 7,
        "double": Bson::Double(2.0),
        "safe": Bson::Int64(Long::from_i64(1 << 53)),
        "unsafe": Bson::Int64(Long::from_i64((1 << 53) + 1)),
        "negative_safe": Bson::Int64(Long::from_i64(-(1 << 53))),
    };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();

    let promoted = deserialize(&bytes, &DeserializerOptions::default()).unwrap();
    assert_eq!(promoted.get("i32"), Some(&Bson::Number(7.0)));
    assert_eq!(promoted.get("double"), Some(&Bson::Number(2.0)));
    assert_eq!(
        promoted.get("safe"),
        Some(&Bson::Number(9_007_199_254_740_992.0))
    );
    assert_eq!(
        promoted.get("unsafe"),
        Some(&Bson::Int64(Long::from_i64((1 << 53) + 1)))
    );
    assert_eq!(
        promoted.get("negative_safe"),
        Some(&Bson::Number(-9_007_199_254_740_992.0))
    );

    assert_eq!(deserialize(&bytes, &exact()).unwrap(), doc);

    let longs_only = DeserializerOptions::default().promote_values(false);
    let decoded = deserialize(&bytes, &longs_only).unwrap();
    assert_eq!(decoded.get("i32"), Some(&Bson::Int32(7)));
    assert_eq!(
        decoded.get("safe"),
        Some(&Bson::Number(9_007_199_254_740_992.0))
    );
}

#[test]
fn promote_buffers() {
    let doc = doc! {
        "generic": Bson::Bytes(b"hello world".to_vec()),
        "md5": Binary::from_bytes(b"digest".to_vec(), BinarySubtype::Md5),
    };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();

    let plain = deserialize(&bytes, &DeserializerOptions::default()).unwrap();
    assert_eq!(
        plain.get_binary("generic").unwrap(),
        &Binary::from_bytes(b"hello world".to_vec(), BinarySubtype::Generic)
    );

    let promoted = deserialize(
        &bytes,
        &DeserializerOptions::default().promote_buffers(true),
    )
    .unwrap();
    assert_eq!(
        promoted.get("generic"),
        Some(&Bson::Bytes(b"hello world".to_vec()))
    );
    assert_eq!(promoted.get_binary("md5").unwrap().subtype, BinarySubtype::Md5);
}

#[test]
fn binary_old_layout() {
    let doc = doc! { "b": Binary::from_bytes(b"hi".to_vec(), BinarySubtype::BinaryOld) };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();
    let expected = raw_document(&[
        0x05, b'b', 0x00, 0x06, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00, b'h', b'i',
    ]);
    assert_eq!(bytes, expected);
    assert_eq!(deserialize(&bytes, &exact()).unwrap(), doc);

    // inner length disagreeing with the outer one
    let corrupt = raw_document(&[
        0x05, b'b', 0x00, 0x06, 0x00, 0x00, 0x00, 0x02, 0x03, 0x00, 0x00, 0x00, b'h', b'i',
    ]);
    let err = deserialize(&corrupt, &exact()).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("b"));
}

#[test]
fn undefined_handling() {
    let doc = doc! { "a": Bson::Undefined, "list": [Bson::Undefined, 1] };

    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();
    assert_eq!(
        deserialize(&bytes, &exact()).unwrap(),
        doc! { "a": null, "list": [null, 1] }
    );

    let options = SerializerOptions::default().ignore_undefined(true);
    let bytes = serialize(&doc, &options).unwrap();
    assert_eq!(bytes.len(), calculate_object_size(&doc, &options).unwrap());
    let decoded = deserialize(&bytes, &exact()).unwrap();
    assert_eq!(decoded, doc! { "list": [null, 1] });
    assert!(!decoded.contains_key("a"));
}

#[test]
fn function_handling() {
    let source = "function() { return 1; }";
    let doc = doc! {
        "f": Bson::Function(source.into()),
        "list": [Bson::Function(source.into())],
    };

    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();
    assert_eq!(
        deserialize(&bytes, &exact()).unwrap(),
        doc! { "list": [null] }
    );

    let options = SerializerOptions::default().serialize_functions(true);
    let bytes = serialize(&doc, &options).unwrap();
    let decoded = deserialize(&bytes, &exact()).unwrap();
    assert_eq!(decoded.get("f"), Some(&Bson::JavaScriptCode(Code::new(source))));
    assert_eq!(
        decoded.get_array("list").unwrap(),
        &vec![Bson::JavaScriptCode(Code::new(source))]
    );
}

#[test]
fn code_scope_on_the_wire() {
    let empty_scope = doc! { "c": Code::with_scope("x", doc! {}) };
    let bytes = serialize(&empty_scope, &SerializerOptions::default()).unwrap();
    assert_eq!(bytes[4], 0x0D);
    assert_eq!(deserialize(&bytes, &exact()).unwrap(), empty_scope);

    let scoped = doc! { "c": Code::with_scope("x", doc! { "y": 1 }) };
    let bytes = serialize(&scoped, &SerializerOptions::default()).unwrap();
    assert_eq!(bytes[4], 0x0F);
    assert_eq!(deserialize(&bytes, &exact()).unwrap(), scoped);
}

#[test]
fn check_keys() {
    let options = SerializerOptions::default().check_keys(true);

    let err = serialize(&doc! { "$bad": 1 }, &options).unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.key.as_deref(), Some("$bad"));

    let err = serialize(&doc! { "outer": { "a.b": 1 } }, &options).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("a.b"));

    // accepted without the option
    assert!(serialize(&doc! { "$ok": 1, "a.b": 1 }, &SerializerOptions::default()).is_ok());

    // reference fields are exempt
    let doc = doc! { "ref": DbRef::new("coll", 1).with_db("db") };
    assert!(serialize(&doc, &options).is_ok());
}

#[test]
fn null_bytes_are_rejected() {
    let options = SerializerOptions::default();

    let err = serialize(&doc! { "a\0b": 1 }, &options).unwrap_err();
    assert!(err.is_invalid_argument());

    let doc = doc! { "re": Regex::new("a\0", "").unwrap() };
    let err = serialize(&doc, &options).unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(err.key.as_deref(), Some("re"));

    let doc = doc! { "list": [1, { "k\0": 1 }] };
    let err = calculate_object_size(&doc, &options).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn db_ref_decoding() {
    let id = ObjectId::from_bytes([9; 12]);
    let doc = doc! {
        "full": { "$ref": "coll", "$id": id, "$db": "app", "extra": true },
        "partial": { "$ref": "coll", "$id": id },
        "not_a_ref": { "$ref": "coll" },
    };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();
    let decoded = deserialize(&bytes, &DeserializerOptions::default()).unwrap();

    let full = decoded.get("full").and_then(Bson::as_db_ref).unwrap();
    assert_eq!(full.namespace, "coll");
    assert_eq!(*full.id, Bson::ObjectId(id));
    assert_eq!(full.db.as_deref(), Some("app"));
    assert_eq!(full.fields, doc! { "extra": true });

    let partial = decoded.get("partial").and_then(Bson::as_db_ref).unwrap();
    assert_eq!(partial, &DbRef::new("coll", id));

    assert_eq!(
        decoded.get("not_a_ref"),
        Some(&Bson::Document(doc! { "$ref": "coll" }))
    );
}

#[test]
fn reference_keys_must_lead() {
    let options = SerializerOptions::default();
    let cases = [
        doc! { "r": { "x": 1, "$ref": "c", "$id": 2 } },
        doc! { "r": { "$id": 2, "$ref": "c" } },
        doc! { "r": { "$ref": "c", "x": 1, "$id": 2 } },
        doc! { "r": { "$ref": "c", "$id": 2, "x": 1, "$db": "app" } },
        doc! { "r": { "$ref": "c", "$id": 2, "$db": 3 } },
    ];
    for doc in cases {
        let bytes = serialize(&doc, &options).unwrap();
        let decoded = deserialize(&bytes, &exact()).unwrap();
        assert_matches!(decoded.get("r"), Some(Bson::Document(_)), "{doc}");
        assert_eq!(serialize(&decoded, &options).unwrap(), bytes, "{doc}");
    }

    let leading = doc! { "r": { "$ref": "c", "$id": 2, "$db": "app", "x": 1 } };
    let bytes = serialize(&leading, &options).unwrap();
    let decoded = deserialize(&bytes, &exact()).unwrap();
    assert_matches!(decoded.get("r"), Some(Bson::DbRef(_)));
    assert_eq!(serialize(&decoded, &options).unwrap(), bytes);
}

#[test]
fn regex_flags() {
    let doc = doc! { "re": Regex::new("a+", "xumsli").unwrap() };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();

    let decoded = deserialize(&bytes, &DeserializerOptions::default()).unwrap();
    assert_eq!(
        decoded.get("re"),
        Some(&Bson::RegularExpression(Regex::new("a+", "imsux").unwrap()))
    );

    let verbatim = DeserializerOptions::default().bson_regexp(true);
    let decoded = deserialize(&bytes, &verbatim).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn symbols_stay_symbols() {
    let doc = doc! { "s": Bson::Symbol("sym".into()) };
    let bytes = serialize(&doc, &SerializerOptions::default()).unwrap();
    assert_eq!(bytes[4], 0x0E);
    assert_eq!(deserialize(&bytes, &DeserializerOptions::default()).unwrap(), doc);
}

#[test]
fn stream_of_documents() {
    let first = doc! { "a": 1 };
    let second = doc! { "b": "hello" };
    let options = SerializerOptions::default();

    let mut buf = vec![0u8; 30];
    let end = serialize_into(&first, &mut buf, 0, &options).unwrap();
    assert_eq!(end, 11);
    let end = serialize_into(&second, &mut buf, end + 1, &options).unwrap();
    assert_eq!(end, 29);

    let (docs, next) = deserialize_stream(&buf, 0, 2, &exact()).unwrap();
    assert_eq!(docs, vec![first, second.clone()]);
    assert_eq!(next, 30);

    let (docs, next) = deserialize_stream(&buf, 12, 1, &exact()).unwrap();
    assert_eq!(docs, vec![second]);
    assert_eq!(next, 30);

    let err = deserialize_stream(&buf, 0, 3, &exact()).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.index, Some(2));
}

#[test]
fn rejects_bad_lengths() {
    let options = DeserializerOptions::default();

    assert!(deserialize(&[0x01, 0x02, 0x03], &options).unwrap_err().is_malformed_value());
    assert!(
        deserialize(&[0xff, 0xff, 0x00, 0x00, 0x00], &options)
            .unwrap_err()
            .is_malformed_value()
    );
    assert!(
        deserialize(&[0x04, 0x00, 0x00, 0x00, 0x00], &options)
            .unwrap_err()
            .is_malformed_value()
    );

    let mut padded = HELLO_WORLD.to_vec();
    padded.extend_from_slice(&[0, 0]);
    assert!(deserialize(&padded, &options).unwrap_err().is_malformed_value());
    let lenient = DeserializerOptions::default().allow_object_smaller_than_buffer_size(true);
    assert_eq!(
        deserialize(&padded, &lenient).unwrap(),
        doc! { "hello": "world" }
    );
    assert!(deserialize(&HELLO_WORLD[..20], &lenient).is_err());

    let mut unterminated = HELLO_WORLD;
    unterminated[21] = 1;
    assert!(deserialize(&unterminated, &options).unwrap_err().is_malformed_value());

    // string length pointing past the document
    let mut long_string = HELLO_WORLD;
    long_string[11] = 0x40;
    assert!(deserialize(&long_string, &options).unwrap_err().is_malformed_value());
}

#[test]
fn rejects_bad_elements() {
    let options = DeserializerOptions::default();

    let err = deserialize(&raw_document(&[0x20, b'x', 0x00]), &options).unwrap_err();
    assert!(err.is_malformed_value());
    assert_eq!(err.key.as_deref(), Some("x"));

    let bad_bool = raw_document(&[0x08, b'b', 0x00, 0x02]);
    assert!(deserialize(&bad_bool, &options).unwrap_err().is_malformed_value());

    let bad_utf8 = raw_document(&[0x02, b's', 0x00, 0x02, 0x00, 0x00, 0x00, 0xff, 0x00]);
    let err = deserialize(&bad_utf8, &options).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);
    assert_eq!(err.key.as_deref(), Some("s"));

    let truncated_int = raw_document(&[0x10, b'i', 0x00, 0x01, 0x00]);
    assert!(deserialize(&truncated_int, &options).unwrap_err().is_malformed_value());
}

#[test]
fn errors_report_innermost_location() {
    let inner = raw_document(&[0x08, b'b', 0x00, 0x02]);
    let mut elements = vec![0x03, b'o', 0x00];
    elements.extend_from_slice(&inner);
    let err = deserialize(&raw_document(&elements), &DeserializerOptions::default()).unwrap_err();
    assert_eq!(err.key.as_deref(), Some("b"));

    let mut elements = vec![0x04, b'l', 0x00];
    elements.extend_from_slice(&raw_document(&[
        0x10, b'0', 0x00, 0x01, 0x00, 0x00, 0x00, 0x08, b'1', 0x00, 0x07,
    ]));
    let err = deserialize(&raw_document(&elements), &DeserializerOptions::default()).unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(err.key, None);
    assert!(err.to_string().starts_with("Error at array index 1"));
}
