use crate::{Bson, Code, Document, Long, Regex, bson, doc, oid::ObjectId};
use pretty_assertions::assert_eq;

#[test]
fn literal_widths() {
    let doc = doc! {
        "float": 2.5,
        "whole_float": 3.0,
        "i32": 12,
        "i64": -55i64,
        "with_wrapped_parens": (-20),
    };

    assert_eq!(doc.get("float"), Some(&Bson::Number(2.5)));
    assert_eq!(doc.get("whole_float"), Some(&Bson::Number(3.0)));
    assert_eq!(doc.get("i32"), Some(&Bson::Int32(12)));
    assert_eq!(doc.get("i64"), Some(&Bson::Int64(Long::from_i64(-55))));
    assert_eq!(doc.get("with_wrapped_parens"), Some(&Bson::Int32(-20)));
}

#[test]
fn nested_values() {
    let id = ObjectId::from_bytes(*b"thisismyname");
    let doc = doc! {
        "array": ["testing", 1, true, [1, 2], { "x": null }],
        "doc": {
            "fish": "in",
            "a": "barrel",
            "!": 1,
        },
        "regexp": Regex::new("s[ao]d", "i").unwrap(),
        "code": Code::new("function(x) { return x._id; }"),
        "_id": id,
        "null": null,
    };

    let mut inner = Document::new();
    inner.insert("x", Bson::Null);
    let expected_array = Bson::Array(vec![
        Bson::String("testing".into()),
        Bson::Int32(1),
        Bson::Boolean(true),
        Bson::Array(vec![Bson::Int32(1), Bson::Int32(2)]),
        Bson::Document(inner),
    ]);
    assert_eq!(doc.get("array"), Some(&expected_array));
    assert_eq!(doc.get_document("doc").unwrap().len(), 3);
    assert_eq!(doc.get_object_id("_id").unwrap(), id);
    assert!(doc.is_null("null"));

    let keys: Vec<_> = doc.keys().map(String::as_str).collect();
    assert_eq!(keys, ["array", "doc", "regexp", "code", "_id", "null"]);
}

#[test]
fn computed_keys() {
    let key = "dynamic";
    let doc = doc! { (key): 1, (format!("{key}_2")): 2 };
    assert_eq!(doc.get_i32("dynamic").unwrap(), 1);
    assert_eq!(doc.get_i32("dynamic_2").unwrap(), 2);
}

#[test]
fn empty_values() {
    assert_eq!(doc! {}, Document::new());
    assert_eq!(bson!([]), Bson::Array(vec![]));
    assert_eq!(bson!({}), Bson::Document(Document::new()));
    assert_eq!(bson!(null), Bson::Null);
    assert_eq!(bson!([null, 1]), Bson::Array(vec![Bson::Null, Bson::Int32(1)]));
}
