//! Conversion between BSON values and [MongoDB Extended JSON v2](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/)
//!
//! ## Overview of Extended JSON
//!
//! MongoDB Extended JSON (abbreviated extJSON) is a format of JSON that allows for the encoding of
//! BSON type information. Normal JSON cannot unambiguously represent all BSON types losslessly, so
//! an extension was designed to include conventions for representing those types.
//!
//! For example, a BSON binary is represented by the following format:
//! ```text
//! {
//!    "$binary": {
//!        "base64": <base64 encoded payload as a string>,
//!        "subType": <subtype as a one or two character hex string>,
//!    }
//! }
//! ```
//!
//! ### Canonical and Relaxed Modes
//!
//! There are two modes of extJSON: "Canonical" and "Relaxed". They are the same except for the
//! following differences:
//!   - In relaxed mode, numbers are written as JSON numbers rather than in the object notation,
//!     except for non-finite doubles.
//!   - In relaxed mode, the string in the datetime object notation is RFC 3339 formatted if the
//!     date falls between 1970 and 9999.
//!
//! ```rust
//! use bson_core::{bson, extjson::{self, ExtJsonOptions}};
//!
//! let value = bson!({ "x": 5, "pi": 3.25 });
//!
//! let relaxed = extjson::stringify(&value, &ExtJsonOptions::default());
//! assert_eq!(relaxed, r#"{"x":5,"pi":3.25}"#);
//!
//! let canonical = extjson::stringify(&value, &ExtJsonOptions::canonical());
//! assert_eq!(canonical, r#"{"x":{"$numberInt":"5"},"pi":{"$numberDouble":"3.25"}}"#);
//! ```
//!
//! ## Parsing Extended JSON
//!
//! Both modes are accepted on input, and they can even be mixed within one value. The mode only
//! decides how bare JSON numbers are read: relaxed parsing yields host numbers
//! ([`Bson::Number`]), canonical parsing yields explicit `Int32`, `Int64` and `Double` values.
//!
//! ```rust
//! use bson_core::{Bson, extjson::{self, ExtJsonOptions}};
//!
//! let value = extjson::parse(r#"{ "y": { "$numberInt": "5" }, "z": 7 }"#, &ExtJsonOptions::default())?;
//! let doc = value.as_document().unwrap();
//! assert_eq!(doc.get("y"), Some(&Bson::Int32(5)));
//! assert_eq!(doc.get("z"), Some(&Bson::Number(7.0)));
//!
//! assert!(extjson::parse(r#"{ "$numberLong": 5 }"#, &ExtJsonOptions::default()).is_err());
//! # Ok::<(), bson_core::error::Error>(())
//! ```

mod json;
pub(crate) mod models;

use serde_json::Value;

use crate::{
    Bson,
    Document,
    error::{Error, Result},
};

/// Options used to configure Extended JSON conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ExtJsonOptions {
    /// Use relaxed rather than canonical Extended JSON.
    pub relaxed: bool,
}

impl Default for ExtJsonOptions {
    fn default() -> Self {
        Self { relaxed: true }
    }
}

impl ExtJsonOptions {
    /// Options selecting canonical mode.
    pub fn canonical() -> Self {
        Self { relaxed: false }
    }

    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }
}

/// Converts `value` into a [`serde_json::Value`].
pub fn to_value(value: &Bson, options: &ExtJsonOptions) -> Value {
    if options.relaxed {
        value.clone().into_relaxed_extjson()
    } else {
        value.clone().into_canonical_extjson()
    }
}

/// Converts a [`serde_json::Value`] holding Extended JSON into [`Bson`].
pub fn from_value(value: Value, options: &ExtJsonOptions) -> Result<Bson> {
    json::bson_from_value(value, options.relaxed)
}

/// Writes `value` as Extended JSON text.
pub fn stringify(value: &Bson, options: &ExtJsonOptions) -> String {
    to_value(value, options).to_string()
}

/// Writes `doc` as an Extended JSON object.
pub fn stringify_document(doc: &Document, options: &ExtJsonOptions) -> String {
    let value = Bson::Document(doc.clone());
    stringify(&value, options)
}

/// Parses Extended JSON text into [`Bson`].
pub fn parse(text: &str, options: &ExtJsonOptions) -> Result<Bson> {
    let value: Value = serde_json::from_str(text)?;
    from_value(value, options)
}

/// Parses Extended JSON text that must hold an object into a [`Document`]. The top-level object
/// is always read as a document, even when its keys would otherwise mark a typed value.
pub fn parse_document(text: &str, options: &ExtJsonOptions) -> Result<Document> {
    match serde_json::from_str(text)? {
        Value::Object(map) => json::document_from_map(map, options.relaxed),
        other => Err(Error::malformed_value(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
