// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity.
//! We call this entity a document.
//!
//! This library implements the [BSON standard](http://bsonspec.org/spec.html) as a value-tree
//! codec: a [`Document`] of [`Bson`] values is sized, written to bytes and read back, and can be
//! converted to and from [Extended JSON](extjson).
//!
//! ## Basic usage
//!
//! ```rust
//! use bson_core::{
//!     Bson,
//!     de::DeserializerOptions,
//!     deserialize,
//!     doc,
//!     ser::SerializerOptions,
//!     serialize,
//! };
//!
//! let doc = doc! { "foo": "bar", "n": 42 };
//!
//! let bytes = serialize(&doc, &SerializerOptions::default())?;
//! let decoded = deserialize(&bytes, &DeserializerOptions::default())?;
//!
//! assert_eq!(decoded.get("foo"), Some(&Bson::String("bar".into())));
//! // Plain int32 values come back as untyped numbers unless `promote_values` is off.
//! assert_eq!(decoded.get("n"), Some(&Bson::Number(42.0)));
//! # Ok::<(), bson_core::error::Error>(())
//! ```
//!
//! ## Numbers
//!
//! [`Bson::Number`] is an untyped number whose wire width is inferred when it is written:
//! integral values in the int32 range are written as int32, other integral values below `2^63`
//! in magnitude as int64, and everything else as a double. The explicit [`Bson::Int32`],
//! [`Bson::Int64`], [`Bson::Double`] and [`Bson::Decimal128`] variants always keep their tag.
//! 64-bit integers are carried by [`Long`], which mirrors the two's complement arithmetic of a
//! pair of 32-bit words and can be flagged unsigned.
//!
//! ## Writing several documents into one buffer
//!
//! ```rust
//! use bson_core::{
//!     calculate_object_size,
//!     de::DeserializerOptions,
//!     deserialize_stream,
//!     doc,
//!     ser::SerializerOptions,
//!     serialize_into,
//! };
//!
//! let options = SerializerOptions::default();
//! let docs = [doc! { "a": 1 }, doc! { "b": "two" }];
//! let total: usize = docs
//!     .iter()
//!     .map(|d| calculate_object_size(d, &options))
//!     .sum::<Result<_, _>>()?;
//!
//! let mut buf = vec![0u8; total];
//! let mut index = 0;
//! for doc in &docs {
//!     index = serialize_into(doc, &mut buf, index, &options)? + 1;
//! }
//!
//! let (decoded, end) = deserialize_stream(&buf, 0, 2, &DeserializerOptions::default())?;
//! assert_eq!(decoded.len(), 2);
//! assert_eq!(end, buf.len());
//! # Ok::<(), bson_core::error::Error>(())
//! ```

#[doc(inline)]
pub use self::{
    binary::Binary,
    bson::{Array, Bson, Code, DbPointer, DbRef, Regex, Timestamp},
    datetime::DateTime,
    de::{deserialize, deserialize_stream},
    decimal128::Decimal128,
    document::Document,
    long::Long,
    oid::ObjectId,
    ser::{calculate_object_size, serialize, serialize_into},
};

#[macro_use]
mod macros;
mod binary;
mod bson;
pub mod datetime;
pub mod de;
pub mod decimal128;
pub mod document;
pub mod error;
pub mod extjson;
pub mod long;
pub mod oid;
pub mod ser;
pub mod spec;
