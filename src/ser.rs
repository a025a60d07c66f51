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

//! Serializer
//!
//! Serialization runs in two passes. [`calculate_object_size`] walks the document once to
//! validate every key and compute the exact output length; the writer then fills a buffer of
//! exactly that length. Both passes resolve values through the same option handling and each
//! matches every [`Bson`] variant, so a value the size pass accepts is always written in full.

mod size;

pub use self::size::calculate_object_size;

use crate::{
    Binary,
    bson::{Bson, Code, DbPointer, Document, Regex},
    error::{Error, Result},
    spec::{BinarySubtype, ElementType},
};

static NULL: Bson = Bson::Null;

/// Options used to configure serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    /// Reject keys that start with `$` or contain `.`.
    pub check_keys: bool,

    /// Write [`Bson::Function`] values as JavaScript code rather than leaving them out.
    pub serialize_functions: bool,

    /// Leave out [`Bson::Undefined`] document fields rather than writing them as null.
    pub ignore_undefined: bool,
}

impl SerializerOptions {
    pub fn check_keys(mut self, check_keys: bool) -> Self {
        self.check_keys = check_keys;
        self
    }

    pub fn serialize_functions(mut self, serialize_functions: bool) -> Self {
        self.serialize_functions = serialize_functions;
        self
    }

    pub fn ignore_undefined(mut self, ignore_undefined: bool) -> Self {
        self.ignore_undefined = ignore_undefined;
        self
    }
}

/// The value actually written for `value`, or `None` when it is left out.
///
/// Undefined is written as null except for document fields under `ignore_undefined`; functions
/// are left out unless `serialize_functions` is set. Array slots are never left out, so skipped
/// array values are written as null to keep the positions dense.
pub(crate) fn resolve<'a>(
    value: &'a Bson,
    in_array: bool,
    options: &SerializerOptions,
) -> Option<&'a Bson> {
    match value {
        Bson::Undefined if in_array || !options.ignore_undefined => Some(&NULL),
        Bson::Undefined => None,
        Bson::Function(_) if options.serialize_functions => Some(value),
        Bson::Function(_) if in_array => Some(&NULL),
        Bson::Function(_) => None,
        _ => Some(value),
    }
}

/// Serializes `doc` into a newly allocated buffer of exactly
/// [`calculate_object_size`] bytes.
///
/// ```rust
/// use bson_core::{doc, serialize, ser::SerializerOptions};
///
/// let bytes = serialize(&doc! { "hello": "world" }, &SerializerOptions::default())?;
/// assert_eq!(bytes.len(), 22);
/// # Ok::<(), bson_core::error::Error>(())
/// ```
pub fn serialize(doc: &Document, options: &SerializerOptions) -> Result<Vec<u8>> {
    let size = calculate_object_size(doc, options)?;
    let mut buf = vec![0u8; size];
    let mut writer = Writer::new(&mut buf, 0);
    writer.write_document(doc, options)?;
    Ok(buf)
}

/// Serializes `doc` into `buf` starting at `index` and returns the index of the last byte
/// written.
///
/// Nothing is written when the document is rejected or does not fit.
pub fn serialize_into(
    doc: &Document,
    buf: &mut [u8],
    index: usize,
    options: &SerializerOptions,
) -> Result<usize> {
    let size = calculate_object_size(doc, options)?;
    let available = buf.len().saturating_sub(index);
    if size > available {
        return Err(Error::invalid_argument(format!(
            "document of {size} bytes does not fit in the {available} bytes available at index \
             {index}"
        )));
    }

    let mut writer = Writer::new(buf, index);
    writer.write_document(doc, options)?;
    Ok(writer.pos - 1)
}

struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        let dest = self.buf.get_mut(self.pos..end).ok_or_else(|| {
            Error::invalid_argument("value grew past its computed size while serializing")
        })?;
        dest.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn put_u8(&mut self, val: u8) -> Result<()> {
        self.put(&[val])
    }

    fn put_i32(&mut self, val: i32) -> Result<()> {
        self.put(&val.to_le_bytes())
    }

    fn put_i64(&mut self, val: i64) -> Result<()> {
        self.put(&val.to_le_bytes())
    }

    fn put_f64(&mut self, val: f64) -> Result<()> {
        self.put(&val.to_le_bytes())
    }

    fn put_cstring(&mut self, s: &str) -> Result<()> {
        self.put(s.as_bytes())?;
        self.put_u8(0)
    }

    fn put_string(&mut self, s: &str) -> Result<()> {
        self.put_i32(s.len() as i32 + 1)?;
        self.put_cstring(s)
    }

    /// Writes a placeholder length, runs `body`, then backpatches the length of everything
    /// written since the placeholder.
    fn length_prefixed(&mut self, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let start = self.pos;
        self.put_i32(0)?;
        body(self)?;
        let len = (self.pos - start) as i32;
        self.buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn write_document(&mut self, doc: &Document, options: &SerializerOptions) -> Result<()> {
        self.length_prefixed(|w| {
            for (key, value) in doc {
                if let Some(value) = resolve(value, false, options) {
                    w.write_element(key, value, options)?;
                }
            }
            w.put_u8(0)
        })
    }

    fn write_array(&mut self, array: &[Bson], options: &SerializerOptions) -> Result<()> {
        self.length_prefixed(|w| {
            for (index, value) in array.iter().enumerate() {
                if let Some(value) = resolve(value, true, options) {
                    w.write_element(&index.to_string(), value, options)?;
                }
            }
            w.put_u8(0)
        })
    }

    fn write_binary(&mut self, bytes: &[u8], subtype: BinarySubtype) -> Result<()> {
        if let BinarySubtype::BinaryOld = subtype {
            self.put_i32(bytes.len() as i32 + 4)?;
            self.put_u8(subtype.into())?;
            self.put_i32(bytes.len() as i32)?;
        } else {
            self.put_i32(bytes.len() as i32)?;
            self.put_u8(subtype.into())?;
        }
        self.put(bytes)
    }

    fn write_element(&mut self, key: &str, value: &Bson, options: &SerializerOptions) -> Result<()> {
        self.put_u8(value.element_type() as u8)?;
        self.put_cstring(key)?;

        match *value {
            Bson::Double(v) => self.put_f64(v),
            Bson::Number(v) => match crate::bson::number_element_type(v) {
                ElementType::Int32 => self.put_i32(v as i32),
                ElementType::Int64 => self.put_i64(v as i64),
                _ => self.put_f64(v),
            },
            Bson::String(ref v) | Bson::Symbol(ref v) => self.put_string(v),
            Bson::Array(ref v) => self.write_array(v, options),
            Bson::Document(ref v) => self.write_document(v, options),
            Bson::DbRef(ref v) => self.write_document(&v.to_document(), options),
            Bson::Boolean(v) => self.put_u8(v as u8),
            Bson::Null | Bson::Undefined | Bson::MinKey | Bson::MaxKey => Ok(()),
            Bson::RegularExpression(Regex {
                ref pattern,
                options: ref flags,
            }) => {
                self.put_cstring(pattern)?;
                self.put_cstring(flags)
            }
            Bson::JavaScriptCode(ref code) if code.has_scope() => {
                let Code { code, scope } = code;
                self.length_prefixed(|w| {
                    w.put_string(code)?;
                    match scope {
                        Some(scope) => w.write_document(scope, options),
                        None => Ok(()),
                    }
                })
            }
            Bson::JavaScriptCode(Code { ref code, .. }) | Bson::Function(ref code) => {
                self.put_string(code)
            }
            Bson::Int32(v) => self.put_i32(v),
            Bson::Int64(v) => self.put_i64(v.as_i64()),
            Bson::Timestamp(ts) => self.put(&ts.to_le_bytes()),
            Bson::Binary(Binary { subtype, ref bytes }) => self.write_binary(bytes, subtype),
            Bson::Bytes(ref bytes) => self.write_binary(bytes, BinarySubtype::Generic),
            Bson::ObjectId(ref id) => self.put(&id.bytes()),
            Bson::DateTime(ref v) => self.put_i64(v.timestamp_millis()),
            Bson::Decimal128(ref v) => self.put(&v.bytes()),
            Bson::DbPointer(DbPointer {
                ref namespace,
                ref id,
            }) => {
                self.put_string(namespace)?;
                self.put(&id.bytes())
            }
        }
    }
}
