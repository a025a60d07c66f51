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

//! Deserializer
//!
//! Decoding walks the buffer once. Every length prefix is checked against the bytes actually
//! available and against the position of the terminating null byte, so truncated or corrupt
//! input is reported as [`MalformedValue`](crate::error::ErrorKind::MalformedValue) rather than
//! read past.

use crate::{
    Binary,
    DateTime,
    Decimal128,
    Long,
    bson::{Array, Bson, Code, DbPointer, DbRef, Document, Regex, Timestamp},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

pub(crate) const MAX_BSON_SIZE: i32 = i32::MAX;
pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
const MIN_CODE_WITH_SCOPE_SIZE: i32 = 4 + 4 + 1 + MIN_BSON_DOCUMENT_SIZE;
const MAX_SAFE_INTEGER: i64 = 1 << 53;

/// Flags a host regular expression engine understands. Others are dropped unless
/// [`DeserializerOptions::bson_regexp`] is set.
const HOST_REGEX_FLAGS: &str = "imsux";

/// Options used to configure deserialization.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct DeserializerOptions {
    /// Decode int64 values within `±2^53` as [`Bson::Number`] rather than [`Bson::Int64`].
    pub promote_longs: bool,

    /// Decode int32 and double values as [`Bson::Number`] rather than their explicit wrappers.
    pub promote_values: bool,

    /// Decode generic binary values as [`Bson::Bytes`] rather than [`Binary`].
    pub promote_buffers: bool,

    /// Keep regular expression flags exactly as stored instead of filtering them to the flags a
    /// host regex engine supports.
    pub bson_regexp: bool,

    /// Accept a buffer longer than the document's declared length; the trailing bytes are
    /// ignored.
    pub allow_object_smaller_than_buffer_size: bool,
}

impl Default for DeserializerOptions {
    fn default() -> Self {
        Self {
            promote_longs: true,
            promote_values: true,
            promote_buffers: false,
            bson_regexp: false,
            allow_object_smaller_than_buffer_size: false,
        }
    }
}

impl DeserializerOptions {
    pub fn promote_longs(mut self, promote_longs: bool) -> Self {
        self.promote_longs = promote_longs;
        self
    }

    pub fn promote_values(mut self, promote_values: bool) -> Self {
        self.promote_values = promote_values;
        self
    }

    pub fn promote_buffers(mut self, promote_buffers: bool) -> Self {
        self.promote_buffers = promote_buffers;
        self
    }

    pub fn bson_regexp(mut self, bson_regexp: bool) -> Self {
        self.bson_regexp = bson_regexp;
        self
    }

    pub fn allow_object_smaller_than_buffer_size(mut self, allow: bool) -> Self {
        self.allow_object_smaller_than_buffer_size = allow;
        self
    }
}

/// Decodes the single document held in `buf`.
///
/// Unless [`allow_object_smaller_than_buffer_size`](DeserializerOptions) is set, the declared
/// length must equal `buf.len()` exactly.
///
/// ```rust
/// use bson_core::{Bson, de::DeserializerOptions, deserialize};
///
/// let bytes = [
///     0x16, 0x00, 0x00, 0x00, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00, 0x06, 0x00, 0x00, 0x00,
///     b'w', b'o', b'r', b'l', b'd', 0x00, 0x00,
/// ];
/// let doc = deserialize(&bytes, &DeserializerOptions::default())?;
/// assert_eq!(doc.get("hello"), Some(&Bson::String("world".into())));
/// # Ok::<(), bson_core::error::Error>(())
/// ```
pub fn deserialize(buf: &[u8], options: &DeserializerOptions) -> Result<Document> {
    let size = declared_size(buf, 0)?;
    if options.allow_object_smaller_than_buffer_size {
        if size > buf.len() {
            return Err(Error::malformed_value(format!(
                "declared document length {size} exceeds the {} byte buffer",
                buf.len()
            )));
        }
    } else if size != buf.len() {
        return Err(Error::malformed_value(format!(
            "declared document length {size} does not match the {} byte buffer",
            buf.len()
        )));
    }

    decode_document(&buf[..size], options)
}

/// Decodes `count` documents laid end to end in `buf`, starting at `start`.
///
/// Returns the documents and the index just past the last one, which is where the next
/// document in the stream would begin.
pub fn deserialize_stream(
    buf: &[u8],
    start: usize,
    count: usize,
    options: &DeserializerOptions,
) -> Result<(Vec<Document>, usize)> {
    let mut index = start;
    let mut docs = Vec::with_capacity(count);
    for n in 0..count {
        let size = declared_size(buf, index).map_err(|e| e.with_index(n))?;
        let end = index + size;
        let bytes = buf.get(index..end).ok_or_else(|| {
            Error::malformed_value(format!(
                "document of {size} bytes at offset {index} runs past the end of the buffer"
            ))
            .with_index(n)
        })?;
        docs.push(decode_document(bytes, options).map_err(|e| e.with_index(n))?);
        index = end;
    }
    Ok((docs, index))
}

/// Reads and sanity checks the length prefix of the document starting at `start`.
fn declared_size(buf: &[u8], start: usize) -> Result<usize> {
    let prefix: [u8; 4] = buf
        .get(start..start.saturating_add(4))
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::malformed_value("buffer is too small to hold a BSON document"))?;
    let size = i32::from_le_bytes(prefix);
    if !(MIN_BSON_DOCUMENT_SIZE..=MAX_BSON_SIZE).contains(&size) {
        return Err(Error::malformed_value(format!("invalid document length {size}")));
    }
    Ok(size as usize)
}

fn decode_document(bytes: &[u8], options: &DeserializerOptions) -> Result<Document> {
    if bytes.last() != Some(&0) {
        return Err(Error::malformed_value("document is not terminated with a null byte"));
    }
    let mut reader = Reader::new(bytes, options);
    reader.read_document()
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    options: &'a DeserializerOptions,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], options: &'a DeserializerOptions) -> Self {
        Self {
            buf,
            pos: 0,
            options,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let buf = self.buf;
        let bytes = self
            .pos
            .checked_add(len)
            .and_then(|end| buf.get(self.pos..end))
            .ok_or_else(|| {
                Error::malformed_value(format!(
                    "unexpected end of buffer reading {len} bytes at offset {}",
                    self.pos
                ))
            })?;
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.take_array().map(f64::from_le_bytes)
    }

    /// Reads a length prefix that counts only the bytes after it.
    fn read_length(&mut self, min: i32) -> Result<usize> {
        let len = self.read_i32()?;
        self.check_length(len, min, self.pos)
    }

    /// Reads a length prefix that counts itself, as document and code-with-scope lengths do.
    fn read_length_including_prefix(&mut self, min: i32) -> Result<usize> {
        let start = self.pos;
        let len = self.read_i32()?;
        self.check_length(len, min, start)
    }

    /// Checks that `len` bytes measured from `from` fit in the buffer.
    fn check_length(&self, len: i32, min: i32, from: usize) -> Result<usize> {
        if len < min {
            return Err(Error::malformed_value(format!("invalid length {len}")));
        }
        let len = len as usize;
        let remaining = self.buf.len() - from;
        if len > remaining {
            return Err(Error::malformed_value(format!(
                "length {len} exceeds the {remaining} bytes remaining"
            )));
        }
        Ok(len)
    }

    fn read_cstring(&mut self) -> Result<&'a str> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::malformed_value("C string is not null terminated"))?;
        let bytes = self.take(nul + 1)?;
        to_str(&bytes[..nul])
    }

    fn read_string(&mut self) -> Result<&'a str> {
        let len = self.read_length(1)?;
        let bytes = self.take(len)?;
        match bytes.split_last() {
            Some((0, s)) => to_str(s),
            _ => Err(Error::malformed_value(
                "string is not terminated with a null byte",
            )),
        }
    }

    /// Walks the elements of a document or array, handing each key and type tag to
    /// `element` until the terminator, which must sit exactly at the declared end.
    fn read_elements(
        &mut self,
        mut element: impl FnMut(&mut Self, &'a str, u8) -> Result<()>,
    ) -> Result<()> {
        let start = self.pos;
        let len = self.read_length_including_prefix(MIN_BSON_DOCUMENT_SIZE)?;
        let end = start + len;

        loop {
            if self.pos >= end {
                return Err(Error::malformed_value(
                    "elements overran the declared document length",
                ));
            }
            let tag = self.read_u8()?;
            if tag == 0 {
                break;
            }
            let key = self.read_cstring()?;
            element(self, key, tag)?;
        }

        if self.pos != end {
            return Err(Error::malformed_value(format!(
                "declared length {len} does not match the document's terminator at {}",
                self.pos - start
            )));
        }
        Ok(())
    }

    fn read_document(&mut self) -> Result<Document> {
        let mut doc = Document::new();
        self.read_elements(|r, key, tag| {
            let value = r.read_value(tag).map_err(|e| e.with_key(key))?;
            doc.insert(key, value);
            Ok(())
        })?;
        Ok(doc)
    }

    fn read_array(&mut self) -> Result<Array> {
        let mut array = Array::new();
        self.read_elements(|r, _, tag| {
            let value = r.read_value(tag).map_err(|e| e.with_index(array.len()))?;
            array.push(value);
            Ok(())
        })?;
        Ok(array)
    }

    fn read_binary(&mut self) -> Result<Bson> {
        let len = self.read_length(0)?;
        let subtype = BinarySubtype::from(self.read_u8()?);
        let bytes = if let BinarySubtype::BinaryOld = subtype {
            let inner = self.read_i32()?;
            if inner < 0 || inner as usize + 4 != len {
                return Err(Error::malformed_value(format!(
                    "old binary inner length {inner} does not match outer length {len}"
                )));
            }
            self.take(inner as usize)?
        } else {
            self.take(len)?
        };

        if self.options.promote_buffers && subtype == BinarySubtype::Generic {
            Ok(Bson::Bytes(bytes.to_vec()))
        } else {
            Ok(Bson::Binary(Binary::from_bytes(bytes, subtype)))
        }
    }

    fn read_regex(&mut self) -> Result<Regex> {
        let pattern = self.read_cstring()?;
        let flags = self.read_cstring()?;
        if self.options.bson_regexp {
            return Ok(Regex {
                pattern: pattern.to_string(),
                options: flags.to_string(),
            });
        }
        let supported: String = flags
            .chars()
            .filter(|c| HOST_REGEX_FLAGS.contains(*c))
            .collect();
        Ok(Regex::from_parts(pattern, &supported))
    }

    fn read_code_with_scope(&mut self) -> Result<Code> {
        let start = self.pos;
        let len = self.read_length_including_prefix(MIN_CODE_WITH_SCOPE_SIZE)?;
        let code = self.read_string()?;
        let scope = self.read_document()?;
        if self.pos - start != len {
            return Err(Error::malformed_value(format!(
                "code with scope length {len} does not match its contents"
            )));
        }
        Ok(Code::with_scope(code, scope))
    }

    fn read_value(&mut self, tag: u8) -> Result<Bson> {
        let element_type = ElementType::from(tag).ok_or_else(|| {
            Error::malformed_value(format!("unrecognized element type {tag:#04x}"))
        })?;
        let options = self.options;
        let value = match element_type {
            ElementType::Double => {
                let v = self.read_f64()?;
                if options.promote_values {
                    Bson::Number(v)
                } else {
                    Bson::Double(v)
                }
            }
            ElementType::String => Bson::String(self.read_string()?.to_string()),
            ElementType::EmbeddedDocument => {
                let doc = self.read_document()?;
                match DbRef::from_document(&doc) {
                    Some(db_ref) => Bson::DbRef(db_ref),
                    None => Bson::Document(doc),
                }
            }
            ElementType::Array => Bson::Array(self.read_array()?),
            ElementType::Binary => self.read_binary()?,
            ElementType::Undefined => Bson::Undefined,
            ElementType::ObjectId => Bson::ObjectId(ObjectId::from_bytes(self.take_array()?)),
            ElementType::Boolean => match self.read_u8()? {
                0 => Bson::Boolean(false),
                1 => Bson::Boolean(true),
                other => {
                    return Err(Error::malformed_value(format!(
                        "boolean must be stored as 0 or 1, got {other}"
                    )));
                }
            },
            ElementType::DateTime => Bson::DateTime(DateTime::from_millis(self.read_i64()?)),
            ElementType::Null => Bson::Null,
            ElementType::RegularExpression => Bson::RegularExpression(self.read_regex()?),
            ElementType::DbPointer => {
                let namespace = self.read_string()?.to_string();
                let id = ObjectId::from_bytes(self.take_array()?);
                Bson::DbPointer(DbPointer { namespace, id })
            }
            ElementType::JavaScriptCode => Bson::JavaScriptCode(Code::new(self.read_string()?)),
            ElementType::Symbol => Bson::Symbol(self.read_string()?.to_string()),
            ElementType::JavaScriptCodeWithScope => {
                Bson::JavaScriptCode(self.read_code_with_scope()?)
            }
            ElementType::Int32 => {
                let v = self.read_i32()?;
                if options.promote_values {
                    Bson::Number(v.into())
                } else {
                    Bson::Int32(v)
                }
            }
            ElementType::Timestamp => Bson::Timestamp(Timestamp::from_le_bytes(self.take_array()?)),
            ElementType::Int64 => {
                let v = self.read_i64()?;
                if options.promote_longs && (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v) {
                    Bson::Number(v as f64)
                } else {
                    Bson::Int64(Long::from_i64(v))
                }
            }
            ElementType::Decimal128 => Bson::Decimal128(Decimal128::from_bytes(self.take_array()?)),
            ElementType::MaxKey => Bson::MaxKey,
            ElementType::MinKey => Bson::MinKey,
        };
        Ok(value)
    }
}

fn to_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| ErrorKind::Utf8Encoding.into())
}
