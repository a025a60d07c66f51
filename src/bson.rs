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

//! BSON definition

use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

use base64::{Engine, engine::general_purpose::STANDARD};

pub use crate::document::Document;
use crate::{
    Binary,
    DateTime,
    Decimal128,
    Long,
    error::{Error, Result},
    oid::ObjectId,
    spec::ElementType,
};

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Possible BSON value types.
#[derive(Clone, Debug, PartialEq)]
pub enum Bson {
    /// 64-bit binary floating point, always written as a BSON double
    Double(f64),
    /// An untyped number whose wire width is inferred when serialized
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Undefined value (Deprecated)
    Undefined,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code, with or without a scope
    JavaScriptCode(Code),
    /// A host function, only serialized when requested
    Function(String),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit integer
    Int64(Long),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// Raw bytes, written as generic binary
    Bytes(Vec<u8>),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// Symbol (Deprecated)
    Symbol(String),
    /// [128-bit decimal floating point](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md)
    Decimal128(Decimal128),
    /// A database reference, stored as an embedded document
    DbRef(DbRef),
    /// DBPointer (Deprecated)
    DbPointer(DbPointer),
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

impl Default for Bson {
    fn default() -> Self {
        Bson::Null
    }
}

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Bson::Double(f) | Bson::Number(f) => write!(fmt, "{}", f),
            Bson::String(ref s) => write!(fmt, "\"{}\"", s),
            Bson::Array(ref vec) => {
                fmt.write_str("[")?;

                let mut first = true;
                for bson in vec {
                    if !first {
                        fmt.write_str(", ")?;
                    }

                    write!(fmt, "{}", bson)?;
                    first = false;
                }

                fmt.write_str("]")
            }
            Bson::Document(ref doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::Undefined => write!(fmt, "undefined"),
            Bson::RegularExpression(ref regex) => write!(fmt, "{}", regex),
            Bson::JavaScriptCode(Code { ref code, .. }) | Bson::Function(ref code) => {
                fmt.write_str(code)
            }
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(ts) => write!(fmt, "{}", ts),
            Bson::Binary(ref binary) => write!(fmt, "{}", binary),
            Bson::Bytes(ref bytes) => write!(fmt, "Binary(0x0, {})", STANDARD.encode(bytes)),
            Bson::ObjectId(ref id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(date_time) => write!(fmt, "DateTime(\"{}\")", date_time),
            Bson::Symbol(ref sym) => write!(fmt, "Symbol(\"{}\")", sym),
            Bson::Decimal128(ref d) => write!(fmt, "{}", d),
            Bson::DbRef(ref db_ref) => write!(fmt, "{}", db_ref),
            Bson::DbPointer(DbPointer {
                ref namespace,
                ref id,
            }) => write!(fmt, "DBPointer({}, {})", namespace, id),
            Bson::MinKey => write!(fmt, "MinKey"),
            Bson::MaxKey => write!(fmt, "MaxKey"),
        }
    }
}

impl From<f32> for Bson {
    fn from(a: f32) -> Bson {
        Bson::Number(a as f64)
    }
}

impl From<f64> for Bson {
    fn from(a: f64) -> Bson {
        Bson::Number(a)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(a: String) -> Bson {
        Bson::String(a)
    }
}

impl From<Document> for Bson {
    fn from(a: Document) -> Bson {
        Bson::Document(a)
    }
}

impl From<bool> for Bson {
    fn from(a: bool) -> Bson {
        Bson::Boolean(a)
    }
}

impl From<Regex> for Bson {
    fn from(regex: Regex) -> Bson {
        Bson::RegularExpression(regex)
    }
}

impl From<Code> for Bson {
    fn from(code: Code) -> Bson {
        Bson::JavaScriptCode(code)
    }
}

impl From<Binary> for Bson {
    fn from(binary: Binary) -> Bson {
        Bson::Binary(binary)
    }
}

impl From<Timestamp> for Bson {
    fn from(ts: Timestamp) -> Bson {
        Bson::Timestamp(ts)
    }
}

impl<T> From<&T> for Bson
where
    T: Clone + Into<Bson>,
{
    fn from(t: &T) -> Bson {
        t.clone().into()
    }
}

impl<T> From<Vec<T>> for Bson
where
    T: Into<Bson>,
{
    fn from(v: Vec<T>) -> Bson {
        Bson::Array(v.into_iter().map(|val| val.into()).collect())
    }
}

impl<T: Into<Bson>> std::iter::FromIterator<T> for Bson {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Bson::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl From<i32> for Bson {
    fn from(a: i32) -> Bson {
        Bson::Int32(a)
    }
}

impl From<i64> for Bson {
    fn from(a: i64) -> Bson {
        Bson::Int64(Long::from_i64(a))
    }
}

impl From<u32> for Bson {
    fn from(a: u32) -> Bson {
        if let Ok(i) = i32::try_from(a) {
            Bson::Int32(i)
        } else {
            Bson::Int64(Long::from_i64(a.into()))
        }
    }
}

impl From<Long> for Bson {
    fn from(a: Long) -> Bson {
        Bson::Int64(a)
    }
}

impl From<[u8; 12]> for Bson {
    fn from(a: [u8; 12]) -> Bson {
        Bson::ObjectId(ObjectId::from_bytes(a))
    }
}

impl From<ObjectId> for Bson {
    fn from(a: ObjectId) -> Bson {
        Bson::ObjectId(a)
    }
}

impl From<DateTime> for Bson {
    fn from(a: DateTime) -> Bson {
        Bson::DateTime(a)
    }
}

impl From<Decimal128> for Bson {
    fn from(d: Decimal128) -> Self {
        Bson::Decimal128(d)
    }
}

impl From<DbRef> for Bson {
    fn from(db_ref: DbRef) -> Self {
        Bson::DbRef(db_ref)
    }
}

impl From<DbPointer> for Bson {
    fn from(a: DbPointer) -> Bson {
        Bson::DbPointer(a)
    }
}

impl<T> From<Option<T>> for Bson
where
    T: Into<Self>,
{
    fn from(a: Option<T>) -> Bson {
        match a {
            None => Bson::Null,
            Some(t) => t.into(),
        }
    }
}

/// The wire type an untyped number is written as.
///
/// Integral values within the int32 range become int32, integral values within
/// `[-2^63, 2^63)` become int64, and everything else (fractions, `-0.0`, NaN, infinities and
/// larger magnitudes) becomes a double.
pub fn number_element_type(value: f64) -> ElementType {
    let integral = value.is_finite()
        && value.fract() == 0.0
        && !(value == 0.0 && value.is_sign_negative());
    if !integral {
        ElementType::Double
    } else if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        ElementType::Int32
    } else if (-TWO_POW_63..TWO_POW_63).contains(&value) {
        ElementType::Int64
    } else {
        ElementType::Double
    }
}

impl Bson {
    /// Get the wire [`ElementType`] this value is written as.
    ///
    /// `Undefined` reports its own tag even though the serializer writes it as null or skips it,
    /// and `Function` reports JavaScript code, the tag it takes when functions are serialized.
    pub fn element_type(&self) -> ElementType {
        match *self {
            Bson::Double(..) => ElementType::Double,
            Bson::Number(v) => number_element_type(v),
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) | Bson::DbRef(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::Undefined => ElementType::Undefined,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(ref code) if code.has_scope() => {
                ElementType::JavaScriptCodeWithScope
            }
            Bson::JavaScriptCode(..) | Bson::Function(..) => ElementType::JavaScriptCode,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) | Bson::Bytes(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::Decimal128(..) => ElementType::Decimal128,
            Bson::DbPointer(..) => ElementType::DbPointer,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
        }
    }

    /// Rank of this value's type in the cross-type sort order. `MinKey` ranks below and `MaxKey`
    /// above every other value; numbers of any width share a rank, as do strings and symbols.
    pub fn sort_order(&self) -> u8 {
        match *self {
            Bson::MinKey => 0,
            Bson::Undefined => 1,
            Bson::Null => 2,
            Bson::Double(..)
            | Bson::Number(..)
            | Bson::Int32(..)
            | Bson::Int64(..)
            | Bson::Decimal128(..) => 3,
            Bson::String(..) | Bson::Symbol(..) => 4,
            Bson::Document(..) | Bson::DbRef(..) => 5,
            Bson::Array(..) => 6,
            Bson::Binary(..) | Bson::Bytes(..) => 7,
            Bson::ObjectId(..) | Bson::DbPointer(..) => 8,
            Bson::Boolean(..) => 9,
            Bson::DateTime(..) => 10,
            Bson::Timestamp(..) => 11,
            Bson::RegularExpression(..) => 12,
            Bson::JavaScriptCode(..) | Bson::Function(..) => 13,
            Bson::MaxKey => 14,
        }
    }

    /// Compares the type ranks of two values. See [`Bson::sort_order`].
    pub fn cmp_type_order(&self, other: &Bson) -> Ordering {
        self.sort_order().cmp(&other.sort_order())
    }
}

/// Value helpers
impl Bson {
    /// If `self` is a [`Double`](Bson::Double) or an untyped [`Number`](Bson::Number), return its
    /// value. Returns `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Bson::Double(v) | Bson::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Bson::String(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match *self {
            Bson::Array(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match *self {
            Bson::Array(ref mut v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match *self {
            Bson::Document(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match *self {
            Bson::Document(ref mut v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Bson::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is an [`Int32`](Bson::Int32), or a [`Number`](Bson::Number) that would be
    /// written as one, return its value. Returns `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Bson::Int32(v) => Some(v),
            Bson::Number(v) if number_element_type(v) == ElementType::Int32 => Some(v as i32),
            _ => None,
        }
    }

    /// If `self` holds an integer of any width, return it as an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Bson::Int64(v) => Some(v.as_i64()),
            Bson::Int32(v) => Some(v.into()),
            Bson::Number(v) if number_element_type(v) != ElementType::Double => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<Long> {
        match *self {
            Bson::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match *self {
            Bson::ObjectId(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime> {
        match *self {
            Bson::DateTime(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match *self {
            Bson::Symbol(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            Bson::Timestamp(timestamp) => Some(timestamp),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match *self {
            Bson::Binary(ref binary) => Some(binary),
            _ => None,
        }
    }

    pub fn as_decimal128(&self) -> Option<&Decimal128> {
        match *self {
            Bson::Decimal128(ref d) => Some(d),
            _ => None,
        }
    }

    pub fn as_db_ref(&self) -> Option<&DbRef> {
        match *self {
            Bson::DbRef(ref db_ref) => Some(db_ref),
            _ => None,
        }
    }

    pub fn as_null(&self) -> Option<()> {
        match *self {
            Bson::Null => Some(()),
            _ => None,
        }
    }
}

/// Represents a BSON timestamp value.
///
/// A timestamp shares the int64 wire layout but is its own type: it never converts to or compares
/// with a [`Long`].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order timestamps with the same number of seconds in the `time`
    /// field.
    pub increment: u32,
}

impl Timestamp {
    pub fn new(time: u32, increment: u32) -> Self {
        Self { time, increment }
    }

    /// The 64 bit wire value: `time` in the high word, `increment` in the low word.
    pub fn to_u64(self) -> u64 {
        ((self.time as u64) << 32) | self.increment as u64
    }

    pub fn from_u64(val: u64) -> Self {
        Timestamp {
            time: (val >> 32) as u32,
            increment: (val & 0xFFFF_FFFF) as u32,
        }
    }

    pub(crate) fn to_le_bytes(self) -> [u8; 8] {
        self.to_u64().to_le_bytes()
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self::from_u64(u64::from_le_bytes(bytes))
    }
}

impl Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Timestamp({}, {})", self.time, self.increment)
    }
}

/// Represents a BSON regular expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options for the regex.
    ///
    /// Options are identified by characters, which must be stored in
    /// alphabetical order. Valid options are 'i' for case insensitive matching, 'm' for
    /// multiline matching, 'x' for verbose mode, 'l' to make \w, \W, etc. locale dependent,
    /// 's' for dotall mode ('.' matches everything), and 'u' to make \w, \W, etc. match
    /// unicode.
    pub options: String,
}

impl Regex {
    const VALID_OPTIONS: &'static str = "ilmsux";

    /// Builds a regex, rejecting unknown option characters and sorting the rest.
    pub fn new(pattern: impl Into<String>, options: impl AsRef<str>) -> Result<Self> {
        let options = options.as_ref();
        if let Some(bad) = options.chars().find(|c| !Self::VALID_OPTIONS.contains(*c)) {
            return Err(Error::invalid_argument(format!(
                "regular expression option {bad:?} is not one of i, m, x, l, s, u"
            )));
        }
        Ok(Self::from_parts(pattern, options))
    }

    /// Builds a regex without validating `options`. The decoder uses this for flags found on
    /// the wire.
    pub(crate) fn from_parts(pattern: impl Into<String>, options: &str) -> Self {
        let mut chars: Vec<_> = options.chars().collect();
        chars.sort_unstable();
        Self {
            pattern: pattern.into(),
            options: chars.into_iter().collect(),
        }
    }
}

impl Display for Regex {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "/{}/{}", self.pattern, self.options)
    }
}

/// Represents BSON JavaScript code, optionally with a scope document.
///
/// Code with a non-empty scope is written as code-with-scope; otherwise as plain code. A
/// `Some` empty scope assigned directly to the field therefore reads back as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub code: String,
    pub scope: Option<Document>,
}

impl Code {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            scope: None,
        }
    }

    /// An empty `scope` is stored as `None`.
    pub fn with_scope(code: impl Into<String>, scope: Document) -> Self {
        Self {
            code: code.into(),
            scope: (!scope.is_empty()).then_some(scope),
        }
    }

    /// Whether this value is written as code-with-scope.
    pub fn has_scope(&self) -> bool {
        self.scope.as_ref().is_some_and(|scope| !scope.is_empty())
    }
}

/// A reference to a document in another collection.
///
/// On the wire this is an ordinary embedded document `{ $ref, $id, $db?, ...fields }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    /// The referenced collection.
    pub namespace: String,

    /// The referenced document's id.
    pub id: Box<Bson>,

    /// The database holding the collection, when not the current one.
    pub db: Option<String>,

    /// Any further fields carried alongside the reference.
    pub fields: Document,
}

impl DbRef {
    pub fn new(namespace: impl Into<String>, id: impl Into<Bson>) -> Self {
        Self {
            namespace: namespace.into(),
            id: Box::new(id.into()),
            db: None,
            fields: Document::new(),
        }
    }

    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// The embedded document this reference is written as.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("$ref", self.namespace.clone());
        doc.insert("$id", (*self.id).clone());
        if let Some(ref db) = self.db {
            doc.insert("$db", db.clone());
        }
        for (k, v) in &self.fields {
            doc.insert(k.clone(), v.clone());
        }
        doc
    }

    /// Recognizes a reference in `doc`. The leading keys must be `$ref` (a string), then `$id`,
    /// then optionally `$db` (a string); no other `$`-prefixed key may follow. Anything else is
    /// left as a plain document so that its key order survives re-serialization.
    pub(crate) fn from_document(doc: &Document) -> Option<Self> {
        let mut entries = doc.iter();
        let namespace = match entries.next()? {
            (k, Bson::String(ns)) if k == "$ref" => ns,
            _ => return None,
        };
        let id = match entries.next()? {
            (k, id) if k == "$id" => id,
            _ => return None,
        };
        let db = match doc.iter().nth(2) {
            Some((k, Bson::String(db))) if k == "$db" => Some(db.clone()),
            Some((k, _)) if k == "$db" => return None,
            _ => None,
        };
        if doc
            .keys()
            .skip(if db.is_some() { 3 } else { 2 })
            .any(|k| k.starts_with('$'))
        {
            return None;
        }

        let fields = doc
            .iter()
            .filter(|(k, _)| !k.starts_with('$'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self {
            namespace: namespace.to_string(),
            id: Box::new(id.clone()),
            db,
            fields,
        })
    }
}

impl Display for DbRef {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "DBRef(\"{}\", {}", self.namespace, self.id)?;
        if let Some(ref db) = self.db {
            write!(fmt, ", \"{}\"", db)?;
        }
        fmt.write_str(")")
    }
}

/// Represents a DBPointer. (Deprecated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub namespace: String,
    pub id: ObjectId,
}
