//! A BSON document represented as an associative HashMap with insertion ordering.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{Read, Write},
    iter::{Extend, FromIterator, IntoIterator},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    Binary,
    DateTime,
    Decimal128,
    bson::{Array, Bson, Timestamp},
    de::{DeserializerOptions, MAX_BSON_SIZE, MIN_BSON_DOCUMENT_SIZE},
    error::{Error, Result},
    oid::ObjectId,
    ser::SerializerOptions,
    spec::ElementType,
};

/// A BSON document represented as an associative HashMap with insertion ordering.
///
/// Keys are kept in insertion order, which is also the order they are written on the wire.
/// Inserting an existing key replaces its value in place.
#[derive(Clone, PartialEq)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        Debug::fmt(&self.inner, fmt)?;
        write!(fmt, ")")
    }
}

/// An owning iterator over Document entries.
pub struct IntoIter {
    inner: indexmap::map::IntoIter<String, Bson>,
}

/// An iterator over Document entries.
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, String, Bson>,
}

/// An iterator over a Document's keys.
pub struct Keys<'a> {
    inner: indexmap::map::Keys<'a, String, Bson>,
}

/// An iterator over a Document's values.
pub struct Values<'a> {
    inner: indexmap::map::Values<'a, String, Bson>,
}

/// An iterator over Document entries that yields mutable values.
pub struct IterMut<'a> {
    inner: indexmap::map::IterMut<'a, String, Bson>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a String;

    fn next(&mut self) -> Option<&'a String> {
        self.inner.next()
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Bson;

    fn next(&mut self) -> Option<&'a Bson> {
        self.inner.next()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.inner.iter(),
        }
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Bson)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a Bson);

    fn next(&mut self) -> Option<(&'a String, &'a Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a String, &'a mut Bson);

    fn next(&mut self) -> Option<(&'a String, &'a mut Bson)> {
        self.inner.next()
    }
}

impl Extend<(String, Bson)> for Document {
    fn extend<T: IntoIterator<Item = (String, Bson)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

fn unexpected(actual: &Bson, expected: ElementType) -> Error {
    Error::value_access_unexpected_type(actual.element_type(), expected)
}

impl Document {
    /// Returns a new empty document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::default(),
        }
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Gets an iterator over pairs of keys and mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            inner: self.inner.iter_mut(),
        }
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    fn get_required(&self, key: impl AsRef<str>) -> Result<&Bson> {
        let key = key.as_ref();
        self.get(key)
            .ok_or_else(|| Error::value_access_not_present().with_key(key))
    }

    /// Get a floating point value for this key. Both explicit doubles and untyped numbers are
    /// accepted.
    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_f64()
            .ok_or_else(|| unexpected(value, ElementType::Double).with_key(key))
    }

    /// Get a reference to a Decimal128 value for key, if it exists.
    pub fn get_decimal128(&self, key: impl AsRef<str>) -> Result<&Decimal128> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_decimal128()
            .ok_or_else(|| unexpected(value, ElementType::Decimal128).with_key(key))
    }

    /// Get a string slice this key if it exists and has the correct type.
    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_str()
            .ok_or_else(|| unexpected(value, ElementType::String).with_key(key))
    }

    /// Get a reference to an array for this key if it exists and has the correct type.
    pub fn get_array(&self, key: impl AsRef<str>) -> Result<&Array> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_array()
            .ok_or_else(|| unexpected(value, ElementType::Array).with_key(key))
    }

    /// Get a reference to a document for this key if it exists and has the correct type.
    pub fn get_document(&self, key: impl AsRef<str>) -> Result<&Document> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_document()
            .ok_or_else(|| unexpected(value, ElementType::EmbeddedDocument).with_key(key))
    }

    /// Get a bool value for this key if it exists and has the correct type.
    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_bool()
            .ok_or_else(|| unexpected(value, ElementType::Boolean).with_key(key))
    }

    /// Returns whether this key has a null value
    pub fn is_null(&self, key: impl AsRef<str>) -> bool {
        self.get(key) == Some(&Bson::Null)
    }

    /// Get an i32 value for this key. Untyped numbers that would be written as int32 are
    /// accepted.
    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_i32()
            .ok_or_else(|| unexpected(value, ElementType::Int32).with_key(key))
    }

    /// Get an i64 value for this key. Any integer width is accepted.
    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_i64()
            .ok_or_else(|| unexpected(value, ElementType::Int64).with_key(key))
    }

    /// Get a time stamp value for this key if it exists and has the correct type.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_timestamp()
            .ok_or_else(|| unexpected(value, ElementType::Timestamp).with_key(key))
    }

    /// Get a reference to a binary value for this key if it exists and has the correct type.
    pub fn get_binary(&self, key: impl AsRef<str>) -> Result<&Binary> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_binary()
            .ok_or_else(|| unexpected(value, ElementType::Binary).with_key(key))
    }

    /// Get an object id value for this key if it exists and has the correct type.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_object_id()
            .ok_or_else(|| unexpected(value, ElementType::ObjectId).with_key(key))
    }

    /// Get a reference to a UTC datetime value for this key if it exists and has the correct type.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<&DateTime> {
        let key = key.as_ref();
        let value = self.get_required(key)?;
        value
            .as_datetime()
            .ok_or_else(|| unexpected(value, ElementType::DateTime).with_key(key))
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> Keys<'_> {
        Keys {
            inner: self.inner.keys(),
        }
    }

    /// Gets a collection of all values in the document.
    pub fn values(&self) -> Values<'_> {
        Values {
            inner: self.inner.values(),
        }
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sets the value of the entry with the OccupiedEntry's key,
    /// and returns the entry's old value. Accepts any type that
    /// can be converted into Bson.
    pub fn insert<KT: Into<String>, BT: Into<Bson>>(&mut self, key: KT, val: BT) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Takes the value of the entry out of the document, and returns it.
    /// Computes in **O(n)** time (average).
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }

    /// Serializes this document into `writer` with the default [`SerializerOptions`].
    pub fn to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = crate::serialize(self, &SerializerOptions::default())?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Reads one length-prefixed document from `reader`.
    pub fn from_reader<R: Read>(mut reader: R, options: &DeserializerOptions) -> Result<Document> {
        let mut length = [0u8; 4];
        reader.read_exact(&mut length)?;
        let declared = i32::from_le_bytes(length);
        if !(MIN_BSON_DOCUMENT_SIZE..=MAX_BSON_SIZE).contains(&declared) {
            return Err(Error::malformed_value(format!(
                "document length {declared} is out of range"
            )));
        }

        // grow with the bytes actually read rather than the declared length
        let mut buf = length.to_vec();
        reader.take(declared as u64 - 4).read_to_end(&mut buf)?;
        if buf.len() != declared as usize {
            return Err(Error::malformed_value(format!(
                "document truncated: expected {declared} bytes, got {}",
                buf.len()
            )));
        }
        crate::deserialize(&buf, options)
    }
}
