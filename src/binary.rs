//! A growable binary buffer tagged with a [`BinarySubtype`].

use std::fmt::{self, Display};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    error::{Error, Result},
    spec::BinarySubtype,
};

/// Represents a BSON binary value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl Default for Binary {
    fn default() -> Self {
        Self::new(BinarySubtype::Generic)
    }
}

impl Binary {
    /// Creates an empty buffer of the given subtype.
    pub fn new(subtype: BinarySubtype) -> Self {
        Self {
            subtype,
            bytes: Vec::new(),
        }
    }

    /// Creates a buffer holding `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, subtype: BinarySubtype) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }

    /// Creates a [`Binary`] from a base64 string. A missing `subtype` defaults to
    /// [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = STANDARD
            .decode(input.as_ref())
            .map_err(|e| Error::malformed_value(format!("invalid base64: {e}")))?;
        Ok(Self::from_bytes(
            bytes,
            subtype.into().unwrap_or(BinarySubtype::Generic),
        ))
    }

    /// Appends a single byte. Values outside `0..=255` are rejected.
    pub fn put(&mut self, byte: u32) -> Result<()> {
        let byte = u8::try_from(byte).map_err(|_| {
            Error::invalid_argument(format!("{byte} does not fit in a single byte"))
        })?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Appends a single character, which must be in the Latin-1 range.
    pub fn put_char(&mut self, c: char) -> Result<()> {
        self.put(c as u32)
    }

    /// Writes `data` starting at `offset`, zero-filling any gap and extending the buffer when the
    /// write runs past its end.
    pub fn write(&mut self, data: impl AsRef<[u8]>, offset: usize) {
        let data = data.as_ref();
        let end = offset + data.len();
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[offset..end].copy_from_slice(data);
    }

    /// Reads up to `length` bytes starting at `position`. A zero `length` reads the whole
    /// written length. The slice is clipped at the end of the buffer.
    pub fn read(&self, position: usize, length: usize) -> &[u8] {
        let length = if length == 0 { self.bytes.len() } else { length };
        let start = position.min(self.bytes.len());
        let end = position.saturating_add(length).min(self.bytes.len());
        &self.bytes[start..end]
    }

    /// The written bytes.
    pub fn value(&self) -> &[u8] {
        &self.bytes
    }

    /// The written bytes with each byte mapped to the Latin-1 character of the same code point.
    pub fn value_string(&self) -> String {
        self.bytes.iter().map(|&b| b as char).collect()
    }

    /// Number of bytes written.
    pub fn length(&self) -> usize {
        self.bytes.len()
    }
}
