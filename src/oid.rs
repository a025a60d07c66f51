//! Module containing functionality related to BSON ObjectIds.
//! For more information, see the documentation for the [`ObjectId`] type.

use std::{
    fmt,
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
    time::SystemTime,
};

use crate::error::{Error, Result};

const TIMESTAMP_SIZE: usize = 4;
const MACHINE_ID_SIZE: usize = 3;
const PROCESS_ID_SIZE: usize = 2;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const MACHINE_ID_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const PROCESS_ID_OFFSET: usize = MACHINE_ID_OFFSET + MACHINE_ID_SIZE;
const COUNTER_OFFSET: usize = PROCESS_ID_OFFSET + PROCESS_ID_SIZE;

const MAX_U24: u32 = 0xFF_FFFF;

static DEFAULT_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(ObjectIdGenerator::new);

/// Anything that can report an ObjectId as a 24 character hex string.
///
/// This lets ids produced by other libraries be compared with and converted into [`ObjectId`]
/// without knowing their concrete type.
pub trait HasHexId {
    fn to_hex_string(&self) -> String;
}

/// The accepted inputs for building an [`ObjectId`].
#[derive(Clone, Copy)]
pub enum ObjectIdInput<'a> {
    /// Either a 24 character hex string, or a 12 byte string taken as the raw id.
    Str(&'a str),

    /// Exactly 12 raw bytes.
    Bytes(&'a [u8]),

    /// Any value exposing a hex id.
    HexId(&'a dyn HasHexId),
}

impl<'a> From<&'a str> for ObjectIdInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl<'a> From<&'a String> for ObjectIdInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for ObjectIdInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl<'a> From<&'a [u8; 12]> for ObjectIdInput<'a> {
    fn from(value: &'a [u8; 12]) -> Self {
        Self::Bytes(value.as_slice())
    }
}

impl<'a> From<&'a ObjectId> for ObjectIdInput<'a> {
    fn from(value: &'a ObjectId) -> Self {
        Self::Bytes(value.id.as_slice())
    }
}

/// Produces ObjectIds for one process.
///
/// Each generator owns a random machine identifier and a counter seeded at random; the counter
/// is advanced atomically and wraps modulo 2^24. [`ObjectId::new`] draws from a process-wide
/// default generator, while callers that need isolated or reproducible state can hold their own.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    machine_id: [u8; MACHINE_ID_SIZE],
    process_id: u16,
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Creates a generator with a random machine identifier and counter seed.
    pub fn new() -> Self {
        Self::with_state(
            rand::random(),
            std::process::id() as u16,
            rand::random::<u32>() & MAX_U24,
        )
    }

    /// Creates a generator with a fixed identity and counter seed.
    pub fn with_state(machine_id: [u8; 3], process_id: u16, counter_seed: u32) -> Self {
        Self {
            machine_id,
            process_id,
            counter: AtomicU32::new(counter_seed & MAX_U24),
        }
    }

    /// The generator used by [`ObjectId::new`].
    pub fn global() -> &'static ObjectIdGenerator {
        &DEFAULT_GENERATOR
    }

    /// Generates an id stamped with the current time.
    pub fn generate(&self) -> ObjectId {
        let seconds = match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as u32,
            Err(_) => 0,
        };
        self.generate_with_time(seconds)
    }

    /// Generates an id stamped with `seconds` since the Unix epoch.
    pub fn generate_with_time(&self, seconds: u32) -> ObjectId {
        // wraps at 2^32, a multiple of 2^24, so masking keeps the sequence contiguous
        let counter = self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1) & MAX_U24;

        let mut id = [0u8; 12];
        id[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET].copy_from_slice(&seconds.to_be_bytes());
        id[MACHINE_ID_OFFSET..PROCESS_ID_OFFSET].copy_from_slice(&self.machine_id);
        id[PROCESS_ID_OFFSET..COUNTER_OFFSET].copy_from_slice(&self.process_id.to_be_bytes());
        id[COUNTER_OFFSET..].copy_from_slice(&counter.to_be_bytes()[1..]);
        ObjectId { id }
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// A wrapper around a raw 12-byte ObjectId.
///
/// Layout: 4 byte big-endian seconds since the epoch, 3 byte machine identifier, 2 byte process
/// id, 3 byte big-endian counter.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectId {
    /// Generates a new ObjectId from the process-wide generator.
    pub fn new() -> ObjectId {
        ObjectIdGenerator::global().generate()
    }

    /// Constructs a new ObjectId wrapper around the raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Builds an id from any of the accepted [`ObjectIdInput`] forms.
    pub fn from_input<'a>(input: impl Into<ObjectIdInput<'a>>) -> Result<ObjectId> {
        match input.into() {
            ObjectIdInput::Str(s) if s.len() == 12 => Self::from_slice(s.as_bytes()),
            ObjectIdInput::Str(s) => Self::parse_str(s),
            ObjectIdInput::Bytes(bytes) => Self::from_slice(bytes),
            ObjectIdInput::HexId(other) => Self::parse_str(other.to_hex_string()),
        }
    }

    fn from_slice(bytes: &[u8]) -> Result<ObjectId> {
        let id: [u8; 12] = bytes
            .try_into()
            .map_err(|_| Error::oid_invalid_length(bytes.len()))?;
        Ok(ObjectId { id })
    }

    /// Creates an ObjectId using a 12-byte (24-char) hexadecimal string.
    pub fn parse_str(s: impl AsRef<str>) -> Result<ObjectId> {
        let s = s.as_ref();

        let bytes: Vec<u8> = hex::decode(s.as_bytes()).map_err(|e| Error::from_hex_error(e, s.len()))?;
        if bytes.len() != 12 {
            Err(Error::oid_invalid_length(bytes.len() * 2))
        } else {
            let mut byte_array: [u8; 12] = [0; 12];
            byte_array[..].copy_from_slice(&bytes[..]);
            Ok(ObjectId::from_bytes(byte_array))
        }
    }

    /// Alias of [`ObjectId::parse_str`].
    pub fn create_from_hex_string(s: impl AsRef<str>) -> Result<ObjectId> {
        Self::parse_str(s)
    }

    /// An id whose timestamp is `seconds` and whose remaining bytes are zero, suitable as a
    /// lower bound when querying by creation time.
    pub fn create_from_time(seconds: u32) -> ObjectId {
        let mut id = [0u8; 12];
        id[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET].copy_from_slice(&seconds.to_be_bytes());
        ObjectId { id }
    }

    /// Whether `input` could be turned into an ObjectId by [`ObjectId::from_input`].
    pub fn is_valid<'a>(input: impl Into<ObjectIdInput<'a>>) -> bool {
        match input.into() {
            ObjectIdInput::Str(s) => {
                s.len() == 12 || (s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit()))
            }
            ObjectIdInput::Bytes(bytes) => bytes.len() == 12,
            ObjectIdInput::HexId(other) => {
                let hex = other.to_hex_string();
                hex.len() == 24 && hex.bytes().all(|b| b.is_ascii_hexdigit())
            }
        }
    }

    /// Compares against another id in any accepted form. Hex strings compare case-insensitively;
    /// 12 byte strings compare as raw ids; anything else is unequal.
    pub fn equals<'a>(&self, other: impl Into<ObjectIdInput<'a>>) -> bool {
        match other.into() {
            ObjectIdInput::Str(s) if s.len() == 12 => s.as_bytes() == self.id,
            ObjectIdInput::Str(s) if s.len() == 24 => s.eq_ignore_ascii_case(&self.to_hex()),
            ObjectIdInput::Str(_) => false,
            ObjectIdInput::Bytes(bytes) => bytes == self.id,
            ObjectIdInput::HexId(other) => other
                .to_hex_string()
                .eq_ignore_ascii_case(&self.to_hex()),
        }
    }

    /// Retrieves the timestamp from an [`ObjectId`].
    pub fn timestamp(&self) -> crate::DateTime {
        crate::DateTime::from_millis(self.generation_time() as i64 * 1000)
    }

    /// Seconds since the epoch at which this id was generated.
    pub fn generation_time(&self) -> u32 {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..MACHINE_ID_OFFSET]);
        u32::from_be_bytes(buf)
    }

    /// Returns the raw byte representation of an ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Convert this [`ObjectId`] to its hex string representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }
}

impl HasHexId for ObjectId {
    fn to_hex_string(&self) -> String {
        self.to_hex()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}
