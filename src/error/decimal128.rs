use thiserror::Error as ThisError;

use crate::error::{Error, ErrorKind};

/// The kinds of errors that can occur when working with the [`Decimal128`](crate::Decimal128) type.
///
/// Numeric edge cases such as overflow, underflow or an empty exponent never surface here: they
/// degrade to the NaN or infinity bit patterns instead.
#[derive(Clone, Debug, ThisError)]
#[non_exhaustive]
pub enum Decimal128ErrorKind {
    /// The text cannot be read as a decimal, infinity or NaN token at all.
    #[error("{input:?} is not a valid Decimal128 string")]
    #[non_exhaustive]
    Unparseable {
        /// The rejected input.
        input: String,
    },

    /// A raw representation of the wrong length was supplied.
    #[error("invalid length {length}, expected 16 bytes")]
    #[non_exhaustive]
    InvalidLength {
        /// The length of the rejected input.
        length: usize,
    },
}

impl Error {
    pub(crate) fn decimal128(kind: Decimal128ErrorKind) -> Self {
        ErrorKind::Decimal128 { kind }.into()
    }

    pub(crate) fn decimal128_unparseable(input: &str) -> Self {
        Self::decimal128(Decimal128ErrorKind::Unparseable {
            input: input.to_string(),
        })
    }

    /// Whether this error was raised for text that cannot be read as a decimal value.
    pub fn is_decimal128_unparseable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Decimal128 {
                kind: Decimal128ErrorKind::Unparseable { .. },
            }
        )
    }
}
