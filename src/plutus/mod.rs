//! Generic Plutus data tree shared by every datum codec in the crate.
//!
//! A `PlutusData` value is one of four shapes: an integer, a byte string, an
//! ordered list, or a tagged constructor (alternative index + ordered fields).
//! [`cbor`] moves it to and from the ledger's CBOR encoding and [`primitives`]
//! maps it onto plain Rust values.

use std::fmt;
use thiserror::Error;

pub mod cbor;
pub mod primitives;

pub use cbor::{decode_cbor, encode_cbor, from_cbor_bytes, to_cbor_bytes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Integer(i128),
    Bytes(Vec<u8>),
    List(Vec<PlutusData>),
    Constr { index: u64, fields: Vec<PlutusData> },
}

impl PlutusData {
    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { index, fields }
    }
}

impl fmt::Display for PlutusData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlutusData::Integer(n) => write!(f, "{}", n),
            PlutusData::Bytes(b) => write!(f, "h'{}'", hex::encode(b)),
            PlutusData::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PlutusData::Constr { index, fields } => {
                write!(f, "Constr {} [", index)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PlutusError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("CBOR decode error: {0}")]
    Cbor(String),

    #[error("CBOR encode error: {0}")]
    Encode(String),

    #[error("unsupported CBOR item: {0}")]
    Unsupported(String),

    #[error("expected {expected}, got {found}")]
    UnexpectedShape { expected: &'static str, found: String },

    #[error("integer out of range: {0}")]
    OutOfRange(String),
}
