//! Error taxonomy for order decoding and validation.
//!
//! Internal helpers fail fast with an [`OrderError`]; the public boundaries of
//! [`crate::order::OrderV2`] turn it into an [`InvalidOrder`] value so a batch
//! can keep going past a single bad order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DexVersion;
use crate::models::{OutRef, Value};
use crate::order::EncodedDatum;
use crate::plutus::PlutusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderErrorCode {
    MissingDatumHash,
    MissingDatum,
    InvalidDatum,
    InvalidScriptHash,
    InvalidParameter,
    InvalidValue,
    NonExistencePool,
    Expired,
    MissingBatcherFee,
    MissingDepositAda,
    Unexpected,
}

impl OrderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderErrorCode::MissingDatumHash => "MISSING_DATUM_HASH",
            OrderErrorCode::MissingDatum => "MISSING_DATUM",
            OrderErrorCode::InvalidDatum => "INVALID_DATUM",
            OrderErrorCode::InvalidScriptHash => "INVALID_SCRIPT_HASH",
            OrderErrorCode::InvalidParameter => "INVALID_PARAMETER",
            OrderErrorCode::InvalidValue => "INVALID_VALUE",
            OrderErrorCode::NonExistencePool => "NON_EXISTENCE_POOL",
            OrderErrorCode::Expired => "EXPIRED",
            OrderErrorCode::MissingBatcherFee => "MISSING_BATCHER_FEE",
            OrderErrorCode::MissingDepositAda => "MISSING_DEPOSIT_ADA",
            OrderErrorCode::Unexpected => "UNEXPECTED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            OrderErrorCode::MissingDatumHash => "Order output has neither datum hash nor inline datum",
            OrderErrorCode::MissingDatum => "Datum for the order's datum hash was not provided",
            OrderErrorCode::InvalidDatum => "Order datum could not be decoded",
            OrderErrorCode::InvalidScriptHash => "Order output is not locked by the order script",
            OrderErrorCode::InvalidParameter => "Order datum carries an invalid parameter",
            OrderErrorCode::InvalidValue => "Order value cannot cover the requested amounts",
            OrderErrorCode::NonExistencePool => "Order references a pool that does not exist",
            OrderErrorCode::Expired => "Order has expired",
            OrderErrorCode::MissingBatcherFee => "Order does not reserve enough batcher fee",
            OrderErrorCode::MissingDepositAda => "Order does not carry enough deposit ADA",
            OrderErrorCode::Unexpected => "Unexpected error",
        }
    }
}

impl fmt::Display for OrderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn code_message(code: &OrderErrorCode) -> &'static str {
    code.message()
}

/// A typed order error. The human message is derived from `code` and never
/// stored, so the compact form only carries `code` and `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {} {extra:?}", code_message(.code))]
pub struct OrderError {
    pub code: OrderErrorCode,
    #[serde(default)]
    pub extra: Vec<String>,
}

impl OrderError {
    pub fn new(code: OrderErrorCode, extra: Vec<String>) -> Self {
        Self { code, extra }
    }

    pub fn code(code: OrderErrorCode) -> Self {
        Self::new(code, Vec::new())
    }

    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// Compact JSON form: `{"code":"…","extra":[…]}`.
    pub fn to_compact_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl FromStr for OrderError {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl From<PlutusError> for OrderError {
    fn from(e: PlutusError) -> Self {
        OrderError::new(OrderErrorCode::InvalidDatum, vec![e.to_string()])
    }
}

/// Anything foreign becomes `UNEXPECTED`, keeping its message. An
/// `OrderError` that travelled inside an `anyhow::Error` is passed through.
impl From<anyhow::Error> for OrderError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<OrderError>() {
            Ok(typed) => typed,
            Err(other) => OrderError::new(OrderErrorCode::Unexpected, vec![other.to_string()]),
        }
    }
}

/// Return early with an [`OrderError`] when `cond` does not hold.
///
/// ```ignore
/// order_ensure!(fee > 0, OrderErrorCode::MissingBatcherFee, format!("fee: {}", fee));
/// ```
#[macro_export]
macro_rules! order_ensure {
    ($cond:expr, $code:expr $(, $extra:expr)* $(,)?) => {
        if !($cond) {
            return Err($crate::errors::OrderError::new(
                $code,
                vec![$($extra.to_string()),*],
            ));
        }
    };
}

/// An order that failed validation, with enough context for a batcher to
/// report or refund it.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidOrder {
    pub version: DexVersion,
    pub out_ref: OutRef,
    pub address: String,
    pub owner: Option<String>,
    pub value: Value,
    pub raw_datum: Option<EncodedDatum>,
    pub error: OrderError,
}

impl InvalidOrder {
    pub fn code(&self) -> OrderErrorCode {
        self.error.code
    }
}

impl fmt::Display for InvalidOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order {}: {}", self.out_ref, self.error)
    }
}
