//! Minswap V2 order protocol: the step union, the order datum, and the
//! order aggregate a batcher works with.

pub mod datum;
pub mod encoded;
pub mod info;
pub mod order_v2;
pub mod step;

pub use datum::{AuthorizationMethod, AuthorizationMethodType, ExpirySetting, ExtraDatum, OrderDatum};
pub use encoded::{EncodedDatum, EncodedStep};
pub use info::OrderInfo;
pub use order_v2::{BatchingOptions, OrderV2};
pub use step::{
    DepositAmountOption, Direction, Killable, Route, Step, StepType, SwapAmountOption,
    WithdrawAmountOption,
};

use crate::errors::{OrderError, OrderErrorCode};
use crate::plutus::primitives::as_constr;
use crate::plutus::PlutusData;

/// Read a constructor node, failing with `INVALID_PARAMETER` and the raw node
/// text when it is anything else.
pub(crate) fn decode_constr<'a>(
    data: &'a PlutusData,
    what: &str,
) -> Result<(u64, &'a [PlutusData]), OrderError> {
    as_constr(data).map_err(|_| {
        OrderError::new(
            OrderErrorCode::InvalidParameter,
            vec![format!("{} must be a constructor", what), data.to_string()],
        )
    })
}

/// Read a constructor node whose index is in `0..=max_index` and whose field
/// count is exactly `arity`.
pub(crate) fn decode_constr_exact<'a>(
    data: &'a PlutusData,
    what: &str,
    max_index: u64,
    arity: usize,
) -> Result<(u64, &'a [PlutusData]), OrderError> {
    let (index, fields) = decode_constr(data, what)?;
    order_ensure!(
        index <= max_index,
        OrderErrorCode::InvalidParameter,
        format!("invalid {} index {}", what, index),
        data
    );
    check_arity(what, data, fields, arity)?;
    Ok((index, fields))
}

pub(crate) fn check_arity(
    what: &str,
    data: &PlutusData,
    fields: &[PlutusData],
    arity: usize,
) -> Result<(), OrderError> {
    order_ensure!(
        fields.len() == arity,
        OrderErrorCode::InvalidParameter,
        format!("{} expects {} fields, got {}", what, arity, fields.len()),
        data
    );
    Ok(())
}
