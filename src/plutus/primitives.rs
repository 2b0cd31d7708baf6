//! Primitive wrappers between `PlutusData` and plain Rust values.
//!
//! Every `as_*` reader fails with `PlutusError::UnexpectedShape` when the node
//! has the wrong shape; callers propagate it with `?`.

use super::{PlutusData, PlutusError};

fn unexpected(expected: &'static str, found: &PlutusData) -> PlutusError {
    PlutusError::UnexpectedShape {
        expected,
        found: found.to_string(),
    }
}

pub fn int(n: i128) -> PlutusData {
    PlutusData::Integer(n)
}

pub fn as_int(data: &PlutusData) -> Result<i128, PlutusError> {
    match data {
        PlutusData::Integer(n) => Ok(*n),
        other => Err(unexpected("integer", other)),
    }
}

/// Wrap a lowercase hex string as a byte string node.
pub fn bytes_hex(hex_str: &str) -> Result<PlutusData, PlutusError> {
    Ok(PlutusData::Bytes(hex::decode(hex_str)?))
}

/// Read a byte string node and return it as a lowercase hex string.
pub fn as_bytes_hex(data: &PlutusData) -> Result<String, PlutusError> {
    match data {
        PlutusData::Bytes(b) => Ok(hex::encode(b)),
        other => Err(unexpected("bytes", other)),
    }
}

/// `Just x` is `Constr 0 [x]`, `Nothing` is `Constr 1 []`.
pub fn maybe<T>(value: Option<&T>, wrap: impl FnOnce(&T) -> PlutusData) -> PlutusData {
    match value {
        Some(v) => PlutusData::constr(0, vec![wrap(v)]),
        None => PlutusData::constr(1, vec![]),
    }
}

pub fn as_maybe<T, E>(
    data: &PlutusData,
    unwrap: impl FnOnce(&PlutusData) -> Result<T, E>,
) -> Result<Option<T>, E>
where
    E: From<PlutusError>,
{
    match data {
        PlutusData::Constr { index: 0, fields } if fields.len() == 1 => unwrap(&fields[0]).map(Some),
        PlutusData::Constr { index: 1, fields } if fields.is_empty() => Ok(None),
        other => Err(unexpected("Just x / Nothing", other).into()),
    }
}

pub fn list<T>(items: &[T], wrap: impl FnMut(&T) -> PlutusData) -> PlutusData {
    PlutusData::List(items.iter().map(wrap).collect())
}

pub fn as_list<T, E>(
    data: &PlutusData,
    unwrap: impl FnMut(&PlutusData) -> Result<T, E>,
) -> Result<Vec<T>, E>
where
    E: From<PlutusError>,
{
    match data {
        PlutusData::List(items) => items.iter().map(unwrap).collect(),
        other => Err(unexpected("list", other).into()),
    }
}

/// Extract the alternative index and field slice of a constructor node.
pub fn as_constr(data: &PlutusData) -> Result<(u64, &[PlutusData]), PlutusError> {
    match data {
        PlutusData::Constr { index, fields } => Ok((*index, fields.as_slice())),
        other => Err(unexpected("constr", other)),
    }
}
