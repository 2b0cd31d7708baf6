//! CBOR codec for `PlutusData`.
//!
//! Decoding goes through `ciborium::Value`, which accepts both definite and
//! indefinite containers. Encoding writes headers directly with `ciborium-ll`
//! so that the output follows the ledger's canonical layout: non-empty arrays
//! are indefinite, empty arrays are definite, byte strings longer than 64
//! bytes are chunked.

use ciborium::value::Value;
use ciborium_ll::{Encoder, Header};

use super::{PlutusData, PlutusError};

const TAG_BIGNUM_POS: u64 = 2;
const TAG_BIGNUM_NEG: u64 = 3;
const TAG_CONSTR_GENERAL: u64 = 102;
const TAG_CONSTR_0: u64 = 121;
const TAG_CONSTR_7: u64 = 1280;
const BYTES_CHUNK: usize = 64;

/// Decode a CBOR hex string into a `PlutusData` tree.
pub fn decode_cbor(cbor_hex: &str) -> Result<PlutusData, PlutusError> {
    let bytes = hex::decode(cbor_hex.trim())?;
    from_cbor_bytes(&bytes)
}

pub fn from_cbor_bytes(bytes: &[u8]) -> Result<PlutusData, PlutusError> {
    let value: Value =
        ciborium::de::from_reader(bytes).map_err(|e| PlutusError::Cbor(e.to_string()))?;
    from_value(value)
}

/// Encode a `PlutusData` tree into its canonical CBOR hex string.
pub fn encode_cbor(data: &PlutusData) -> Result<String, PlutusError> {
    Ok(hex::encode(to_cbor_bytes(data)?))
}

pub fn to_cbor_bytes(data: &PlutusData) -> Result<Vec<u8>, PlutusError> {
    let mut buffer = Vec::new();
    {
        let mut encoder = Encoder::from(&mut buffer);
        write_data(&mut encoder, data).map_err(|e| PlutusError::Encode(e.to_string()))?;
    }
    Ok(buffer)
}

fn from_value(value: Value) -> Result<PlutusData, PlutusError> {
    match value {
        Value::Integer(i) => Ok(PlutusData::Integer(i.into())),
        Value::Bytes(b) => Ok(PlutusData::Bytes(b)),
        Value::Array(items) => items
            .into_iter()
            .map(from_value)
            .collect::<Result<Vec<_>, _>>()
            .map(PlutusData::List),
        Value::Tag(tag, inner) => from_tagged(tag, *inner),
        Value::Map(_) => Err(PlutusError::Unsupported("map".to_string())),
        other => Err(PlutusError::Unsupported(format!("{:?}", other))),
    }
}

fn from_tagged(tag: u64, inner: Value) -> Result<PlutusData, PlutusError> {
    match tag {
        TAG_CONSTR_0..=127 => Ok(PlutusData::constr(tag - TAG_CONSTR_0, constr_items(inner)?)),
        TAG_CONSTR_7..=1400 => Ok(PlutusData::constr(
            tag - TAG_CONSTR_7 + 7,
            constr_items(inner)?,
        )),
        TAG_CONSTR_GENERAL => {
            let mut pair = match inner {
                Value::Array(pair) if pair.len() == 2 => pair,
                other => {
                    return Err(PlutusError::UnexpectedShape {
                        expected: "[index, fields] under tag 102",
                        found: format!("{:?}", other),
                    })
                }
            };
            let fields = constr_items(pair.pop().unwrap_or(Value::Null))?;
            let index = match pair.pop() {
                Some(Value::Integer(i)) => u64::try_from(i)
                    .map_err(|_| PlutusError::OutOfRange("constructor index".to_string()))?,
                other => {
                    return Err(PlutusError::UnexpectedShape {
                        expected: "constructor index",
                        found: format!("{:?}", other),
                    })
                }
            };
            Ok(PlutusData::constr(index, fields))
        }
        TAG_BIGNUM_POS | TAG_BIGNUM_NEG => {
            let bytes = match inner {
                Value::Bytes(b) => b,
                other => {
                    return Err(PlutusError::UnexpectedShape {
                        expected: "bignum bytes",
                        found: format!("{:?}", other),
                    })
                }
            };
            let magnitude = bignum_from_bytes(&bytes)?;
            if tag == TAG_BIGNUM_POS {
                Ok(PlutusData::Integer(magnitude))
            } else {
                Ok(PlutusData::Integer(-1 - magnitude))
            }
        }
        other => Err(PlutusError::Unsupported(format!("tag {}", other))),
    }
}

fn constr_items(inner: Value) -> Result<Vec<PlutusData>, PlutusError> {
    match inner {
        Value::Array(items) => items.into_iter().map(from_value).collect(),
        other => Err(PlutusError::UnexpectedShape {
            expected: "array inside constr tag",
            found: format!("{:?}", other),
        }),
    }
}

fn bignum_from_bytes(bytes: &[u8]) -> Result<i128, PlutusError> {
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    // Top bit must stay clear so the magnitude fits a non-negative i128.
    if significant.len() > 16 || (significant.len() == 16 && significant[0] & 0x80 != 0) {
        return Err(PlutusError::OutOfRange(format!(
            "bignum of {} bytes",
            significant.len()
        )));
    }
    Ok(significant
        .iter()
        .fold(0i128, |acc, b| (acc << 8) | i128::from(*b)))
}

fn bignum_to_bytes(magnitude: u128) -> Vec<u8> {
    magnitude
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect()
}

fn write_data(encoder: &mut Encoder<&mut Vec<u8>>, data: &PlutusData) -> std::io::Result<()> {
    match data {
        PlutusData::Integer(n) => write_integer(encoder, *n),
        PlutusData::Bytes(b) => encoder.bytes(b, BYTES_CHUNK),
        PlutusData::List(items) => write_array(encoder, items),
        PlutusData::Constr { index, fields } => match *index {
            i @ 0..=6 => {
                encoder.push(Header::Tag(TAG_CONSTR_0 + i))?;
                write_array(encoder, fields)
            }
            i @ 7..=127 => {
                encoder.push(Header::Tag(TAG_CONSTR_7 + i - 7))?;
                write_array(encoder, fields)
            }
            i => {
                encoder.push(Header::Tag(TAG_CONSTR_GENERAL))?;
                encoder.push(Header::Array(Some(2)))?;
                encoder.push(Header::Positive(i))?;
                write_array(encoder, fields)
            }
        },
    }
}

fn write_array(encoder: &mut Encoder<&mut Vec<u8>>, items: &[PlutusData]) -> std::io::Result<()> {
    if items.is_empty() {
        return encoder.push(Header::Array(Some(0)));
    }
    encoder.push(Header::Array(None))?;
    for item in items {
        write_data(encoder, item)?;
    }
    encoder.push(Header::Break)
}

fn write_integer(encoder: &mut Encoder<&mut Vec<u8>>, n: i128) -> std::io::Result<()> {
    if n >= 0 {
        match u64::try_from(n) {
            Ok(small) => encoder.push(Header::Positive(small)),
            Err(_) => {
                encoder.push(Header::Tag(TAG_BIGNUM_POS))?;
                encoder.bytes(&bignum_to_bytes(n as u128), BYTES_CHUNK)
            }
        }
    } else {
        // CBOR negative integers carry -1 - n.
        let magnitude = (-1 - n) as u128;
        match u64::try_from(magnitude) {
            Ok(small) => encoder.push(Header::Negative(small)),
            Err(_) => {
                encoder.push(Header::Tag(TAG_BIGNUM_NEG))?;
                encoder.bytes(&bignum_to_bytes(magnitude), BYTES_CHUNK)
            }
        }
    }
}
