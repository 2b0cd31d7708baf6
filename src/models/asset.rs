use serde::{Deserialize, Serialize};

use crate::errors::{OrderError, OrderErrorCode};
use crate::plutus::primitives::{as_bytes_hex, as_constr, bytes_hex};
use crate::plutus::{PlutusData, PlutusError};

/// A native token: 28-byte policy id and 0–32 byte name, both lowercase hex.
///
/// Ordering compares policy then name. Since both are fixed-width lowercase
/// hex, this matches byte-wise ordering of the raw values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Asset {
    pub policy_id: String,
    pub name_hex: String,
}

impl Asset {
    pub fn new(policy_id: &str, name_hex: &str) -> Self {
        Self {
            policy_id: policy_id.to_lowercase(),
            name_hex: name_hex.to_lowercase(),
        }
    }

    pub fn identifier(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.policy_id, delimiter, self.name_hex)
    }

    pub fn asset_name(&self) -> String {
        String::from_utf8_lossy(&hex::decode(&self.name_hex).unwrap_or_default()).to_string()
    }

    /// `Constr 0 [policy, name]`
    pub fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
        Ok(PlutusData::constr(
            0,
            vec![bytes_hex(&self.policy_id)?, bytes_hex(&self.name_hex)?],
        ))
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Asset, PlutusError> {
        let (policy_id, name_hex) = parse_asset_constr(data)?;
        Ok(Asset { policy_id, name_hex })
    }
}

/// Anything that can sit in a `Value`: lovelace, or a native token.
///
/// `Lovelace` is declared first so it sorts below every asset, the same place
/// its empty policy id puts it on chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    Lovelace,
    Asset(Asset),
}

impl Token {
    /// Lovelace is `Constr 0 [h'', h'']`.
    pub fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
        match self {
            Token::Lovelace => Ok(PlutusData::constr(
                0,
                vec![PlutusData::Bytes(vec![]), PlutusData::Bytes(vec![])],
            )),
            Token::Asset(a) => a.to_plutus_data(),
        }
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Token, PlutusError> {
        let (policy_id, name_hex) = parse_asset_constr(data)?;
        if policy_id.is_empty() {
            if !name_hex.is_empty() {
                return Err(PlutusError::UnexpectedShape {
                    expected: "empty token name for lovelace",
                    found: name_hex,
                });
            }
            return Ok(Token::Lovelace);
        }
        Ok(Token::Asset(Asset { policy_id, name_hex }))
    }
}

impl From<Asset> for Token {
    fn from(asset: Asset) -> Self {
        Token::Asset(asset)
    }
}

/// Parse the two-field constr that represents a Cardano asset: (policy_bytes, name_bytes).
/// Returns `(policy_hex, name_hex)`.
fn parse_asset_constr(data: &PlutusData) -> Result<(String, String), PlutusError> {
    let (index, fields) = as_constr(data)?;
    if index != 0 || fields.len() != 2 {
        return Err(PlutusError::UnexpectedShape {
            expected: "asset Constr 0 [policy, name]",
            found: data.to_string(),
        });
    }
    Ok((as_bytes_hex(&fields[0])?, as_bytes_hex(&fields[1])?))
}

const POLICY_HEX_LEN: usize = 56;
const MAX_NAME_HEX_LEN: usize = 64;

/// Parse a unit as indexers print it: `lovelace`, or policy id hex followed
/// by the asset name hex, optionally separated by a dot.
pub fn from_identifier(id: &str) -> Result<Token, OrderError> {
    if id == "lovelace" {
        return Ok(Token::Lovelace);
    }
    let hex_id = id.replacen('.', "", 1);
    let well_formed = hex_id.len() >= POLICY_HEX_LEN
        && hex_id.len() <= POLICY_HEX_LEN + MAX_NAME_HEX_LEN
        && hex_id.len() % 2 == 0
        && hex_id.bytes().all(|b| b.is_ascii_hexdigit());
    order_ensure!(
        well_formed,
        OrderErrorCode::InvalidValue,
        format!("malformed unit: {:?}", id)
    );
    let (policy_id, name_hex) = hex_id.split_at(POLICY_HEX_LEN);
    Ok(Token::Asset(Asset::new(policy_id, name_hex)))
}

pub fn token_name(token: &Token) -> String {
    match token {
        Token::Lovelace => "ADA".to_string(),
        Token::Asset(a) => a.asset_name(),
    }
}

pub fn token_identifier(token: &Token) -> String {
    match token {
        Token::Lovelace => "lovelace".to_string(),
        Token::Asset(a) => a.identifier(""),
    }
}

/// A trading pair normalized so that `asset_a < asset_b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradingPair {
    pub asset_a: Token,
    pub asset_b: Token,
}

impl TradingPair {
    pub fn new(x: Token, y: Token) -> Self {
        if x <= y {
            Self { asset_a: x, asset_b: y }
        } else {
            Self { asset_a: y, asset_b: x }
        }
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", token_name(&self.asset_a), token_name(&self.asset_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: &str = "29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c6";
    const LP: &str = "f5808c2c990d86da54bfc97d89cee6efa20cd8461616359478d96b4c";

    #[test]
    fn test_lovelace_sorts_first() {
        let min = Token::Asset(Asset::new(MIN, "4d494e"));
        assert!(Token::Lovelace < min);
    }

    #[test]
    fn test_asset_ordering_is_bytewise() {
        let a = Asset::new(MIN, "4d494e");
        let b = Asset::new(LP, "00");
        let c = Asset::new(MIN, "4d494e00");
        assert!(a < b);
        // A shorter name that is a prefix sorts first, as with raw bytes.
        assert!(a < c);
        assert_eq!(Asset::new(&MIN.to_uppercase(), "4D494E"), a);
    }

    #[test]
    fn test_pair_is_normalized() {
        let min = Token::Asset(Asset::new(MIN, "4d494e"));
        let pair = TradingPair::new(min.clone(), Token::Lovelace);
        assert_eq!(pair.asset_a, Token::Lovelace);
        assert_eq!(pair.asset_b, min);
        assert_eq!(pair, TradingPair::new(Token::Lovelace, min));
        assert_eq!(pair.pair(), "ADA/MIN");
    }

    #[test]
    fn test_token_plutus_data() {
        let lovelace = Token::Lovelace.to_plutus_data().unwrap();
        assert_eq!(Token::from_plutus_data(&lovelace).unwrap(), Token::Lovelace);

        let min = Token::Asset(Asset::new(MIN, "4d494e"));
        let data = min.to_plutus_data().unwrap();
        assert_eq!(Token::from_plutus_data(&data).unwrap(), min);

        let bad = PlutusData::constr(
            0,
            vec![PlutusData::Bytes(vec![]), PlutusData::Bytes(vec![1])],
        );
        assert!(Token::from_plutus_data(&bad).is_err());
        assert!(Asset::from_plutus_data(&PlutusData::constr(1, vec![])).is_err());
    }

    #[test]
    fn test_from_identifier() {
        assert_eq!(from_identifier("lovelace").unwrap(), Token::Lovelace);
        let token = from_identifier(&format!("{}.4d494e", MIN)).unwrap();
        assert_eq!(token_identifier(&token), format!("{}4d494e", MIN));
        assert_eq!(token_name(&token), "MIN");
        assert_eq!(from_identifier(MIN).unwrap(), Token::Asset(Asset::new(MIN, "")));
    }

    #[test]
    fn test_from_identifier_rejects_malformed_units() {
        let odd_name = format!("{}4d4", MIN);
        let too_long = format!("{}{}", MIN, "00".repeat(33));
        let multibyte = format!("{}é", &MIN[..55]);
        let units = [
            "",
            "deadbeef",
            "ada",
            odd_name.as_str(),
            too_long.as_str(),
            multibyte.as_str(),
        ];
        for unit in units {
            let err = from_identifier(unit).unwrap_err();
            assert_eq!(err.code, OrderErrorCode::InvalidValue, "{}", unit);
        }
    }
}
