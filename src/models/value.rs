use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::errors::{OrderError, OrderErrorCode};
use crate::models::asset::{from_identifier, token_identifier, Token};
use crate::models::Unit;

/// A multi-asset amount map.
///
/// Amounts are signed so that the result of a subtraction can be inspected
/// with [`Value::is_non_negative`] before it is trusted. Arithmetic saturates
/// at the `i128` bounds, which keeps the sign of every entry exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value(BTreeMap<Token, i128>);

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lovelace(amount: i128) -> Self {
        let mut value = Self::new();
        value.add(&Token::Lovelace, amount);
        value
    }

    /// Build a value from the `unit`/`quantity` list carried by a UTXO.
    pub fn from_units(units: &[Unit]) -> Result<Self, OrderError> {
        let mut value = Self::new();
        for u in units {
            let quantity = u.quantity.parse::<i128>().map_err(|e| {
                OrderError::new(
                    OrderErrorCode::InvalidValue,
                    vec![format!("invalid quantity {:?} for {}: {}", u.quantity, u.unit, e)],
                )
            })?;
            value.add(&from_identifier(&u.unit)?, quantity);
        }
        Ok(value)
    }

    pub fn get(&self, token: &Token) -> i128 {
        self.0.get(token).copied().unwrap_or(0)
    }

    pub fn add(&mut self, token: &Token, amount: i128) -> &mut Self {
        let entry = self.0.entry(token.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
        self
    }

    pub fn subtract(&mut self, token: &Token, amount: i128) -> &mut Self {
        let entry = self.0.entry(token.clone()).or_insert(0);
        *entry = entry.saturating_sub(amount);
        self
    }

    pub fn remove(&mut self, token: &Token) -> i128 {
        self.0.remove(token).unwrap_or(0)
    }

    /// Drop zero entries.
    pub fn trim(&mut self) -> &mut Self {
        self.0.retain(|_, amount| *amount != 0);
        self
    }

    pub fn is_non_negative(&self) -> bool {
        self.0.values().all(|amount| *amount >= 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|amount| *amount == 0)
    }

    pub fn coins(&self) -> i128 {
        self.get(&Token::Lovelace)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &i128)> {
        self.0.iter()
    }
}

impl FromIterator<(Token, i128)> for Value {
    fn from_iter<I: IntoIterator<Item = (Token, i128)>>(iter: I) -> Self {
        let mut value = Value::new();
        for (token, amount) in iter {
            value.add(&token, amount);
        }
        value
    }
}

/// Serialized as `{ "<unit>": "<quantity>" }`, the shape indexers return.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (token, amount) in &self.0 {
            map.serialize_entry(&token_identifier(token), &amount.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Asset;

    fn min() -> Token {
        Token::Asset(Asset::new(
            "29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c6",
            "4d494e",
        ))
    }

    #[test]
    fn test_arithmetic_and_trim() {
        let mut value = Value::from_lovelace(5_000_000);
        value.add(&min(), 100);
        value.subtract(&Token::Lovelace, 5_000_000).subtract(&min(), 40);
        assert_eq!(value.get(&min()), 60);
        assert_eq!(value.coins(), 0);
        assert!(value.is_non_negative());

        value.trim();
        assert_eq!(value.iter().count(), 1);

        value.subtract(&min(), 61);
        assert!(!value.is_non_negative());
    }

    #[test]
    fn test_arithmetic_saturates_with_exact_sign() {
        let mut value = Value::from_lovelace(i128::MAX);
        value.add(&Token::Lovelace, 1);
        assert_eq!(value.coins(), i128::MAX);

        let mut value = Value::from_lovelace(-5);
        value.subtract(&Token::Lovelace, i128::MAX);
        assert_eq!(value.coins(), i128::MIN);
        assert!(!value.is_non_negative());

        let mut value = Value::new();
        value.subtract(&min(), i128::MIN);
        assert_eq!(value.get(&min()), i128::MAX);
    }

    #[test]
    fn test_from_units() {
        let units = vec![
            Unit {
                unit: "lovelace".to_string(),
                quantity: "2000000".to_string(),
            },
            Unit {
                unit: "29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c64d494e".to_string(),
                quantity: "15".to_string(),
            },
        ];
        let value = Value::from_units(&units).unwrap();
        assert_eq!(value.coins(), 2_000_000);
        assert_eq!(value.get(&min()), 15);

        let bad = vec![Unit {
            unit: "lovelace".to_string(),
            quantity: "abc".to_string(),
        }];
        assert_eq!(
            Value::from_units(&bad).unwrap_err().code,
            OrderErrorCode::InvalidValue
        );
    }

    #[test]
    fn test_from_units_rejects_malformed_unit() {
        let units = vec![
            Unit {
                unit: "lovelace".to_string(),
                quantity: "1000000".to_string(),
            },
            Unit {
                unit: "deadbeef".to_string(),
                quantity: "5000000".to_string(),
            },
        ];
        let err = Value::from_units(&units).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
        assert!(err.extra[0].contains("deadbeef"));
    }

    #[test]
    fn test_serialize() {
        let value: Value = vec![(Token::Lovelace, 7)].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"lovelace":"7"}"#
        );
    }
}
