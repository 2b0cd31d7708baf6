use serde::Serialize;

use super::{EncodedDatum, OrderDatum, OrderInfo, Step};
use crate::config::{DexVersion, NetworkConfig, NetworkId};
use crate::errors::{InvalidOrder, OrderError, OrderErrorCode};
use crate::models::{Address, Credential, OutRef, Token, TradingPair, Utxo, Value};

/// A validated Minswap V2 order.
///
/// Only [`OrderV2::new`] and [`OrderV2::from_utxo`] produce one, and both
/// check the datum against the network first, so a live `OrderV2` always
/// holds a datum the order validator would accept.
#[derive(Debug, Clone, Serialize)]
pub struct OrderV2 {
    pub out_ref: OutRef,
    pub address: String,
    pub value: Value,
    pub datum: OrderDatum,
    pub raw_datum: EncodedDatum,
    pub network_id: NetworkId,
}

#[derive(Debug, Clone)]
pub struct BatchingOptions {
    pub pair: TradingPair,
    /// Fee the batcher intends to charge. Defaults to the order's ceiling.
    pub custom_batcher_fee: Option<i128>,
    /// POSIX milliseconds.
    pub execution_time: i128,
}

impl OrderV2 {
    pub fn new(
        out_ref: OutRef,
        address: String,
        value: Value,
        datum: OrderDatum,
        raw_datum: EncodedDatum,
        config: &NetworkConfig,
    ) -> Result<Self, InvalidOrder> {
        let order = Self {
            out_ref,
            address,
            value,
            datum,
            raw_datum,
            network_id: config.network_id,
        };
        match order.validate(config) {
            Ok(()) => Ok(order),
            Err(error) => Err(order.reject_with(error)),
        }
    }

    /// Build an order without any validation.
    #[cfg(test)]
    pub(crate) fn new_unchecked(
        out_ref: OutRef,
        address: String,
        value: Value,
        datum: OrderDatum,
        raw_datum: EncodedDatum,
        network_id: NetworkId,
    ) -> Self {
        Self {
            out_ref,
            address,
            value,
            datum,
            raw_datum,
            network_id,
        }
    }

    /// Build an order from an output at the order script. A hash-only output
    /// needs its datum supplied by the caller.
    pub fn from_utxo(
        utxo: &Utxo,
        datum: Option<&EncodedDatum>,
        config: &NetworkConfig,
    ) -> Result<Self, InvalidOrder> {
        let out_ref = utxo.out_ref();
        let reject = |value: Value, raw: Option<EncodedDatum>, error: OrderError| {
            tracing::debug!(order = %out_ref, code = %error.code, "order output rejected");
            InvalidOrder {
                version: DexVersion::DexV2,
                out_ref: out_ref.clone(),
                address: utxo.address.clone(),
                owner: None,
                value,
                raw_datum: raw,
                error,
            }
        };

        let value = match Value::from_units(&utxo.amount) {
            Ok(value) => value,
            Err(error) => return Err(reject(Value::new(), None, error)),
        };

        if let Err(error) = check_script_hash(&utxo.address, config) {
            return Err(reject(value, None, error));
        }

        let raw = match (&utxo.inline_datum, &utxo.data_hash, datum) {
            (Some(inline), _, _) => EncodedDatum::new(inline.as_str()),
            (None, Some(_), Some(supplied)) => supplied.clone(),
            (None, Some(hash), None) => {
                let error = OrderError::new(OrderErrorCode::MissingDatum, vec![hash.clone()]);
                return Err(reject(value, None, error));
            }
            (None, None, _) => {
                return Err(reject(value, None, OrderError::code(OrderErrorCode::MissingDatumHash)));
            }
        };

        let decoded = match OrderDatum::decode(&raw, config.network_id.id()) {
            Ok(decoded) => decoded,
            Err(error) => return Err(reject(value, Some(raw), error)),
        };

        Self::new(out_ref.clone(), utxo.address.clone(), value, decoded, raw, config)
    }

    /// `"<tx hash>#<output index>"`
    pub fn key(&self) -> String {
        self.out_ref.to_string()
    }

    /// Bech32 address of whoever may cancel this order.
    pub fn owner(&self) -> Result<String, OrderError> {
        Ok(self.canceller_address().to_bech32()?)
    }

    pub fn canceller_address(&self) -> Address {
        self.datum.canceller_address(self.network_id.id())
    }

    pub fn step(&self) -> &Step {
        &self.datum.step
    }

    /// True once `time` (POSIX ms) is past the expiry. Orders without an
    /// expiry setting never expire.
    pub fn is_expired(&self, time: i128) -> bool {
        match &self.datum.expiry_setting {
            Some(expiry) => time > expiry.expired_time,
            None => false,
        }
    }

    /// Realize the order against `pair`, reserving the maximum batcher fee.
    pub fn get_order_info(&self, pair: &TradingPair) -> Result<OrderInfo, InvalidOrder> {
        self.order_info_with_fee(pair, self.datum.max_batcher_fee)
    }

    /// Checks a batcher runs right before including the order: expiry, the fee
    /// it wants to charge, then the order's realized amounts at that fee.
    pub fn validate_order_on_batching(
        &self,
        options: &BatchingOptions,
    ) -> Result<OrderInfo, InvalidOrder> {
        if self.is_expired(options.execution_time) {
            let expired_time = self
                .datum
                .expiry_setting
                .map(|e| e.expired_time)
                .unwrap_or_default();
            return Err(self.reject_with(OrderError::new(
                OrderErrorCode::Expired,
                vec![
                    format!("expired time: {}", expired_time),
                    format!("execution time: {}", options.execution_time),
                ],
            )));
        }

        let fee = self.resolve_batcher_fee(options.custom_batcher_fee)?;
        self.order_info_with_fee(&options.pair, fee)
    }

    /// Highest fee a batcher may take in one execution.
    pub fn batcher_fee_ceiling(&self) -> i128 {
        match &self.datum.step {
            Step::PartialSwap {
                max_batcher_fee_each_time,
                ..
            } => *max_batcher_fee_each_time,
            _ => self.datum.max_batcher_fee,
        }
    }

    /// The fee a batcher would take: `custom` when it is positive and within
    /// the ceiling, the ceiling itself when no fee is requested.
    pub fn resolve_batcher_fee(&self, custom: Option<i128>) -> Result<i128, InvalidOrder> {
        self.check_batcher_fee(custom).map_err(|e| self.reject_with(e))
    }

    fn check_batcher_fee(&self, custom: Option<i128>) -> Result<i128, OrderError> {
        let ceiling = self.batcher_fee_ceiling();
        let Some(fee) = custom else {
            return Ok(ceiling);
        };
        order_ensure!(
            fee > 0,
            OrderErrorCode::InvalidParameter,
            format!("custom batcher fee must be positive: {}", fee)
        );
        order_ensure!(
            fee <= ceiling,
            OrderErrorCode::MissingBatcherFee,
            format!("custom batcher fee: {}", fee),
            format!("max batcher fee: {}", ceiling)
        );
        Ok(fee)
    }

    fn order_info_with_fee(
        &self,
        pair: &TradingPair,
        batcher_fee: i128,
    ) -> Result<OrderInfo, InvalidOrder> {
        let info = OrderInfo::derive(
            &self.datum.step,
            &self.datum.lp_asset,
            &self.value,
            pair,
            batcher_fee,
        )
        .map_err(|e| self.reject_with(e))?;
        tracing::debug!(order = %self.out_ref, kind = info.kind(), batcher_fee, "order info derived");
        Ok(info)
    }

    fn validate(&self, config: &NetworkConfig) -> Result<(), OrderError> {
        let mut rest = self.value.clone();
        rest.subtract(&Token::Lovelace, self.datum.max_batcher_fee).trim();
        order_ensure!(
            rest.is_non_negative(),
            OrderErrorCode::InvalidValue,
            format!("lovelace: {}", self.value.coins()),
            format!("max batcher fee: {}", self.datum.max_batcher_fee)
        );
        self.datum.validate_on_chain_constraint(config)
    }

    fn reject_with(&self, error: OrderError) -> InvalidOrder {
        tracing::debug!(order = %self.out_ref, code = %error.code, "order rejected");
        InvalidOrder {
            version: DexVersion::DexV2,
            out_ref: self.out_ref.clone(),
            address: self.address.clone(),
            owner: self.owner().ok(),
            value: self.value.clone(),
            raw_datum: Some(self.raw_datum.clone()),
            error,
        }
    }
}

/// The output must sit at the order script, whatever its staking part.
fn check_script_hash(address: &str, config: &NetworkConfig) -> Result<(), OrderError> {
    let parsed = Address::from_bech32(address)
        .map_err(|e| OrderError::new(OrderErrorCode::InvalidScriptHash, vec![e.to_string()]))?;
    let expected = Credential::Script(config.order_script_hash.clone());
    order_ensure!(
        parsed.payment == expected,
        OrderErrorCode::InvalidScriptHash,
        format!("payment credential: {}", parsed.payment.hash()),
        format!("order script hash: {}", config.order_script_hash)
    );
    Ok(())
}
