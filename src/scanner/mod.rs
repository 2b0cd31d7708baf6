//! Scan every order sitting at the order script and sort it into valid,
//! expired and invalid buckets.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::{DexVersion, NetworkConfig, NetworkId};
use crate::errors::{InvalidOrder, OrderError};
use crate::models::{Utxo, Value};
use crate::order::{EncodedDatum, OrderV2, StepType};

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Where order outputs and their datums come from.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Unspent outputs at the order script. Inline datums must be filled in.
    async fn order_utxos(&self, config: &NetworkConfig) -> Result<Vec<Utxo>>;

    async fn datum(&self, hash: &str) -> Result<Option<EncodedDatum>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ScannedOrder {
    pub key: String,
    pub owner: Option<String>,
    pub step_type: StepType,
    /// Fee a batcher would charge, from the default fee table.
    pub batcher_fee: i128,
    pub order: OrderV2,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub network: NetworkId,
    pub scanned_at: i128,
    pub valid: Vec<ScannedOrder>,
    pub expired: Vec<ScannedOrder>,
    pub invalid: Vec<InvalidOrder>,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.valid.len() + self.expired.len() + self.invalid.len()
    }
}

#[derive(Debug)]
enum Outcome {
    Valid(ScannedOrder),
    Expired(ScannedOrder),
    Invalid(InvalidOrder),
}

pub async fn scan_orders<S: OrderSource + 'static>(
    source: Arc<S>,
    config: &NetworkConfig,
    now: i128,
    concurrency: usize,
) -> Result<ScanReport> {
    let utxos = source.order_utxos(config).await?;
    let total = utxos.len();
    let address = config.order_address()?;
    tracing::info!(total, network = %config.network_id, %address, "scanning order outputs");

    let config = Arc::new(config.clone());
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(total);

    for utxo in utxos {
        let source = Arc::clone(&source);
        let config = Arc::clone(&config);
        let sem = Arc::clone(&semaphore);
        let pending = utxo.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.ok();
            let supplied = match (&utxo.inline_datum, &utxo.data_hash) {
                (None, Some(hash)) => match source.datum(hash).await {
                    Ok(datum) => datum,
                    Err(e) => {
                        tracing::warn!(order = %utxo.out_ref(), error = %e, "datum lookup failed");
                        return Outcome::Invalid(unexpected_failure(&utxo, e));
                    }
                },
                _ => None,
            };
            classify(&utxo, supplied.as_ref(), &config, now)
        });
        handles.push((pending, handle));
    }

    let mut report = ScanReport {
        network: config.network_id,
        scanned_at: now,
        valid: Vec::new(),
        expired: Vec::new(),
        invalid: Vec::new(),
    };
    for (pending, handle) in handles {
        match handle.await {
            Ok(Outcome::Valid(order)) => report.valid.push(order),
            Ok(Outcome::Expired(order)) => report.expired.push(order),
            Ok(Outcome::Invalid(invalid)) => {
                tracing::warn!(order = %invalid.out_ref, error = %invalid.error, "invalid order");
                report.invalid.push(invalid);
            }
            Err(e) => {
                tracing::warn!(order = %pending.out_ref(), error = %e, "scan task failed");
                let error = anyhow::anyhow!("scan task failed: {}", e);
                report.invalid.push(unexpected_failure(&pending, error));
            }
        }
    }

    report.valid.sort_by(|a, b| a.key.cmp(&b.key));
    report.expired.sort_by(|a, b| a.key.cmp(&b.key));
    report
        .invalid
        .sort_by(|a, b| a.out_ref.to_string().cmp(&b.out_ref.to_string()));
    tracing::info!(
        valid = report.valid.len(),
        expired = report.expired.len(),
        invalid = report.invalid.len(),
        "scan finished"
    );
    Ok(report)
}

fn classify(utxo: &Utxo, datum: Option<&EncodedDatum>, config: &NetworkConfig, now: i128) -> Outcome {
    let order = match OrderV2::from_utxo(utxo, datum, config) {
        Ok(order) => order,
        Err(invalid) => return Outcome::Invalid(invalid),
    };
    let step_type = order.step().step_type();
    let default_fee = config.default_batcher_fee(DexVersion::DexV2, step_type);
    let batcher_fee = match order.resolve_batcher_fee(default_fee) {
        Ok(fee) => fee,
        Err(invalid) => return Outcome::Invalid(invalid),
    };
    let expired = order.is_expired(now);
    let scanned = ScannedOrder {
        key: order.key(),
        owner: order.owner().ok(),
        step_type,
        batcher_fee,
        order,
    };
    if expired {
        Outcome::Expired(scanned)
    } else {
        Outcome::Valid(scanned)
    }
}

/// An order that could not be classified because something outside the
/// datum failed.
fn unexpected_failure(utxo: &Utxo, error: anyhow::Error) -> InvalidOrder {
    InvalidOrder {
        version: DexVersion::DexV2,
        out_ref: utxo.out_ref(),
        address: utxo.address.clone(),
        owner: None,
        value: Value::from_units(&utxo.amount).unwrap_or_default(),
        raw_datum: None,
        error: OrderError::from(error),
    }
}
