use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: String,
}

fn deserialize_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Q {
        Str(String),
        Num(u64),
    }
    let q = Q::deserialize(deserializer)?;
    Ok(match q {
        Q::Str(s) => s,
        Q::Num(n) => n.to_string(),
    })
}

/// Transaction id + output index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutRef {
    pub tx_hash: String,
    pub output_index: u32,
}

impl fmt::Display for OutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.output_index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utxo {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<Unit>,
    pub data_hash: Option<String>,
    pub inline_datum: Option<String>,
    pub reference_script_hash: Option<String>,
}

impl Utxo {
    pub fn out_ref(&self) -> OutRef {
        OutRef {
            tx_hash: self.tx_hash.clone(),
            output_index: self.output_index,
        }
    }
}

/// One entry of a Kupo `/matches` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoUtxoResponse {
    pub address: String,
    #[serde(rename = "transaction_id")]
    pub tx_id: String,
    #[serde(rename = "output_index", deserialize_with = "deserialize_output_index")]
    pub output_idx: u32,
    pub value: KupoValue,
    pub datum_hash: Option<String>,
    /// `"hash"` or `"inline"` when a datum is attached.
    pub datum_type: Option<String>,
    pub script_hash: Option<String>,
}

impl KupoUtxoResponse {
    pub fn has_inline_datum(&self) -> bool {
        self.datum_type.as_deref() == Some("inline")
    }
}

fn deserialize_output_index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum O {
        Num(u32),
        Str(String),
    }
    let o = O::deserialize(deserializer)?;
    match o {
        O::Num(n) => Ok(n),
        O::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoValue {
    #[serde(deserialize_with = "deserialize_coins")]
    pub coins: String,
    pub assets: Option<HashMap<String, Quantity>>,
}

/// Kupo reports quantities as numbers, some proxies as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Num(u64),
    Str(String),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Num(n) => write!(f, "{}", n),
            Quantity::Str(s) => f.write_str(s),
        }
    }
}

fn deserialize_coins<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum C {
        Str(String),
        Num(u64),
    }
    let c = C::deserialize(deserializer)?;
    Ok(match c {
        C::Str(s) => s,
        C::Num(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KupoDatumResponse {
    pub datum: String,
}

/// Kupo omits the datum itself from `/matches`; an inline datum is resolved
/// separately and filled in by the caller.
impl From<KupoUtxoResponse> for Utxo {
    fn from(r: KupoUtxoResponse) -> Self {
        let mut amount = vec![Unit {
            unit: "lovelace".to_string(),
            quantity: r.value.coins,
        }];
        if let Some(assets) = r.value.assets {
            let mut assets: Vec<_> = assets.into_iter().collect();
            assets.sort_by(|a, b| a.0.cmp(&b.0));
            for (unit, qty) in assets {
                amount.push(Unit {
                    unit: unit.replace('.', ""),
                    quantity: qty.to_string(),
                });
            }
        }

        Utxo {
            address: r.address,
            tx_hash: r.tx_id,
            output_index: r.output_idx,
            amount,
            data_hash: r.datum_hash,
            inline_datum: None,
            reference_script_hash: r.script_hash,
        }
    }
}
