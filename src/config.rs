//! Network-keyed configuration.
//!
//! A `NetworkConfig` is built once (from a preset or a JSON file) and passed by
//! reference into order construction and validation.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Address, Credential};
use crate::order::StepType;
use crate::utils::load_from_file;

const MAINNET_LP_POLICY_ID: &str = "f5808c2c990d86da54bfc97d89cee6efa20cd8461616359478d96b4c";
const MAINNET_ORDER_SCRIPT_HASH: &str = "c3e28c36c3447315ba5a56f33da6a6ddc1770a876a8d9f0cb3a97c4c";
const TESTNET_LP_POLICY_ID: &str = "d6aae2059baee188f74917493cf7637e679cd219bdfbbf4dcbeb1d0b";
const TESTNET_ORDER_SCRIPT_HASH: &str = "da9525463841173ad1230b1d5a1b5408a4a1f2b4e7c9ff5c2b27c51d";

static MAINNET: OnceLock<NetworkConfig> = OnceLock::new();
static TESTNET: OnceLock<NetworkConfig> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Testnet,
    Mainnet,
}

impl NetworkId {
    /// Network id as written in an address header.
    pub fn id(&self) -> u8 {
        match self {
            NetworkId::Testnet => 0,
            NetworkId::Mainnet => 1,
        }
    }
}

impl FromStr for NetworkId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkId::Mainnet),
            "testnet" | "preprod" => Ok(NetworkId::Testnet),
            other => Err(anyhow!("unknown network: {}", other)),
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Testnet => f.write_str("testnet"),
            NetworkId::Mainnet => f.write_str("mainnet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DexVersion {
    Dex,
    DexV2,
    Stableswap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatcherFeeEntry {
    pub dex_version: DexVersion,
    pub step_type: StepType,
    pub fee: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: NetworkId,
    pub lp_policy_id: String,
    pub order_script_hash: String,
    #[serde(default = "default_batcher_fees")]
    pub batcher_fees: Vec<BatcherFeeEntry>,
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self {
            network_id: NetworkId::Mainnet,
            lp_policy_id: MAINNET_LP_POLICY_ID.to_string(),
            order_script_hash: MAINNET_ORDER_SCRIPT_HASH.to_string(),
            batcher_fees: default_batcher_fees(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            network_id: NetworkId::Testnet,
            lp_policy_id: TESTNET_LP_POLICY_ID.to_string(),
            order_script_hash: TESTNET_ORDER_SCRIPT_HASH.to_string(),
            batcher_fees: default_batcher_fees(),
        }
    }

    /// Shared preset for a network, built on first access.
    pub fn preset(network: NetworkId) -> &'static NetworkConfig {
        match network {
            NetworkId::Mainnet => MAINNET.get_or_init(NetworkConfig::mainnet),
            NetworkId::Testnet => TESTNET.get_or_init(NetworkConfig::testnet),
        }
    }

    /// Load a config from a JSON file. Hashes are normalized to lowercase.
    pub fn load(path: &str) -> Result<Self> {
        let mut config: NetworkConfig = load_from_file(path)?;
        config.lp_policy_id = config.lp_policy_id.to_lowercase();
        config.order_script_hash = config.order_script_hash.to_lowercase();
        for (name, hash) in [
            ("lp_policy_id", &config.lp_policy_id),
            ("order_script_hash", &config.order_script_hash),
        ] {
            let bytes = hex::decode(hash).map_err(|e| anyhow!("{} is not hex: {}", name, e))?;
            if bytes.len() != 28 {
                return Err(anyhow!("{} must be 28 bytes, got {}", name, bytes.len()));
            }
        }
        Ok(config)
    }

    /// Enterprise address of the order script on this network.
    pub fn order_address(&self) -> Result<String> {
        Address::enterprise(
            self.network_id.id(),
            Credential::Script(self.order_script_hash.clone()),
        )
        .to_bech32()
    }

    pub fn default_batcher_fee(&self, dex_version: DexVersion, step_type: StepType) -> Option<i128> {
        self.batcher_fees
            .iter()
            .find(|e| e.dex_version == dex_version && e.step_type == step_type)
            .map(|e| e.fee)
    }
}

fn default_batcher_fees() -> Vec<BatcherFeeEntry> {
    use StepType::*;

    let entry = |dex_version, step_type, fee| BatcherFeeEntry {
        dex_version,
        step_type,
        fee,
    };

    let mut fees = Vec::new();
    for step_type in [SwapExactIn, SwapExactOut, Deposit, Withdraw, ZapOut] {
        fees.push(entry(DexVersion::Dex, step_type, 2_000_000));
    }
    for step_type in [SwapExactIn, Deposit, Withdraw, WithdrawImbalance, ZapOut] {
        fees.push(entry(DexVersion::Stableswap, step_type, 700_000));
    }
    for step_type in [
        SwapExactIn,
        StopLoss,
        Oco,
        SwapExactOut,
        Deposit,
        Withdraw,
        ZapOut,
        PartialSwap,
        WithdrawImbalance,
        Donation,
    ] {
        fees.push(entry(DexVersion::DexV2, step_type, 700_000));
    }
    fees.push(entry(DexVersion::DexV2, SwapMultiRouting, 900_000));
    fees
}
