//! # minswap-order-rs
//!
//! Decode, encode and validate Minswap V2 order datums, and scan the order
//! script for orders a batcher can execute.
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | `plutus` | Plutus data tree and its CBOR codec |
//! | `models` | Assets, values, addresses, UTXOs |
//! | `order` | Step union, order datum, `OrderV2` aggregate, order info |
//! | `errors` | `OrderError` taxonomy and `InvalidOrder` |
//! | `config` | Per-network LP policy, order script hash, batcher fee table |
//! | `scanner` | Concurrent scan of order outputs from an `OrderSource` |
//! | `kupo` | Kupo-backed `OrderSource` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use minswap_order_rs::{scan_orders, KupoApi, NetworkConfig, NetworkId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = NetworkConfig::preset(NetworkId::Mainnet);
//!     let kupo = Arc::new(KupoApi::new("http://localhost:1442")?);
//!     let now = minswap_order_rs::utils::now_millis();
//!
//!     let report = scan_orders(kupo, config, now, 5).await?;
//!     for order in &report.valid {
//!         println!("{} {:?} fee={}", order.key, order.step_type, order.batcher_fee);
//!     }
//!     Ok(())
//! }
//! ```

#[macro_use]
pub mod errors;
pub mod config;
pub mod kupo;
pub mod models;
pub mod order;
pub mod plutus;
pub mod scanner;
pub mod utils;

pub use config::{DexVersion, NetworkConfig, NetworkId};
pub use errors::{InvalidOrder, OrderError, OrderErrorCode};
pub use kupo::KupoApi;
pub use models::{Address, Asset, Token, TradingPair, Utxo, Value};
pub use order::{BatchingOptions, EncodedDatum, EncodedStep, OrderDatum, OrderInfo, OrderV2, Step};
pub use scanner::{scan_orders, OrderSource, ScanReport};
