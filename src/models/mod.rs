pub mod address;
pub mod asset;
pub mod utxo;
pub mod value;

pub use address::{Address, Credential, StakeCredential};
pub use asset::{token_identifier, token_name, Asset, Token, TradingPair};
pub use utxo::{KupoDatumResponse, KupoUtxoResponse, KupoValue, OutRef, Unit, Utxo};
pub use value::Value;
