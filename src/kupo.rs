use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::NetworkConfig;
use crate::models::{KupoDatumResponse, KupoUtxoResponse, Utxo};
use crate::order::EncodedDatum;
use crate::scanner::OrderSource;
use crate::utils::{remove_trailing_slash, retry};

const RETRIES: u32 = 10;
const BASE_DELAY_MS: u64 = 1000;

pub struct KupoApi {
    api_url: String,
    client: reqwest::Client,
}

impl KupoApi {
    pub fn new(api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minutes for large queries
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self::with_client(api_url, client))
    }

    pub fn with_client(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: remove_trailing_slash(api_url),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_matches_url(&self, match_pattern: &str, unspent: bool) -> String {
        let base = format!("{}/matches/{}", self.api_url, match_pattern);
        if unspent {
            format!("{}?unspent", base)
        } else {
            base
        }
    }

    fn build_datum_url(&self, hash: &str) -> String {
        format!("{}/datums/{}", self.api_url, hash)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate_limited"));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| anyhow!("unexpected response from {}: {}", url, e))
    }

    /// Outputs matching a Kupo pattern. Inline datums are not resolved.
    pub async fn get(&self, match_pattern: &str, unspent: bool) -> Result<Vec<KupoUtxoResponse>> {
        let url = self.build_matches_url(match_pattern, unspent);
        let responses: Vec<KupoUtxoResponse> =
            retry(RETRIES, BASE_DELAY_MS, || self.fetch_json(&url)).await?;
        tracing::debug!(pattern = match_pattern, count = responses.len(), "kupo matches");
        Ok(responses)
    }

    /// Raw datum CBOR for a datum hash, or `None` when Kupo has not seen it.
    pub async fn datum(&self, hash: &str) -> Result<Option<String>> {
        let url = self.build_datum_url(hash);
        let response: Option<KupoDatumResponse> =
            retry(RETRIES, BASE_DELAY_MS, || self.fetch_json(&url)).await?;
        Ok(response.map(|r| r.datum))
    }
}

#[async_trait]
impl OrderSource for KupoApi {
    /// Every unspent output paying to the order script, whatever its staking
    /// part, with inline datums filled in.
    async fn order_utxos(&self, config: &NetworkConfig) -> Result<Vec<Utxo>> {
        let pattern = format!("{}/*", config.order_script_hash);
        let responses = self.get(&pattern, true).await?;

        let mut utxos = Vec::with_capacity(responses.len());
        for response in responses {
            let inline_hash = if response.has_inline_datum() {
                response.datum_hash.clone()
            } else {
                None
            };
            let mut utxo = Utxo::from(response);
            if let Some(hash) = inline_hash {
                utxo.inline_datum = self.datum(&hash).await?;
            }
            utxos.push(utxo);
        }
        tracing::debug!(count = utxos.len(), "fetched order outputs");
        Ok(utxos)
    }

    async fn datum(&self, hash: &str) -> Result<Option<EncodedDatum>> {
        Ok(KupoApi::datum(self, hash).await?.map(EncodedDatum::new))
    }
}
