use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::model::sample::Sample;
use crate::model::token::{pair_symbol, TokenInfo};

use super::types::{AlphaAggTrade, AlphaEnvelope, AlphaTicker24, AlphaTokenItem, OneOrMany};

const TOKEN_LIST_PATH: &str = "/bapi/defi/v1/public/wallet-direct/buw/wallet/cex/alpha/all/token/list";
const AGG_TRADES_PATH: &str = "/bapi/defi/v1/public/alpha-trade/agg-trades";
const TICKER_24_PATH: &str = "/bapi/defi/v1/public/alpha-trade/aggTicker24";

/// Read-only market data the engine needs from the remote side.
pub trait AlphaFeed {
    fn token_list(&self) -> impl Future<Output = Result<Vec<TokenInfo>>> + Send;

    /// Latest `limit` trades, oldest first.
    fn recent_trades(
        &self,
        alpha_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;

    /// Current trading multiplier; 0 when the instrument reports none.
    fn multiplier(&self, alpha_id: &str) -> impl Future<Output = Result<f64>> + Send;
}

pub struct AlphaRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl AlphaRestClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("Cache-Control", "no-store")
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?
            .error_for_status()
            .with_context(|| format!("GET {} returned error status", path))?;

        let envelope: AlphaEnvelope<T> = resp
            .json()
            .await
            .with_context(|| format!("GET {} returned malformed json", path))?;

        if envelope.success == Some(false) {
            return Err(AppError::AlphaApi {
                code: envelope.code,
                msg: envelope.message.unwrap_or_default(),
            }
            .into());
        }
        Ok(envelope.data)
    }
}

impl AlphaFeed for AlphaRestClient {
    async fn token_list(&self) -> Result<Vec<TokenInfo>> {
        let items: Vec<AlphaTokenItem> = self.get_data(TOKEN_LIST_PATH, &[]).await?.unwrap_or_default();
        let tokens: Vec<TokenInfo> = items
            .into_iter()
            .filter(|it| !it.alpha_id.is_empty())
            .map(TokenInfo::from)
            .collect();
        tracing::debug!(count = tokens.len(), "Fetched alpha token list");
        Ok(tokens)
    }

    async fn recent_trades(&self, alpha_id: &str, limit: usize) -> Result<Vec<Sample>> {
        let query = [
            ("symbol", pair_symbol(alpha_id)),
            ("limit", limit.to_string()),
        ];
        let trades: Vec<AlphaAggTrade> = self.get_data(AGG_TRADES_PATH, &query).await?.unwrap_or_default();
        Ok(trades
            .iter()
            .map(AlphaAggTrade::to_sample)
            .filter(Sample::is_priced)
            .collect())
    }

    async fn multiplier(&self, alpha_id: &str) -> Result<f64> {
        let pair = pair_symbol(alpha_id);
        let query = [("dataType", "limit".to_string()), ("symbols", pair.clone())];
        let data: Option<OneOrMany<AlphaTicker24>> = self.get_data(TICKER_24_PATH, &query).await?;
        let Some(data) = data else {
            return Ok(0.0);
        };
        let mul = data
            .into_vec()
            .into_iter()
            .find(|t| t.alpha_id.as_deref() == Some(alpha_id) || t.symbol.as_deref() == Some(pair.as_str()))
            .map(|t| t.mul_point)
            .filter(|m| m.is_finite())
            .unwrap_or(0.0);
        Ok(mul)
    }
}
