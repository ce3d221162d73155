use serde::Deserialize;

use crate::model::sample::Sample;
use crate::model::token::TokenInfo;

pub fn string_or_number_to_f64_default<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

pub fn string_or_number_to_u64_default<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = string_or_number_to_f64_default(deserializer)?;
    if v.is_finite() && v > 0.0 {
        Ok(v as u64)
    } else {
        Ok(0)
    }
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope shared by all `bapi` endpoints.
#[derive(Debug, Deserialize)]
pub struct AlphaEnvelope<T> {
    #[serde(default, deserialize_with = "null_to_default")]
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    pub data: Option<T>,
}

/// Aggregated trade item (`alpha-trade/agg-trades`).
#[derive(Debug, Deserialize, Clone)]
pub struct AlphaAggTrade {
    #[serde(rename = "a", default)]
    pub agg_id: Option<u64>,
    #[serde(rename = "p", deserialize_with = "string_or_number_to_f64_default")]
    pub price: f64,
    #[serde(rename = "q", deserialize_with = "string_or_number_to_f64_default")]
    pub qty: f64,
    #[serde(rename = "T", default)]
    pub time: u64,
}

impl AlphaAggTrade {
    pub fn to_sample(&self) -> Sample {
        match self.agg_id {
            Some(id) => Sample::with_trade_id(id, self.time, self.price, self.qty),
            None => Sample::new(self.time, self.price, self.qty),
        }
    }
}

/// Token list item (`wallet-direct/buw/wallet/cex/alpha/all/token/list`).
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlphaTokenItem {
    #[serde(default, deserialize_with = "null_to_default")]
    pub alpha_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub contract_address: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub icon_url: String,
    #[serde(default, deserialize_with = "string_or_number_to_u64_default")]
    pub listing_time: u64,
    #[serde(default, deserialize_with = "string_or_number_to_f64_default")]
    pub mul_point: f64,
    #[serde(default, deserialize_with = "string_or_number_to_f64_default")]
    pub volume24h: f64,
    #[serde(default, deserialize_with = "string_or_number_to_f64_default")]
    pub liquidity: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub offline: bool,
}

impl From<AlphaTokenItem> for TokenInfo {
    fn from(item: AlphaTokenItem) -> Self {
        TokenInfo {
            alpha_id: item.alpha_id,
            symbol: item.symbol.trim().to_ascii_uppercase(),
            contract_address: item.contract_address.trim().to_ascii_lowercase(),
            icon_url: item.icon_url,
            listing_time_ms: item.listing_time,
            multiplier: item.mul_point,
            volume_24h: item.volume24h,
            liquidity: item.liquidity,
            offline: item.offline,
        }
    }
}

/// 24h ticker item (`alpha-trade/aggTicker24`).
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlphaTicker24 {
    #[serde(default)]
    pub alpha_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "string_or_number_to_f64_default")]
    pub mul_point: f64,
}

/// The ticker endpoint answers with either one object or a list.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(v) => v,
            Self::One(v) => vec![v],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agg_trade_parses_string_numbers() {
        let json = r#"{"code":"000000","data":[{"a":1,"p":"0.0123","q":"250.5","T":1700000000000,"m":true}]}"#;
        let env: AlphaEnvelope<Vec<AlphaAggTrade>> = serde_json::from_str(json).unwrap();
        let trades = env.data.unwrap();
        assert_eq!(trades.len(), 1);
        assert!((trades[0].price - 0.0123).abs() < 1e-12);
        assert!((trades[0].qty - 250.5).abs() < 1e-12);
        assert_eq!(trades[0].time, 1_700_000_000_000);
        assert_eq!(trades[0].to_sample().trade_id, Some(1));
    }

    #[test]
    fn token_item_normalizes_case_and_nulls() {
        let json = r#"{"alphaId":"ALPHA_1","symbol":"koge","contractAddress":"0xABC","iconUrl":null,
            "listingTime":1700000000000,"mulPoint":4,"volume24h":"1234.5","liquidity":null,"offline":false}"#;
        let item: AlphaTokenItem = serde_json::from_str(json).unwrap();
        let token = TokenInfo::from(item);
        assert_eq!(token.symbol, "KOGE");
        assert_eq!(token.contract_address, "0xabc");
        assert_eq!(token.icon_url, "");
        assert!((token.multiplier - 4.0).abs() < f64::EPSILON);
        assert!((token.volume_24h - 1234.5).abs() < f64::EPSILON);
        assert_eq!(token.liquidity, 0.0);
    }

    #[test]
    fn ticker_accepts_object_or_list() {
        let one: OneOrMany<AlphaTicker24> =
            serde_json::from_str(r#"{"symbol":"ALPHA_1USDT","mulPoint":"4"}"#).unwrap();
        assert_eq!(one.into_vec().len(), 1);
        let many: OneOrMany<AlphaTicker24> =
            serde_json::from_str(r#"[{"alphaId":"ALPHA_1","mulPoint":2},{"alphaId":"ALPHA_2"}]"#)
                .unwrap();
        assert_eq!(many.into_vec().len(), 2);
    }
}
