use std::collections::HashMap;

/// Instrument metadata from the alpha token list.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub alpha_id: String,
    /// Upper-cased.
    pub symbol: String,
    /// Lower-cased.
    pub contract_address: String,
    pub icon_url: String,
    pub listing_time_ms: u64,
    pub multiplier: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub offline: bool,
}

/// Trading pair symbol on the tick feed.
pub fn pair_symbol(alpha_id: &str) -> String {
    format!("{}USDT", alpha_id)
}

/// Token list indexed by contract address.
#[derive(Debug, Clone, Default)]
pub struct TokenMap {
    tokens: Vec<TokenInfo>,
    by_address: HashMap<String, usize>,
}

impl TokenMap {
    pub fn from_tokens(tokens: Vec<TokenInfo>) -> Self {
        let mut map = Self::default();
        for token in tokens {
            if token.alpha_id.is_empty() {
                continue;
            }
            let idx = map.tokens.len();
            if !token.contract_address.is_empty() {
                map.by_address.insert(token.contract_address.clone(), idx);
            }
            map.tokens.push(token);
        }
        map
    }

    pub fn by_address(&self, contract: &str) -> Option<&TokenInfo> {
        self.by_address
            .get(&contract.to_ascii_lowercase())
            .and_then(|&idx| self.tokens.get(idx))
    }
}
