use std::cmp::Ordering;

use futures_util::future::join_all;

use crate::alpha::AlphaFeed;
use crate::cache::TtlCache;
use crate::config::RankerConfig;
use crate::model::reading::Reading;
use crate::model::token::TokenInfo;
use crate::stability::index_range_pct;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStability {
    pub token: TokenInfo,
    /// `f64::INFINITY` when the candidate's trades could not be fetched or evaluated.
    pub range_pct: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
}

impl CandidateStability {
    pub fn unstable(token: TokenInfo) -> Self {
        Self {
            token,
            range_pct: f64::INFINITY,
            volume_24h: 0.0,
            liquidity: 0.0,
        }
    }
}

/// Listed enhanced-tier tokens, whatever is on screen.
pub fn enhanced_tier(tokens: &[TokenInfo], enhanced_multiplier: f64) -> Vec<TokenInfo> {
    tokens
        .iter()
        .filter(|t| t.multiplier == enhanced_multiplier)
        .filter(|t| !t.offline)
        .cloned()
        .collect()
}

/// Enhanced-tier tokens other than the one on screen that are still listed.
pub fn eligible_candidates(
    tokens: &[TokenInfo],
    current_alpha_id: Option<&str>,
    enhanced_multiplier: f64,
) -> Vec<TokenInfo> {
    enhanced_tier(tokens, enhanced_multiplier)
        .into_iter()
        .filter(|t| Some(t.alpha_id.as_str()) != current_alpha_id)
        .collect()
}

/// Higher 24h volume first, then tighter range, then deeper liquidity.
fn preference(a: &CandidateStability, b: &CandidateStability) -> Ordering {
    b.volume_24h
        .total_cmp(&a.volume_24h)
        .then_with(|| a.range_pct.total_cmp(&b.range_pct))
        .then_with(|| b.liquidity.total_cmp(&a.liquidity))
}

/// Pick the preferred candidate whose range is within tolerance; earlier entries win full ties.
pub fn select_most_stable(
    candidates: Vec<CandidateStability>,
    tolerance_pct: f64,
) -> Option<CandidateStability> {
    let mut best: Option<CandidateStability> = None;
    for candidate in candidates {
        if !candidate.range_pct.is_finite() || candidate.range_pct > tolerance_pct {
            continue;
        }
        let replace = match &best {
            None => true,
            Some(current) => preference(&candidate, current) == Ordering::Less,
        };
        if replace {
            best = Some(candidate);
        }
    }
    best
}

/// Recommends the most stable alternative instrument in the enhanced tier.
pub struct StableTokenRanker {
    cfg: RankerConfig,
    candidates: TtlCache<Vec<TokenInfo>>,
}

impl StableTokenRanker {
    pub fn new(cfg: RankerConfig) -> Self {
        let ttl = cfg.cache_ttl_ms;
        Self {
            cfg,
            candidates: TtlCache::new(ttl),
        }
    }

    /// Forget cached candidates, e.g. after the page navigated to another instrument.
    pub fn invalidate(&mut self) {
        self.candidates.invalidate();
    }

    /// Enhanced tier from cache or feed; the cached list never depends on the instrument on screen.
    async fn enhanced_list<F: AlphaFeed>(&mut self, feed: &F, now_ms: u64) -> Option<Vec<TokenInfo>> {
        if let Some(cached) = self.candidates.get(now_ms) {
            return Some(cached.clone());
        }
        match feed.token_list().await {
            Ok(tokens) => {
                let tier = enhanced_tier(&tokens, self.cfg.enhanced_multiplier);
                self.candidates.put(tier.clone(), now_ms);
                Some(tier)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch stable-token candidates");
                None
            }
        }
    }

    async fn evaluate_candidate<F: AlphaFeed>(&self, feed: &F, token: TokenInfo) -> CandidateStability {
        match feed
            .recent_trades(&token.alpha_id, self.cfg.sample_size)
            .await
        {
            Ok(trades) => match index_range_pct(&trades, self.cfg.min_trades) {
                Some(range_pct) => CandidateStability {
                    volume_24h: token.volume_24h,
                    liquidity: token.liquidity,
                    range_pct,
                    token,
                },
                None => CandidateStability::unstable(token),
            },
            Err(e) => {
                tracing::debug!(alpha_id = %token.alpha_id, error = %e, "Candidate trade fetch failed");
                CandidateStability::unstable(token)
            }
        }
    }

    pub async fn rank<F: AlphaFeed>(
        &mut self,
        feed: &F,
        current_alpha_id: Option<&str>,
        tolerance_pct: f64,
        now_ms: u64,
    ) -> Reading<CandidateStability> {
        let Some(tier) = self.enhanced_list(feed, now_ms).await else {
            return Reading::Unavailable;
        };
        let candidates = eligible_candidates(&tier, current_alpha_id, self.cfg.enhanced_multiplier);
        if candidates.is_empty() {
            return Reading::Insufficient;
        }

        let this = &*self;
        let evaluated = join_all(
            candidates
                .into_iter()
                .map(|token| this.evaluate_candidate(feed, token)),
        )
        .await;

        match select_most_stable(evaluated, tolerance_pct) {
            Some(winner) => {
                tracing::debug!(
                    symbol = %winner.token.symbol,
                    range_pct = winner.range_pct,
                    "Selected most stable candidate"
                );
                Reading::Value(winner)
            }
            None => Reading::Insufficient,
        }
    }
}
