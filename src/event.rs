use crate::model::reading::Reading;
use crate::model::sample::Sample;
use crate::model::token::TokenInfo;
use crate::ranker::CandidateStability;

/// Everything the poll loops hand to the engine task.
///
/// Loops only fetch and probe; the engine is the single writer of all derived state.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The page now shows this instrument, or one the token list does not know.
    InstrumentResolved(Option<TokenInfo>),
    TicksFetched {
        alpha_id: String,
        ticks: Reading<Vec<Sample>>,
        now_ms: u64,
    },
    MultiplierFetched {
        alpha_id: String,
        multiplier: Reading<f64>,
    },
    BalanceObserved {
        balance: f64,
        now_ms: u64,
    },
    AmountObserved {
        amount: f64,
        now_ms: u64,
    },
    StableTokenRanked(Reading<CandidateStability>),
    ClearData,
    SetTolerance(f64),
}
