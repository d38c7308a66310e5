use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised while matching sells against prior buy lots.
///
/// Either variant means the history violates the cumulative
/// buy-before-sell invariant, so the whole matching run is aborted:
/// skipping the offending sell would leave downstream gain totals
/// silently wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A SELL with zero prior BUY lots for its ticker.
    #[error("No matching buy trades found for {ticker} on {date}")]
    NoMatch { ticker: String, date: NaiveDate },

    /// A SELL whose quantity exceeds the remaining prior BUY lots.
    #[error("Not enough shares to sell for {ticker} on {date}")]
    InsufficientLots { ticker: String, date: NaiveDate },
}
