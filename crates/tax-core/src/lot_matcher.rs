//! FIFO Lot Matcher
//!
//! Walks a chronological trade snapshot and produces one realized gain
//! record per SELL, consuming the oldest open buy lots of that ticker
//! first. The lot queues live only for the duration of the call.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::trade::{round2, sort_chronological, Trade, TradeAction};

/// An open purchase lot not yet fully consumed by later sells.
#[derive(Debug, Clone)]
struct BuyLot {
    quantity: u32,
    price: f64,
}

/// Realized gain or loss for a single SELL trade.
///
/// A sell spanning several buy lots still yields exactly one record;
/// `price_bought` is the quantity-weighted average of the consumed lots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealizedGain {
    pub ticker: String,
    /// Shares matched, always the full sell quantity on success.
    pub quantity: u32,
    /// Weighted-average cost basis per share, rounded to cents.
    pub price_bought: f64,
    pub price_sold: f64,
    /// Signed proceeds minus cost basis, rounded to cents.
    pub gain: f64,
    pub sell_date: NaiveDate,
    pub notes: Option<String>,
}

/// Match every SELL in the snapshot against prior BUY lots, FIFO per ticker.
///
/// Storage hands snapshots over sorted by `(trade_date, trade_time)`
/// already; the input is re-sorted on the same key anyway so a caller
/// with an unordered snapshot gets identical results. Matching state is
/// partitioned per ticker, and a failure aborts the whole run with no
/// partial output.
pub fn match_trades(trades: &[Trade]) -> Result<Vec<RealizedGain>, MatchError> {
    let mut snapshot = trades.to_vec();
    sort_chronological(&mut snapshot);

    let mut open_lots: HashMap<String, VecDeque<BuyLot>> = HashMap::new();
    let mut results = Vec::new();

    for trade in &snapshot {
        match trade.action {
            TradeAction::Buy => {
                open_lots.entry(trade.ticker.clone()).or_default().push_back(BuyLot {
                    quantity: trade.quantity,
                    price: trade.price,
                });
            }
            TradeAction::Sell => {
                let lots = open_lots.entry(trade.ticker.clone()).or_default();
                if lots.is_empty() {
                    return Err(MatchError::NoMatch {
                        ticker: trade.ticker.clone(),
                        date: trade.trade_date,
                    });
                }

                let mut remaining = trade.quantity;
                let mut matched_quantity = 0u32;
                let mut cost_basis = 0.0;

                while remaining > 0 && !lots.is_empty() {
                    let lot = &mut lots[0];
                    let consumed = remaining.min(lot.quantity);

                    cost_basis += consumed as f64 * lot.price;
                    matched_quantity += consumed;
                    remaining -= consumed;
                    lot.quantity -= consumed;

                    if lot.quantity == 0 {
                        lots.pop_front();
                    }
                }

                if remaining > 0 {
                    return Err(MatchError::InsufficientLots {
                        ticker: trade.ticker.clone(),
                        date: trade.trade_date,
                    });
                }

                let proceeds = matched_quantity as f64 * trade.price;
                results.push(RealizedGain {
                    ticker: trade.ticker.clone(),
                    quantity: matched_quantity,
                    price_bought: round2(cost_basis / matched_quantity as f64),
                    price_sold: trade.price,
                    gain: round2(proceeds - cost_basis),
                    sell_date: trade.trade_date,
                    notes: trade.notes.clone(),
                });
            }
        }
    }

    Ok(results)
}
