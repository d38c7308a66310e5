//! Wash Sale Detector
//!
//! Flags loss-making sells with a replacement purchase of the same
//! ticker inside the 61-day window around the sale. Runs over the raw
//! snapshot independently of the lot matcher and never fails.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::trade::{round2, sort_by_ticker_then_date, Trade, TradeAction};

/// Days on either side of a loss sale in which a repurchase disallows it.
pub const WASH_SALE_WINDOW_DAYS: i64 = 30;

/// A loss disallowed because a replacement buy fell inside the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashSaleDisallowance {
    pub sell_date: NaiveDate,
    pub ticker: String,
    /// Positive magnitude, rounded to cents.
    pub disallowed_loss: f64,
    /// The first in-window buy, in `(ticker, date)` scan order.
    pub matched_buy_date: NaiveDate,
}

/// Scan a snapshot for wash sales.
///
/// The loss for a sell is measured against the price of the most recent
/// buy before it in `(ticker, trade_date)` order — not the FIFO-matched
/// basis. The two engines are intentionally independent; this is a
/// trade-level approximation of the per-lot IRS rule.
pub fn detect_wash_sales(trades: &[Trade]) -> Vec<WashSaleDisallowance> {
    let mut snapshot = trades.to_vec();
    sort_by_ticker_then_date(&mut snapshot);

    let mut flagged = Vec::new();

    for (i, trade) in snapshot.iter().enumerate() {
        if trade.action != TradeAction::Sell {
            continue;
        }

        // A sell with no prior purchase cannot realize a relevant loss.
        let Some(cost_basis) = snapshot[..i]
            .iter()
            .filter(|t| t.action == TradeAction::Buy && t.ticker == trade.ticker)
            .last()
            .map(|t| t.price)
        else {
            continue;
        };

        let realized = (trade.price - cost_basis) * trade.quantity as f64;
        if realized >= 0.0 {
            continue;
        }

        let window_start = trade.trade_date - Duration::days(WASH_SALE_WINDOW_DAYS);
        let window_end = trade.trade_date + Duration::days(WASH_SALE_WINDOW_DAYS);

        // Replacement buys after the sell count too; first match wins.
        let replacement = snapshot.iter().find(|t| {
            t.action == TradeAction::Buy
                && t.ticker == trade.ticker
                && t.trade_date >= window_start
                && t.trade_date <= window_end
        });

        if let Some(buy) = replacement {
            flagged.push(WashSaleDisallowance {
                sell_date: trade.trade_date,
                ticker: trade.ticker.clone(),
                disallowed_loss: round2(realized.abs()),
                matched_buy_date: buy.trade_date,
            });
        }
    }

    flagged
}
