use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tax_core::{Trade, TradeAction};

/// Row shape of the `trades` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub owner_id: i64,
    pub ticker: String,
    pub action: String, // "BUY" or "SELL"
    pub quantity: i64,
    pub price: f64,
    pub trade_date: NaiveDate,
    pub trade_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

impl TradeRow {
    /// Lift a stored row into the engine's strongly typed trade.
    ///
    /// The schema constrains `action` and `quantity`, so a failure here
    /// means the table was written around the store.
    pub fn into_trade(self) -> Result<Trade> {
        let action = TradeAction::parse(&self.action)
            .ok_or_else(|| anyhow!("trade {} has unknown action {:?}", self.id, self.action))?;
        let quantity = u32::try_from(self.quantity)
            .map_err(|_| anyhow!("trade {} has invalid quantity {}", self.id, self.quantity))?;

        Ok(Trade {
            id: self.id,
            owner_id: self.owner_id,
            ticker: self.ticker,
            action,
            quantity,
            price: self.price,
            trade_date: self.trade_date,
            trade_time: self.trade_time,
            notes: self.notes,
        })
    }
}

/// Fields accepted when creating or updating a trade, already validated
/// by the web layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub owner_id: i64,
    pub ticker: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub price: f64,
    pub trade_date: NaiveDate,
    pub trade_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// Optional narrowing of a report snapshot. Filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub ticker: Option<String>,
    /// Calendar month as "YYYY-MM".
    pub month: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
