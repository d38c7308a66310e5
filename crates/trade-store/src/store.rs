use anyhow::Result;
use tax_core::{Trade, TradeAction};
use thiserror::Error;

use crate::db::TradeDb;
use crate::models::{TradeFilter, TradeInput, TradeRow};

/// Rejected write: the sell would push cumulative sold past cumulative
/// bought for that owner's ticker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot sell more than you have bought: {requested} requested, {available} available for {ticker}")]
pub struct OversellError {
    pub ticker: String,
    pub requested: i64,
    pub available: i64,
}

/// CRUD and snapshot reads over the `trades` table.
#[derive(Clone)]
pub struct TradeStore {
    db: TradeDb,
}

impl TradeStore {
    pub fn new(db: TradeDb) -> Self {
        Self { db }
    }

    /// Insert a trade. A SELL is checked against the aggregate
    /// buy-before-sell invariant first; updates and deletes bypass the
    /// check, which is why the matcher still defends at report time.
    pub async fn add_trade(&self, input: TradeInput) -> Result<i64> {
        if input.action == TradeAction::Sell {
            let (bought, sold) = self.quantity_totals(input.owner_id, &input.ticker).await?;
            let available = bought - sold;
            if i64::from(input.quantity) > available {
                return Err(OversellError {
                    ticker: input.ticker.clone(),
                    requested: i64::from(input.quantity),
                    available: available.max(0),
                }
                .into());
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO trades (owner_id, ticker, action, quantity, price, trade_date, trade_time, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(input.owner_id)
        .bind(&input.ticker)
        .bind(input.action.as_str())
        .bind(i64::from(input.quantity))
        .bind(input.price)
        .bind(input.trade_date)
        .bind(input.trade_time)
        .bind(&input.notes)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(ticker = %input.ticker, action = %input.action, "trade recorded");
        Ok(result.last_insert_rowid())
    }

    /// Get trade by ID
    pub async fn get_trade(&self, id: i64) -> Result<Option<TradeRow>> {
        let row = sqlx::query_as::<_, TradeRow>("SELECT * FROM trades WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row)
    }

    /// Update trade
    pub async fn update_trade(&self, id: i64, input: TradeInput) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE trades
            SET owner_id = ?, ticker = ?, action = ?, quantity = ?, price = ?, trade_date = ?, trade_time = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(input.owner_id)
        .bind(&input.ticker)
        .bind(input.action.as_str())
        .bind(i64::from(input.quantity))
        .bind(input.price)
        .bind(input.trade_date)
        .bind(input.trade_time)
        .bind(&input.notes)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Delete trade
    pub async fn delete_trade(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM trades WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// All of an owner's trades, newest first, for display.
    pub async fn list_trades(&self, owner_id: i64) -> Result<Vec<TradeRow>> {
        let rows = sqlx::query_as::<_, TradeRow>(
            "SELECT * FROM trades WHERE owner_id = ? ORDER BY trade_date DESC, trade_time DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// One owner's filtered snapshot, ordered ascending by
    /// `(trade_date, trade_time)` — the feed for both tax engines.
    /// Null times sort first, matching the engine's tie-break.
    pub async fn fetch_trades(&self, owner_id: i64, filter: &TradeFilter) -> Result<Vec<Trade>> {
        let mut sql = String::from("SELECT * FROM trades WHERE owner_id = ?");
        if filter.ticker.is_some() {
            sql.push_str(" AND ticker = ?");
        }
        if filter.month.is_some() {
            sql.push_str(" AND strftime('%Y-%m', trade_date) = ?");
        }
        if filter.start_date.is_some() {
            sql.push_str(" AND trade_date >= ?");
        }
        if filter.end_date.is_some() {
            sql.push_str(" AND trade_date <= ?");
        }
        sql.push_str(" ORDER BY trade_date ASC, trade_time ASC, id ASC");

        let mut query = sqlx::query_as::<_, TradeRow>(&sql).bind(owner_id);
        if let Some(ticker) = &filter.ticker {
            query = query.bind(ticker);
        }
        if let Some(month) = &filter.month {
            query = query.bind(month);
        }
        if let Some(start) = filter.start_date {
            query = query.bind(start);
        }
        if let Some(end) = filter.end_date {
            query = query.bind(end);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.into_iter().map(TradeRow::into_trade).collect()
    }

    /// Cumulative (bought, sold) share counts for one owner's ticker.
    async fn quantity_totals(&self, owner_id: i64, ticker: &str) -> Result<(i64, i64)> {
        let bought: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity) FROM trades WHERE owner_id = ? AND ticker = ? AND action = 'BUY'",
        )
        .bind(owner_id)
        .bind(ticker)
        .fetch_one(self.db.pool())
        .await?;

        let sold: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(quantity) FROM trades WHERE owner_id = ? AND ticker = ? AND action = 'SELL'",
        )
        .bind(owner_id)
        .bind(ticker)
        .fetch_one(self.db.pool())
        .await?;

        Ok((bought.unwrap_or(0), sold.unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    async fn setup_store() -> TradeStore {
        let db = TradeDb::new("sqlite::memory:").await.unwrap();
        TradeStore::new(db)
    }

    fn input(ticker: &str, action: TradeAction, quantity: u32, price: f64, day: &str) -> TradeInput {
        TradeInput {
            owner_id: 1,
            ticker: ticker.to_string(),
            action,
            quantity,
            price,
            trade_date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            trade_time: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_get_trade() {
        let store = setup_store().await;

        let id = store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 150.0, "2024-01-01"))
            .await
            .unwrap();
        assert!(id > 0);

        let row = store.get_trade(id).await.unwrap().unwrap();
        assert_eq!(row.ticker, "AAPL");
        assert_eq!(row.action, "BUY");
        assert_eq!(row.quantity, 10);
    }

    #[tokio::test]
    async fn test_oversell_is_rejected() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 5, 10.0, "2024-01-01"))
            .await
            .unwrap();

        let err = store
            .add_trade(input("AAPL", TradeAction::Sell, 10, 12.0, "2024-01-02"))
            .await
            .unwrap_err();

        let oversell = err.downcast_ref::<OversellError>().unwrap();
        assert_eq!(oversell.requested, 10);
        assert_eq!(oversell.available, 5);
    }

    #[tokio::test]
    async fn test_selling_exactly_the_position_is_allowed() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 5, 10.0, "2024-01-01"))
            .await
            .unwrap();
        store
            .add_trade(input("AAPL", TradeAction::Sell, 5, 12.0, "2024-01-02"))
            .await
            .unwrap();

        // Position is now flat; any further sell is an oversell.
        let err = store
            .add_trade(input("AAPL", TradeAction::Sell, 1, 12.0, "2024-01-03"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<OversellError>().is_some());
    }

    #[tokio::test]
    async fn test_oversell_check_is_per_ticker() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 10.0, "2024-01-01"))
            .await
            .unwrap();

        let err = store
            .add_trade(input("MSFT", TradeAction::Sell, 1, 300.0, "2024-01-02"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<OversellError>().is_some());
    }

    #[tokio::test]
    async fn test_fetch_returns_chronological_snapshot() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 12.0, "2024-03-01"))
            .await
            .unwrap();
        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 10.0, "2024-01-01"))
            .await
            .unwrap();

        let trades = store.fetch_trades(1, &TradeFilter::default()).await.unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].trade_date.to_string(), "2024-01-01");
        assert_eq!(trades[1].trade_date.to_string(), "2024-03-01");
    }

    #[tokio::test]
    async fn test_fetch_orders_same_day_by_time() {
        let store = setup_store().await;

        let mut late = input("AAPL", TradeAction::Buy, 10, 10.0, "2024-01-01");
        late.trade_time = Some(NaiveTime::from_hms_opt(15, 45, 0).unwrap());
        let mut early = input("AAPL", TradeAction::Buy, 5, 11.0, "2024-01-01");
        early.trade_time = Some(NaiveTime::from_hms_opt(9, 30, 0).unwrap());

        store.add_trade(late).await.unwrap();
        store.add_trade(early).await.unwrap();

        let trades = store.fetch_trades(1, &TradeFilter::default()).await.unwrap();
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[1].quantity, 10);
    }

    #[tokio::test]
    async fn test_fetch_filters_by_ticker_and_dates() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 10.0, "2024-01-15"))
            .await
            .unwrap();
        store
            .add_trade(input("MSFT", TradeAction::Buy, 5, 300.0, "2024-02-10"))
            .await
            .unwrap();
        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 12.0, "2024-03-20"))
            .await
            .unwrap();

        let by_ticker = TradeFilter { ticker: Some("AAPL".to_string()), ..Default::default() };
        assert_eq!(store.fetch_trades(1, &by_ticker).await.unwrap().len(), 2);

        let by_month = TradeFilter { month: Some("2024-02".to_string()), ..Default::default() };
        let trades = store.fetch_trades(1, &by_month).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].ticker, "MSFT");

        let by_range = TradeFilter {
            start_date: Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            ..Default::default()
        };
        assert_eq!(store.fetch_trades(1, &by_range).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trades_are_scoped_by_owner() {
        let store = setup_store().await;

        store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 10.0, "2024-01-01"))
            .await
            .unwrap();
        let mut other = input("AAPL", TradeAction::Buy, 99, 10.0, "2024-01-01");
        other.owner_id = 2;
        store.add_trade(other).await.unwrap();

        let trades = store.fetch_trades(1, &TradeFilter::default()).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 10);

        // An owner with no buys cannot sell against someone else's lots.
        let mut sell = input("AAPL", TradeAction::Sell, 1, 12.0, "2024-01-02");
        sell.owner_id = 3;
        let err = store.add_trade(sell).await.unwrap_err();
        assert!(err.downcast_ref::<OversellError>().is_some());
    }

    #[tokio::test]
    async fn test_update_and_delete_trade() {
        let store = setup_store().await;

        let id = store
            .add_trade(input("AAPL", TradeAction::Buy, 10, 150.0, "2024-01-01"))
            .await
            .unwrap();

        let mut changed = input("AAPL", TradeAction::Buy, 12, 149.5, "2024-01-01");
        changed.notes = Some("fixed fill size".to_string());
        store.update_trade(id, changed).await.unwrap();

        let row = store.get_trade(id).await.unwrap().unwrap();
        assert_eq!(row.quantity, 12);
        assert_eq!(row.notes.as_deref(), Some("fixed fill size"));

        store.delete_trade(id).await.unwrap();
        assert!(store.get_trade(id).await.unwrap().is_none());
    }
}
