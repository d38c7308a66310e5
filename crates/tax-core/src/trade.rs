//! Trade records and the orderings the engines rely on.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Direction of a trade. The engines accept no other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Parse the storage/API representation ("BUY" / "SELL").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable transaction in an owner's trade history.
///
/// The snapshot handed to the engines is already scoped to a single
/// owner; `owner_id` is carried for reporting, never used for matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub owner_id: i64,
    /// Normalized uppercase symbol.
    pub ticker: String,
    pub action: TradeAction,
    pub quantity: u32,
    /// Price per share at execution.
    pub price: f64,
    pub trade_date: NaiveDate,
    /// Breaks same-date ordering ties; absent sorts earliest.
    pub trade_time: Option<NaiveTime>,
    /// Free-text annotation, carried through to reports.
    pub notes: Option<String>,
}

impl Trade {
    fn execution_key(&self) -> (NaiveDate, NaiveTime) {
        (self.trade_date, self.trade_time.unwrap_or(NaiveTime::MIN))
    }
}

/// Sort a snapshot ascending by `(trade_date, trade_time)`.
///
/// Stable, so trades sharing an execution key keep their input order.
pub fn sort_chronological(trades: &mut [Trade]) {
    trades.sort_by_key(Trade::execution_key);
}

/// Sort a snapshot ascending by `(ticker, trade_date)`, the traversal
/// order of the wash sale scan.
pub fn sort_by_ticker_then_date(trades: &mut [Trade]) {
    trades.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.trade_date.cmp(&b.trade_date)));
}

/// Round a money amount to cents.
pub(crate) fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_on(ticker: &str, date: &str, time: Option<&str>) -> Trade {
        Trade {
            id: 0,
            owner_id: 1,
            ticker: ticker.to_string(),
            action: TradeAction::Buy,
            quantity: 1,
            price: 1.0,
            trade_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            trade_time: time.map(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").unwrap()),
            notes: None,
        }
    }

    #[test]
    fn test_action_parse_round_trip() {
        assert_eq!(TradeAction::parse("BUY"), Some(TradeAction::Buy));
        assert_eq!(TradeAction::parse("SELL"), Some(TradeAction::Sell));
        assert_eq!(TradeAction::parse("HOLD"), None);
        assert_eq!(TradeAction::Sell.as_str(), "SELL");
    }

    #[test]
    fn test_sort_chronological_orders_by_date_then_time() {
        let mut trades = vec![
            trade_on("AAPL", "2024-03-01", Some("15:30:00")),
            trade_on("AAPL", "2024-01-05", None),
            trade_on("AAPL", "2024-03-01", Some("09:30:00")),
        ];

        sort_chronological(&mut trades);

        let dates: Vec<_> = trades.iter().map(|t| t.trade_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-03-01", "2024-03-01"]);
        assert_eq!(trades[1].trade_time.unwrap().to_string(), "09:30:00");
    }

    #[test]
    fn test_missing_time_sorts_earliest() {
        let mut trades = vec![
            trade_on("AAPL", "2024-03-01", Some("00:00:01")),
            trade_on("AAPL", "2024-03-01", None),
        ];

        sort_chronological(&mut trades);

        assert!(trades[0].trade_time.is_none());
    }

    #[test]
    fn test_sort_by_ticker_groups_symbols() {
        let mut trades = vec![
            trade_on("MSFT", "2024-01-01", None),
            trade_on("AAPL", "2024-02-01", None),
            trade_on("AAPL", "2024-01-01", None),
        ];

        sort_by_ticker_then_date(&mut trades);

        let keys: Vec<_> = trades
            .iter()
            .map(|t| (t.ticker.clone(), t.trade_date.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("AAPL".to_string(), "2024-01-01".to_string()),
                ("AAPL".to_string(), "2024-02-01".to_string()),
                ("MSFT".to_string(), "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(13.754999), 13.75);
        assert_eq!(round2(10.666), 10.67);
        assert_eq!(round2(-14.0049), -14.0);
        assert_eq!(round2(50.0), 50.0);
    }
}
