//! Tax Reporting Core
//!
//! FIFO tax-lot matching and wash sale detection over an owner's trade
//! history. Both engines are pure functions of an in-memory snapshot:
//! they hold no state across calls and never touch I/O.

pub mod error;
pub mod lot_matcher;
pub mod trade;
pub mod wash_sale;

pub use error::MatchError;
pub use lot_matcher::{match_trades, RealizedGain};
pub use trade::{sort_chronological, sort_by_ticker_then_date, Trade, TradeAction};
pub use wash_sale::{detect_wash_sales, WashSaleDisallowance, WASH_SALE_WINDOW_DAYS};
