//! Trade Store
//!
//! Sqlite-backed persistence for trade history. Hands the tax engines
//! one consistent, chronologically ordered snapshot per report request.

pub mod db;
pub mod models;
pub mod store;

pub use db::TradeDb;
pub use models::{TradeFilter, TradeInput, TradeRow};
pub use store::{OversellError, TradeStore};
