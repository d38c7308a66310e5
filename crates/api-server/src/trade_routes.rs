//! Trade CRUD Routes
//!
//! Field-level validation of raw user input happens here, before
//! anything reaches storage; the tax engines downstream can then trust
//! well-formed trades.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tax_core::TradeAction;
use trade_store::{OversellError, TradeInput, TradeRow};

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub owner_id: i64,
}

/// Raw user-submitted trade fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeForm {
    pub owner_id: i64,
    pub ticker: String,
    pub action: String,
    pub quantity: i64,
    pub price: f64,
    pub trade_date: String,
    pub trade_time: Option<String>,
    pub notes: Option<String>,
}

pub fn trade_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trades", get(list_trades).post(create_trade))
        .route("/api/trades/:id", put(update_trade).delete(delete_trade))
}

/// List an owner's trades, newest first.
async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<TradeRow>>>, AppError> {
    let trades = state.store.list_trades(query.owner_id).await?;
    Ok(Json(ApiResponse::success(trades)))
}

/// Validate and insert a new trade.
async fn create_trade(
    State(state): State<AppState>,
    Json(form): Json<TradeForm>,
) -> Result<Json<ApiResponse<i64>>, AppError> {
    let input = validate_form(&form)?;

    if !state.symbols.symbol_exists(&input.ticker).await? {
        return Err(AppError::bad_request(format!("Invalid stock symbol: {}", input.ticker)));
    }

    let id = state.store.add_trade(input).await.map_err(map_store_error)?;
    Ok(Json(ApiResponse::success(id)))
}

/// Replace an existing trade's fields.
///
/// The symbol lookup is skipped here — the ticker passed validation
/// when the trade was created, and edits are typically corrections to
/// quantity or price.
async fn update_trade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<TradeForm>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let input = validate_form(&form)?;

    if state.store.get_trade(id).await?.is_none() {
        return Err(AppError::not_found(format!("Trade {} not found", id)));
    }

    state.store.update_trade(id, input).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_trade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if state.store.get_trade(id).await?.is_none() {
        return Err(AppError::not_found(format!("Trade {} not found", id)));
    }

    state.store.delete_trade(id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Check every raw field and produce a typed input for storage.
fn validate_form(form: &TradeForm) -> Result<TradeInput, AppError> {
    let trade_date = NaiveDate::parse_from_str(&form.trade_date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD."))?;
    if trade_date > Utc::now().date_naive() {
        return Err(AppError::bad_request("Trade date cannot be in the future."));
    }

    let trade_time = match form.trade_time.as_deref() {
        Some(raw) => Some(
            NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .map_err(|_| AppError::bad_request("Invalid time format. Use HH:MM:SS."))?,
        ),
        None => None,
    };

    let ticker = form.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::bad_request("Ticker is required."));
    }

    let action = TradeAction::parse(&form.action.to_uppercase())
        .ok_or_else(|| AppError::bad_request("Action must be either BUY or SELL."))?;

    if form.quantity <= 0 || u32::try_from(form.quantity).is_err() {
        return Err(AppError::bad_request("Quantity must be a positive integer."));
    }

    if !form.price.is_finite() || form.price <= 0.0 {
        return Err(AppError::bad_request("Price must be a positive number."));
    }

    Ok(TradeInput {
        owner_id: form.owner_id,
        ticker,
        action,
        quantity: form.quantity as u32,
        price: form.price,
        trade_date,
        trade_time,
        notes: form.notes.clone(),
    })
}

/// An oversell is the user's mistake, not a server fault.
fn map_store_error(err: anyhow::Error) -> AppError {
    if err.downcast_ref::<OversellError>().is_some() {
        AppError::bad_request(err.to_string())
    } else {
        AppError::from(err)
    }
}
