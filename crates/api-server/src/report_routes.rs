//! Tax Report Routes
//!
//! One consistent snapshot is fetched per request and handed to both
//! engines independently; a matching failure aborts the whole report.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tax_core::{detect_wash_sales, match_trades, RealizedGain, WashSaleDisallowance};
use trade_store::TradeFilter;

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub owner_id: i64,
    pub ticker: Option<String>,
    /// Calendar month as "YYYY-MM".
    pub month: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub gains: Vec<RealizedGain>,
    pub wash_sales: Vec<WashSaleDisallowance>,
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/report", get(get_report))
        .route("/api/report/export", get(export_report))
}

/// Realized gains and wash sale disallowances as JSON.
async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<ReportResponse>>, AppError> {
    let report = build_report(&state, &query).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// The same report as a CSV attachment.
async fn export_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = build_report(&state, &query).await?;
    let csv = report_export::render_report_csv(&report.gains, &report.wash_sales)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=report.csv"),
        ],
        csv,
    )
        .into_response())
}

async fn build_report(state: &AppState, query: &ReportQuery) -> Result<ReportResponse, AppError> {
    let filter = parse_filter(query)?;
    let trades = state.store.fetch_trades(query.owner_id, &filter).await?;

    let gains = match_trades(&trades).map_err(|err| AppError::unprocessable(err.to_string()))?;
    let wash_sales = detect_wash_sales(&trades);

    tracing::info!(
        owner_id = query.owner_id,
        trades = trades.len(),
        gains = gains.len(),
        wash_sales = wash_sales.len(),
        "report computed"
    );

    Ok(ReportResponse { gains, wash_sales })
}

fn parse_filter(query: &ReportQuery) -> Result<TradeFilter, AppError> {
    let month = match query.month.as_deref() {
        Some(raw) => {
            // Accept only a real calendar month.
            NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
                .map_err(|_| AppError::bad_request("Invalid month format. Use YYYY-MM."))?;
            Some(raw.to_string())
        }
        None => None,
    };

    Ok(TradeFilter {
        ticker: query.ticker.as_ref().map(|t| t.trim().to_uppercase()),
        month,
        start_date: parse_date_param(query.start_date.as_deref(), "start_date")?,
        end_date: parse_date_param(query.end_date.as_deref(), "end_date")?,
    })
}

fn parse_date_param(raw: Option<&str>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("Invalid {name}. Use YYYY-MM-DD."))),
        None => Ok(None),
    }
}
