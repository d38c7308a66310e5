//! Report Export
//!
//! Serializes a computed tax report as the two-section CSV download:
//! realized gains first, wash sale disallowances after a blank line.
//! Money fields are fixed at two decimals; gain keeps its sign.

use anyhow::Result;
use tax_core::{RealizedGain, WashSaleDisallowance};

const GAINS_HEADER: [&str; 7] =
    ["Date", "Ticker", "Quantity", "Price Bought", "Price Sold", "Gain", "Notes"];
const WASH_SALES_HEADER: [&str; 4] = ["Sell Date", "Ticker", "Disallowed Loss", "Matched Buy Date"];

/// Render the full report CSV.
pub fn render_report_csv(
    gains: &[RealizedGain],
    wash_sales: &[WashSaleDisallowance],
) -> Result<String> {
    let gains_section = render_gains(gains)?;
    let wash_section = render_wash_sales(wash_sales)?;

    Ok(format!("{}\n{}", gains_section, wash_section))
}

fn render_gains(gains: &[RealizedGain]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(GAINS_HEADER)?;

    for gain in gains {
        writer.write_record(&[
            gain.sell_date.to_string(),
            gain.ticker.clone(),
            gain.quantity.to_string(),
            format!("{:.2}", gain.price_bought),
            format!("{:.2}", gain.price_sold),
            format!("{:.2}", gain.gain),
            gain.notes.clone().unwrap_or_default(),
        ])?;
    }

    into_string(writer)
}

fn render_wash_sales(wash_sales: &[WashSaleDisallowance]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(WASH_SALES_HEADER)?;

    for sale in wash_sales {
        writer.write_record(&[
            sale.sell_date.to_string(),
            sale.ticker.clone(),
            format!("{:.2}", sale.disallowed_loss),
            sale.matched_buy_date.to_string(),
        ])?;
    }

    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("finalize csv writer: {}", err))?;
    Ok(String::from_utf8(bytes)?)
}
