use std::io::Read;
use std::str::FromStr;

use gas_storage_core::day_count::parse_date_with_format;
use gas_storage_core::forecasting::PriceObservation;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::input::file::resolve_path;

/// Month/day/two-digit-year, as in the Dates column of exported price sheets.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%y";

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(alias = "Dates", alias = "Date", alias = "date")]
    dates: String,
    #[serde(alias = "Prices", alias = "Price", alias = "price")]
    prices: String,
}

/// Load a `Dates,Prices` CSV file into price observations.
pub fn read_history_csv(
    path: &str,
    date_format: &str,
) -> Result<Vec<PriceObservation>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let observations = parse_history(file, date_format)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    debug!(path = %canonical.display(), rows = observations.len(), "loaded price history");
    Ok(observations)
}

/// Parse history rows from any CSV reader.
pub fn parse_history<R: Read>(
    reader: R,
    date_format: &str,
) -> Result<Vec<PriceObservation>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut observations = Vec::new();

    for (i, row) in rdr.deserialize::<HistoryRow>().enumerate() {
        let row = row?;
        let line = i + 2;
        let date = parse_date_with_format(&row.dates, date_format)
            .map_err(|e| format!("row {line}: {e}"))?;
        let price = parse_price(&row.prices).map_err(|e| format!("row {line}: {e}"))?;
        observations.push(PriceObservation { date, price });
    }

    Ok(observations)
}

/// Plain decimals and spreadsheet scientific notation (`1.01E+01`).
fn parse_price(value: &str) -> Result<Decimal, String> {
    let parsed = if value.contains(['e', 'E']) {
        Decimal::from_scientific(value)
    } else {
        Decimal::from_str(value)
    };
    parsed.map_err(|e| format!("invalid price '{value}': {e}"))
}
