use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::GasStorageError;
use crate::types::Years;
use crate::GasStorageResult;

/// Average days in a Julian year.
pub const DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Average days per month (365.25 / 12 = 30.4375).
pub const AVG_DAYS_PER_MONTH: Decimal = dec!(30.4375);

/// ISO calendar date format used for events and estimates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> GasStorageResult<NaiveDate> {
    parse_date_with_format(value, ISO_DATE_FORMAT)
}

/// Parse a date with an explicit chrono format string (e.g. `%m/%d/%y`).
pub fn parse_date_with_format(value: &str, format: &str) -> GasStorageResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), format)
        .map_err(|e| GasStorageError::InvalidDate(format!("'{value}' does not match {format}: {e}")))
}

/// Signed whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Fractional months between two dates on the 365.25/12 convention.
///
/// No calendar-month truncation: 183 days is 6.0123... months.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> Decimal {
    Decimal::from(days_between(from, to)) / AVG_DAYS_PER_MONTH
}

/// Fractional years between two dates on the 365.25 convention.
pub fn years_between(from: NaiveDate, to: NaiveDate) -> Years {
    Decimal::from(days_between(from, to)) / DAYS_PER_YEAR
}
