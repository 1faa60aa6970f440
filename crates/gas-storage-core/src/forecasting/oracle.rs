use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::day_count::parse_date;
use crate::error::GasStorageError;
use crate::forecasting::history::PriceObservation;
use crate::types::Price;
use crate::GasStorageResult;

/// A point price estimate for any calendar date, past or future.
///
/// The valuation pass only ever reads from an oracle, so implementations
/// must be safe to share across threads once built.
pub trait PriceOracle: Send + Sync {
    /// Unit price of the commodity on `date`.
    fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price>;

    /// Parse a `YYYY-MM-DD` string and estimate the price on that date.
    fn estimate_str(&self, date: &str) -> GasStorageResult<Price> {
        self.estimate(parse_date(date)?)
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for &T {
    fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price> {
        (**self).estimate(date)
    }
}

impl<T: PriceOracle + ?Sized> PriceOracle for Box<T> {
    fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price> {
        (**self).estimate(date)
    }
}

/// Exact-date price lookup.
///
/// Holds caller-supplied prices (forward quotes, scenario prices) and fails
/// for any date it was not given. No interpolation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSchedule {
    prices: BTreeMap<NaiveDate, Price>,
}

impl PriceSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from observations; a later observation for the same date wins.
    pub fn from_observations(observations: &[PriceObservation]) -> Self {
        let prices = observations.iter().map(|o| (o.date, o.price)).collect();
        Self { prices }
    }

    pub fn with_price(mut self, date: NaiveDate, price: Price) -> Self {
        self.prices.insert(date, price);
        self
    }

    pub fn insert(&mut self, date: NaiveDate, price: Price) -> Option<Price> {
        self.prices.insert(date, price)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceOracle for PriceSchedule {
    fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price> {
        self.prices.get(&date).copied().ok_or_else(|| {
            GasStorageError::InsufficientData(format!("No scheduled price for {date}"))
        })
    }
}
