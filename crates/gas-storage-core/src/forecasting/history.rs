use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GasStorageError;
use crate::types::Price;
use crate::GasStorageResult;

/// A single dated price point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: Price,
}

/// Historical price series, sorted ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    observations: Vec<PriceObservation>,
}

impl PriceHistory {
    /// Build a history from observations in any order.
    ///
    /// Observations are sorted by date. Duplicate dates are rejected rather
    /// than averaged.
    pub fn new(mut observations: Vec<PriceObservation>) -> GasStorageResult<Self> {
        if observations.is_empty() {
            return Err(GasStorageError::InsufficientData(
                "Price history requires at least one observation".into(),
            ));
        }

        observations.sort_by_key(|o| o.date);

        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(GasStorageError::InvalidInput {
                field: "history.date".into(),
                reason: format!("Duplicate observation date {}", pair[0].date),
            });
        }

        Ok(Self { observations })
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Earliest observation date.
    pub fn first_date(&self) -> NaiveDate {
        self.observations[0].date
    }

    /// Latest observation date.
    pub fn last_date(&self) -> NaiveDate {
        self.observations[self.observations.len() - 1].date
    }
}

impl<'de> Deserialize<'de> for PriceHistory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let observations = Vec::<PriceObservation>::deserialize(deserializer)?;
        PriceHistory::new(observations).map_err(serde::de::Error::custom)
    }
}
