use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GasStorageError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Capacity exceeded on {date}: injection of {volume} with {inventory} in storage exceeds max storage of {max_storage}"
    )]
    CapacityExceeded {
        date: NaiveDate,
        volume: Decimal,
        inventory: Decimal,
        max_storage: Decimal,
    },

    #[error("Insufficient inventory on {date}: withdraw {volume} but only {inventory} in storage")]
    InsufficientInventory {
        date: NaiveDate,
        volume: Decimal,
        inventory: Decimal,
    },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Price model has not been fitted")]
    ModelNotFitted,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for GasStorageError {
    fn from(e: serde_json::Error) -> Self {
        GasStorageError::SerializationError(e.to_string())
    }
}
