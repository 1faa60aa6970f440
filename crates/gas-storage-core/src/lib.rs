pub mod day_count;
pub mod error;
pub mod types;

#[cfg(feature = "forecasting")]
pub mod forecasting;

#[cfg(feature = "storage_contract")]
pub mod storage_contract;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::GasStorageError;
pub use types::*;

/// Standard result type for all gas-storage operations
pub type GasStorageResult<T> = Result<T, GasStorageError>;
