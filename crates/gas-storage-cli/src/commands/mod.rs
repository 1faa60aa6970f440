pub mod contract;
pub mod forecasting;
pub mod scenarios;
