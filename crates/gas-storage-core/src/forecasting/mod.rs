pub mod history;
pub mod oracle;
pub mod seasonal;

pub use history::{PriceHistory, PriceObservation};
pub use oracle::{PriceOracle, PriceSchedule};
pub use seasonal::{FitSummary, SeasonalTrendConfig, SeasonalTrendModel};
