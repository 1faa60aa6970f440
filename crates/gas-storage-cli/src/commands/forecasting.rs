use clap::Args;
use serde_json::Value;

use gas_storage_core::day_count::parse_date;
use gas_storage_core::forecasting::{
    PriceHistory, PriceObservation, PriceOracle, SeasonalTrendConfig, SeasonalTrendModel,
};

use crate::input::history::{read_history_csv, DEFAULT_DATE_FORMAT};

/// Where historical prices come from and how the model is configured
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Path to a CSV of historical prices (Dates,Prices columns)
    #[arg(long)]
    pub history: Option<String>,

    /// chrono format of the Dates column
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,

    /// Number of yearly Fourier harmonics in the price model (1-10)
    #[arg(long)]
    pub fourier_order: Option<u32>,
}

impl HistoryArgs {
    /// Observations from `--history`, if given.
    pub fn load(&self) -> Result<Option<Vec<PriceObservation>>, Box<dyn std::error::Error>> {
        self.history
            .as_deref()
            .map(|path| read_history_csv(path, &self.date_format))
            .transpose()
    }

    /// Observations from `--history`, which must be given.
    pub fn require(&self) -> Result<Vec<PriceObservation>, Box<dyn std::error::Error>> {
        self.load()?
            .ok_or_else(|| "--history <prices.csv> is required".into())
    }

    /// Model configuration with any `--fourier-order` override applied.
    pub fn model_config(&self, base: SeasonalTrendConfig) -> SeasonalTrendConfig {
        match self.fourier_order {
            Some(fourier_order) => SeasonalTrendConfig { fourier_order },
            None => base,
        }
    }
}

/// Arguments for fitting the price model
#[derive(Args)]
pub struct FitModelArgs {
    #[command(flatten)]
    pub history: HistoryArgs,
}

/// Arguments for point price estimates
#[derive(Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Date to estimate (YYYY-MM-DD); repeat for several dates
    #[arg(long = "date", required = true)]
    pub dates: Vec<String>,
}

pub fn run_fit_model(args: FitModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history = PriceHistory::new(args.history.require()?)?;
    let config = args.history.model_config(SeasonalTrendConfig::default());
    let (_, summary) = SeasonalTrendModel::fitted(config, &history)?;
    Ok(serde_json::to_value(summary)?)
}

pub fn run_estimate(args: EstimateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history = PriceHistory::new(args.history.require()?)?;
    let config = args.history.model_config(SeasonalTrendConfig::default());
    let (model, summary) = SeasonalTrendModel::fitted(config, &history)?;

    let mut estimates = Vec::with_capacity(args.dates.len());
    for raw in &args.dates {
        let date = parse_date(raw)?;
        let price = model.estimate(date)?;
        estimates.push(PriceObservation { date, price });
    }

    Ok(serde_json::json!({
        "result": {
            "estimates": estimates,
            "rmse": summary.result.rmse,
            "observations": summary.result.observations,
            "fourier_order": config.fourier_order,
        },
        "methodology": summary.methodology,
        "warnings": summary.warnings,
    }))
}
