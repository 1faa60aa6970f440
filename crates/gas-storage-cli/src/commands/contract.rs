use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use gas_storage_core::day_count::parse_date;
use gas_storage_core::storage_contract::{
    price_contract_request, ContractParameters, ContractPricingRequest, ContractValuationInput,
    ScheduledVolume,
};

use crate::commands::forecasting::HistoryArgs;
use crate::input;

/// Arguments for contract valuation
#[derive(Args)]
pub struct PriceContractArgs {
    /// Path to JSON pricing request (events, fees, and history or price_schedule)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub history: HistoryArgs,

    #[command(flatten)]
    pub single: SingleEventArgs,
}

/// One injection and one withdrawal, used when no JSON request is given.
///
/// These flags carry no prices: pair them with `--history <prices.csv>`.
#[derive(Args, Debug, Clone)]
pub struct SingleEventArgs {
    /// Injection date (YYYY-MM-DD); without --input, --history is required for prices
    #[arg(long, default_value = "2023-06-01")]
    pub injection_date: String,

    /// Injection volume (MMBtu)
    #[arg(long, default_value = "200000")]
    pub injection_volume: Decimal,

    /// Withdrawal date (YYYY-MM-DD)
    #[arg(long, default_value = "2023-12-01")]
    pub withdrawal_date: String,

    /// Withdrawal volume (MMBtu)
    #[arg(long, default_value = "200000")]
    pub withdrawal_volume: Decimal,

    /// Storage fee ($/MMBtu/month)
    #[arg(long, default_value = "0.02")]
    pub storage_fee: Decimal,

    /// Injection fee ($/MMBtu)
    #[arg(long, default_value = "0.10")]
    pub injection_fee: Decimal,

    /// Withdrawal fee ($/MMBtu)
    #[arg(long, default_value = "0.05")]
    pub withdrawal_fee: Decimal,

    /// Max storage (MMBtu)
    #[arg(long, default_value = "600000")]
    pub max_storage: Decimal,
}

impl SingleEventArgs {
    pub fn to_contract(&self) -> Result<ContractValuationInput, Box<dyn std::error::Error>> {
        Ok(ContractValuationInput {
            injections: vec![ScheduledVolume {
                date: parse_date(&self.injection_date)?,
                volume: self.injection_volume,
            }],
            withdrawals: vec![ScheduledVolume {
                date: parse_date(&self.withdrawal_date)?,
                volume: self.withdrawal_volume,
            }],
            parameters: ContractParameters {
                storage_monthly_fee: self.storage_fee,
                injection_fee: self.injection_fee,
                withdrawal_fee: self.withdrawal_fee,
                max_storage: self.max_storage,
            },
        })
    }
}

/// Assemble a pricing request from `--input`, stdin, or the single-event flags,
/// then apply `--history` and `--fourier-order`.
pub fn load_request(
    input_path: Option<&str>,
    history: &HistoryArgs,
    single: &SingleEventArgs,
) -> Result<ContractPricingRequest, Box<dyn std::error::Error>> {
    let mut request: ContractPricingRequest = if let Some(path) = input_path {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        info!("no JSON request given, pricing single injection/withdrawal from flags");
        ContractPricingRequest {
            contract: single.to_contract()?,
            ..ContractPricingRequest::default()
        }
    };

    if let Some(observations) = history.load()? {
        request.history = Some(observations);
    }
    request.model = history.model_config(request.model);
    require_prices(&request)?;
    Ok(request)
}

fn require_prices(request: &ContractPricingRequest) -> Result<(), Box<dyn std::error::Error>> {
    if request.history.is_none() && request.price_schedule.is_none() {
        return Err("no prices to value the contract with: pass --history <prices.csv> \
                    or include \"history\" or \"price_schedule\" in the JSON request"
            .into());
    }
    Ok(())
}

pub fn run_price_contract(args: PriceContractArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_request(args.input.as_deref(), &args.history, &args.single)?;
    let result = price_contract_request(&request)?;
    Ok(serde_json::to_value(result)?)
}
