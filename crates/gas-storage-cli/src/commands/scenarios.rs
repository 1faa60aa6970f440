use clap::Args;
use serde_json::Value;

use gas_storage_core::scenarios::{contract_sensitivity, ContractSensitivityInput, SensitivityVariable};

use crate::commands::contract::{load_request, SingleEventArgs};
use crate::commands::forecasting::HistoryArgs;

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "storage_monthly_fee:0:0.05:0.01"). Names: storage_monthly_fee,
    /// injection_fee, withdrawal_fee, max_storage, volume_scale
    #[arg(long)]
    pub var1: String,

    /// Second sensitivity variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Path to JSON pricing request for the base case
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub history: HistoryArgs,

    #[command(flatten)]
    pub single: SingleEventArgs,
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let variable_1 = parse_sens_var(&args.var1)?;
    let variable_2 = args.var2.as_deref().map(parse_sens_var).transpose()?;

    let request = load_request(args.input.as_deref(), &args.history, &args.single)?;
    let (oracle, model_warnings) = request.build_oracle()?;

    let input = ContractSensitivityInput {
        contract: request.contract,
        variable_1,
        variable_2,
    };
    let mut result = contract_sensitivity(&input, oracle.as_ref())?;
    let mut warnings = model_warnings;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;

    Ok(serde_json::to_value(result)?)
}
