use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use gas_storage_core::forecasting::{PriceHistory, PriceOracle, SeasonalTrendConfig, SeasonalTrendModel};
use gas_storage_core::scenarios::{contract_sensitivity, ContractSensitivityInput, SensitivityVariable};
use gas_storage_core::storage_contract::{price_contract_request, ContractPricingRequest};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<SeasonalTrendConfig> {
    match config_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(SeasonalTrendConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Forecasting
// ---------------------------------------------------------------------------

/// Fit the seasonal trend model to `[{date, price}, ...]` and return the fit summary.
#[napi]
pub fn fit_price_model(history_json: String, config_json: Option<String>) -> NapiResult<String> {
    let history: PriceHistory = serde_json::from_str(&history_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let (_, output) = SeasonalTrendModel::fitted(config, &history).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Fit the model and return the estimated price on `date` (YYYY-MM-DD) as a decimal string.
#[napi]
pub fn estimate_price(
    history_json: String,
    date: String,
    config_json: Option<String>,
) -> NapiResult<String> {
    let history: PriceHistory = serde_json::from_str(&history_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let (model, _) = SeasonalTrendModel::fitted(config, &history).map_err(to_napi_error)?;
    let price = model.estimate_str(&date).map_err(to_napi_error)?;
    Ok(price.to_string())
}

// ---------------------------------------------------------------------------
// Storage contract
// ---------------------------------------------------------------------------

#[napi]
pub fn price_contract(request_json: String) -> NapiResult<String> {
    let request: ContractPricingRequest =
        serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let output = price_contract_request(&request).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SensitivityRequest {
    #[serde(flatten)]
    request: ContractPricingRequest,
    variable_1: SensitivityVariable,
    #[serde(default)]
    variable_2: Option<SensitivityVariable>,
}

/// Sweep one or two contract terms. The request is a pricing request plus
/// `variable_1` and optional `variable_2`.
#[napi(js_name = "contractSensitivity")]
pub fn contract_sensitivity_grid(request_json: String) -> NapiResult<String> {
    let SensitivityRequest {
        request,
        variable_1,
        variable_2,
    } = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let (oracle, mut warnings) = request.build_oracle().map_err(to_napi_error)?;
    let input = ContractSensitivityInput {
        contract: request.contract,
        variable_1,
        variable_2,
    };
    let mut output = contract_sensitivity(&input, oracle.as_ref()).map_err(to_napi_error)?;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    serde_json::to_string(&output).map_err(to_napi_error)
}
