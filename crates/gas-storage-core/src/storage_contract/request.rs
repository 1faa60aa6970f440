use serde::{Deserialize, Serialize};

use crate::error::GasStorageError;
use crate::forecasting::history::{PriceHistory, PriceObservation};
use crate::forecasting::oracle::{PriceOracle, PriceSchedule};
use crate::forecasting::seasonal::{SeasonalTrendConfig, SeasonalTrendModel};
use crate::storage_contract::valuation::{price_contract, ContractValuationInput, ContractValuationOutput};
use crate::types::ComputationOutput;
use crate::GasStorageResult;

/// A self-contained pricing request: the contract plus where its prices
/// come from.
///
/// Exactly one of `history` (fit a seasonal trend model) or
/// `price_schedule` (exact-date prices) must be supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractPricingRequest {
    #[serde(flatten)]
    pub contract: ContractValuationInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<PriceObservation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_schedule: Option<Vec<PriceObservation>>,
    #[serde(default)]
    pub model: SeasonalTrendConfig,
}

impl ContractPricingRequest {
    /// Build the oracle this request describes.
    ///
    /// Returns the oracle and any warnings raised while fitting it.
    pub fn build_oracle(&self) -> GasStorageResult<(Box<dyn PriceOracle>, Vec<String>)> {
        match (&self.history, &self.price_schedule) {
            (Some(_), Some(_)) => Err(GasStorageError::InvalidInput {
                field: "history / price_schedule".into(),
                reason: "Provide either a price history or a price schedule, not both".into(),
            }),
            (Some(observations), None) => {
                let history = PriceHistory::new(observations.clone())?;
                let (model, fit) = SeasonalTrendModel::fitted(self.model, &history)?;
                let warnings: Vec<String> = fit
                    .warnings
                    .into_iter()
                    .map(|w| format!("price model: {w}"))
                    .collect();
                let oracle: Box<dyn PriceOracle> = Box::new(model);
                Ok((oracle, warnings))
            }
            (None, Some(observations)) => {
                let oracle: Box<dyn PriceOracle> =
                    Box::new(PriceSchedule::from_observations(observations));
                Ok((oracle, Vec::new()))
            }
            (None, None) => Err(GasStorageError::InsufficientData(
                "A price history or price schedule is required to price the contract".into(),
            )),
        }
    }
}

/// Build the request's oracle and value its contract.
pub fn price_contract_request(
    request: &ContractPricingRequest,
) -> GasStorageResult<ComputationOutput<ContractValuationOutput>> {
    let (oracle, model_warnings) = request.build_oracle()?;
    let mut output = price_contract(&request.contract, oracle.as_ref())?;
    let mut warnings = model_warnings;
    warnings.append(&mut output.warnings);
    output.warnings = warnings;
    Ok(output)
}
