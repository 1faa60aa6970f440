use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::GasStorageError;
use crate::forecasting::oracle::PriceOracle;
use crate::storage_contract::valuation::{contract_net_value, ContractValuationInput};
use crate::types::*;
use crate::GasStorageResult;

/// Upper bound on evaluated grid points.
const MAX_GRID_CELLS: usize = 10_000;

/// Sensitivity variable specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Contract terms that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractVariable {
    StorageMonthlyFee,
    InjectionFee,
    WithdrawalFee,
    MaxStorage,
    /// Multiplier applied to every injection and withdrawal volume.
    VolumeScale,
}

impl ContractVariable {
    pub const ALL: [ContractVariable; 5] = [
        ContractVariable::StorageMonthlyFee,
        ContractVariable::InjectionFee,
        ContractVariable::WithdrawalFee,
        ContractVariable::MaxStorage,
        ContractVariable::VolumeScale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractVariable::StorageMonthlyFee => "storage_monthly_fee",
            ContractVariable::InjectionFee => "injection_fee",
            ContractVariable::WithdrawalFee => "withdrawal_fee",
            ContractVariable::MaxStorage => "max_storage",
            ContractVariable::VolumeScale => "volume_scale",
        }
    }

    /// Copy of `contract` with this variable set to `value`.
    ///
    /// Fails with `InvalidInput` if scaling a volume overflows.
    pub fn apply(
        &self,
        contract: &ContractValuationInput,
        value: Decimal,
    ) -> GasStorageResult<ContractValuationInput> {
        let mut out = contract.clone();
        match self {
            ContractVariable::StorageMonthlyFee => out.parameters.storage_monthly_fee = value,
            ContractVariable::InjectionFee => out.parameters.injection_fee = value,
            ContractVariable::WithdrawalFee => out.parameters.withdrawal_fee = value,
            ContractVariable::MaxStorage => out.parameters.max_storage = value,
            ContractVariable::VolumeScale => {
                for e in out.injections.iter_mut().chain(out.withdrawals.iter_mut()) {
                    e.volume = e.volume.checked_mul(value).ok_or_else(|| {
                        GasStorageError::InvalidInput {
                            field: "volume".into(),
                            reason: format!("arithmetic overflow scaling {} by {value}", e.volume),
                        }
                    })?;
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for ContractVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractVariable {
    type Err = GasStorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractVariable::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| GasStorageError::InvalidInput {
                field: "variable.name".into(),
                reason: format!(
                    "Unknown contract variable '{s}', expected one of: {}",
                    ContractVariable::ALL.map(|v| v.as_str()).join(", ")
                ),
            })
    }
}

/// Input for one- or two-way contract sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSensitivityInput {
    /// Base case contract
    pub contract: ContractValuationInput,
    /// First variable to sweep (rows)
    pub variable_1: SensitivityVariable,
    /// Optional second variable to sweep (columns)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SensitivityVariable>,
}

/// Output of contract sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSensitivityOutput {
    pub variable_1_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    /// Empty for a one-way sweep.
    pub variable_2_values: Vec<Decimal>,
    /// Matrix[i][j] = net value at variable_1_values[i], variable_2_values[j].
    /// A one-way sweep has a single column. `None` marks a failed valuation.
    pub matrix: Vec<Vec<Option<Money>>>,
    /// Net value of the unmodified contract
    pub base_case_value: Money,
    pub failed_points: usize,
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> GasStorageResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(GasStorageError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(GasStorageError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }
    let too_many = match var.max.checked_sub(var.min) {
        Some(span) => span / var.step > Decimal::from(MAX_GRID_CELLS as u64),
        None => true,
    };
    if too_many {
        return Err(GasStorageError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: format!("Sweep exceeds {MAX_GRID_CELLS} points"),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Re-value a storage contract across a grid of one or two contract terms.
///
/// Each grid point is valued independently against the same oracle. A point
/// that fails (for example a capacity breach after shrinking `max_storage`)
/// is recorded as `None` with a warning; only a failing base case aborts.
pub fn contract_sensitivity<O>(
    input: &ContractSensitivityInput,
    oracle: &O,
) -> GasStorageResult<ComputationOutput<ContractSensitivityOutput>>
where
    O: PriceOracle + ?Sized,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let var1: ContractVariable = input.variable_1.name.parse()?;
    let var2: Option<ContractVariable> = input
        .variable_2
        .as_ref()
        .map(|v| v.name.parse::<ContractVariable>())
        .transpose()?;
    if var2 == Some(var1) {
        return Err(GasStorageError::InvalidInput {
            field: "variable_2.name".into(),
            reason: format!("Cannot sweep {var1} against itself"),
        });
    }

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = match &input.variable_2 {
        Some(v) => generate_sweep_values(v)?,
        None => Vec::new(),
    };
    let cells = v1_values.len() * v2_values.len().max(1);
    if cells > MAX_GRID_CELLS {
        return Err(GasStorageError::InvalidInput {
            field: "variable_1 / variable_2".into(),
            reason: format!("Grid of {cells} points exceeds {MAX_GRID_CELLS}"),
        });
    }

    let base_case_value = contract_net_value(&input.contract, oracle)?;

    let mut failed_points = 0usize;
    let mut matrix = Vec::with_capacity(v1_values.len());

    for v1 in &v1_values {
        let row = match var2 {
            None => vec![evaluate_point(
                var1.apply(&input.contract, *v1),
                oracle,
                &format!("{var1}={v1}"),
                &mut warnings,
                &mut failed_points,
            )],
            Some(var2) => v2_values
                .iter()
                .map(|v2| {
                    evaluate_point(
                        var1.apply(&input.contract, *v1).and_then(|c| var2.apply(&c, *v2)),
                        oracle,
                        &format!("{var1}={v1}, {var2}={v2}"),
                        &mut warnings,
                        &mut failed_points,
                    )
                })
                .collect(),
        };
        matrix.push(row);
    }

    info!(cells, failed_points, "evaluated contract sensitivity grid");

    let output = ContractSensitivityOutput {
        variable_1_name: var1.to_string(),
        variable_2_name: var2.map(|v| v.to_string()),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        matrix,
        base_case_value,
        failed_points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Contract Sensitivity Analysis (net value)",
        &serde_json::json!({
            "variable_1": input.variable_1,
            "variable_2": input.variable_2,
            "output_metric": "net_value",
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn evaluate_point<O>(
    contract: GasStorageResult<ContractValuationInput>,
    oracle: &O,
    label: &str,
    warnings: &mut Vec<String>,
    failed_points: &mut usize,
) -> Option<Money>
where
    O: PriceOracle + ?Sized,
{
    match contract.and_then(|c| contract_net_value(&c, oracle)) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(point = label, error = %e, "sensitivity point failed");
            warnings.push(format!("Evaluation failed at ({label}): {e}"));
            *failed_points += 1;
            None
        }
    }
}
