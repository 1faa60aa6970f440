use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::day_count::months_between;
use crate::error::GasStorageError;
use crate::forecasting::oracle::PriceOracle;
use crate::storage_contract::events::{merge_events, EventKind, ScheduledVolume, StorageEvent};
use crate::types::{with_metadata, ComputationOutput, Money, Price, Rate, Volume};
use crate::GasStorageResult;

const DEFAULT_MAX_STORAGE: Decimal = dec!(1000000);

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Fee and capacity terms of a storage contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParameters {
    /// Carrying cost per unit of inventory per month.
    #[serde(default)]
    pub storage_monthly_fee: Rate,
    /// Cost per unit injected.
    #[serde(default)]
    pub injection_fee: Rate,
    /// Cost per unit withdrawn.
    #[serde(default)]
    pub withdrawal_fee: Rate,
    /// Storage capacity in volume units.
    #[serde(default = "default_max_storage")]
    pub max_storage: Volume,
}

fn default_max_storage() -> Volume {
    DEFAULT_MAX_STORAGE
}

impl Default for ContractParameters {
    fn default() -> Self {
        Self {
            storage_monthly_fee: Decimal::ZERO,
            injection_fee: Decimal::ZERO,
            withdrawal_fee: Decimal::ZERO,
            max_storage: DEFAULT_MAX_STORAGE,
        }
    }
}

/// A storage contract: the injection and withdrawal schedule plus its terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractValuationInput {
    #[serde(default)]
    pub injections: Vec<ScheduledVolume>,
    #[serde(default)]
    pub withdrawals: Vec<ScheduledVolume>,
    #[serde(flatten)]
    pub parameters: ContractParameters,
}

/// Cash flows booked for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub kind: EventKind,
    pub volume: Volume,
    /// Oracle price on the event date.
    pub price: Price,
    /// Signed commodity cash flow: negative purchase cost, positive sale proceeds.
    pub cash_flow: Money,
    /// Injection or withdrawal fee for this event.
    pub fee: Money,
    /// Carrying cost for the interval ending at this event.
    pub storage_cost: Money,
    pub months_since_previous: Decimal,
    pub inventory_after: Volume,
    pub net_value_after: Money,
}

/// Output of a contract valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractValuationOutput {
    /// Sales minus purchases minus fees minus carrying cost.
    pub net_value: Money,
    pub total_purchase_cost: Money,
    pub total_sale_proceeds: Money,
    pub total_injection_fees: Money,
    pub total_withdrawal_fees: Money,
    pub total_storage_cost: Money,
    pub total_injected: Volume,
    pub total_withdrawn: Volume,
    pub peak_inventory: Volume,
    /// Inventory left after the final event (unvalued).
    pub closing_inventory: Volume,
    pub ledger: Vec<LedgerEntry>,
}

/// Transient state of the single valuation pass.
#[derive(Debug, Default)]
struct ValuationState {
    inventory: Volume,
    net_value: Money,
    previous_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Value a gas storage contract against a price oracle.
///
/// Events are merged chronologically (see [`merge_events`]) and walked once:
///
/// - carrying cost = inventory * storage_monthly_fee * months since the
///   previous event, charged before the current event changes inventory
/// - injection: net -= (price + injection_fee) * volume
/// - withdrawal: net += price * volume - withdrawal_fee * volume
///
/// An injection that would exceed `max_storage` or a withdrawal larger than
/// the inventory aborts the whole valuation. The oracle is queried once per
/// event, in chronological order, and only after the event passes its
/// capacity check.
pub fn price_contract<O>(
    input: &ContractValuationInput,
    oracle: &O,
) -> GasStorageResult<ComputationOutput<ContractValuationOutput>>
where
    O: PriceOracle + ?Sized,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_contract_input(input)?;

    let events = merge_events(&input.injections, &input.withdrawals);
    if events.is_empty() {
        warnings.push("Contract has no injection or withdrawal events".into());
    }

    let output = run_valuation(&events, &input.parameters, oracle)?;

    for entry in output.ledger.iter().filter(|e| e.price < Decimal::ZERO) {
        warnings.push(format!(
            "Negative price estimate {} on {}",
            entry.price, entry.date
        ));
    }
    if output.closing_inventory > Decimal::ZERO {
        warnings.push(format!(
            "{} units remain in storage after the final event and are not valued",
            output.closing_inventory
        ));
    }

    info!(
        events = events.len(),
        net_value = %output.net_value,
        "valued storage contract"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "parameters": input.parameters,
        "month_convention": "days / (365.25 / 12)",
        "event_order": "chronological; injections before withdrawals on the same date",
        "discounting": "none",
    });

    Ok(with_metadata(
        "Gas Storage Contract Valuation (event-by-event cash flow)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Net value only, without the ledger envelope.
pub fn contract_net_value<O>(input: &ContractValuationInput, oracle: &O) -> GasStorageResult<Money>
where
    O: PriceOracle + ?Sized,
{
    validate_contract_input(input)?;
    let events = merge_events(&input.injections, &input.withdrawals);
    Ok(run_valuation(&events, &input.parameters, oracle)?.net_value)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn run_valuation<O>(
    events: &[StorageEvent],
    params: &ContractParameters,
    oracle: &O,
) -> GasStorageResult<ContractValuationOutput>
where
    O: PriceOracle + ?Sized,
{
    let mut state = ValuationState::default();
    let mut ledger = Vec::with_capacity(events.len());

    let mut total_purchase_cost = Decimal::ZERO;
    let mut total_sale_proceeds = Decimal::ZERO;
    let mut total_injection_fees = Decimal::ZERO;
    let mut total_withdrawal_fees = Decimal::ZERO;
    let mut total_storage_cost = Decimal::ZERO;
    let mut total_injected = Decimal::ZERO;
    let mut total_withdrawn = Decimal::ZERO;
    let mut peak_inventory = Decimal::ZERO;

    for event in events {
        // -- Carrying cost on inventory held since the previous event --
        let (months, storage_cost) = match state.previous_date {
            Some(prev) => {
                let months = months_between(prev, event.date);
                let cost = state
                    .inventory
                    .checked_mul(params.storage_monthly_fee)
                    .and_then(|c| c.checked_mul(months));
                (months, checked(cost, "storage_cost")?)
            }
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        state.net_value = checked(state.net_value.checked_sub(storage_cost), "net_value")?;
        total_storage_cost = checked(total_storage_cost.checked_add(storage_cost), "total_storage_cost")?;

        let (price, cash_flow, fee) = match event.kind {
            EventKind::Injection => {
                // A sum past Decimal::MAX is necessarily past max_storage too.
                let after = state.inventory.checked_add(event.volume);
                if after.map_or(true, |a| a > params.max_storage) {
                    return Err(GasStorageError::CapacityExceeded {
                        date: event.date,
                        volume: event.volume,
                        inventory: state.inventory,
                        max_storage: params.max_storage,
                    });
                }
                let price = oracle.estimate(event.date)?;
                let cost = checked(price.checked_mul(event.volume), "purchase_cost")?;
                let fee = checked(params.injection_fee.checked_mul(event.volume), "injection_fee")?;
                state.net_value = checked(
                    state.net_value.checked_sub(cost).and_then(|v| v.checked_sub(fee)),
                    "net_value",
                )?;
                state.inventory = checked(after, "inventory")?;

                total_purchase_cost = checked(total_purchase_cost.checked_add(cost), "total_purchase_cost")?;
                total_injection_fees = checked(total_injection_fees.checked_add(fee), "total_injection_fees")?;
                total_injected = checked(total_injected.checked_add(event.volume), "total_injected")?;
                (price, -cost, fee)
            }
            EventKind::Withdrawal => {
                if state.inventory < event.volume {
                    return Err(GasStorageError::InsufficientInventory {
                        date: event.date,
                        volume: event.volume,
                        inventory: state.inventory,
                    });
                }
                let price = oracle.estimate(event.date)?;
                let proceeds = checked(price.checked_mul(event.volume), "sale_proceeds")?;
                let fee = checked(params.withdrawal_fee.checked_mul(event.volume), "withdrawal_fee")?;
                state.net_value = checked(
                    state.net_value.checked_add(proceeds).and_then(|v| v.checked_sub(fee)),
                    "net_value",
                )?;
                state.inventory -= event.volume;

                total_sale_proceeds = checked(total_sale_proceeds.checked_add(proceeds), "total_sale_proceeds")?;
                total_withdrawal_fees = checked(total_withdrawal_fees.checked_add(fee), "total_withdrawal_fees")?;
                total_withdrawn = checked(total_withdrawn.checked_add(event.volume), "total_withdrawn")?;
                (price, proceeds, fee)
            }
        };

        peak_inventory = peak_inventory.max(state.inventory);
        state.previous_date = Some(event.date);

        debug!(
            date = %event.date,
            kind = ?event.kind,
            volume = %event.volume,
            %price,
            inventory = %state.inventory,
            net_value = %state.net_value,
            "processed storage event"
        );

        ledger.push(LedgerEntry {
            date: event.date,
            kind: event.kind,
            volume: event.volume,
            price,
            cash_flow,
            fee,
            storage_cost,
            months_since_previous: months,
            inventory_after: state.inventory,
            net_value_after: state.net_value,
        });
    }

    Ok(ContractValuationOutput {
        net_value: state.net_value,
        total_purchase_cost,
        total_sale_proceeds,
        total_injection_fees,
        total_withdrawal_fees,
        total_storage_cost,
        total_injected,
        total_withdrawn,
        peak_inventory,
        closing_inventory: state.inventory,
        ledger,
    })
}

/// Result of a checked Decimal operation; `None` means it overflowed.
fn checked(value: Option<Decimal>, field: &str) -> GasStorageResult<Decimal> {
    value.ok_or_else(|| GasStorageError::InvalidInput {
        field: field.into(),
        reason: "arithmetic overflow".into(),
    })
}

fn validate_contract_input(input: &ContractValuationInput) -> GasStorageResult<()> {
    let p = &input.parameters;
    if p.storage_monthly_fee < Decimal::ZERO {
        return Err(GasStorageError::InvalidInput {
            field: "storage_monthly_fee".into(),
            reason: "Storage fee cannot be negative".into(),
        });
    }
    if p.injection_fee < Decimal::ZERO {
        return Err(GasStorageError::InvalidInput {
            field: "injection_fee".into(),
            reason: "Injection fee cannot be negative".into(),
        });
    }
    if p.withdrawal_fee < Decimal::ZERO {
        return Err(GasStorageError::InvalidInput {
            field: "withdrawal_fee".into(),
            reason: "Withdrawal fee cannot be negative".into(),
        });
    }
    if p.max_storage <= Decimal::ZERO {
        return Err(GasStorageError::InvalidInput {
            field: "max_storage".into(),
            reason: "Max storage must be positive".into(),
        });
    }
    validate_volumes("injections", &input.injections)?;
    validate_volumes("withdrawals", &input.withdrawals)?;
    Ok(())
}

fn validate_volumes(field: &str, events: &[ScheduledVolume]) -> GasStorageResult<()> {
    for (i, e) in events.iter().enumerate() {
        if e.volume <= Decimal::ZERO {
            return Err(GasStorageError::InvalidInput {
                field: format!("{field}[{i}].volume"),
                reason: format!("Volume must be positive, got {} on {}", e.volume, e.date),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecasting::oracle::PriceSchedule;
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sv(date: &str, volume: Decimal) -> ScheduledVolume {
        ScheduledVolume {
            date: d(date),
            volume,
        }
    }

    fn assert_approx(actual: Decimal, expected: Decimal, tolerance: Decimal, label: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "{label}: expected ~{expected}, got {actual} (diff={diff}, tol={tolerance})"
        );
    }

    /// Records the order in which dates are priced.
    struct RecordingOracle {
        price: Price,
        calls: Mutex<Vec<NaiveDate>>,
    }

    impl PriceOracle for RecordingOracle {
        fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price> {
            self.calls.lock().unwrap().push(date);
            Ok(self.price)
        }
    }

    fn reference_input() -> ContractValuationInput {
        ContractValuationInput {
            injections: vec![sv("2023-06-01", dec!(100))],
            withdrawals: vec![sv("2023-12-01", dec!(100))],
            parameters: ContractParameters {
                storage_monthly_fee: dec!(0.02),
                injection_fee: dec!(0.10),
                withdrawal_fee: dec!(0.05),
                max_storage: dec!(600000),
            },
        }
    }

    fn reference_oracle() -> PriceSchedule {
        PriceSchedule::new()
            .with_price(d("2023-06-01"), dec!(2.00))
            .with_price(d("2023-12-01"), dec!(3.00))
    }

    #[test]
    fn test_reference_contract() {
        let output = price_contract(&reference_input(), &reference_oracle()).unwrap();
        let r = &output.result;

        let storage = dec!(100) * dec!(0.02) * (dec!(183) / dec!(30.4375));
        let expected = -dec!(200) - dec!(10) - storage + dec!(300) - dec!(5);
        assert_eq!(r.net_value, expected);
        assert_approx(r.net_value, dec!(72.97), dec!(0.05), "net value");
        assert_approx(r.total_storage_cost, dec!(12.02), dec!(0.01), "storage cost");
        assert_eq!(r.total_purchase_cost, dec!(200));
        assert_eq!(r.total_sale_proceeds, dec!(300));
        assert_eq!(r.total_injection_fees, dec!(10));
        assert_eq!(r.total_withdrawal_fees, dec!(5));
        assert_eq!(r.peak_inventory, dec!(100));
        assert_eq!(r.closing_inventory, Decimal::ZERO);
        assert_eq!(r.ledger.len(), 2);
        assert_eq!(r.ledger[0].storage_cost, Decimal::ZERO);
        assert_eq!(r.ledger[1].net_value_after, r.net_value);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_empty_contract_is_zero() {
        let input = ContractValuationInput::default();
        let output = price_contract(&input, &PriceSchedule::new()).unwrap();
        assert_eq!(output.result.net_value, Decimal::ZERO);
        assert!(output.result.ledger.is_empty());
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_inject_exactly_to_capacity() {
        let mut input = reference_input();
        input.parameters.max_storage = dec!(100);
        assert!(price_contract(&input, &reference_oracle()).is_ok());
    }

    #[test]
    fn test_inject_past_capacity_fails() {
        let mut input = reference_input();
        input.parameters.max_storage = dec!(99.999);
        let err = price_contract(&input, &reference_oracle()).unwrap_err();
        match err {
            GasStorageError::CapacityExceeded {
                volume,
                inventory,
                max_storage,
                date,
            } => {
                assert_eq!(volume, dec!(100));
                assert_eq!(inventory, Decimal::ZERO);
                assert_eq!(max_storage, dec!(99.999));
                assert_eq!(date, d("2023-06-01"));
            }
            other => panic!("Expected CapacityExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_withdraw_more_than_inventory_fails() {
        let mut input = reference_input();
        input.withdrawals[0].volume = dec!(101);
        let err = price_contract(&input, &reference_oracle()).unwrap_err();
        assert!(matches!(
            err,
            GasStorageError::InsufficientInventory { volume, inventory, .. }
                if volume == dec!(101) && inventory == dec!(100)
        ));
    }

    #[test]
    fn test_failed_event_is_not_priced() {
        let oracle = RecordingOracle {
            price: dec!(1),
            calls: Mutex::new(Vec::new()),
        };
        let input = ContractValuationInput {
            injections: vec![sv("2023-01-01", dec!(10))],
            withdrawals: vec![sv("2023-02-01", dec!(5)), sv("2023-03-01", dec!(6))],
            parameters: ContractParameters::default(),
        };
        assert!(price_contract(&input, &oracle).is_err());
        assert_eq!(
            *oracle.calls.lock().unwrap(),
            vec![d("2023-01-01"), d("2023-02-01")]
        );
    }

    #[test]
    fn test_oracle_called_in_chronological_order() {
        let oracle = RecordingOracle {
            price: dec!(1),
            calls: Mutex::new(Vec::new()),
        };
        let input = ContractValuationInput {
            injections: vec![sv("2023-03-01", dec!(10)), sv("2023-01-01", dec!(10))],
            withdrawals: vec![sv("2023-04-01", dec!(5)), sv("2023-02-01", dec!(5))],
            parameters: ContractParameters::default(),
        };
        price_contract(&input, &oracle).unwrap();
        assert_eq!(
            *oracle.calls.lock().unwrap(),
            vec![d("2023-01-01"), d("2023-02-01"), d("2023-03-01"), d("2023-04-01")]
        );
    }

    #[test]
    fn test_same_day_inject_and_withdraw() {
        // Injection is processed first, so the same-day withdrawal succeeds.
        let input = ContractValuationInput {
            injections: vec![sv("2023-06-01", dec!(50))],
            withdrawals: vec![sv("2023-06-01", dec!(50))],
            parameters: ContractParameters {
                storage_monthly_fee: dec!(1),
                ..ContractParameters::default()
            },
        };
        let oracle = PriceSchedule::new().with_price(d("2023-06-01"), dec!(3));
        let r = price_contract(&input, &oracle).unwrap().result;
        assert_eq!(r.net_value, Decimal::ZERO);
        assert_eq!(r.total_storage_cost, Decimal::ZERO);
    }

    #[test]
    fn test_closing_inventory_warns() {
        let mut input = reference_input();
        input.withdrawals[0].volume = dec!(40);
        let output = price_contract(&input, &reference_oracle()).unwrap();
        assert_eq!(output.result.closing_inventory, dec!(60));
        assert!(output.warnings.iter().any(|w| w.contains("remain in storage")));
    }

    #[test]
    fn test_rejects_non_positive_volume() {
        let mut input = reference_input();
        input.withdrawals[0].volume = Decimal::ZERO;
        let err = price_contract(&input, &reference_oracle()).unwrap_err();
        match err {
            GasStorageError::InvalidInput { field, .. } => assert_eq!(field, "withdrawals[0].volume"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_negative_fee() {
        let mut input = reference_input();
        input.parameters.injection_fee = dec!(-0.01);
        assert!(matches!(
            price_contract(&input, &reference_oracle()),
            Err(GasStorageError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_huge_volume_overflow_is_an_error() {
        let date = d("2023-06-01");
        let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);
        let input = ContractValuationInput {
            injections: vec![sv("2023-06-01", huge)],
            withdrawals: vec![],
            parameters: ContractParameters {
                max_storage: huge,
                ..ContractParameters::default()
            },
        };
        let oracle = PriceSchedule::new().with_price(date, dec!(10));
        match price_contract(&input, &oracle).unwrap_err() {
            GasStorageError::InvalidInput { field, reason } => {
                assert_eq!(field, "purchase_cost");
                assert_eq!(reason, "arithmetic overflow");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_capacity_sum_past_decimal_max_is_capacity_error() {
        let input = ContractValuationInput {
            injections: vec![sv("2023-06-01", Decimal::MAX), sv("2023-07-01", Decimal::MAX)],
            withdrawals: vec![],
            parameters: ContractParameters {
                max_storage: Decimal::MAX,
                ..ContractParameters::default()
            },
        };
        let oracle = PriceSchedule::new()
            .with_price(d("2023-06-01"), dec!(0))
            .with_price(d("2023-07-01"), dec!(0));
        assert!(matches!(
            price_contract(&input, &oracle),
            Err(GasStorageError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_net_value_matches_envelope() {
        let input = reference_input();
        let oracle = reference_oracle();
        assert_eq!(
            contract_net_value(&input, &oracle).unwrap(),
            price_contract(&input, &oracle).unwrap().result.net_value
        );
    }

    #[test]
    fn test_parameters_default_from_json() {
        let json = r#"{
            "injections": [{"date": "2023-06-01", "volume": "100"}],
            "withdrawals": [],
            "injection_fee": "0.1"
        }"#;
        let input: ContractValuationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.parameters.injection_fee, dec!(0.1));
        assert_eq!(input.parameters.storage_monthly_fee, Decimal::ZERO);
        assert_eq!(input.parameters.max_storage, dec!(1000000));
    }
}
