use chrono::NaiveDate;
use gas_storage_core::forecasting::{PriceOracle, PriceSchedule};
use gas_storage_core::storage_contract::{
    merge_events, price_contract, ContractParameters, ContractValuationInput, EventKind,
    ScheduledVolume,
};
use gas_storage_core::{GasStorageError, GasStorageResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sv(date: &str, volume: Decimal) -> ScheduledVolume {
    ScheduledVolume {
        date: d(date),
        volume,
    }
}

fn no_fees(max_storage: Decimal) -> ContractParameters {
    ContractParameters {
        storage_monthly_fee: Decimal::ZERO,
        injection_fee: Decimal::ZERO,
        withdrawal_fee: Decimal::ZERO,
        max_storage,
    }
}

/// Flat price for every date.
struct FlatOracle(Decimal);

impl PriceOracle for FlatOracle {
    fn estimate(&self, _date: NaiveDate) -> GasStorageResult<Decimal> {
        Ok(self.0)
    }
}

// ===========================================================================
// Cash flow identities
// ===========================================================================

#[test]
fn test_zero_fees_net_value_is_sales_minus_purchases() {
    // Buy 100 @ 2.50 and 50 @ 2.75, sell 80 @ 3.10 and 70 @ 3.40
    let oracle = PriceSchedule::new()
        .with_price(d("2023-05-01"), dec!(2.50))
        .with_price(d("2023-06-15"), dec!(2.75))
        .with_price(d("2023-11-01"), dec!(3.10))
        .with_price(d("2024-01-20"), dec!(3.40));
    let input = ContractValuationInput {
        injections: vec![sv("2023-05-01", dec!(100)), sv("2023-06-15", dec!(50))],
        withdrawals: vec![sv("2023-11-01", dec!(80)), sv("2024-01-20", dec!(70))],
        parameters: no_fees(dec!(1000)),
    };

    let result = price_contract(&input, &oracle).unwrap().result;
    let sales = dec!(3.10) * dec!(80) + dec!(3.40) * dec!(70);
    let purchases = dec!(2.50) * dec!(100) + dec!(2.75) * dec!(50);
    assert_eq!(result.net_value, sales - purchases);
    assert_eq!(result.closing_inventory, Decimal::ZERO);
    assert_eq!(result.total_injected, result.total_withdrawn);
}

#[test]
fn test_reference_contract_value() {
    // Inject 100 on 2023-06-01 @ 2.00, withdraw on 2023-12-01 @ 3.00.
    // Storage: 100 * 0.02 * 183/30.4375 ≈ 12.02
    // Net ≈ -200 - 10 - 12.02 + 300 - 5 ≈ 72.97
    let oracle = PriceSchedule::new()
        .with_price(d("2023-06-01"), dec!(2.00))
        .with_price(d("2023-12-01"), dec!(3.00));
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(100))],
        withdrawals: vec![sv("2023-12-01", dec!(100))],
        parameters: ContractParameters {
            storage_monthly_fee: dec!(0.02),
            injection_fee: dec!(0.10),
            withdrawal_fee: dec!(0.05),
            max_storage: dec!(600000),
        },
    };

    let result = price_contract(&input, &oracle).unwrap().result;
    assert!(
        (result.net_value - dec!(72.97)).abs() <= dec!(0.05),
        "Expected net value ~72.97, got {}",
        result.net_value
    );
    assert_eq!(result.ledger[1].months_since_previous, dec!(183) / dec!(30.4375));
}

#[test]
fn test_empty_schedule_is_zero() {
    let input = ContractValuationInput {
        injections: vec![],
        withdrawals: vec![],
        parameters: ContractParameters::default(),
    };
    let output = price_contract(&input, &FlatOracle(dec!(3))).unwrap();
    assert_eq!(output.result.net_value, Decimal::ZERO);
}

#[test]
fn test_repeat_valuation_is_identical() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-01-10", dec!(333.3)), sv("2023-02-17", dec!(12.7))],
        withdrawals: vec![sv("2023-09-03", dec!(346))],
        parameters: ContractParameters {
            storage_monthly_fee: dec!(0.013),
            injection_fee: dec!(0.07),
            withdrawal_fee: dec!(0.03),
            max_storage: dec!(500),
        },
    };
    let oracle = FlatOracle(dec!(2.9));
    let a = price_contract(&input, &oracle).unwrap().result;
    let b = price_contract(&input, &oracle).unwrap().result;
    assert_eq!(a.net_value, b.net_value);
    assert_eq!(a.total_storage_cost, b.total_storage_cost);
}

// ===========================================================================
// Capacity and inventory invariants
// ===========================================================================

#[test]
fn test_fill_to_exact_capacity() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(400)), sv("2023-07-01", dec!(200))],
        withdrawals: vec![],
        parameters: no_fees(dec!(600)),
    };
    let result = price_contract(&input, &FlatOracle(dec!(2))).unwrap().result;
    assert_eq!(result.peak_inventory, dec!(600));
}

#[test]
fn test_capacity_exceeded_by_epsilon() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(400)), sv("2023-07-01", dec!(200.0001))],
        withdrawals: vec![],
        parameters: no_fees(dec!(600)),
    };
    let err = price_contract(&input, &FlatOracle(dec!(2))).unwrap_err();
    match err {
        GasStorageError::CapacityExceeded {
            volume,
            inventory,
            max_storage,
            ..
        } => {
            assert_eq!(volume, dec!(200.0001));
            assert_eq!(inventory, dec!(400));
            assert_eq!(max_storage, dec!(600));
        }
        other => panic!("Expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn test_withdraw_entire_inventory() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(250))],
        withdrawals: vec![sv("2023-08-01", dec!(100)), sv("2023-09-01", dec!(150))],
        parameters: no_fees(dec!(1000)),
    };
    let result = price_contract(&input, &FlatOracle(dec!(2))).unwrap().result;
    assert_eq!(result.closing_inventory, Decimal::ZERO);
    assert_eq!(result.ledger.last().unwrap().inventory_after, Decimal::ZERO);
}

#[test]
fn test_withdraw_one_unit_too_many() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(250))],
        withdrawals: vec![sv("2023-08-01", dec!(100)), sv("2023-09-01", dec!(151))],
        parameters: no_fees(dec!(1000)),
    };
    let err = price_contract(&input, &FlatOracle(dec!(2))).unwrap_err();
    assert!(matches!(
        err,
        GasStorageError::InsufficientInventory { volume, inventory, .. }
            if volume == dec!(151) && inventory == dec!(150)
    ));
    assert!(err.to_string().contains("only 150 in storage"));
}

#[test]
fn test_withdrawal_before_any_injection_fails() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-06-01", dec!(10))],
        withdrawals: vec![sv("2023-05-01", dec!(10))],
        parameters: no_fees(dec!(1000)),
    };
    assert!(matches!(
        price_contract(&input, &FlatOracle(dec!(2))),
        Err(GasStorageError::InsufficientInventory { .. })
    ));
}

// ===========================================================================
// Carrying cost
// ===========================================================================

fn storage_cost_for_gap(days: i64) -> Decimal {
    let start = d("2023-01-01");
    let input = ContractValuationInput {
        injections: vec![ScheduledVolume {
            date: start,
            volume: dec!(1000),
        }],
        withdrawals: vec![ScheduledVolume {
            date: start + chrono::Duration::days(days),
            volume: dec!(1000),
        }],
        parameters: ContractParameters {
            storage_monthly_fee: dec!(0.05),
            ..no_fees(dec!(1000))
        },
    };
    price_contract(&input, &FlatOracle(dec!(2)))
        .unwrap()
        .result
        .total_storage_cost
}

#[test]
fn test_storage_cost_linear_in_elapsed_days() {
    let single = storage_cost_for_gap(61);
    let double = storage_cost_for_gap(122);
    assert!(
        (double - single * dec!(2)).abs() < dec!(0.0000001),
        "Doubling the gap should double storage cost: {single} vs {double}"
    );
    // 1000 * 0.05 * 61 / 30.4375 ≈ 100.21
    assert!((single - dec!(100.21)).abs() < dec!(0.01));
}

#[test]
fn test_storage_charged_on_inventory_before_event() {
    // 100 held Jan->Feb, then 300 held Feb->Mar
    let input = ContractValuationInput {
        injections: vec![sv("2023-01-01", dec!(100)), sv("2023-02-01", dec!(200))],
        withdrawals: vec![sv("2023-03-01", dec!(300))],
        parameters: ContractParameters {
            storage_monthly_fee: dec!(1),
            ..no_fees(dec!(1000))
        },
    };
    let result = price_contract(&input, &FlatOracle(dec!(0))).unwrap().result;
    let jan_feb = dec!(100) * dec!(1) * (dec!(31) / dec!(30.4375));
    let feb_mar = dec!(300) * dec!(1) * (dec!(28) / dec!(30.4375));
    assert_eq!(result.ledger[1].storage_cost, jan_feb);
    assert_eq!(result.ledger[2].storage_cost, feb_mar);
    assert_eq!(result.net_value, -jan_feb - feb_mar);
}

#[test]
fn test_no_storage_cost_after_last_event() {
    let input = ContractValuationInput {
        injections: vec![sv("2023-01-01", dec!(100))],
        withdrawals: vec![],
        parameters: ContractParameters {
            storage_monthly_fee: dec!(1),
            ..no_fees(dec!(1000))
        },
    };
    let output = price_contract(&input, &FlatOracle(dec!(2))).unwrap();
    assert_eq!(output.result.total_storage_cost, Decimal::ZERO);
    assert_eq!(output.result.net_value, dec!(-200));
    assert_eq!(output.result.closing_inventory, dec!(100));
}

// ===========================================================================
// Event ordering
// ===========================================================================

#[test]
fn test_merge_preserves_tie_break() {
    let injections = vec![sv("2023-06-01", dec!(7)), sv("2023-05-01", dec!(5))];
    let withdrawals = vec![sv("2023-06-01", dec!(3)), sv("2023-06-01", dec!(2))];
    let merged = merge_events(&injections, &withdrawals);

    let order: Vec<(String, EventKind, Decimal)> = merged
        .into_iter()
        .map(|e| (e.date.to_string(), e.kind, e.volume))
        .collect();
    pretty_assertions::assert_eq!(
        order,
        vec![
            ("2023-05-01".to_string(), EventKind::Injection, dec!(5)),
            ("2023-06-01".to_string(), EventKind::Injection, dec!(7)),
            ("2023-06-01".to_string(), EventKind::Withdrawal, dec!(3)),
            ("2023-06-01".to_string(), EventKind::Withdrawal, dec!(2)),
        ]
    );
}

#[test]
fn test_unsorted_inputs_value_like_sorted() {
    let oracle = FlatOracle(dec!(2));
    let params = ContractParameters {
        storage_monthly_fee: dec!(0.02),
        injection_fee: dec!(0.1),
        withdrawal_fee: dec!(0.05),
        max_storage: dec!(1000),
    };
    let sorted = ContractValuationInput {
        injections: vec![sv("2023-01-01", dec!(100)), sv("2023-03-01", dec!(100))],
        withdrawals: vec![sv("2023-06-01", dec!(150)), sv("2023-09-01", dec!(50))],
        parameters: params.clone(),
    };
    let shuffled = ContractValuationInput {
        injections: vec![sv("2023-03-01", dec!(100)), sv("2023-01-01", dec!(100))],
        withdrawals: vec![sv("2023-09-01", dec!(50)), sv("2023-06-01", dec!(150))],
        parameters: params,
    };
    assert_eq!(
        price_contract(&sorted, &oracle).unwrap().result.net_value,
        price_contract(&shuffled, &oracle).unwrap().result.net_value
    );
}
