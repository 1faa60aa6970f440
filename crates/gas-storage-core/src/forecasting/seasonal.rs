use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::day_count::years_between;
use crate::error::GasStorageError;
use crate::forecasting::history::PriceHistory;
use crate::forecasting::oracle::PriceOracle;
use crate::types::{with_metadata, ComputationOutput, Price};
use crate::GasStorageResult;

const DEFAULT_FOURIER_ORDER: u32 = 3;
const MAX_FOURIER_ORDER: u32 = 10;

/// Pivots smaller than this are treated as a singular design matrix.
const PIVOT_EPSILON: Decimal = dec!(0.000000000001);

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Configuration for the trend + yearly seasonality regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalTrendConfig {
    /// Number of sine/cosine pairs describing the yearly cycle.
    #[serde(default = "default_fourier_order")]
    pub fourier_order: u32,
}

fn default_fourier_order() -> u32 {
    DEFAULT_FOURIER_ORDER
}

impl Default for SeasonalTrendConfig {
    fn default() -> Self {
        Self {
            fourier_order: DEFAULT_FOURIER_ORDER,
        }
    }
}

/// One harmonic of the fitted yearly cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalTerm {
    /// Harmonic number (1 = once per year).
    pub harmonic: u32,
    pub sin_coefficient: Decimal,
    pub cos_coefficient: Decimal,
    /// Peak deviation contributed by this harmonic.
    pub amplitude: Decimal,
}

/// Fitted value against the observation it was fitted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPoint {
    pub date: NaiveDate,
    pub observed: Price,
    pub fitted: Price,
    pub residual: Decimal,
}

/// Output of a model fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    /// Price level at the first observation date, net of seasonality.
    pub intercept: Decimal,
    /// Linear trend in price units per year.
    pub trend_per_year: Decimal,
    pub seasonal_terms: Vec<SeasonalTerm>,
    /// Root mean squared in-sample error.
    pub rmse: Decimal,
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub fitted_values: Vec<FittedPoint>,
}

#[derive(Debug, Clone)]
struct FittedCoefficients {
    origin: NaiveDate,
    beta: Vec<Decimal>,
}

/// Linear trend plus yearly Fourier seasonality, fitted by least squares.
///
/// price(t) = b0 + b1 * t + sum_k [ s_k * sin(2 pi k phi) + c_k * cos(2 pi k phi) ]
///
/// where t is years since the first observation and phi is the fractional
/// part of t (position within the year).
#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    config: SeasonalTrendConfig,
    fitted: Option<FittedCoefficients>,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

impl SeasonalTrendModel {
    pub fn new(config: SeasonalTrendConfig) -> GasStorageResult<Self> {
        if config.fourier_order == 0 || config.fourier_order > MAX_FOURIER_ORDER {
            return Err(GasStorageError::InvalidInput {
                field: "fourier_order".into(),
                reason: format!(
                    "Fourier order must be between 1 and {MAX_FOURIER_ORDER}, got {}",
                    config.fourier_order
                ),
            });
        }
        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Build and fit in one step.
    pub fn fitted(
        config: SeasonalTrendConfig,
        history: &PriceHistory,
    ) -> GasStorageResult<(Self, ComputationOutput<FitSummary>)> {
        let mut model = Self::new(config)?;
        let summary = model.fit(history)?;
        Ok((model, summary))
    }

    pub fn config(&self) -> SeasonalTrendConfig {
        self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Number of regression coefficients: intercept, trend, and a sin/cos
    /// pair per harmonic.
    pub fn parameter_count(&self) -> usize {
        2 + 2 * self.config.fourier_order as usize
    }

    /// Fit the model to a price history, replacing any previous fit.
    ///
    /// Solves the normal equations (X^T X) beta = X^T y by Gaussian
    /// elimination with partial pivoting.
    pub fn fit(&mut self, history: &PriceHistory) -> GasStorageResult<ComputationOutput<FitSummary>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let required = self.parameter_count();
        if history.len() < required {
            return Err(GasStorageError::InsufficientData(format!(
                "Fourier order {} needs at least {required} observations, got {}",
                self.config.fourier_order,
                history.len()
            )));
        }

        let origin = history.first_date();
        let order = self.config.fourier_order;

        let design: Vec<Vec<Decimal>> = history
            .observations()
            .iter()
            .map(|o| regressors(origin, o.date, order))
            .collect();
        let target: Vec<Decimal> = history.observations().iter().map(|o| o.price).collect();

        let beta = solve_least_squares(&design, &target)?;

        // -- Diagnostics --
        let mut fitted_values = Vec::with_capacity(history.len());
        let mut sum_sq_error = Decimal::ZERO;
        for (obs, row) in history.observations().iter().zip(design.iter()) {
            let fitted = dot(&beta, row);
            let residual = obs.price - fitted;
            sum_sq_error += residual * residual;
            fitted_values.push(FittedPoint {
                date: obs.date,
                observed: obs.price,
                fitted,
                residual,
            });
        }
        let mse = sum_sq_error / Decimal::from(history.len() as u64);
        let rmse = mse.sqrt().unwrap_or(Decimal::ZERO);

        let seasonal_terms = (1..=order)
            .map(|k| {
                let idx = 2 * k as usize;
                let s = beta[idx];
                let c = beta[idx + 1];
                SeasonalTerm {
                    harmonic: k,
                    sin_coefficient: s,
                    cos_coefficient: c,
                    amplitude: (s * s + c * c).sqrt().unwrap_or(Decimal::ZERO),
                }
            })
            .collect();

        let span_years = years_between(origin, history.last_date());
        if span_years < Decimal::ONE {
            warnings.push(format!(
                "History spans {} years; yearly seasonality is poorly identified below one year",
                span_years.round_dp(2)
            ));
        }
        if history.observations().iter().any(|o| o.price <= Decimal::ZERO) {
            warnings.push("History contains non-positive prices".into());
        }

        info!(
            observations = history.len(),
            fourier_order = order,
            rmse = %rmse.round_dp(6),
            "fitted seasonal trend model"
        );

        let summary = FitSummary {
            intercept: beta[0],
            trend_per_year: beta[1],
            seasonal_terms,
            rmse,
            observations: history.len(),
            first_date: origin,
            last_date: history.last_date(),
            fitted_values,
        };

        self.fitted = Some(FittedCoefficients { origin, beta });

        let elapsed = start.elapsed().as_micros() as u64;
        let assumptions = serde_json::json!({
            "model": "linear trend + yearly Fourier seasonality",
            "fourier_order": order,
            "time_axis": "years since first observation (365.25-day year)",
            "estimator": "ordinary least squares via normal equations",
        });

        Ok(with_metadata(
            "Seasonal Trend Price Model Fit",
            &assumptions,
            warnings,
            elapsed,
            summary,
        ))
    }
}

impl PriceOracle for SeasonalTrendModel {
    fn estimate(&self, date: NaiveDate) -> GasStorageResult<Price> {
        let fitted = self.fitted.as_ref().ok_or(GasStorageError::ModelNotFitted)?;
        let row = regressors(fitted.origin, date, self.config.fourier_order);
        let price = dot(&fitted.beta, &row);
        debug!(%date, %price, "seasonal trend estimate");
        Ok(price)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Design-matrix row for `date`: [1, t, sin(2 pi phi), cos(2 pi phi), ...].
fn regressors(origin: NaiveDate, date: NaiveDate, order: u32) -> Vec<Decimal> {
    let t = years_between(origin, date);
    let phase = t - t.floor();

    let mut row = Vec::with_capacity(2 + 2 * order as usize);
    row.push(Decimal::ONE);
    row.push(t);
    for k in 1..=order {
        // Keep the angle inside [0, 2 pi) before handing it to the series.
        let cycles = Decimal::from(k) * phase;
        let angle = Decimal::TWO_PI * (cycles - cycles.floor());
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

/// Least-squares coefficients for `design * beta ~= target`.
fn solve_least_squares(design: &[Vec<Decimal>], target: &[Decimal]) -> GasStorageResult<Vec<Decimal>> {
    let p = design.first().map(|r| r.len()).unwrap_or(0);

    // Augmented normal-equation matrix [X^T X | X^T y]
    let mut m = vec![vec![Decimal::ZERO; p + 1]; p];
    for (row, y) in design.iter().zip(target.iter()) {
        for i in 0..p {
            for j in i..p {
                m[i][j] += row[i] * row[j];
            }
            m[i][p] += row[i] * y;
        }
    }
    for i in 0..p {
        for j in 0..i {
            m[i][j] = m[j][i];
        }
    }

    // Forward elimination with partial pivoting
    for col in 0..p {
        let pivot_row = (col..p)
            .max_by_key(|&r| m[r][col].abs())
            .unwrap_or(col);
        if m[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(GasStorageError::DivisionByZero {
                context: format!("seasonal trend normal equations (column {col} is singular)"),
            });
        }
        m.swap(col, pivot_row);

        for r in (col + 1)..p {
            let factor = m[r][col] / m[col][col];
            if factor.is_zero() {
                continue;
            }
            for c in col..=p {
                let delta = factor * m[col][c];
                m[r][c] -= delta;
            }
        }
    }

    // Back substitution
    let mut beta = vec![Decimal::ZERO; p];
    for i in (0..p).rev() {
        let mut acc = m[i][p];
        for j in (i + 1)..p {
            acc -= m[i][j] * beta[j];
        }
        beta[i] = acc / m[i][i];
    }

    Ok(beta)
}

fn dot(a: &[Decimal], b: &[Decimal]) -> Decimal {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
