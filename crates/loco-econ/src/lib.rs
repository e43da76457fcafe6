#![deny(warnings)]

//! Economy model: inflation factors, inflation-adjusted costs and the
//! cached delivered-cargo payment table.
//!
//! Every factor starts at 1024 (fixed point 1.0 with a divisor of 2^10 in
//! most callers) and grows monthly by `factor * rate >> 12`. Inflation stops
//! at 2030; the driver enforces that by not calling `update_monthly` for
//! later years.

use loco_core::{CargoId, Currency, MAX_CARGO};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod cargo;

pub use cargo::CargoObject;

/// Number of inflation factors.
pub const NUM_FACTORS: usize = 32;
/// Factor value at 1900, before any inflation.
pub const BASE_FACTOR: u32 = 1024;
/// Payment table buckets per cargo; bucket `n` covers `2 * n` days.
pub const PAYMENT_BUCKETS: usize = 60;
/// First year with inflation applied.
pub const INFLATION_START_YEAR: i32 = 1900;
/// Inflation is frozen from this year on.
pub const INFLATION_END_YEAR: i32 = 2030;

/// Monthly growth per factor in 1/4096ths.
const INFLATION_RATES: [u32; NUM_FACTORS] = [
    20, 20, 20, 20, 23, 20, 23, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20,
    20, 20, 20, 17, 17, 17, 17, 17,
];

/// Units and distance used to fill the payment table.
const PAYMENT_TABLE_UNITS: i64 = 100;
const PAYMENT_TABLE_DISTANCE: i64 = 10;

/// Errors from economy lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconError {
    /// No cargo object is loaded for this id.
    #[error("cargo {0} is not loaded")]
    UnknownCargo(CargoId),
    /// Inflation factor index is outside the table.
    #[error("inflation index {0} is out of range")]
    InvalidIndex(u8),
}

/// Inflation state shared by every cost and payment calculation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    currency_multiplication_factor: [u32; NUM_FACTORS],
    /// Never written by the engine; kept so saved state has the same shape.
    unused_currency_multiplication_factor: [u32; NUM_FACTORS],
    delivered_cargo_payments: Vec<Vec<Currency>>,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new()
    }
}

impl Economy {
    /// Factors at their 1900 values and an empty payment table.
    pub fn new() -> Self {
        Self {
            currency_multiplication_factor: [BASE_FACTOR; NUM_FACTORS],
            unused_currency_multiplication_factor: [0; NUM_FACTORS],
            delivered_cargo_payments: Vec::new(),
        }
    }

    pub fn factors(&self) -> &[u32; NUM_FACTORS] {
        &self.currency_multiplication_factor
    }

    pub fn unused_factors(&self) -> &[u32; NUM_FACTORS] {
        &self.unused_currency_multiplication_factor
    }

    pub fn factor(&self, index: u8) -> Result<u32, EconError> {
        self.currency_multiplication_factor
            .get(usize::from(index))
            .copied()
            .ok_or(EconError::InvalidIndex(index))
    }

    /// Apply one month of inflation, then rebuild the payment table.
    pub fn update_monthly(&mut self, cargo: &[CargoObject]) {
        for (factor, rate) in self
            .currency_multiplication_factor
            .iter_mut()
            .zip(INFLATION_RATES)
        {
            *factor = factor.wrapping_add(factor.wrapping_mul(rate) >> 12);
        }
        self.rebuild_payment_table(cargo);
    }

    /// Reset the factors and replay every month from 1900 to `year`.
    ///
    /// Years at or before 1900 leave the factors at their base value; years
    /// after 2030 replay as if they were 2030.
    pub fn set_inflation_for_year(&mut self, year: i32, cargo: &[CargoObject]) {
        self.currency_multiplication_factor = [BASE_FACTOR; NUM_FACTORS];
        self.unused_currency_multiplication_factor = [0; NUM_FACTORS];

        let last = year.min(INFLATION_END_YEAR);
        let months = if last > INFLATION_START_YEAR {
            (last - INFLATION_START_YEAR) * 12
        } else {
            0
        };
        for _ in 0..months {
            self.update_monthly(cargo);
        }
        self.rebuild_payment_table(cargo);
        debug!(year, months, factor0 = self.currency_multiplication_factor[0], "inflation replayed");
    }

    /// `cost_factor * factor[index] / 2^divisor`, truncating towards zero.
    ///
    /// Indices past the table use factor 0.
    pub fn inflation_adjusted_cost(&self, cost_factor: i64, index: u8, divisor: u8) -> Currency {
        let factor = self
            .currency_multiplication_factor
            .get(usize::from(index))
            .copied()
            .unwrap_or(0);
        (cost_factor * i64::from(factor)) / (1i64 << divisor)
    }

    /// Loan given to a freshly created company, rounded down to hundreds.
    pub fn starting_loan(&self, starting_loan_size: u16) -> Currency {
        self.inflation_adjusted_cost(i64::from(starting_loan_size), 0, 8) / 100 * 100
    }

    /// Money earned for `units` of `cargo` carried `distance` in `num_days`.
    pub fn calculate_delivered_cargo_payment(
        &self,
        cargo: &CargoObject,
        units: i32,
        distance: i32,
        num_days: u16,
    ) -> Currency {
        let factor = cargo.adjusted_payment_factor(num_days);
        let unit_distance_payment = self.inflation_adjusted_cost(factor, cargo.payment_index, 8);
        unit_distance_payment * i64::from(units) * i64::from(distance) / 4096
    }

    /// Cached payment for 100 units over distance 10 delivered in
    /// `2 * bucket` days; `bucket` is 1-based.
    pub fn cached_payment(&self, cargo: CargoId, bucket: usize) -> Result<Currency, EconError> {
        let row = self
            .delivered_cargo_payments
            .get(cargo.index())
            .ok_or(EconError::UnknownCargo(cargo))?;
        let last = row.len().max(1) - 1;
        Ok(row.get(bucket.saturating_sub(1).min(last)).copied().unwrap_or(0))
    }

    pub fn payment_table(&self) -> &[Vec<Currency>] {
        &self.delivered_cargo_payments
    }

    fn rebuild_payment_table(&mut self, cargo: &[CargoObject]) {
        let rows: Vec<Vec<Currency>> = cargo
            .iter()
            .take(MAX_CARGO)
            .map(|obj| {
                (1..=PAYMENT_BUCKETS as u16)
                    .map(|bucket| {
                        self.calculate_delivered_cargo_payment(
                            obj,
                            PAYMENT_TABLE_UNITS as i32,
                            PAYMENT_TABLE_DISTANCE as i32,
                            bucket * 2,
                        )
                    })
                    .collect()
            })
            .collect();
        self.delivered_cargo_payments = rows;
    }
}
